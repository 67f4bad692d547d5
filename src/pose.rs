//! A stack of model transforms used to place geometry hierarchically, and the
//! [`Camera`] that produces the view transform.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

use crate::error::{RenderError, RenderResult};

/// One entry of a [`PoseStack`]: the full transform and the matrix used for normals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub pose: Mat4,
    pub normal: Mat3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            pose: Mat4::IDENTITY,
            normal: Mat3::IDENTITY,
        }
    }
}

impl Pose {
    /// Transforms a position, translation included.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.pose.transform_point3(point)
    }

    /// Transforms a normal. Normals are never translated.
    pub fn transform_normal(&self, normal: Vec3) -> Vec3 {
        self.normal * normal
    }
}

/// Stack of composed transforms. Always holds at least one entry.
#[derive(Clone, Debug)]
pub struct PoseStack {
    stack: Vec<Pose>,
}

impl Default for PoseStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseStack {
    pub fn new() -> Self {
        Self {
            stack: vec![Pose::default()],
        }
    }

    /// Duplicates the top entry.
    pub fn push(&mut self) {
        let top = *self.last();
        self.stack.push(top);
    }

    pub fn pop(&mut self) -> RenderResult<Pose> {
        if self.stack.len() == 1 {
            return Err(RenderError::state("cannot pop the root pose"));
        }
        Ok(self.stack.pop().unwrap_or_default())
    }

    pub fn last(&self) -> &Pose {
        // The root entry is never popped.
        &self.stack[self.stack.len() - 1]
    }

    fn last_mut(&mut self) -> &mut Pose {
        let top = self.stack.len() - 1;
        &mut self.stack[top]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn clear(&mut self) {
        self.stack.truncate(1);
        self.stack[0] = Pose::default();
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        let top = self.last_mut();
        top.pose *= Mat4::from_translation(Vec3::new(x, y, z));
    }

    /// Scales the pose. The normal matrix receives the inverse scale so normals
    /// stay perpendicular to scaled surfaces.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        let top = self.last_mut();
        top.pose *= Mat4::from_scale(Vec3::new(x, y, z));
        if x == y && y == z {
            if x < 0.0 {
                top.normal *= Mat3::from_diagonal(Vec3::splat(-1.0));
            }
        } else {
            top.normal *= Mat3::from_diagonal(Vec3::new(1.0 / x, 1.0 / y, 1.0 / z));
        }
    }

    pub fn rotate(&mut self, rotation: Quat) {
        let top = self.last_mut();
        top.pose *= Mat4::from_quat(rotation);
        top.normal *= Mat3::from_quat(rotation);
    }

    /// Multiplies an arbitrary matrix onto the pose and derives the matching normal matrix.
    pub fn mul_pose(&mut self, matrix: Mat4) {
        let top = self.last_mut();
        top.pose *= matrix;
        top.normal *= Mat3::from_mat4(matrix).inverse().transpose();
    }
}

/// A viewpoint with a position and an XYZ rotation in degrees.
///
/// The view matrix is only recomputed by [`update_view_matrix`](Self::update_view_matrix).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    position: Vec3,
    rotation: Vec3,
    view_matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO)
    }
}

impl Camera {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self {
            position,
            rotation,
            view_matrix: Mat4::IDENTITY,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Rotation around the X, Y and Z axes in degrees.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        )
    }

    /// Moves the camera in world space.
    pub fn offset(&mut self, motion: Vec3) {
        self.position += motion;
    }

    /// Moves the camera along its own axes.
    pub fn move_relative(&mut self, movement: Vec3) {
        self.offset(self.orientation() * movement);
    }

    /// Adds to the rotation, in degrees.
    pub fn rotate(&mut self, degrees: Vec3) {
        self.rotation += degrees;
    }

    pub fn update_view_matrix(&mut self) {
        self.view_matrix = Mat4::from_translation(self.position) * Mat4::from_quat(self.orientation());
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normals_ignore_translation() {
        let mut stack = PoseStack::new();
        stack.translate(5.0, -2.0, 1.0);
        let pose = stack.last();
        assert_eq!(pose.transform_point(Vec3::ZERO), Vec3::new(5.0, -2.0, 1.0));
        assert_eq!(pose.transform_normal(Vec3::Y), Vec3::Y);
    }

    #[test]
    fn push_pop_restores() {
        let mut stack = PoseStack::new();
        stack.push();
        stack.scale(2.0, 2.0, 2.0);
        assert_eq!(stack.last().transform_point(Vec3::ONE), Vec3::splat(2.0));
        stack.pop().unwrap();
        assert_eq!(stack.last().transform_point(Vec3::ONE), Vec3::ONE);
        assert!(matches!(stack.pop(), Err(RenderError::State(_))));
    }

    #[test]
    fn rotation_applies_to_normals() {
        let mut stack = PoseStack::new();
        stack.rotate(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let normal = stack.last().transform_normal(Vec3::X);
        assert!(normal.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn non_uniform_scale_keeps_normals_perpendicular() {
        let mut stack = PoseStack::new();
        stack.scale(4.0, 1.0, 1.0);
        let normal = stack.last().transform_normal(Vec3::new(1.0, 1.0, 0.0));
        assert!(normal.abs_diff_eq(Vec3::new(0.25, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn camera_moves_along_its_orientation() {
        let mut camera = Camera::default();
        camera.rotate(Vec3::new(0.0, 90.0, 0.0));
        camera.move_relative(Vec3::Z);
        assert!(camera.position().abs_diff_eq(Vec3::X, 1e-5));

        camera.offset(Vec3::Z);
        assert!(camera.position().abs_diff_eq(Vec3::new(1.0, 0.0, 1.0), 1e-5));
    }

    #[test]
    fn view_matrix_translates_after_rotating() {
        let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 90.0, 0.0));
        assert_eq!(camera.view_matrix(), Mat4::IDENTITY);

        camera.update_view_matrix();
        let view = camera.view_matrix();
        assert!(view.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
        assert!(view.transform_point3(Vec3::X).abs_diff_eq(Vec3::new(1.0, 2.0, 2.0), 1e-5));
    }
}
