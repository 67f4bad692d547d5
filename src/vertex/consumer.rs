//! The semantic vertex writing interface.

use glam::Vec3;

use crate::{error::RenderResult, pose::PoseStack};

/// Remaps texture coordinates, e.g. into the region of an atlas.
pub trait UvModifier {
    fn map_u(&self, u: f32) -> f32;
    fn map_v(&self, v: f32) -> f32;
}

/// Something that accepts vertices through the common named attributes.
///
/// The plain helpers write the elements named `position`, `normal`, `color` and
/// `uv`. The transformed helpers run their input through a [`PoseStack`] or a
/// [`UvModifier`] first.
pub trait VertexConsumer {
    fn vertex(&mut self, x: f32, y: f32, z: f32) -> RenderResult<&mut Self>;
    fn normal(&mut self, x: f32, y: f32, z: f32) -> RenderResult<&mut Self>;
    fn color(&mut self, r: f32, g: f32, b: f32, a: f32) -> RenderResult<&mut Self>;
    fn uv(&mut self, u: f32, v: f32) -> RenderResult<&mut Self>;
    fn end_vertex(&mut self) -> RenderResult<()>;

    /// Writes a position transformed by the full top pose, translation included.
    fn transformed_vertex(
        &mut self,
        poses: &PoseStack,
        x: f32,
        y: f32,
        z: f32,
    ) -> RenderResult<&mut Self> {
        let p = poses.last().transform_point(Vec3::new(x, y, z));
        self.vertex(p.x, p.y, p.z)
    }

    /// Writes a normal transformed by the rotation part of the top pose only.
    fn transformed_normal(
        &mut self,
        poses: &PoseStack,
        x: f32,
        y: f32,
        z: f32,
    ) -> RenderResult<&mut Self> {
        let n = poses.last().transform_normal(Vec3::new(x, y, z));
        self.normal(n.x, n.y, n.z)
    }

    fn mapped_uv(&mut self, modifier: &dyn UvModifier, u: f32, v: f32) -> RenderResult<&mut Self> {
        self.uv(modifier.map_u(u), modifier.map_v(v))
    }
}
