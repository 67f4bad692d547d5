//! Animation frame state shared by all texture maps.

use glam::{Mat3, Vec2};

use crate::error::{RenderError, RenderResult};

/// Cycles through the frames of a vertical frame strip.
///
/// The frame matrix is a 2D UV transform: it scales V down to one frame and
/// offsets it to the current frame. Shaders receive both the current and the
/// previous matrix so they can blend between frames.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameAnimation {
    frames: Vec<u32>,
    frame_time: u32,
    cursor: usize,
    ticks: u32,
    v_scale: f32,
    v_step: f32,
    frame_matrix: Mat3,
    last_frame_matrix: Mat3,
}

impl FrameAnimation {
    /// `v_scale` is applied to incoming V coordinates, `v_step` is the V distance
    /// between two frames of the strip.
    pub fn new(frames: Vec<u32>, frame_time: u32, v_scale: f32, v_step: f32) -> RenderResult<Self> {
        if frames.is_empty() {
            return Err(RenderError::configuration("animation needs at least one frame"));
        }
        if frame_time == 0 {
            return Err(RenderError::configuration("frame time must be at least one tick"));
        }

        let mut animation = Self {
            frames,
            frame_time,
            cursor: 0,
            ticks: 0,
            v_scale,
            v_step,
            frame_matrix: Mat3::IDENTITY,
            last_frame_matrix: Mat3::IDENTITY,
        };
        animation.frame_matrix = animation.matrix_for(animation.frames[0]);
        animation.last_frame_matrix = animation.frame_matrix;
        Ok(animation)
    }

    /// Number of frames stored in the strip, `max(frames) + 1`. `None` for an
    /// empty frame list or a frame index of `u32::MAX`.
    pub fn strip_length(frames: &[u32]) -> Option<u32> {
        frames.iter().max().and_then(|max| max.checked_add(1))
    }

    fn matrix_for(&self, frame: u32) -> Mat3 {
        Mat3::from_translation(Vec2::new(0.0, frame as f32 * self.v_step))
            * Mat3::from_scale(Vec2::new(1.0, self.v_scale))
    }

    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    pub fn frame_time(&self) -> u32 {
        self.frame_time
    }

    /// Index into the strip of the frame currently shown.
    pub fn current_frame(&self) -> u32 {
        self.frames[self.cursor]
    }

    pub fn frame_matrix(&self) -> Mat3 {
        self.frame_matrix
    }

    pub fn last_frame_matrix(&self) -> Mat3 {
        self.last_frame_matrix
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// Advances to the next frame, wrapping at the end of the frame list.
    pub fn next_frame(&mut self) {
        self.cursor = (self.cursor + 1) % self.frames.len();
        self.ticks = 0;
        self.last_frame_matrix = self.frame_matrix;
        self.frame_matrix = self.matrix_for(self.frames[self.cursor]);
    }

    /// Counts one tick and advances once `frame_time` ticks have passed.
    /// Returns true if the frame changed.
    pub fn tick(&mut self) -> bool {
        self.ticks += 1;
        if self.ticks >= self.frame_time {
            self.next_frame();
            true
        } else {
            false
        }
    }

    /// Progress towards the next frame in `[0, 1)`.
    pub fn partial_tick(&self) -> f32 {
        self.ticks as f32 / self.frame_time as f32
    }
}
