//! Textures made of a single image, optionally a strip of animation frames.

use glam::Mat3;
use image::{DynamicImage, RgbaImage};

use crate::{
    error::{RenderError, RenderResult},
    resource::ResourceLocation,
    texture::{FrameAnimation, TextureMap},
    vertex::UvModifier,
};

/// A texture map holding exactly one (possibly animated) texture.
///
/// Animated textures are stored as a vertical strip of equally sized frames;
/// UVs are passed through unchanged and the frame matrix selects the frame.
#[derive(Clone, Debug)]
pub struct SingleTextureMap {
    image: RgbaImage,
    frame_height: u32,
    animation: FrameAnimation,
    interpolate: bool,
}

impl SingleTextureMap {
    /// Creates a map from raw RGBA pixels.
    ///
    /// `height` is the height of the whole strip, not of a single frame.
    pub fn new(
        width: u32,
        height: u32,
        frames: Vec<u32>,
        frame_time: u32,
        pixels: Vec<u8>,
        interpolate: bool,
    ) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::configuration(format!(
                "texture size {width}x{height} is empty"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::configuration(format!(
                "expected {expected} bytes of RGBA data for {width}x{height}, got {}",
                pixels.len()
            )));
        }
        let image = RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::configuration("pixel buffer does not match texture size"))?;
        Self::from_rgba(image, frames, frame_time, interpolate)
    }

    /// Creates a map from a decoded image.
    pub fn from_image(
        image: &DynamicImage,
        frames: Vec<u32>,
        frame_time: u32,
        interpolate: bool,
    ) -> RenderResult<Self> {
        Self::from_rgba(image.to_rgba8(), frames, frame_time, interpolate)
    }

    pub fn from_rgba(
        image: RgbaImage,
        frames: Vec<u32>,
        frame_time: u32,
        interpolate: bool,
    ) -> RenderResult<Self> {
        let height = image.height();
        let frame_height = frame_height(height, &frames)?;
        let strip = height as f32;
        let animation = FrameAnimation::new(
            frames,
            frame_time,
            frame_height as f32 / strip,
            frame_height as f32 / strip,
        )?;

        Ok(Self {
            image,
            frame_height,
            animation,
            interpolate,
        })
    }

    pub fn animation(&self) -> &FrameAnimation {
        &self.animation
    }
}

/// Height of one frame of a strip, rejecting strips that do not divide evenly.
pub(crate) fn frame_height(height: u32, frames: &[u32]) -> RenderResult<u32> {
    let Some(last) = frames.iter().max() else {
        return Err(RenderError::configuration("animation needs at least one frame"));
    };
    let strip = FrameAnimation::strip_length(frames)
        .ok_or_else(|| RenderError::configuration(format!("frame index {last} is out of range")))?;
    if height == 0 || height % strip != 0 {
        return Err(RenderError::configuration(format!(
            "texture height {height} is not divisible into {strip} frames"
        )));
    }
    Ok(height / strip)
}

impl UvModifier for SingleTextureMap {
    fn map_u(&self, u: f32) -> f32 {
        u
    }

    fn map_v(&self, v: f32) -> f32 {
        v
    }
}

impl TextureMap for SingleTextureMap {
    fn image_width(&self) -> u32 {
        self.image.width()
    }

    fn image_height(&self) -> u32 {
        self.frame_height
    }

    fn map_width(&self) -> u32 {
        self.image.width()
    }

    fn map_height(&self) -> u32 {
        self.image.height()
    }

    fn pixels(&self) -> &RgbaImage {
        &self.image
    }

    fn interpolate(&self) -> bool {
        self.interpolate
    }

    fn activate_texture(&mut self, _location: &ResourceLocation) -> RenderResult<()> {
        Ok(())
    }

    fn frame_matrix(&self) -> Mat3 {
        self.animation.frame_matrix()
    }

    fn last_frame_matrix(&self) -> Mat3 {
        self.animation.last_frame_matrix()
    }

    fn next_frame(&mut self) {
        self.animation.next_frame();
    }

    fn tick(&mut self) -> bool {
        self.animation.tick()
    }

    fn partial_tick(&self) -> f32 {
        self.animation.partial_tick()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::texture::TextureMeta;

    fn strip(width: u32, height: u32, frames: Vec<u32>) -> RenderResult<SingleTextureMap> {
        let pixels = vec![255; (width * height * 4) as usize];
        SingleTextureMap::new(width, height, frames, 2, pixels, false)
    }

    #[test]
    fn frame_height_divides_strip() {
        let map = strip(8, 32, vec![0, 1, 2, 3]).unwrap();
        assert_eq!(map.image_height(), 8);
        assert_eq!(map.map_height(), 32);
        assert_eq!(map.image_width(), 8);
    }

    #[test]
    fn indivisible_height_is_rejected() {
        assert!(matches!(
            strip(8, 30, vec![0, 1, 2, 3]),
            Err(RenderError::Configuration(_))
        ));
    }

    #[test]
    fn out_of_range_frame_index_is_rejected() {
        let meta = TextureMeta::from_json(r#"{ "frames": [4294967295] }"#).unwrap();
        assert!(matches!(
            SingleTextureMap::new(1, 1, meta.frames, 1, vec![0; 4], false),
            Err(RenderError::Configuration(_))
        ));
        assert_eq!(FrameAnimation::strip_length(&[u32::MAX]), None);
    }

    #[test]
    fn wrong_pixel_count_is_rejected() {
        assert!(matches!(
            SingleTextureMap::new(2, 2, vec![0], 1, vec![0; 15], false),
            Err(RenderError::Configuration(_))
        ));
    }

    #[test]
    fn animation_is_cyclic() {
        let mut map = strip(8, 32, vec![0, 1, 2, 3]).unwrap();
        let start = map.frame_matrix();
        for _ in 0..3 {
            map.next_frame();
            assert_ne!(map.frame_matrix(), start);
        }
        map.next_frame();
        assert_eq!(map.frame_matrix(), start);
    }

    #[test]
    fn uvs_pass_through_and_frame_matrix_selects_frame() {
        let mut map = strip(8, 32, vec![0, 1, 2, 3]).unwrap();
        assert_eq!(map.map_u(0.3), 0.3);
        assert_eq!(map.map_v(0.7), 0.7);
        map.next_frame();
        map.next_frame();
        let uv = map.frame_matrix().transform_point2(Vec2::new(1.0, 0.0));
        assert!(uv.abs_diff_eq(Vec2::new(1.0, 0.5), 1e-6));
    }

    #[test]
    fn from_image_reads_dimensions() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(4, 12));
        let map = SingleTextureMap::from_image(&image, vec![0, 1, 2], 1, true).unwrap();
        assert_eq!(map.image_height(), 4);
        assert!(map.interpolate());
    }
}
