//! Texture maps: pixel data plus the UV and animation state used to sample it.
//!
//! A [`TextureMap`] is the CPU side of a texture. It owns the RGBA pixels that
//! get uploaded to the GPU (see [`crate::abs::Texture`]), remaps UVs into the
//! right part of the image and keeps track of animation frames. Animated
//! textures are vertical strips of equally sized frames.

pub mod animation;
pub mod atlas;
pub mod single;

pub use animation::*;
pub use atlas::*;
pub use single::*;

use glam::Mat3;
use image::RgbaImage;

use crate::{error::RenderResult, resource::ResourceLocation, vertex::UvModifier};

/// Animation settings of a texture, usually read from a `.json` file next to the image.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct TextureMeta {
    pub frames: Vec<u32>,
    #[serde(rename = "frametime")]
    pub frame_time: u32,
    pub interpolate: bool,
}

impl Default for TextureMeta {
    fn default() -> Self {
        Self {
            frames: vec![0],
            frame_time: 1,
            interpolate: false,
        }
    }
}

impl TextureMeta {
    pub fn from_json(json: &str) -> RenderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Common interface of single textures and atlases.
pub trait TextureMap: UvModifier {
    /// Width of the active texture in pixels.
    fn image_width(&self) -> u32;
    /// Height of one frame of the active texture in pixels.
    fn image_height(&self) -> u32;
    /// Width of the whole pixel buffer.
    fn map_width(&self) -> u32;
    /// Height of the whole pixel buffer, all frames included.
    fn map_height(&self) -> u32;
    fn pixels(&self) -> &RgbaImage;
    /// Whether samplers should filter linearly. Does not affect UV math.
    fn interpolate(&self) -> bool;
    /// Selects the texture that UV mapping and frame matrices refer to.
    fn activate_texture(&mut self, location: &ResourceLocation) -> RenderResult<()>;
    fn frame_matrix(&self) -> Mat3;
    fn last_frame_matrix(&self) -> Mat3;
    /// Advances all animations by one frame. There is no rate limiting,
    /// callers decide how often this runs.
    fn next_frame(&mut self);
    /// Counts one tick, advancing frames whose frame time has elapsed.
    fn tick(&mut self) -> bool;
    fn partial_tick(&self) -> f32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_defaults_fill_missing_fields() {
        let meta = TextureMeta::from_json(r#"{ "frametime": 4 }"#).unwrap();
        assert_eq!(meta.frames, vec![0]);
        assert_eq!(meta.frame_time, 4);
        assert!(!meta.interpolate);

        let meta = TextureMeta::from_json(r#"{ "frames": [0, 1, 1], "interpolate": true }"#).unwrap();
        assert_eq!(meta.frames, vec![0, 1, 1]);
        assert!(meta.interpolate);
    }

    #[test]
    fn malformed_meta_is_a_json_error() {
        assert!(matches!(
            TextureMeta::from_json("{ frames: }"),
            Err(crate::error::RenderError::Json(_))
        ));
    }
}
