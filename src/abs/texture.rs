//! Structs and functions for handling textures.
//!
//! The module provides the [`Texture`] struct, the GPU side of a
//! [`TextureMap`].

use std::sync::Arc;

use crate::{
    abs::{GraphicsDevice, RenderContext},
    error::{RenderError, RenderResult},
    texture::TextureMap,
};

/// Represents a texture stored on the GPU side.
pub struct Texture<D: GraphicsDevice> {
    context: Arc<RenderContext<D>>,
    id: Option<D::Texture>,
    width: u32,
    height: u32,
}

impl<D: GraphicsDevice> Texture<D> {
    /// Creates a new texture holding the pixels of `map`.
    pub fn new(context: &Arc<RenderContext<D>>, map: &dyn TextureMap) -> RenderResult<Self> {
        let device = context.device()?;
        let id = device.create_texture().map_err(RenderError::Device)?;
        let mut texture = Self {
            context: Arc::clone(context),
            id: Some(id),
            width: 0,
            height: 0,
        };
        texture.reload(map)?;
        Ok(texture)
    }

    /// Replaces the texture contents with the current pixels of `map`.
    pub fn reload(&mut self, map: &dyn TextureMap) -> RenderResult<()> {
        let device = self.context.device()?;
        let id = self.id()?;
        let pixels = map.pixels();

        device.bind_texture(0, Some(id));
        device.upload_texture(pixels.width(), pixels.height(), pixels.as_raw(), map.interpolate());
        device.bind_texture(0, None);

        self.width = pixels.width();
        self.height = pixels.height();
        log::debug!("uploaded {}x{} texture", self.width, self.height);
        Ok(())
    }

    fn id(&self) -> RenderResult<D::Texture> {
        self.id
            .ok_or_else(|| RenderError::state("texture has been discarded"))
    }

    /// Binds the texture to the specified texture unit.
    pub fn bind(&self, unit: u32) -> RenderResult<()> {
        let device = self.context.device()?;
        device.bind_texture(unit, Some(self.id()?));
        Ok(())
    }

    pub fn unbind(&self, unit: u32) -> RenderResult<()> {
        let device = self.context.device()?;
        self.id()?;
        device.bind_texture(unit, None);
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Deletes the GPU texture. Calling this more than once does nothing.
    pub fn discard(&mut self) -> RenderResult<()> {
        let device = self.context.device()?;
        if let Some(id) = self.id.take() {
            device.delete_texture(id);
        }
        Ok(())
    }
}

impl<D: GraphicsDevice> Drop for Texture<D> {
    fn drop(&mut self) {
        if self.id.is_some() && self.discard().is_err() {
            log::warn!("texture dropped off the render thread, its GPU object is leaked");
        }
    }
}
