//! This module contains the GPU facing side of the renderer,
//! including the device abstraction, context ownership, vertex buffers and textures.

pub mod buffer;
pub mod context;
pub mod device;
pub mod texture;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::*;
pub use context::*;
pub use device::*;
pub use texture::*;
