//! A small OpenGL rendering toolkit. This crate packs vertex data on the CPU
//! according to runtime vertex formats, uploads it into GPU buffers, and keeps
//! the texture maps, atlases and animations that go with it.
//!
//! GPU access goes through a [`abs::RenderContext`], which is bound to the
//! thread that created it.

pub mod abs;
pub mod config;
pub mod error;
pub mod logging;
pub mod pose;
pub mod resource;
pub mod texture;
pub mod vertex;

pub use error::{RenderError, RenderResult};
