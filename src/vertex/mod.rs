//! CPU side vertex data: layouts, primitives and the buffer builder.

pub mod builder;
pub mod consumer;
pub mod format;
pub mod primitive;

pub use builder::*;
pub use consumer::*;
pub use format::*;
pub use primitive::*;
