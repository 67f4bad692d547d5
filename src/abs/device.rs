//! The GPU binding surface.
//!
//! [`GraphicsDevice`] is the small set of OpenGL calls the renderer needs. It
//! is implemented for [`glow::Context`]; anything else implementing it (for
//! example a recording double in tests) can stand in for a real driver.

use std::fmt::Debug;

use glow::HasContext;

use crate::{abs::BufferUsage, vertex::NumberFormat};

/// Binding point of a buffer object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

impl BufferTarget {
    pub const fn gl(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// Everything the renderer asks of the GPU.
///
/// All methods must be called on the thread that owns the context, which
/// [`RenderContext`](crate::abs::RenderContext) enforces.
pub trait GraphicsDevice {
    type VertexArray: Copy + Debug;
    type Buffer: Copy + Debug;
    type Texture: Copy + Debug;

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn delete_buffer(&self, buffer: Self::Buffer);
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);
    /// Replaces the contents of the buffer bound to `target`.
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    fn enable_attribute(&self, index: u32);
    fn disable_attribute(&self, index: u32);
    /// Attribute read as float, optionally normalizing integer data.
    fn float_attribute_pointer(
        &self,
        index: u32,
        components: i32,
        format: NumberFormat,
        normalize: bool,
        stride: i32,
        offset: i32,
    );
    /// Attribute read as integer by the shader.
    fn integer_attribute_pointer(
        &self,
        index: u32,
        components: i32,
        format: NumberFormat,
        stride: i32,
        offset: i32,
    );

    /// Draws `index_count` 32-bit indices from the bound vertex array.
    fn draw_elements(&self, topology: u32, index_count: i32);

    fn create_texture(&self) -> Result<Self::Texture, String>;
    fn delete_texture(&self, texture: Self::Texture);
    fn bind_texture(&self, unit: u32, texture: Option<Self::Texture>);
    /// Uploads RGBA8 pixels to the bound texture and configures its sampler.
    fn upload_texture(&self, width: u32, height: u32, pixels: &[u8], interpolate: bool);
}

impl GraphicsDevice for glow::Context {
    type VertexArray = glow::VertexArray;
    type Buffer = glow::Buffer;
    type Texture = glow::Texture;

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target.gl(), buffer) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe { self.buffer_data_u8_slice(target.gl(), data, usage.gl()) }
    }

    fn enable_attribute(&self, index: u32) {
        unsafe { self.enable_vertex_attrib_array(index) }
    }

    fn disable_attribute(&self, index: u32) {
        unsafe { self.disable_vertex_attrib_array(index) }
    }

    fn float_attribute_pointer(
        &self,
        index: u32,
        components: i32,
        format: NumberFormat,
        normalize: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.vertex_attrib_pointer_f32(index, components, format.gl_type(), normalize, stride, offset)
        }
    }

    fn integer_attribute_pointer(
        &self,
        index: u32,
        components: i32,
        format: NumberFormat,
        stride: i32,
        offset: i32,
    ) {
        unsafe { self.vertex_attrib_pointer_i32(index, components, format.gl_type(), stride, offset) }
    }

    fn draw_elements(&self, topology: u32, index_count: i32) {
        unsafe { HasContext::draw_elements(self, topology, index_count, glow::UNSIGNED_INT, 0) }
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { HasContext::create_texture(self) }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    fn bind_texture(&self, unit: u32, texture: Option<Self::Texture>) {
        unsafe {
            self.active_texture(glow::TEXTURE0 + unit);
            HasContext::bind_texture(self, glow::TEXTURE_2D, texture);
        }
    }

    fn upload_texture(&self, width: u32, height: u32, pixels: &[u8], interpolate: bool) {
        let (min_filter, mag_filter) = if interpolate {
            (glow::LINEAR_MIPMAP_LINEAR, glow::LINEAR)
        } else {
            (glow::NEAREST_MIPMAP_NEAREST, glow::NEAREST)
        };
        unsafe {
            self.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
            self.generate_mipmap(glow::TEXTURE_2D);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, min_filter as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, mag_filter as i32);
        }
    }
}
