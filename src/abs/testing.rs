//! A [`GraphicsDevice`] that records calls instead of talking to a driver.

use std::sync::{
    Mutex,
    atomic::{AtomicU32, Ordering},
};

use crate::{
    abs::{BufferTarget, BufferUsage, GraphicsDevice},
    vertex::NumberFormat,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateVertexArray(u32),
    DeleteVertexArray(u32),
    BindVertexArray(Option<u32>),
    CreateBuffer(u32),
    DeleteBuffer(u32),
    BindBuffer(BufferTarget, Option<u32>),
    BufferData(BufferTarget, Vec<u8>, BufferUsage),
    EnableAttribute(u32),
    DisableAttribute(u32),
    FloatPointer {
        index: u32,
        components: i32,
        format: NumberFormat,
        normalize: bool,
        stride: i32,
        offset: i32,
    },
    IntegerPointer {
        index: u32,
        components: i32,
        format: NumberFormat,
        stride: i32,
        offset: i32,
    },
    DrawElements(u32, i32),
    CreateTexture(u32),
    DeleteTexture(u32),
    BindTexture(u32, Option<u32>),
    UploadTexture {
        width: u32,
        height: u32,
        bytes: usize,
        interpolate: bool,
    },
}

#[derive(Default)]
pub struct RecordingDevice {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicU32,
}

impl RecordingDevice {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns and clears everything recorded so far.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

impl GraphicsDevice for RecordingDevice {
    type VertexArray = u32;
    type Buffer = u32;
    type Texture = u32;

    fn create_vertex_array(&self) -> Result<u32, String> {
        let id = self.next();
        self.record(Call::CreateVertexArray(id));
        Ok(id)
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        self.record(Call::DeleteVertexArray(vertex_array));
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let id = self.next();
        self.record(Call::CreateBuffer(id));
        Ok(id)
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(Call::DeleteBuffer(buffer));
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<u32>) {
        self.record(Call::BindBuffer(target, buffer));
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.record(Call::BufferData(target, data.to_vec(), usage));
    }

    fn enable_attribute(&self, index: u32) {
        self.record(Call::EnableAttribute(index));
    }

    fn disable_attribute(&self, index: u32) {
        self.record(Call::DisableAttribute(index));
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
        self.record(Call::FloatPointer {
            index,
            components,
            format,
            normalize,
            stride,
            offset,
        });
    }

    fn integer_attribute_pointer(
        &self,
        index: u32,
        components: i32,
        format: NumberFormat,
        stride: i32,
        offset: i32,
    ) {
        self.record(Call::IntegerPointer {
            index,
            components,
            format,
            stride,
            offset,
        });
    }

    fn draw_elements(&self, topology: u32, index_count: i32) {
        self.record(Call::DrawElements(topology, index_count));
    }

    fn create_texture(&self) -> Result<u32, String> {
        let id = self.next();
        self.record(Call::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&self, texture: u32) {
        self.record(Call::DeleteTexture(texture));
    }

    fn bind_texture(&self, unit: u32, texture: Option<u32>) {
        self.record(Call::BindTexture(unit, texture));
    }

    fn upload_texture(&self, width: u32, height: u32, pixels: &[u8], interpolate: bool) {
        self.record(Call::UploadTexture {
            width,
            height,
            bytes: pixels.len(),
            interpolate,
        });
    }
}
