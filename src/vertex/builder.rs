//! Immediate mode vertex data builder.
//!
//! A [`BufferBuilder`] collects the vertices and indices of one pass and packs
//! them according to a [`VertexFormat`]. A pass looks like this:
//!
//! 1. [`BufferBuilder::begin`] locks in a primitive and a format.
//! 2. Elements are written through the [`VertexConsumer`] helpers or the raw
//!    `put_*` setters, each vertex closed by [`VertexConsumer::end_vertex`].
//! 3. [`BufferBuilder::end`] finishes the pass, generating default indices if
//!    none were given.
//! 4. [`BufferBuilder::pop_next`] hands the packed [`BufferPair`] off, usually
//!    to [`VertexBuffer::upload`](crate::abs::VertexBuffer::upload).
//!
//! Every vertex must write every element of the format; missing elements are
//! rejected at `end_vertex`, they are never zero filled.

use std::sync::Arc;

use crate::{
    error::{RenderError, RenderResult},
    vertex::{NumberFormat, RenderPrimitive, VertexConsumer, VertexElement, VertexFormat},
};

/// A primitive value that can be written as one component of a vertex element.
pub trait Component: Copy {
    /// Whether this type has the in-memory layout of `format`.
    fn accepts(format: NumberFormat) -> bool;
    fn write_to(self, out: &mut [u8]);
}

macro_rules! component {
    ($ty:ty, $($format:ident)|+) => {
        impl Component for $ty {
            fn accepts(format: NumberFormat) -> bool {
                matches!(format, $(NumberFormat::$format)|+)
            }

            fn write_to(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_ne_bytes());
            }
        }
    };
}

component!(f32, Float);
component!(i32, Int | UnsignedInt);
component!(u32, Int | UnsignedInt);
component!(i16, Short | UnsignedShort);
component!(u16, Short | UnsignedShort);
component!(i8, Byte | UnsignedByte);
component!(u8, Byte | UnsignedByte);

/// Scales a float into the range of a normalized integer type.
fn quantize(value: f32, normalize: bool, signed: bool, max: f32) -> f32 {
    match (normalize, signed) {
        (false, _) => value,
        (true, true) => value.clamp(-1.0, 1.0) * max,
        (true, false) => value.clamp(0.0, 1.0) * max,
    }
}

/// Encodes a float into whatever number format `element` is declared with.
fn encode_f32(value: f32, element: &VertexElement, out: &mut [u8]) {
    let n = element.normalize();
    match element.format() {
        NumberFormat::Float => value.write_to(out),
        NumberFormat::Int => (quantize(value, n, true, i32::MAX as f32) as i32).write_to(out),
        NumberFormat::UnsignedInt => {
            (quantize(value, n, false, u32::MAX as f32) as u32).write_to(out)
        }
        NumberFormat::Short => (quantize(value, n, true, i16::MAX as f32) as i16).write_to(out),
        NumberFormat::UnsignedShort => {
            (quantize(value, n, false, u16::MAX as f32) as u16).write_to(out)
        }
        NumberFormat::Byte => (quantize(value, n, true, i8::MAX as f32) as i8).write_to(out),
        NumberFormat::UnsignedByte => {
            (quantize(value, n, false, u8::MAX as f32) as u8).write_to(out)
        }
    }
}

/// Describes a finished pass: how much data it holds and how to interpret it.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawState {
    vertex_count: u32,
    index_count: u32,
    format: Arc<VertexFormat>,
    primitive: RenderPrimitive,
}

impl DrawState {
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn format(&self) -> &Arc<VertexFormat> {
        &self.format
    }

    pub fn primitive(&self) -> RenderPrimitive {
        self.primitive
    }

    /// Length of the vertex segment in bytes.
    pub fn vertex_bytes(&self) -> usize {
        self.vertex_count as usize * self.format.vertex_size()
    }

    /// Length of the index segment in bytes.
    pub fn index_bytes(&self) -> usize {
        self.index_count as usize * size_of::<u32>()
    }
}

/// The packed output of one pass: vertex bytes immediately followed by the
/// 32-bit index bytes.
#[derive(Clone, Debug)]
pub struct BufferPair {
    data: Vec<u8>,
    draw_state: DrawState,
}

impl BufferPair {
    pub fn draw_state(&self) -> &DrawState {
        &self.draw_state
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn vertex_data(&self) -> &[u8] {
        &self.data[..self.draw_state.vertex_bytes()]
    }

    pub fn index_data(&self) -> &[u8] {
        &self.data[self.draw_state.vertex_bytes()..]
    }

    /// Decodes the index segment.
    pub fn indices(&self) -> Vec<u32> {
        self.index_data()
            .chunks_exact(size_of::<u32>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }
}

/// Per-pass state: the locked in format plus fill tracking of the current vertex.
#[derive(Debug)]
struct Pass {
    primitive: RenderPrimitive,
    format: Arc<VertexFormat>,
    vertex_count: u32,
    /// Element the raw setters write to.
    cursor: usize,
    /// Components already written into the cursor element.
    filled: usize,
    written: Vec<bool>,
    scratch: Vec<u8>,
}

impl Pass {
    fn new(primitive: RenderPrimitive, format: Arc<VertexFormat>) -> Self {
        Self {
            primitive,
            vertex_count: 0,
            cursor: 0,
            filled: 0,
            written: vec![false; format.elements().len()],
            scratch: vec![0; format.vertex_size()],
            format,
        }
    }

    fn select(&mut self, index: usize) {
        self.cursor = index;
        self.filled = 0;
    }

    fn is_dirty(&self) -> bool {
        self.filled != 0 || self.written.iter().any(|w| *w)
    }

    /// Writes the next component of the cursor element through `write` and
    /// advances to the following element once the cursor element is complete.
    fn write_with(
        &mut self,
        check: impl FnOnce(&VertexElement) -> RenderResult<()>,
        write: impl FnOnce(&VertexElement, &mut [u8]),
    ) -> RenderResult<()> {
        let Some(element) = self.format.elements().get(self.cursor) else {
            return Err(RenderError::validation(
                "all elements of the current vertex are already written",
            ));
        };
        check(element)?;

        let size = element.format().size();
        let start = element.offset() + self.filled * size;
        write(element, &mut self.scratch[start..start + size]);

        self.filled += 1;
        if self.filled == element.components() {
            self.written[self.cursor] = true;
            self.cursor += 1;
            self.filled = 0;
        }
        Ok(())
    }

    fn put<C: Component>(&mut self, value: C) -> RenderResult<()> {
        self.write_with(
            |element| {
                if C::accepts(element.format()) {
                    Ok(())
                } else {
                    Err(RenderError::validation(format!(
                        "element '{}' is declared as {:?}, got {}",
                        element.name(),
                        element.format(),
                        std::any::type_name::<C>()
                    )))
                }
            },
            |_, out| value.write_to(out),
        )
    }

    fn put_named(&mut self, name: &str, values: &[f32]) -> RenderResult<()> {
        let Some(index) = self.format.position_of(name) else {
            return Err(RenderError::validation(format!(
                "active vertex format has no '{name}' element"
            )));
        };
        let components = self.format.elements()[index].components();
        if components != values.len() {
            return Err(RenderError::validation(format!(
                "element '{name}' has {components} components, got {}",
                values.len()
            )));
        }

        self.select(index);
        for value in values {
            self.write_with(|_| Ok(()), |element, out| encode_f32(*value, element, out))?;
        }
        Ok(())
    }

    fn missing_elements(&self) -> Vec<&str> {
        self.format
            .elements()
            .iter()
            .zip(&self.written)
            .filter(|(_, written)| !**written)
            .map(|(element, _)| element.name())
            .collect()
    }
}

#[derive(Debug)]
enum BuilderState {
    Idle,
    Building(Pass),
    Released,
}

/// Accumulates vertex and index data for one pass at a time.
///
/// Not thread safe and not reentrant; a second [`begin`](Self::begin) before
/// the current pass is ended and popped is rejected.
#[derive(Debug)]
pub struct BufferBuilder {
    vertices: Vec<u8>,
    indices: Vec<u32>,
    state: BuilderState,
    pending: Option<BufferPair>,
}

impl BufferBuilder {
    /// Creates a builder with room for `capacity` bytes of vertex data.
    /// Both segments grow on demand.
    pub fn new(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            indices: Vec::with_capacity(capacity / size_of::<u32>() / 4),
            state: BuilderState::Idle,
            pending: None,
        }
    }

    /// Starts a new pass.
    pub fn begin(&mut self, primitive: RenderPrimitive, format: Arc<VertexFormat>) -> RenderResult<()> {
        match self.state {
            BuilderState::Building(_) => {
                return Err(RenderError::state("begin called while a pass is in progress"));
            }
            BuilderState::Released => {
                return Err(RenderError::state("buffer builder memory was freed"));
            }
            BuilderState::Idle => {}
        }
        if self.pending.is_some() {
            return Err(RenderError::state(
                "the previous pass was not handed off with pop_next",
            ));
        }
        if format.elements().is_empty() {
            return Err(RenderError::configuration("cannot build with an empty vertex format"));
        }

        self.vertices.clear();
        self.indices.clear();
        self.state = BuilderState::Building(Pass::new(primitive, format));
        Ok(())
    }

    fn pass(&mut self) -> RenderResult<&mut Pass> {
        match &mut self.state {
            BuilderState::Building(pass) => Ok(pass),
            BuilderState::Idle => Err(RenderError::state("no pass in progress, call begin first")),
            BuilderState::Released => Err(RenderError::state("buffer builder memory was freed")),
        }
    }

    pub fn is_building(&self) -> bool {
        matches!(self.state, BuilderState::Building(_))
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Vertices completed in the current pass.
    pub fn vertex_count(&self) -> u32 {
        match &self.state {
            BuilderState::Building(pass) => pass.vertex_count,
            _ => 0,
        }
    }

    /// Indices supplied explicitly in the current pass.
    pub fn index_count(&self) -> u32 {
        if self.is_building() { self.indices.len() as u32 } else { 0 }
    }

    /// Moves the raw write cursor to the named element of the current vertex.
    pub fn select_element(&mut self, name: &str) -> RenderResult<&mut Self> {
        let pass = self.pass()?;
        let Some(index) = pass.format.position_of(name) else {
            return Err(RenderError::validation(format!(
                "active vertex format has no '{name}' element"
            )));
        };
        pass.select(index);
        Ok(self)
    }

    /// Skips the rest of the cursor element.
    pub fn next_element(&mut self) -> RenderResult<&mut Self> {
        let pass = self.pass()?;
        pass.select(pass.cursor + 1);
        Ok(self)
    }

    /// Writes one raw component into the cursor element.
    pub fn put<C: Component>(&mut self, value: C) -> RenderResult<&mut Self> {
        self.pass()?.put(value)?;
        Ok(self)
    }

    pub fn put_slice<C: Component>(&mut self, values: &[C]) -> RenderResult<&mut Self> {
        let pass = self.pass()?;
        for value in values {
            pass.put(*value)?;
        }
        Ok(self)
    }

    pub fn put_float(&mut self, value: f32) -> RenderResult<&mut Self> {
        self.put(value)
    }

    pub fn put_int(&mut self, value: i32) -> RenderResult<&mut Self> {
        self.put(value)
    }

    pub fn put_uint(&mut self, value: u32) -> RenderResult<&mut Self> {
        self.put(value)
    }

    pub fn put_short(&mut self, value: i16) -> RenderResult<&mut Self> {
        self.put(value)
    }

    pub fn put_byte(&mut self, value: u8) -> RenderResult<&mut Self> {
        self.put(value)
    }

    pub fn put_floats(&mut self, values: &[f32]) -> RenderResult<&mut Self> {
        self.put_slice(values)
    }

    pub fn put_ints(&mut self, values: &[i32]) -> RenderResult<&mut Self> {
        self.put_slice(values)
    }

    pub fn put_shorts(&mut self, values: &[i16]) -> RenderResult<&mut Self> {
        self.put_slice(values)
    }

    pub fn put_bytes(&mut self, values: &[u8]) -> RenderResult<&mut Self> {
        self.put_slice(values)
    }

    pub fn index(&mut self, index: u32) -> RenderResult<&mut Self> {
        self.pass()?;
        self.indices.push(index);
        Ok(self)
    }

    pub fn indices(&mut self, indices: &[u32]) -> RenderResult<&mut Self> {
        self.pass()?;
        self.indices.extend_from_slice(indices);
        Ok(self)
    }

    /// Finishes the current pass and queues its data for [`pop_next`](Self::pop_next).
    pub fn end(&mut self) -> RenderResult<()> {
        let pass = self.pass()?;
        if pass.is_dirty() {
            return Err(RenderError::validation(
                "the last vertex was not finished with end_vertex",
            ));
        }
        let vertex_count = pass.vertex_count;
        if let Some(index) = self.indices.iter().find(|i| **i >= vertex_count) {
            return Err(RenderError::validation(format!(
                "index {index} is out of range for {vertex_count} vertices"
            )));
        }

        let pass = match std::mem::replace(&mut self.state, BuilderState::Idle) {
            BuilderState::Building(pass) => pass,
            other => {
                self.state = other;
                return Err(RenderError::state("no pass in progress, call begin first"));
            }
        };

        if self.indices.is_empty() {
            if pass.primitive == RenderPrimitive::Quads && vertex_count % 4 != 0 {
                log::warn!(
                    "{} trailing vertices do not form a quad and will not be drawn",
                    vertex_count % 4
                );
            }
            let indices = &mut self.indices;
            pass.primitive
                .build_default_indices(vertex_count, |i| indices.push(i));
        }

        let draw_state = DrawState {
            vertex_count,
            index_count: self.indices.len() as u32,
            format: pass.format,
            primitive: pass.primitive,
        };

        let mut data = Vec::with_capacity(draw_state.vertex_bytes() + draw_state.index_bytes());
        data.extend_from_slice(&self.vertices);
        data.extend_from_slice(bytemuck::cast_slice(&self.indices));
        self.vertices.clear();
        self.indices.clear();

        log::trace!(
            "finished {:?} pass: {} vertices, {} indices",
            draw_state.primitive,
            draw_state.vertex_count,
            draw_state.index_count
        );
        self.pending = Some(BufferPair { data, draw_state });
        Ok(())
    }

    /// Hands off the finished pass. Each pass can be popped exactly once.
    pub fn pop_next(&mut self) -> RenderResult<BufferPair> {
        self.pending
            .take()
            .ok_or_else(|| RenderError::state("no finished pass pending"))
    }

    /// Releases all memory. The builder can not be used afterwards.
    pub fn free_memory(&mut self) {
        self.vertices = Vec::new();
        self.indices = Vec::new();
        self.pending = None;
        self.state = BuilderState::Released;
    }
}

impl VertexConsumer for BufferBuilder {
    fn vertex(&mut self, x: f32, y: f32, z: f32) -> RenderResult<&mut Self> {
        self.pass()?.put_named("position", &[x, y, z])?;
        Ok(self)
    }

    fn normal(&mut self, x: f32, y: f32, z: f32) -> RenderResult<&mut Self> {
        self.pass()?.put_named("normal", &[x, y, z])?;
        Ok(self)
    }

    fn color(&mut self, r: f32, g: f32, b: f32, a: f32) -> RenderResult<&mut Self> {
        self.pass()?.put_named("color", &[r, g, b, a])?;
        Ok(self)
    }

    fn uv(&mut self, u: f32, v: f32) -> RenderResult<&mut Self> {
        self.pass()?.put_named("uv", &[u, v])?;
        Ok(self)
    }

    fn end_vertex(&mut self) -> RenderResult<()> {
        let BuilderState::Building(pass) = &mut self.state else {
            return Err(RenderError::state("no pass in progress, call begin first"));
        };
        let missing = pass.missing_elements();
        if pass.filled != 0 || !missing.is_empty() {
            return Err(RenderError::validation(format!(
                "vertex {} is missing elements: {}",
                pass.vertex_count,
                missing.join(", ")
            )));
        }

        self.vertices.extend_from_slice(&pass.scratch);
        pass.scratch.fill(0);
        pass.written.fill(false);
        pass.select(0);
        pass.vertex_count += 1;
        Ok(())
    }
}
