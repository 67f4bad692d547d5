//! GPU vertex buffers.
//!
//! A [`VertexBuffer`] owns one vertex array object with its vertex and index
//! buffer objects. Its contents come from a finished [`BufferBuilder`] pass.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    abs::{BufferTarget, GraphicsDevice, RenderContext},
    error::{RenderError, RenderResult},
    vertex::{BufferBuilder, DrawState, RenderPrimitive},
};

/// How often buffer contents are expected to change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
    Stream,
}

impl BufferUsage {
    pub const fn gl(self) -> u32 {
        match self {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
            BufferUsage::Stream => glow::STREAM_DRAW,
        }
    }
}

struct Handles<D: GraphicsDevice> {
    vertex_array: D::VertexArray,
    vertex_buffer: D::Buffer,
    index_buffer: D::Buffer,
}

/// Represents vertex and index data stored on the GPU side.
pub struct VertexBuffer<D: GraphicsDevice> {
    context: Arc<RenderContext<D>>,
    handles: Option<Handles<D>>,
    draw_state: Option<DrawState>,
    /// Attribute slots enabled by the last upload.
    enabled: u32,
}

impl<D: GraphicsDevice> VertexBuffer<D> {
    /// Creates the GPU objects. Nothing is uploaded yet.
    pub fn new(context: &Arc<RenderContext<D>>) -> RenderResult<Self> {
        let device = context.device()?;

        let vertex_array = device.create_vertex_array().map_err(RenderError::Device)?;
        let vertex_buffer = match device.create_buffer() {
            Ok(buffer) => buffer,
            Err(err) => {
                device.delete_vertex_array(vertex_array);
                return Err(RenderError::Device(err));
            }
        };
        let index_buffer = match device.create_buffer() {
            Ok(buffer) => buffer,
            Err(err) => {
                device.delete_buffer(vertex_buffer);
                device.delete_vertex_array(vertex_array);
                return Err(RenderError::Device(err));
            }
        };

        Ok(Self {
            context: Arc::clone(context),
            handles: Some(Handles {
                vertex_array,
                vertex_buffer,
                index_buffer,
            }),
            draw_state: None,
            enabled: 0,
        })
    }

    fn handles(&self) -> RenderResult<&Handles<D>> {
        self.handles
            .as_ref()
            .ok_or_else(|| RenderError::state("vertex buffer has been discarded"))
    }

    /// Uploads the builder's finished pass, replacing the previous contents.
    ///
    /// The pass is only taken from the builder once every check has passed, so
    /// a rejected upload leaves both the builder and the GPU untouched.
    pub fn upload(&mut self, builder: &mut BufferBuilder, usage: BufferUsage) -> RenderResult<()> {
        let context = Arc::clone(&self.context);
        let device = context.device()?;
        self.handles()?;
        let pair = builder.pop_next()?;
        let handles = self.handles()?;

        let state = pair.draw_state();
        let format = state.format();
        let stride = format.vertex_size() as i32;

        device.bind_vertex_array(Some(handles.vertex_array));
        device.bind_buffer(BufferTarget::Array, Some(handles.vertex_buffer));
        device.buffer_data(BufferTarget::Array, pair.vertex_data(), usage);

        for element in format.elements() {
            device.enable_attribute(element.index());
            if element.binds_as_integer() {
                device.integer_attribute_pointer(
                    element.index(),
                    element.components() as i32,
                    element.format(),
                    stride,
                    element.offset() as i32,
                );
            } else {
                device.float_attribute_pointer(
                    element.index(),
                    element.components() as i32,
                    element.format(),
                    element.normalize(),
                    stride,
                    element.offset() as i32,
                );
            }
        }
        let enabled = format.elements().len() as u32;
        for stale in enabled..self.enabled {
            device.disable_attribute(stale);
        }

        device.bind_buffer(BufferTarget::ElementArray, Some(handles.index_buffer));
        device.buffer_data(BufferTarget::ElementArray, pair.index_data(), usage);

        device.bind_vertex_array(None);
        device.bind_buffer(BufferTarget::Array, None);
        device.bind_buffer(BufferTarget::ElementArray, None);

        log::debug!(
            "uploaded {} vertices ({} bytes) and {} indices as {usage:?}",
            state.vertex_count(),
            state.vertex_bytes(),
            state.index_count()
        );
        self.enabled = enabled;
        self.draw_state = Some(state.clone());
        Ok(())
    }

    /// Makes this buffer's vertex array current.
    pub fn bind(&self) -> RenderResult<()> {
        let device = self.context.device()?;
        device.bind_vertex_array(Some(self.handles()?.vertex_array));
        Ok(())
    }

    pub fn unbind(&self) -> RenderResult<()> {
        let device = self.context.device()?;
        self.handles()?;
        device.bind_vertex_array(None);
        Ok(())
    }

    /// Draws the uploaded data with the primitive it was built with.
    pub fn draw(&self) -> RenderResult<()> {
        self.context.ensure_render_thread()?;
        let primitive = self.uploaded()?.primitive();
        self.draw_as(primitive)
    }

    /// Draws the uploaded indices with another primitive's topology.
    pub fn draw_as(&self, primitive: RenderPrimitive) -> RenderResult<()> {
        let device = self.context.device()?;
        let handles = self.handles()?;
        let index_count = self.uploaded()?.index_count();

        device.bind_vertex_array(Some(handles.vertex_array));
        device.draw_elements(primitive.gl_topology(), index_count as i32);
        device.bind_vertex_array(None);
        Ok(())
    }

    fn uploaded(&self) -> RenderResult<&DrawState> {
        self.draw_state
            .as_ref()
            .ok_or_else(|| RenderError::state("nothing has been uploaded to this vertex buffer"))
    }

    /// The state of the last upload, if any.
    pub fn draw_state(&self) -> Option<&DrawState> {
        self.draw_state.as_ref()
    }

    pub fn is_discarded(&self) -> bool {
        self.handles.is_none()
    }

    /// Releases the GPU objects. Calling this more than once does nothing.
    pub fn discard(&mut self) -> RenderResult<()> {
        let device = self.context.device()?;
        if let Some(handles) = self.handles.take() {
            device.delete_buffer(handles.vertex_buffer);
            device.delete_buffer(handles.index_buffer);
            device.delete_vertex_array(handles.vertex_array);
        }
        self.draw_state = None;
        self.enabled = 0;
        Ok(())
    }
}

impl<D: GraphicsDevice> Drop for VertexBuffer<D> {
    fn drop(&mut self) {
        if self.handles.is_none() {
            return;
        }
        if self.discard().is_err() {
            log::warn!("vertex buffer dropped off the render thread, its GPU objects are leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{
        abs::testing::{Call, RecordingDevice},
        vertex::{NumberFormat, VertexConsumer, VertexFormat},
    };

    fn context() -> Arc<RenderContext<RecordingDevice>> {
        Arc::new(RenderContext::new(RecordingDevice::default()))
    }

    fn quad(builder: &mut BufferBuilder) {
        let format = Arc::new(
            VertexFormat::new()
                .append("position", NumberFormat::Float, 3, false)
                .unwrap()
                .append("color", NumberFormat::UnsignedByte, 4, true)
                .unwrap()
                .append("light", NumberFormat::Short, 2, false)
                .unwrap(),
        );
        builder.begin(RenderPrimitive::Quads, format).unwrap();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            builder
                .vertex(x, y, 0.0)
                .unwrap()
                .color(1.0, 1.0, 1.0, 1.0)
                .unwrap()
                .select_element("light")
                .unwrap()
                .put_shorts(&[15, 15])
                .unwrap();
            builder.end_vertex().unwrap();
        }
        builder.end().unwrap();
    }

    #[test]
    fn upload_lays_out_attributes() {
        let context = context();
        let mut buffer = VertexBuffer::new(&context).unwrap();
        let mut builder = BufferBuilder::new(256);
        quad(&mut builder);

        context.device().unwrap().take_calls();
        buffer.upload(&mut builder, BufferUsage::Dynamic).unwrap();
        let calls = context.device().unwrap().take_calls();

        let stride = 3 * 4 + 4 + 2 * 2;
        assert!(calls.contains(&Call::FloatPointer {
            index: 0,
            components: 3,
            format: NumberFormat::Float,
            normalize: false,
            stride,
            offset: 0,
        }));
        assert!(calls.contains(&Call::FloatPointer {
            index: 1,
            components: 4,
            format: NumberFormat::UnsignedByte,
            normalize: true,
            stride,
            offset: 12,
        }));
        assert!(calls.contains(&Call::IntegerPointer {
            index: 2,
            components: 2,
            format: NumberFormat::Short,
            stride,
            offset: 16,
        }));

        let uploads: Vec<_> = calls
            .iter()
            .filter_map(|call| match call {
                Call::BufferData(target, bytes, usage) => Some((*target, bytes.len(), *usage)),
                _ => None,
            })
            .collect();
        assert_eq!(
            uploads,
            vec![
                (BufferTarget::Array, 4 * stride as usize, BufferUsage::Dynamic),
                (BufferTarget::ElementArray, 6 * 4, BufferUsage::Dynamic),
            ]
        );

        let state = buffer.draw_state().unwrap();
        assert_eq!(state.vertex_count(), 4);
        assert_eq!(state.index_count(), 6);
    }

    #[test]
    fn draw_uses_native_topology() {
        let context = context();
        let mut buffer = VertexBuffer::new(&context).unwrap();
        assert!(matches!(buffer.draw(), Err(RenderError::State(_))));

        let mut builder = BufferBuilder::new(256);
        quad(&mut builder);
        buffer.upload(&mut builder, BufferUsage::Static).unwrap();

        context.device().unwrap().take_calls();
        buffer.draw().unwrap();
        buffer.draw_as(RenderPrimitive::Points).unwrap();
        let draws: Vec<_> = context
            .device()
            .unwrap()
            .take_calls()
            .into_iter()
            .filter(|call| matches!(call, Call::DrawElements(..)))
            .collect();
        assert_eq!(
            draws,
            vec![
                Call::DrawElements(glow::TRIANGLES, 6),
                Call::DrawElements(glow::POINTS, 6),
            ]
        );
    }

    #[test]
    fn reupload_disables_stale_attributes() {
        let context = context();
        let mut buffer = VertexBuffer::new(&context).unwrap();
        let mut builder = BufferBuilder::new(256);
        quad(&mut builder);
        buffer.upload(&mut builder, BufferUsage::Static).unwrap();

        let position = Arc::new(
            VertexFormat::new()
                .append("position", NumberFormat::Float, 3, false)
                .unwrap(),
        );
        builder.begin(RenderPrimitive::Points, position).unwrap();
        builder.vertex(0.0, 0.0, 0.0).unwrap();
        builder.end_vertex().unwrap();
        builder.end().unwrap();

        context.device().unwrap().take_calls();
        buffer.upload(&mut builder, BufferUsage::Static).unwrap();
        let calls = context.device().unwrap().take_calls();
        assert!(calls.contains(&Call::DisableAttribute(1)));
        assert!(calls.contains(&Call::DisableAttribute(2)));
        assert_eq!(buffer.draw_state().unwrap().primitive(), RenderPrimitive::Points);
    }

    #[test]
    fn discard_is_idempotent() {
        let context = context();
        let mut buffer = VertexBuffer::new(&context).unwrap();
        buffer.discard().unwrap();
        buffer.discard().unwrap();
        assert!(buffer.is_discarded());

        let deletes = context
            .device()
            .unwrap()
            .take_calls()
            .into_iter()
            .filter(|call| matches!(call, Call::DeleteBuffer(_) | Call::DeleteVertexArray(_)))
            .count();
        assert_eq!(deletes, 3);

        assert!(matches!(buffer.bind(), Err(RenderError::State(_))));
        let mut builder = BufferBuilder::new(64);
        quad(&mut builder);
        assert!(matches!(
            buffer.upload(&mut builder, BufferUsage::Static),
            Err(RenderError::State(_))
        ));
        assert!(builder.has_pending());
    }

    #[test]
    fn drop_releases_gpu_objects() {
        let context = context();
        drop(VertexBuffer::new(&context).unwrap());
        let calls = context.device().unwrap().take_calls();
        assert!(calls.iter().any(|call| matches!(call, Call::DeleteVertexArray(_))));
    }

    #[test]
    fn gpu_calls_are_rejected_off_render_thread() {
        let context = context();
        let mut buffer = VertexBuffer::new(&context).unwrap();
        let mut builder = BufferBuilder::new(256);
        quad(&mut builder);

        let remote = Arc::clone(&context);
        let (buffer, builder) = thread::spawn(move || {
            assert!(matches!(
                VertexBuffer::new(&remote),
                Err(RenderError::ThreadAffinity(_))
            ));
            assert!(matches!(
                buffer.upload(&mut builder, BufferUsage::Static),
                Err(RenderError::ThreadAffinity(_))
            ));
            assert!(builder.has_pending());
            assert!(matches!(buffer.bind(), Err(RenderError::ThreadAffinity(_))));
            assert!(matches!(buffer.draw(), Err(RenderError::ThreadAffinity(_))));
            assert!(matches!(buffer.unbind(), Err(RenderError::ThreadAffinity(_))));
            assert!(matches!(
                buffer.draw_as(RenderPrimitive::Lines),
                Err(RenderError::ThreadAffinity(_))
            ));
            assert!(matches!(buffer.discard(), Err(RenderError::ThreadAffinity(_))));
            (buffer, builder)
        })
        .join()
        .unwrap();

        assert!(!buffer.is_discarded());
        drop(buffer);
        drop(builder);
    }
}
