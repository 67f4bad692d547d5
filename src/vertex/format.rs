//! Vertex layouts.
//!
//! A [`VertexFormat`] is an ordered list of [`VertexElement`]s. The order is
//! load-bearing: it decides both the attribute index each element is bound to
//! on the GPU and the byte offset of the element inside a vertex.

use crate::error::{RenderError, RenderResult};

/// The numeric type of one component of a vertex element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    Float,
    Int,
    UnsignedInt,
    Short,
    UnsignedShort,
    Byte,
    UnsignedByte,
}

impl NumberFormat {
    /// Size of a single component in bytes.
    pub const fn size(self) -> usize {
        match self {
            NumberFormat::Float | NumberFormat::Int | NumberFormat::UnsignedInt => 4,
            NumberFormat::Short | NumberFormat::UnsignedShort => 2,
            NumberFormat::Byte | NumberFormat::UnsignedByte => 1,
        }
    }

    /// The matching OpenGL data type.
    pub const fn gl_type(self) -> u32 {
        match self {
            NumberFormat::Float => glow::FLOAT,
            NumberFormat::Int => glow::INT,
            NumberFormat::UnsignedInt => glow::UNSIGNED_INT,
            NumberFormat::Short => glow::SHORT,
            NumberFormat::UnsignedShort => glow::UNSIGNED_SHORT,
            NumberFormat::Byte => glow::BYTE,
            NumberFormat::UnsignedByte => glow::UNSIGNED_BYTE,
        }
    }

    pub const fn is_integer(self) -> bool {
        !matches!(self, NumberFormat::Float)
    }
}

/// One named attribute of a vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexElement {
    name: String,
    format: NumberFormat,
    components: usize,
    normalize: bool,
    offset: usize,
    index: u32,
}

impl VertexElement {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> NumberFormat {
        self.format
    }

    /// Number of components, e.g. 3 for a position.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Whether integer data is normalized to `[0, 1]` / `[-1, 1]` when read by a shader.
    pub fn normalize(&self) -> bool {
        self.normalize
    }

    /// Byte offset of this element from the start of a vertex.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Attribute location this element is bound to.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Size of this element in bytes.
    pub fn size(&self) -> usize {
        self.components * self.format.size()
    }

    /// Whether the shader reads this element through the integer attribute path.
    pub fn binds_as_integer(&self) -> bool {
        self.format.is_integer() && !self.normalize
    }
}

/// An ordered vertex layout.
///
/// Formats are built once and then shared with builders as `Arc<VertexFormat>`,
/// which only hands out shared references, so a format in use can never change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexFormat {
    elements: Vec<VertexElement>,
    size: usize,
}

impl VertexFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element behind all previously declared ones.
    pub fn append(
        mut self,
        name: &str,
        format: NumberFormat,
        components: usize,
        normalize: bool,
    ) -> RenderResult<Self> {
        if name.is_empty() {
            return Err(RenderError::configuration("vertex element name must not be empty"));
        }
        if components == 0 {
            return Err(RenderError::configuration(format!(
                "vertex element '{name}' needs at least one component"
            )));
        }
        if self.element(name).is_some() {
            return Err(RenderError::configuration(format!(
                "vertex element '{name}' declared twice"
            )));
        }

        let element = VertexElement {
            name: name.to_string(),
            format,
            components,
            normalize,
            offset: self.size,
            index: self.elements.len() as u32,
        };
        self.size += element.size();
        self.elements.push(element);
        Ok(self)
    }

    /// Size of a single element in bytes.
    pub fn element_size(element: &VertexElement) -> usize {
        element.size()
    }

    /// Size of one whole vertex in bytes, which is also the attribute stride.
    pub fn vertex_size(&self) -> usize {
        self.size
    }

    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&VertexElement> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.name == name)
    }
}
