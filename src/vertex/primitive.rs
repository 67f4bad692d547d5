//! Draw topologies and their default index layouts.

/// Signature of a default index builder: vertex count and an index sink.
type IndexBuilder = fn(u32, &mut dyn FnMut(u32));

struct PrimitiveInfo {
    topology: u32,
    build_indices: IndexBuilder,
}

fn sequential_indices(vertex_count: u32, emit: &mut dyn FnMut(u32)) {
    for i in 0..vertex_count {
        emit(i);
    }
}

/// Splits every group of four vertices into two triangles sharing the 0-2 diagonal.
/// Trailing vertices that do not form a full quad are skipped.
fn quad_indices(vertex_count: u32, emit: &mut dyn FnMut(u32)) {
    let full = vertex_count - vertex_count % 4;
    for i in (0..full).step_by(4) {
        emit(i);
        emit(i + 1);
        emit(i + 2);
        emit(i + 2);
        emit(i + 3);
        emit(i);
    }
}

/// Indexed by `RenderPrimitive as usize`.
static PRIMITIVES: [PrimitiveInfo; 8] = [
    PrimitiveInfo { topology: glow::POINTS, build_indices: sequential_indices },
    PrimitiveInfo { topology: glow::LINE_LOOP, build_indices: sequential_indices },
    PrimitiveInfo { topology: glow::LINE_STRIP, build_indices: sequential_indices },
    PrimitiveInfo { topology: glow::LINES, build_indices: sequential_indices },
    PrimitiveInfo { topology: glow::TRIANGLES, build_indices: sequential_indices },
    PrimitiveInfo { topology: glow::TRIANGLE_STRIP, build_indices: sequential_indices },
    PrimitiveInfo { topology: glow::TRIANGLE_FAN, build_indices: sequential_indices },
    PrimitiveInfo { topology: glow::TRIANGLES, build_indices: quad_indices },
];

/// The primitives geometry can be built with.
///
/// Quads are not a native GPU primitive, they are drawn as triangles and only
/// differ in the default index layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPrimitive {
    Points = 0,
    LineLoop,
    LineStrip,
    Lines,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
}

impl RenderPrimitive {
    pub const ALL: [RenderPrimitive; 8] = [
        RenderPrimitive::Points,
        RenderPrimitive::LineLoop,
        RenderPrimitive::LineStrip,
        RenderPrimitive::Lines,
        RenderPrimitive::Triangles,
        RenderPrimitive::TriangleStrip,
        RenderPrimitive::TriangleFan,
        RenderPrimitive::Quads,
    ];

    fn info(self) -> &'static PrimitiveInfo {
        &PRIMITIVES[self as usize]
    }

    /// The OpenGL draw mode this primitive is rendered with.
    pub fn gl_topology(self) -> u32 {
        self.info().topology
    }

    /// Emits the indices needed to draw `vertex_count` vertices that are already
    /// in the standard order for this primitive.
    pub fn build_default_indices(self, vertex_count: u32, mut emit: impl FnMut(u32)) {
        (self.info().build_indices)(vertex_count, &mut emit);
    }

    pub fn default_indices(self, vertex_count: u32) -> Vec<u32> {
        let mut indices = Vec::with_capacity(self.index_count_for(vertex_count) as usize);
        self.build_default_indices(vertex_count, |i| indices.push(i));
        indices
    }

    /// Number of default indices for `vertex_count` vertices.
    pub fn index_count_for(self, vertex_count: u32) -> u32 {
        match self {
            RenderPrimitive::Quads => vertex_count / 4 * 6,
            _ => vertex_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_quads_index_sequentially() {
        for primitive in RenderPrimitive::ALL {
            if primitive == RenderPrimitive::Quads {
                continue;
            }
            assert_eq!(primitive.default_indices(5), vec![0, 1, 2, 3, 4]);
            assert!(primitive.default_indices(0).is_empty());
        }
    }

    #[test]
    fn quads_split_into_triangles() {
        assert_eq!(
            RenderPrimitive::Quads.default_indices(8),
            vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]
        );
        assert_eq!(RenderPrimitive::Quads.gl_topology(), glow::TRIANGLES);
    }

    #[test]
    fn partial_quads_are_truncated() {
        assert_eq!(
            RenderPrimitive::Quads.default_indices(6),
            vec![0, 1, 2, 2, 3, 0]
        );
        assert_eq!(RenderPrimitive::Quads.index_count_for(6), 6);
        assert!(RenderPrimitive::Quads.default_indices(3).is_empty());
    }

    #[test]
    fn topologies_match_gl() {
        assert_eq!(RenderPrimitive::LineLoop.gl_topology(), glow::LINE_LOOP);
        assert_eq!(RenderPrimitive::TriangleFan.gl_topology(), glow::TRIANGLE_FAN);
    }
}
