//! objview Core Library - OBJ loading and in-place affine transforms
//!
//! This library parses the vertex and facet subset of Wavefront OBJ into a
//! vertex buffer plus a fan-triangulated index buffer, and moves, rotates
//! and scales vertex buffers in place.

pub mod error;
pub mod geometry;
pub mod obj;
pub mod transform;

// Re-export commonly used types
pub use error::{ErrorKind, ParseError, ParseResult, TransformError, TransformResult};
pub use geometry::{Mesh, MeshStatus, Triangle, Vertex, VertexBuffer};
pub use obj::{parse, parse_reader, scan_status, triangulate_fan};
pub use transform::{
    rotate_x, rotate_y, rotate_z, scale, translate_x, translate_y, translate_z, AffineOp, Axis,
};
