//! Mesh buffers produced by the OBJ parser
use std::io::{self, Write};

use nalgebra::{MatrixXx3, Point3, Vector3};

/// A vertex position. Its row in the vertex buffer is its identity.
pub type Vertex = Point3<f64>;

/// Vertex positions, one `x y z` row per vertex.
///
/// The row count is fixed when the parser allocates the buffer; transforms
/// rewrite coordinates in place but never resize it.
pub type VertexBuffer = MatrixXx3<f64>;

/// One triangle as three vertex indices, copied verbatim from the file.
pub type Triangle = [u32; 3];

/// Line counts gathered by the counting pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStatus {
    pub vertices: usize,
    pub facets: usize,
    /// `vertices + facets - 2`, the Euler estimate for a closed genus-0
    /// surface. Topology is never checked, so treat it as approximate.
    pub edges: usize,
}

impl MeshStatus {
    pub fn new(vertices: usize, facets: usize) -> Self {
        Self {
            vertices,
            facets,
            edges: (vertices + facets).saturating_sub(2),
        }
    }
}

/// A parsed mesh: vertex positions plus a flat triangle index list
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: VertexBuffer,
    indices: Vec<u32>,
    status: MeshStatus,
}

impl Mesh {
    /// Assemble a mesh from its buffers.
    ///
    /// `indices.len()` must be a multiple of 3; any trailing partial
    /// triangle is dropped.
    pub fn new(vertices: VertexBuffer, mut indices: Vec<u32>, status: MeshStatus) -> Self {
        indices.truncate(indices.len() - indices.len() % 3);
        Self {
            vertices,
            indices,
            status,
        }
    }

    pub fn status(&self) -> MeshStatus {
        self.status
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.nrows()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    /// Mutable access for the affine transforms.
    pub fn vertices_mut(&mut self) -> &mut VertexBuffer {
        &mut self.vertices
    }

    /// Flat index list, three entries per triangle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        (index < self.vertices.nrows()).then(|| {
            let row = self.vertices.row(index);
            Point3::new(row[0], row[1], row[2])
        })
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
    }

    /// Unit face normal of triangle `index`.
    ///
    /// Indices are treated as zero-based. Returns `None` when the triangle
    /// references a vertex outside the buffer or is degenerate.
    pub fn triangle_normal(&self, index: usize) -> Option<Vector3<f64>> {
        let [a, b, c] = self.triangles().nth(index)?;
        let v0 = self.vertex(a as usize)?;
        let v1 = self.vertex(b as usize)?;
        let v2 = self.vertex(c as usize)?;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).try_normalize(f64::EPSILON)
    }

    /// Axis-aligned bounding box as `(min, max)`, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vertex, Vertex)> {
        if self.vertices.nrows() == 0 {
            return None;
        }
        let min = Point3::new(
            self.vertices.column(0).min(),
            self.vertices.column(1).min(),
            self.vertices.column(2).min(),
        );
        let max = Point3::new(
            self.vertices.column(0).max(),
            self.vertices.column(1).max(),
            self.vertices.column(2).max(),
        );
        Some((min, max))
    }

    /// Write the debugging listing: every vertex, then every triangle.
    pub fn write_dump<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "VERTEX")?;
        for row in self.vertices.row_iter() {
            writeln!(writer, "{:.6} {:.6} {:.6}", row[0], row[1], row[2])?;
        }
        writeln!(writer, "FACET")?;
        for [a, b, c] in self.triangles() {
            writeln!(writer, "{} {} {}", a, b, c)?;
        }
        Ok(())
    }
}
