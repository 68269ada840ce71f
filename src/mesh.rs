use crate::{Error, Result};
use float_cmp::ApproxEqUlps;

bitflags::bitflags! {
    /// Optional per-vertex attribute arrays carried by a mesh.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct MeshAttributes: u32 {
        const TEX_COORDS = 0b01;
        const NORMALS = 0b10;
    }
}

/// A triangle mesh in the shape the codec consumes and produces.
///
/// `vertices` is a flat list of positions; `indices` holds three entries per
/// triangle, each referencing a vertex. Texture coordinates and normals are
/// optional, and when present must have one entry per vertex.
///
/// The codec does not preserve vertex or triangle order: the decoded mesh
/// comes back with vertices in the codec's spatial sort order and indices
/// rewritten to match.
#[derive(Debug, Default, Clone)]
pub struct Mesh {
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub normals: Option<Vec<[f32; 3]>>,
}

impl Mesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn attributes(&self) -> MeshAttributes {
        let mut attributes = MeshAttributes::empty();
        if self.tex_coords.is_some() {
            attributes |= MeshAttributes::TEX_COORDS;
        }
        if self.normals.is_some() {
            attributes |= MeshAttributes::NORMALS;
        }
        attributes
    }

    /// The shape metadata a decoder needs to read this mesh back.
    pub fn layout(&self) -> MeshLayout {
        MeshLayout {
            vertex_count: self.vertex_count(),
            triangle_count: self.triangle_count(),
            attributes: self.attributes(),
        }
    }

    /// Check the invariants the codec relies on.
    ///
    /// # Errors
    /// Returns `Error::InvalidMesh` if the mesh is empty, an index is out of
    /// range, or an optional attribute array does not match the vertex count.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() {
            return Err(Error::invalid_mesh("mesh must contain at least one vertex"));
        }
        if self.indices.is_empty() {
            return Err(Error::invalid_mesh(
                "mesh must contain at least one triangle",
            ));
        }
        if self.indices.len() % 3 != 0 {
            return Err(Error::invalid_mesh(format!(
                "index count ({}) must be a multiple of 3",
                self.indices.len()
            )));
        }
        let vertex_count = self.vertices.len() as u32;
        if let Some(&index) = self.indices.iter().find(|&&index| index >= vertex_count) {
            return Err(Error::invalid_mesh(format!(
                "triangle index {} out of range (vertex count {})",
                index, vertex_count
            )));
        }
        if let Some(tex_coords) = &self.tex_coords {
            if tex_coords.len() != self.vertices.len() {
                return Err(Error::invalid_mesh(format!(
                    "texture coordinate count ({}) must match vertex count ({})",
                    tex_coords.len(),
                    self.vertices.len()
                )));
            }
        }
        if let Some(normals) = &self.normals {
            if normals.len() != self.vertices.len() {
                return Err(Error::invalid_mesh(format!(
                    "normal count ({}) must match vertex count ({})",
                    normals.len(),
                    self.vertices.len()
                )));
            }
        }
        Ok(())
    }
}

impl PartialEq for Mesh {
    fn eq(&self, other: &Mesh) -> bool {
        self.indices == other.indices
            && approx_eq_slice(&self.vertices, &other.vertices)
            && match (&self.tex_coords, &other.tex_coords) {
                (Some(a), Some(b)) => approx_eq_slice(a, b),
                (None, None) => true,
                _ => false,
            }
            && match (&self.normals, &other.normals) {
                (Some(a), Some(b)) => approx_eq_slice(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

fn approx_eq_slice<const N: usize>(a: &[[f32; N]], b: &[[f32; N]]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(a, b)| a.iter().zip(b).all(|(a, b)| a.approx_eq_ulps(b, 2)))
}

/// Shape metadata the decoder needs before it can read an MG2 stream.
///
/// The container format carries these counts outside the MG2 payload, so the
/// decoder receives them from the caller rather than from the stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MeshLayout {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub attributes: MeshAttributes,
}

impl MeshLayout {
    pub fn new(vertex_count: usize, triangle_count: usize, attributes: MeshAttributes) -> Self {
        Self {
            vertex_count,
            triangle_count,
            attributes,
        }
    }

    #[inline]
    pub fn has_tex_coords(&self) -> bool {
        self.attributes.contains(MeshAttributes::TEX_COORDS)
    }

    #[inline]
    pub fn has_normals(&self) -> bool {
        self.attributes.contains(MeshAttributes::NORMALS)
    }
}
