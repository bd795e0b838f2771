//! Face connectivity.

use crate::error::{MeshError, Result};

/// Polygon connectivity as a flat index list plus per-face arity.
///
/// Faces are stored back to back: the first `face_sizes[0]` entries of
/// `indices` belong to face 0, the next `face_sizes[1]` to face 1 and so on.
/// Every face has at least three vertices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    indices: Vec<u32>,
    face_sizes: Vec<u32>,
}

impl Topology {
    /// Create empty connectivity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create connectivity from a flat triangle list.
    pub fn from_triangles(indices: Vec<u32>) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::invalid_param(
                "indices",
                indices.len(),
                "triangle index count must be a multiple of 3",
            ));
        }
        let face_sizes = vec![3; indices.len() / 3];
        Ok(Self {
            indices,
            face_sizes,
        })
    }

    /// Create connectivity from a flat index list and per-face arity.
    pub fn from_polygons(indices: Vec<u32>, face_sizes: Vec<u32>) -> Result<Self> {
        if let Some(face) = face_sizes.iter().position(|&n| n < 3) {
            return Err(MeshError::invalid_param(
                "face_sizes",
                face,
                "faces need at least three vertices",
            ));
        }
        let total: u64 = face_sizes.iter().map(|&n| n as u64).sum();
        if total != indices.len() as u64 {
            return Err(MeshError::invalid_param(
                "face_sizes",
                total,
                "face sizes must add up to the index count",
            ));
        }
        Ok(Self {
            indices,
            face_sizes,
        })
    }

    /// Append one face.
    pub fn push_face(&mut self, face: &[u32]) -> Result<()> {
        if face.len() < 3 {
            return Err(MeshError::invalid_param(
                "face",
                face.len(),
                "faces need at least three vertices",
            ));
        }
        self.indices.extend_from_slice(face);
        self.face_sizes.push(face.len() as u32);
        Ok(())
    }

    /// The flat index list.
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex count of each face.
    #[inline]
    pub fn face_sizes(&self) -> &[u32] {
        &self.face_sizes
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.face_sizes.len()
    }

    /// Whether every face is a triangle.
    pub fn is_triangles(&self) -> bool {
        self.face_sizes.iter().all(|&n| n == 3)
    }

    /// Iterate over faces as index slices.
    pub fn faces(&self) -> Faces<'_> {
        Faces {
            topology: self,
            face: 0,
            offset: 0,
        }
    }

    /// Iterate over triangles, fan-triangulating polygons around their first
    /// vertex.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.faces().flat_map(|face| {
            (1..face.len() - 1).map(move |i| [face[0], face[i], face[i + 1]])
        })
    }

    /// Check every index against `num_vertices`.
    pub fn validate(&self, num_vertices: usize) -> Result<()> {
        for (fi, face) in self.faces().enumerate() {
            if let Some(&vi) = face.iter().find(|&&vi| vi as usize >= num_vertices) {
                return Err(MeshError::InvalidVertexIndex {
                    face: fi,
                    vertex: vi as usize,
                });
            }
        }
        Ok(())
    }
}

/// Iterator over the faces of a [`Topology`].
#[derive(Debug, Clone)]
pub struct Faces<'a> {
    topology: &'a Topology,
    face: usize,
    offset: usize,
}

impl<'a> Iterator for Faces<'a> {
    type Item = &'a [u32];

    fn next(&mut self) -> Option<Self::Item> {
        let size = *self.topology.face_sizes.get(self.face)? as usize;
        let face = &self.topology.indices[self.offset..self.offset + size];
        self.face += 1;
        self.offset += size;
        Some(face)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.topology.face_sizes.len() - self.face;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Faces<'_> {}
