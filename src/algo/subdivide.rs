//! Midpoint subdivision.
//!
//! Each iteration splits every triangle into four by inserting one vertex at
//! the middle of each edge:
//!
//! ```text
//!        v2                 v2
//!        /\                 /\
//!       /  \               /  \
//!      /    \     ->   e20/____\e12
//!     /      \           /\    /\
//!    /________\         /__\/__\
//!  v0          v1     v0   e01   v1
//! ```
//!
//! Unlike Loop subdivision the original vertices stay where they are; new
//! vertices interpolate every slot (position, normal, uv, color...) of the
//! edge endpoints at `t = 0.5` through an [`InterpolationRegistry`].
//!
//! # Example
//!
//! ```
//! use meshmux::algo::subdivide::{subdivide_midpoint, SubdivideOptions};
//! use meshmux::attribute::{slot, AttributeKind, AttributeSchema, InterpolationRegistry};
//! use meshmux::mesh::{MeshContainer, Topology};
//! use nalgebra::Vector3;
//!
//! let schema = AttributeSchema::new().with(slot::POSITION, AttributeKind::Position, 3);
//! let mut mesh = MeshContainer::new(schema);
//! for p in [Vector3::new(0.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0)] {
//!     mesh.push_vertex_named(&[(slot::POSITION, p.into())]).unwrap();
//! }
//! mesh.set_topology(Topology::from_triangles(vec![0, 1, 2]).unwrap()).unwrap();
//!
//! let fine = subdivide_midpoint(&mesh, &SubdivideOptions::new(2), &InterpolationRegistry::new()).unwrap();
//! assert_eq!(fine.num_faces(), 16);
//! assert_eq!(fine.num_vertices(), 15);
//! ```

use std::collections::HashMap;

use crate::attribute::InterpolationRegistry;
use crate::error::{MeshError, Result};
use crate::mesh::{lerp_records, MeshContainer, Topology, VertexRecord};

/// Options for midpoint subdivision.
#[derive(Debug, Clone)]
pub struct SubdivideOptions {
    /// Number of subdivision iterations.
    pub iterations: usize,
}

impl Default for SubdivideOptions {
    fn default() -> Self {
        Self { iterations: 1 }
    }
}

impl SubdivideOptions {
    /// Create options with the specified number of iterations.
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}

/// Subdivide an indexed triangle mesh, interpolating every slot.
///
/// Returns [`MeshError::InvalidState`] for unindexed meshes and for meshes
/// with non-triangle faces.
pub fn subdivide_midpoint(
    mesh: &MeshContainer,
    options: &SubdivideOptions,
    interpolation: &InterpolationRegistry,
) -> Result<MeshContainer> {
    let topology = mesh
        .topology()
        .ok_or_else(|| MeshError::InvalidState("subdivision needs an indexed mesh".into()))?;
    if !topology.is_triangles() {
        return Err(MeshError::InvalidState(
            "midpoint subdivision needs a triangle mesh".into(),
        ));
    }
    mesh.validate()?;

    let mut vertices = mesh.vertices().to_vec();
    let mut indices = topology.indices().to_vec();

    for _ in 0..options.iterations {
        let (new_vertices, new_indices) = subdivide_once(&vertices, &indices, interpolation)?;
        vertices = new_vertices;
        indices = new_indices;
    }

    log::debug!(
        "midpoint subdivision x{}: {} -> {} faces",
        options.iterations,
        topology.num_faces(),
        indices.len() / 3
    );

    Ok(MeshContainer::from_parts(
        mesh.name().map(str::to_string),
        mesh.schema().clone(),
        vertices,
        Some(Topology::from_triangles(indices)?),
    ))
}

/// Map from canonical edge `(lo, hi)` to the index of its midpoint vertex.
fn build_edge_vertices(
    vertices: &[VertexRecord],
    indices: &[u32],
    interpolation: &InterpolationRegistry,
) -> (HashMap<(u32, u32), u32>, Vec<VertexRecord>) {
    let mut edge_map = HashMap::new();
    let mut midpoints = Vec::new();

    for tri in indices.chunks_exact(3) {
        for i in 0..3 {
            let (a, b) = (tri[i], tri[(i + 1) % 3]);
            let key = if a < b { (a, b) } else { (b, a) };
            edge_map.entry(key).or_insert_with(|| {
                midpoints.push(lerp_records(
                    &vertices[key.0 as usize],
                    &vertices[key.1 as usize],
                    0.5,
                    interpolation,
                ));
                (vertices.len() + midpoints.len() - 1) as u32
            });
        }
    }

    (edge_map, midpoints)
}

fn subdivide_once(
    vertices: &[VertexRecord],
    indices: &[u32],
    interpolation: &InterpolationRegistry,
) -> Result<(Vec<VertexRecord>, Vec<u32>)> {
    let (edge_map, midpoints) = build_edge_vertices(vertices, indices, interpolation);
    if vertices.len() + midpoints.len() > u32::MAX as usize {
        return Err(MeshError::InvalidState(
            "subdivided mesh exceeds the u32 index range".into(),
        ));
    }

    let edge_vertex = |a: u32, b: u32| -> Result<u32> {
        let key = if a < b { (a, b) } else { (b, a) };
        edge_map
            .get(&key)
            .copied()
            .ok_or_else(|| MeshError::InvalidState(format!("edge {key:?} has no midpoint")))
    };

    let mut new_indices = Vec::with_capacity(indices.len() * 4);
    for tri in indices.chunks_exact(3) {
        let (v0, v1, v2) = (tri[0], tri[1], tri[2]);
        let e01 = edge_vertex(v0, v1)?;
        let e12 = edge_vertex(v1, v2)?;
        let e20 = edge_vertex(v2, v0)?;

        new_indices.extend_from_slice(&[v0, e01, e20]);
        new_indices.extend_from_slice(&[v1, e12, e01]);
        new_indices.extend_from_slice(&[v2, e20, e12]);
        new_indices.extend_from_slice(&[e01, e12, e20]);
    }

    let mut new_vertices = Vec::with_capacity(vertices.len() + midpoints.len());
    new_vertices.extend_from_slice(vertices);
    new_vertices.extend(midpoints);
    Ok((new_vertices, new_indices))
}
