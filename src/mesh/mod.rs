//! Canonical mesh representation.
//!
//! Every codec reads into and writes from [`MeshContainer`]. A container holds
//! an ordered [`AttributeSchema`](crate::attribute::AttributeSchema), one
//! [`VertexRecord`] per vertex with a value for every declared slot, and
//! optional polygon [`Topology`]. A mesh without topology is an unindexed
//! point soup.
//!
//! ```
//! use meshmux::attribute::{slot, AttributeKind, AttributeSchema};
//! use meshmux::mesh::{MeshContainer, Topology, VertexRecord};
//! use nalgebra::Vector3;
//!
//! let schema = AttributeSchema::new().with(slot::POSITION, AttributeKind::Position, 3);
//! let mut mesh = MeshContainer::new(schema);
//! for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]] {
//!     mesh.push_vertex(VertexRecord::new(vec![Vector3::from(p).into()])).unwrap();
//! }
//!
//! let mut quad = Topology::new();
//! quad.push_face(&[0, 1, 2, 3]).unwrap();
//! mesh.set_topology(quad).unwrap();
//!
//! assert_eq!(mesh.topology().unwrap().triangles().count(), 2);
//! ```

mod container;
mod topology;

pub use container::{MeshContainer, VertexRecord};
pub use topology::{Faces, Topology};

pub(crate) use container::lerp_records;
