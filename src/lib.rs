//! # meshmux
//!
//! Mesh interchange across file formats through one canonical in-memory
//! representation.
//!
//! meshmux reads and writes glTF and OFF (and reserves `.bsp` for Quake BSP)
//! through pluggable [codecs](io::Codec) selected by file extension. Every
//! codec produces and consumes the same [`MeshContainer`](mesh::MeshContainer):
//! a schema of named attribute slots, one record per vertex and optional face
//! connectivity.
//!
//! Formats disagree on attribute shapes (4D positions in `4OFF`, RGB or RGBA
//! colors, 2D texcoords), so reshaping a slot goes through the
//! [`ConverterRegistry`](attribute::ConverterRegistry) and blending values
//! goes through the [`InterpolationRegistry`](attribute::InterpolationRegistry).
//!
//! ## Features
//!
//! - **Extension dispatch**: case-insensitive, first registered codec wins
//! - **Boolean or fallible API**: `try_read`/`try_write` for batch tools,
//!   `read`/`write` when the error matters
//! - **Injected file system**: codecs run against real files or
//!   [`MemoryFileSystem`](fs::MemoryFileSystem)
//! - **Exact-pair conversion**: no implicit chaining, loud failures
//!
//! ## Quick Start
//!
//! ```no_run
//! use meshmux::prelude::*;
//!
//! let registry = FormatRegistry::with_defaults();
//! let mut container = registry.read(&FileRef::os("model.off")).unwrap();
//!
//! // glTF has no 4D positions; drop w before writing.
//! let converters = ConverterRegistry::new();
//! for mesh in &mut container.meshes {
//!     mesh.convert_slot(slot::POSITION, 3, &converters).unwrap();
//! }
//!
//! registry.write(&FileRef::os("model.glb"), &container).unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use meshmux::prelude::*;
//! use meshmux::fs::MemoryFileSystem;
//! use nalgebra::{Vector2, Vector3};
//!
//! let schema = AttributeSchema::new()
//!     .with(slot::POSITION, AttributeKind::Position, 3)
//!     .with(slot::UV0, AttributeKind::TexCoord, 2);
//! let mut mesh = MeshContainer::new(schema);
//! for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
//!     mesh.push_vertex_named(&[
//!         (slot::POSITION, Vector3::new(x, y, 0.0).into()),
//!         (slot::UV0, Vector2::new(x, y).into()),
//!     ])
//!     .unwrap();
//! }
//! mesh.set_topology(Topology::from_triangles(vec![0, 1, 2]).unwrap()).unwrap();
//!
//! let fs = MemoryFileSystem::new();
//! let registry = FormatRegistry::with_defaults();
//! assert!(registry.try_write(&fs.file("tri.off"), &FileContainer::from_mesh(mesh)));
//!
//! let back = registry.try_read(&fs.file("tri.off")).unwrap();
//! assert_eq!(back.meshes[0].num_faces(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod attribute;
pub mod diagnostics;
pub mod error;
pub mod fs;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use meshmux::prelude::*;
/// ```
pub mod prelude {
    pub use crate::attribute::{
        slot, AttributeKind, AttributeSchema, AttributeSpec, AttributeValue, ConverterRegistry,
        InterpolationRegistry,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::fs::FileRef;
    pub use crate::io::{Codec, FileContainer, FormatRegistry};
    pub use crate::mesh::{MeshContainer, Topology, VertexRecord};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

pub use error::{MeshError, Result};
