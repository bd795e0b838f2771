//! Quake BSP placeholder.
//!
//! The codec claims `.bsp` so that dispatch for those files is deterministic,
//! but neither direction is implemented: reads and writes always fail with
//! [`MeshError::NotImplemented`] once the file checks pass.

use super::{Codec, FileContainer, SupportedExtension};
use crate::error::{MeshError, Result};
use crate::fs::FileRef;

const FORMAT: &str = "BSP";

const EXTENSIONS: &[SupportedExtension] = &[SupportedExtension::new("Quake BSP", ".bsp")];

/// Registered but unimplemented Quake BSP codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct BspCodec;

impl BspCodec {
    /// Create the codec.
    pub fn new() -> Self {
        Self
    }
}

impl Codec for BspCodec {
    fn name(&self) -> &'static str {
        FORMAT
    }

    fn supported_extensions(&self) -> &[SupportedExtension] {
        EXTENSIONS
    }

    fn read(&self, file: &FileRef) -> Result<FileContainer> {
        if !file.exists() {
            return Err(MeshError::FileNotFound {
                path: file.path().to_path_buf(),
            });
        }
        Err(MeshError::NotImplemented {
            codec: FORMAT,
            operation: "read",
        })
    }

    fn write(&self, _file: &FileRef, _container: &FileContainer) -> Result<()> {
        // Nothing is opened, so an existing file is left as it was.
        Err(MeshError::NotImplemented {
            codec: FORMAT,
            operation: "write",
        })
    }
}
