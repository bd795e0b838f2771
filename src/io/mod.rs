//! Format codecs and extension-based dispatch.
//!
//! # Supported Formats
//!
//! | Format | Extension | Read | Write | Notes |
//! |--------|-----------|------|-------|-------|
//! | Object File Format | `.off` | ✓ | ✓ | `[ST][C][N][4]OFF` variants |
//! | glTF 2.0 | `.gltf`, `.glb` | ✓ | ✓ | One container mesh per primitive |
//! | Quake BSP | `.bsp` | ✗ | ✗ | Registered placeholder |
//!
//! # Usage
//!
//! ```no_run
//! use meshmux::fs::FileRef;
//! use meshmux::io::FormatRegistry;
//!
//! let registry = FormatRegistry::with_defaults();
//!
//! let Some(container) = registry.try_read(&FileRef::os("model.off")) else {
//!     eprintln!("could not read model.off");
//!     return;
//! };
//!
//! if !registry.try_write(&FileRef::os("model.glb"), &container) {
//!     eprintln!("could not write model.glb");
//! }
//! ```
//!
//! The boolean entry points never fail loudly: an unknown extension, a
//! missing file, malformed bytes or a schema the target format cannot hold
//! all come back as `None`/`false`, with the reason sent to the registry's
//! [`Diagnostics`]. Use [`FormatRegistry::read`] and [`FormatRegistry::write`]
//! when the error itself matters.

pub mod bsp;
pub mod gltf;
pub mod off;

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::diagnostics::{default_sink, Diagnostic, Diagnostics, LogDiagnostics};
use crate::error::{MeshError, Result};
use crate::fs::FileRef;
use crate::mesh::MeshContainer;

/// A file extension a codec handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SupportedExtension {
    name: &'static str,
    extension: &'static str,
}

impl SupportedExtension {
    /// Create an extension declaration. `extension` includes the leading dot.
    pub const fn new(name: &'static str, extension: &'static str) -> Self {
        Self { name, extension }
    }

    /// Display name, e.g. `"Object File Format"`.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Extension with leading dot, e.g. `".off"`.
    #[inline]
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Case-insensitive comparison against an extension with leading dot.
    pub fn matches(&self, extension: &str) -> bool {
        self.extension.eq_ignore_ascii_case(extension)
    }
}

impl fmt::Display for SupportedExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (*{})", self.name, self.extension)
    }
}

/// The result of a read, handed back to a write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileContainer {
    /// Meshes in file order.
    pub meshes: Vec<MeshContainer>,
    /// Name of the codec that produced this container.
    pub source_format: Option<String>,
}

impl FileContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a single mesh.
    pub fn from_mesh(mesh: MeshContainer) -> Self {
        Self {
            meshes: vec![mesh],
            source_format: None,
        }
    }

    /// Whether there are no meshes.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Total vertex count over all meshes.
    pub fn num_vertices(&self) -> usize {
        self.meshes.iter().map(MeshContainer::num_vertices).sum()
    }

    /// Total face count over all meshes.
    pub fn num_faces(&self) -> usize {
        self.meshes.iter().map(MeshContainer::num_faces).sum()
    }
}

/// A format plugin.
///
/// Implementors provide the fallible [`read`](Codec::read) and
/// [`write`](Codec::write); callers normally go through the provided
/// [`try_read`](Codec::try_read) and [`try_write`](Codec::try_write), which
/// fold every error into `None`/`false`. The `_reporting` variants send the
/// folded error to an injected [`Diagnostics`] sink.
///
/// Implementations must check that the file exists before opening it, and
/// must drop any stream they open before returning.
pub trait Codec: Send + Sync {
    /// Short display name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Extensions this codec handles. Must not change over the codec's
    /// lifetime.
    fn supported_extensions(&self) -> &[SupportedExtension];

    /// Parse `file`.
    fn read(&self, file: &FileRef) -> Result<FileContainer>;

    /// Serialize `container` to `file`.
    ///
    /// Must fail with [`MeshError::IncompatibleSchema`] rather than drop any
    /// slot the format cannot store.
    fn write(&self, file: &FileRef, container: &FileContainer) -> Result<()>;

    /// Parse `file`, returning `None` on any failure.
    ///
    /// The failure is reported to [`LogDiagnostics`].
    fn try_read(&self, file: &FileRef) -> Option<FileContainer> {
        self.try_read_reporting(file, &LogDiagnostics)
    }

    /// Serialize `container` to `file`, returning `false` on any failure.
    ///
    /// The failure is reported to [`LogDiagnostics`].
    fn try_write(&self, file: &FileRef, container: &FileContainer) -> bool {
        self.try_write_reporting(file, container, &LogDiagnostics)
    }

    /// [`try_read`](Codec::try_read) that reports the swallowed error to
    /// `diagnostics` as [`Diagnostic::CodecFailed`].
    fn try_read_reporting(
        &self,
        file: &FileRef,
        diagnostics: &dyn Diagnostics,
    ) -> Option<FileContainer> {
        match self.read(file) {
            Ok(container) => Some(container),
            Err(e) => {
                diagnostics.report(Diagnostic::codec_failed(self.name(), file, &e));
                None
            }
        }
    }

    /// [`try_write`](Codec::try_write) that reports the swallowed error to
    /// `diagnostics` as [`Diagnostic::CodecFailed`].
    fn try_write_reporting(
        &self,
        file: &FileRef,
        container: &FileContainer,
        diagnostics: &dyn Diagnostics,
    ) -> bool {
        match self.write(file, container) {
            Ok(()) => true,
            Err(e) => {
                diagnostics.report(Diagnostic::codec_failed(self.name(), file, &e));
                false
            }
        }
    }

    /// Whether this codec claims `file`'s extension.
    fn handles(&self, file: &FileRef) -> bool {
        file.extension()
            .is_some_and(|ext| self.supported_extensions().iter().any(|s| s.matches(&ext)))
    }
}

/// Read the whole file through the file system abstraction.
pub(crate) fn read_all(file: &FileRef) -> Result<Vec<u8>> {
    if !file.exists() {
        return Err(MeshError::FileNotFound {
            path: file.path().to_path_buf(),
        });
    }
    let mut stream = file.open_read().ok_or_else(|| MeshError::FileNotFound {
        path: file.path().to_path_buf(),
    })?;
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Write `bytes` in one go through the file system abstraction.
pub(crate) fn write_all(file: &FileRef, bytes: &[u8]) -> Result<()> {
    let mut stream = file
        .open_write()
        .ok_or_else(|| MeshError::save(file.path(), "cannot open file for writing"))?;
    stream.write_all(bytes)?;
    stream.flush()?;
    Ok(())
}

/// Ordered set of codecs, dispatched by file extension.
///
/// The first registered codec that claims an extension handles it; later
/// registrations for the same extension are shadowed. There is no fallback to
/// another codec when the selected one fails.
pub struct FormatRegistry {
    codecs: Vec<Box<dyn Codec>>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl FormatRegistry {
    /// Create a registry with no codecs.
    pub fn new() -> Self {
        Self {
            codecs: Vec::new(),
            diagnostics: default_sink(),
        }
    }

    /// Create a registry with the OFF, glTF and BSP codecs, in that order.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(off::OffCodec::new());
        registry.register(gltf::GltfCodec::new());
        registry.register(bsp::BspCodec::new());
        registry
    }

    /// Route failure diagnostics to `sink` instead of the log.
    pub fn with_diagnostics(mut self, sink: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Append a codec.
    pub fn register<C: Codec + 'static>(&mut self, codec: C) -> &mut Self {
        for ext in codec.supported_extensions() {
            if let Some(owner) = self.codecs.iter().find(|c| {
                c.supported_extensions()
                    .iter()
                    .any(|s| s.matches(ext.extension()))
            }) {
                log::warn!(
                    "{} already handles {}, {} will not be used for it",
                    owner.name(),
                    ext.extension(),
                    codec.name()
                );
            }
        }
        self.codecs.push(Box::new(codec));
        self
    }

    /// Registered codecs in priority order.
    pub fn codecs(&self) -> impl Iterator<Item = &dyn Codec> {
        self.codecs.iter().map(|c| c.as_ref())
    }

    /// Every declared extension, in registration order.
    pub fn supported_extensions(&self) -> Vec<SupportedExtension> {
        self.codecs
            .iter()
            .flat_map(|c| c.supported_extensions().iter().copied())
            .collect()
    }

    /// The codec that handles `file`, if any.
    pub fn codec_for(&self, file: &FileRef) -> Option<&dyn Codec> {
        self.codecs
            .iter()
            .find(|c| c.handles(file))
            .map(|c| c.as_ref())
    }

    fn select(&self, file: &FileRef) -> Result<&dyn Codec> {
        self.codec_for(file).ok_or_else(|| MeshError::UnsupportedFormat {
            extension: file.extension().unwrap_or_else(|| "(none)".to_string()),
        })
    }

    fn report(&self, file: &FileRef, codec: Option<&dyn Codec>, error: &MeshError) {
        let diagnostic = match codec {
            None => Diagnostic::FormatUnrecognized {
                path: file.path().to_path_buf(),
            },
            Some(codec) => Diagnostic::codec_failed(codec.name(), file, error),
        };
        self.diagnostics.report(diagnostic);
    }

    /// Read `file` with the codec selected by its extension.
    pub fn read(&self, file: &FileRef) -> Result<FileContainer> {
        let codec = self.select(file)?;
        log::debug!("reading {} with {}", file.path().display(), codec.name());
        let mut container = codec.read(file)?;
        container.source_format.get_or_insert_with(|| codec.name().to_string());
        Ok(container)
    }

    /// Write `container` to `file` with the codec selected by its extension.
    pub fn write(&self, file: &FileRef, container: &FileContainer) -> Result<()> {
        let codec = self.select(file)?;
        log::debug!("writing {} with {}", file.path().display(), codec.name());
        codec.write(file, container)
    }

    /// Read `file`; `None` if no codec claims it or the codec fails.
    pub fn try_read(&self, file: &FileRef) -> Option<FileContainer> {
        match self.read(file) {
            Ok(container) => Some(container),
            Err(e) => {
                self.report(file, self.codec_for(file), &e);
                None
            }
        }
    }

    /// Write `container` to `file`; `false` if no codec claims it or the
    /// codec fails.
    pub fn try_write(&self, file: &FileRef, container: &FileContainer) -> bool {
        match self.write(file, container) {
            Ok(()) => true,
            Err(e) => {
                self.report(file, self.codec_for(file), &e);
                false
            }
        }
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field(
                "codecs",
                &self.codecs.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnostics;
    use crate::fs::MemoryFileSystem;
    use parking_lot::Mutex;

    /// Records which codec was asked to read.
    struct Probe {
        name: &'static str,
        extensions: Vec<SupportedExtension>,
        calls: Arc<Mutex<Vec<&'static str>>>,
        succeed: bool,
    }

    impl Probe {
        fn new(
            name: &'static str,
            ext: &'static str,
            calls: &Arc<Mutex<Vec<&'static str>>>,
            succeed: bool,
        ) -> Self {
            Self {
                name,
                extensions: vec![SupportedExtension::new(name, ext)],
                calls: Arc::clone(calls),
                succeed,
            }
        }
    }

    impl Codec for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn supported_extensions(&self) -> &[SupportedExtension] {
            &self.extensions
        }

        fn read(&self, _file: &FileRef) -> Result<FileContainer> {
            self.calls.lock().push(self.name);
            if self.succeed {
                Ok(FileContainer::new())
            } else {
                Err(MeshError::InvalidState("probe".into()))
            }
        }

        fn write(&self, _file: &FileRef, _container: &FileContainer) -> Result<()> {
            self.calls.lock().push(self.name);
            if self.succeed {
                Ok(())
            } else {
                Err(MeshError::InvalidState("probe".into()))
            }
        }
    }

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = FormatRegistry::new();
        registry.register(Probe::new("off", ".off", &calls, true));
        registry.register(Probe::new("bsp", ".bsp", &calls, true));

        let fs = MemoryFileSystem::new();
        assert!(registry.try_read(&fs.file("model.OFF")).is_some());
        assert_eq!(*calls.lock(), vec!["off"]);
    }

    #[test]
    fn test_first_registered_wins() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = FormatRegistry::new();
        registry.register(Probe::new("first", ".off", &calls, true));
        registry.register(Probe::new("second", ".off", &calls, true));

        let fs = MemoryFileSystem::new();
        assert_eq!(registry.codec_for(&fs.file("a.off")).unwrap().name(), "first");
        registry.try_read(&fs.file("a.off"));
        assert_eq!(*calls.lock(), vec!["first"]);
    }

    #[test]
    fn test_no_fallthrough_on_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::new(CollectingDiagnostics::new());
        let mut registry = FormatRegistry::new().with_diagnostics(sink.clone());
        registry.register(Probe::new("broken", ".off", &calls, false));
        registry.register(Probe::new("backup", ".off", &calls, true));

        let fs = MemoryFileSystem::new();
        assert!(registry.try_read(&fs.file("a.off")).is_none());
        assert!(!registry.try_write(&fs.file("a.off"), &FileContainer::new()));
        assert_eq!(*calls.lock(), vec!["broken", "broken"]);

        let events = sink.take();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Diagnostic::CodecFailed { codec, .. } if codec == "broken"));
    }

    #[test]
    fn test_unknown_extension() {
        let sink = Arc::new(CollectingDiagnostics::new());
        let registry = FormatRegistry::with_defaults().with_diagnostics(sink.clone());
        let fs = MemoryFileSystem::new();

        assert!(registry.try_read(&fs.file("mesh.xyz")).is_none());
        assert!(registry.try_read(&fs.file("no_extension")).is_none());
        assert!(matches!(
            registry.read(&fs.file("mesh.xyz")),
            Err(MeshError::UnsupportedFormat { extension }) if extension == ".xyz"
        ));
        assert!(matches!(sink.take()[0], Diagnostic::FormatUnrecognized { .. }));
    }

    #[test]
    fn test_default_registry_extensions() {
        let registry = FormatRegistry::with_defaults();
        let exts: Vec<&str> = registry
            .supported_extensions()
            .iter()
            .map(|e| e.extension())
            .collect();
        assert_eq!(exts, vec![".off", ".gltf", ".glb", ".bsp"]);

        let fs = MemoryFileSystem::new();
        assert_eq!(registry.codec_for(&fs.file("a.Bsp")).unwrap().name(), "BSP");
        assert_eq!(registry.codec_for(&fs.file("a.GLB")).unwrap().name(), "glTF");
    }

    #[test]
    fn test_read_sets_source_format() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = FormatRegistry::new();
        registry.register(Probe::new("probe", ".p", &calls, true));
        let fs = MemoryFileSystem::new();

        let container = registry.read(&fs.file("x.p")).unwrap();
        assert_eq!(container.source_format.as_deref(), Some("probe"));
    }

    #[test]
    fn test_codec_failure_reaches_injected_sink() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let failing = Probe::new("broken", ".b", &calls, false);
        let sink = CollectingDiagnostics::new();
        let fs = MemoryFileSystem::new();

        assert!(failing.try_read_reporting(&fs.file("x.b"), &sink).is_none());
        assert!(!failing.try_write_reporting(&fs.file("x.b"), &FileContainer::new(), &sink));

        let events = sink.take();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|d| matches!(
            d,
            Diagnostic::CodecFailed { codec, message, .. } if codec == "broken" && message.contains("probe")
        )));
    }

    #[test]
    fn test_supported_extension_display() {
        let ext = SupportedExtension::new("Object File Format", ".off");
        assert_eq!(ext.to_string(), "Object File Format (*.off)");
        assert!(ext.matches(".OfF"));
        assert!(!ext.matches("off"));
    }
}
