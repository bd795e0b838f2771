//! File system abstraction used by codecs.
//!
//! Codecs never touch `std::fs` directly. They receive a [`FileRef`] that
//! pairs a path with a [`FileSystem`] implementation, which lets the same
//! codec run against real files ([`OsFileSystem`]) or an in-memory fake
//! ([`MemoryFileSystem`]).
//!
//! A `None` stream means "not available". Codecs treat it exactly like a
//! missing file; telling permission errors apart from absence is up to the
//! file system implementation.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Capability set for reading and writing files.
pub trait FileSystem: Send + Sync {
    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Open `path` for reading.
    fn open_read(&self, path: &Path) -> Option<Box<dyn Read + '_>>;

    /// Open `path` for writing, truncating any previous content.
    fn open_write(&self, path: &Path) -> Option<Box<dyn Write + '_>>;
}

/// A path on a particular [`FileSystem`].
#[derive(Clone)]
pub struct FileRef {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileRef {
    /// Refer to `path` on `fs`.
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    /// Refer to `path` on the operating system's file system.
    pub fn os(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(OsFileSystem), path)
    }

    /// The path.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The extension with a leading dot (`".off"`), as written in the path.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
    }

    /// A file next to this one, e.g. an external glTF buffer.
    pub fn sibling(&self, name: &str) -> FileRef {
        let path = match self.path.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        };
        FileRef {
            path,
            fs: Arc::clone(&self.fs),
        }
    }

    /// Whether the file exists.
    pub fn exists(&self) -> bool {
        self.fs.exists(&self.path)
    }

    /// Open the file for reading.
    pub fn open_read(&self) -> Option<Box<dyn Read + '_>> {
        self.fs.open_read(&self.path)
    }

    /// Open the file for writing.
    pub fn open_write(&self) -> Option<Box<dyn Write + '_>> {
        self.fs.open_write(&self.path)
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FileRef").field(&self.path).finish()
    }
}

/// The real file system, with buffered streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open_read(&self, path: &Path) -> Option<Box<dyn Read + '_>> {
        match File::open(path) {
            Ok(file) => Some(Box::new(BufReader::new(file))),
            Err(e) => {
                log::debug!("cannot open {} for reading: {}", path.display(), e);
                None
            }
        }
    }

    fn open_write(&self, path: &Path) -> Option<Box<dyn Write + '_>> {
        match File::create(path) {
            Ok(file) => Some(Box::new(BufWriter::new(file))),
            Err(e) => {
                log::debug!("cannot open {} for writing: {}", path.display(), e);
                None
            }
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    open_streams: AtomicUsize,
    read_only: Mutex<Vec<PathBuf>>,
}

/// In-memory file system for tests and tooling.
///
/// Clones share the same storage. A written file becomes visible when its
/// writer is dropped. [`open_streams`](Self::open_streams) counts streams that
/// have been opened and not yet dropped.
///
/// ```
/// use std::io::Read;
/// use std::path::Path;
/// use meshmux::fs::{FileSystem, MemoryFileSystem};
///
/// let fs = MemoryFileSystem::new();
/// fs.insert("a.off", b"OFF\n0 0 0\n".to_vec());
///
/// let mut text = String::new();
/// fs.open_read(Path::new("a.off")).unwrap().read_to_string(&mut text).unwrap();
/// assert!(text.starts_with("OFF"));
/// assert_eq!(fs.open_streams(), 0);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSystem {
    state: Arc<MemoryState>,
}

impl MemoryFileSystem {
    /// Create an empty file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.state.files.lock().insert(path.into(), contents.into());
    }

    /// Contents of a file.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state.files.lock().get(path.as_ref()).cloned()
    }

    /// Remove a file.
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state.files.lock().remove(path.as_ref())
    }

    /// Make `open_write` fail for `path`, while reads keep working.
    pub fn deny_writes(&self, path: impl Into<PathBuf>) {
        self.state.read_only.lock().push(path.into());
    }

    /// Number of streams currently open.
    pub fn open_streams(&self) -> usize {
        self.state.open_streams.load(Ordering::SeqCst)
    }

    /// Wrap this file system in a [`FileRef`].
    pub fn file(&self, path: impl Into<PathBuf>) -> FileRef {
        FileRef::new(Arc::new(self.clone()), path)
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.state.files.lock().contains_key(path)
    }

    fn open_read(&self, path: &Path) -> Option<Box<dyn Read + '_>> {
        let contents = self.state.files.lock().get(path).cloned()?;
        Some(Box::new(MemoryReader::new(Arc::clone(&self.state), contents)))
    }

    fn open_write(&self, path: &Path) -> Option<Box<dyn Write + '_>> {
        if self.state.read_only.lock().iter().any(|p| p == path) {
            return None;
        }
        Some(Box::new(MemoryWriter::new(
            Arc::clone(&self.state),
            path.to_path_buf(),
        )))
    }
}

struct MemoryReader {
    state: Arc<MemoryState>,
    cursor: Cursor<Vec<u8>>,
}

impl MemoryReader {
    fn new(state: Arc<MemoryState>, contents: Vec<u8>) -> Self {
        state.open_streams.fetch_add(1, Ordering::SeqCst);
        Self {
            state,
            cursor: Cursor::new(contents),
        }
    }
}

impl Read for MemoryReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Drop for MemoryReader {
    fn drop(&mut self) {
        self.state.open_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MemoryWriter {
    state: Arc<MemoryState>,
    path: PathBuf,
    buffer: Vec<u8>,
}

impl MemoryWriter {
    fn new(state: Arc<MemoryState>, path: PathBuf) -> Self {
        state.open_streams.fetch_add(1, Ordering::SeqCst);
        Self {
            state,
            path,
            buffer: Vec::new(),
        }
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        let contents = std::mem::take(&mut self.buffer);
        self.state
            .files
            .lock()
            .insert(std::mem::take(&mut self.path), contents);
        self.state.open_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let fs = MemoryFileSystem::new();
        {
            let mut w = fs.open_write(Path::new("dir/a.bin")).unwrap();
            w.write_all(&[1, 2, 3]).unwrap();
            assert_eq!(fs.open_streams(), 1);
        }
        assert_eq!(fs.open_streams(), 0);
        assert!(fs.exists(Path::new("dir/a.bin")));

        let mut buf = Vec::new();
        fs.open_read(Path::new("dir/a.bin"))
            .unwrap()
            .read_to_end(&mut buf)
            .unwrap();
        assert_eq!(buf, vec![1, 2, 3]);
        assert_eq!(fs.open_streams(), 0);
    }

    #[test]
    fn test_missing_file() {
        let fs = MemoryFileSystem::new();
        assert!(!fs.exists(Path::new("nope")));
        assert!(fs.open_read(Path::new("nope")).is_none());
    }

    #[test]
    fn test_deny_writes() {
        let fs = MemoryFileSystem::new();
        fs.deny_writes("locked.off");
        assert!(fs.open_write(Path::new("locked.off")).is_none());
        assert!(fs.open_write(Path::new("open.off")).is_some());
    }

    #[test]
    fn test_file_ref_extension_and_sibling() {
        let fs = MemoryFileSystem::new();
        let file = fs.file("models/Cube.GLTF");
        assert_eq!(file.extension().as_deref(), Some(".GLTF"));

        let bin = file.sibling("cube.bin");
        assert_eq!(bin.path(), Path::new("models/cube.bin"));

        assert_eq!(fs.file("noext").extension(), None);
    }

    #[test]
    fn test_clones_share_storage() {
        let fs = MemoryFileSystem::new();
        let other = fs.clone();
        other.insert("x", b"hi".to_vec());
        assert_eq!(fs.get("x"), Some(b"hi".to_vec()));
    }
}
