//! The directory-access interface consumed by the walker.
//!
//! Traversal only ever needs three operations: open a directory, pull the
//! next entry, and close the handle (closing maps onto `Drop`). The
//! default implementation reads the local filesystem; callers can inject
//! an alternative with [`GlobFlags::ALTDIRFUNC`](crate::GlobFlags::ALTDIRFUNC)
//! to glob over virtual trees or deterministic test fixtures.

use std::io;
use std::path::Path;

/// Type tag carried by every directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// The source cannot classify the entry. The walker resolves this by
    /// probing when the type matters.
    Unknown,
    Dir,
    File,
    Symlink,
}

/// One directory entry: a name (no separators) and a type tag.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// A stream of entries from one opened directory. Dropping the stream
/// closes the underlying handle.
pub trait DirStream {
    /// The next entry, `Ok(None)` at the end of the directory.
    fn next_entry(&mut self) -> io::Result<Option<DirEntry>>;
}

/// Directory access used by the walker.
pub trait DirAccess {
    /// Open a directory for reading.
    fn open_dir(&self, path: &Path) -> io::Result<Box<dyn DirStream + '_>>;

    /// Classify a single path without reading the whole tree.
    ///
    /// The default implementation first attempts descent (a path that
    /// opens as a directory is one) and otherwise scans the parent
    /// directory for the entry, so injected sources only need to supply
    /// the open/next/close triple. Implementations with a cheaper
    /// stat-like call should override this.
    fn probe(&self, path: &Path) -> Option<EntryKind> {
        if self.open_dir(path).is_ok() {
            return Some(EntryKind::Dir);
        }
        let name = path.file_name()?.to_str()?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut stream = self.open_dir(parent).ok()?;
        while let Ok(Some(entry)) = stream.next_entry() {
            if entry.name == name {
                return Some(entry.kind);
            }
        }
        None
    }
}

/// Local-filesystem implementation over `std::fs::read_dir`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDirAccess;

struct LocalDirStream {
    inner: std::fs::ReadDir,
}

impl DirStream for LocalDirStream {
    fn next_entry(&mut self) -> io::Result<Option<DirEntry>> {
        match self.inner.next() {
            None => Ok(None),
            Some(Err(err)) => Err(err),
            Some(Ok(entry)) => {
                let name = entry.file_name().to_string_lossy().into_owned();
                let kind = match entry.file_type() {
                    Ok(ft) if ft.is_symlink() => EntryKind::Symlink,
                    Ok(ft) if ft.is_dir() => EntryKind::Dir,
                    Ok(ft) if ft.is_file() => EntryKind::File,
                    _ => EntryKind::Unknown,
                };
                Ok(Some(DirEntry { name, kind }))
            }
        }
    }
}

impl DirAccess for LocalDirAccess {
    fn open_dir(&self, path: &Path) -> io::Result<Box<dyn DirStream + '_>> {
        let inner = std::fs::read_dir(path)?;
        Ok(Box::new(LocalDirStream { inner }))
    }

    /// Stat-based probe, avoiding a directory read. Follows symlinks so a
    /// link to a directory classifies as a directory for ONLYDIR and MARK;
    /// a broken link still reports as a symlink.
    fn probe(&self, path: &Path) -> Option<EntryKind> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Some(EntryKind::Dir),
            Ok(meta) if meta.is_file() => Some(EntryKind::File),
            Ok(_) => Some(EntryKind::Unknown),
            Err(_) => match path.symlink_metadata() {
                Ok(meta) if meta.file_type().is_symlink() => Some(EntryKind::Symlink),
                _ => None,
            },
        }
    }
}
