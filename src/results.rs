//! The result buffer.
//!
//! One buffer type serves both services. Filesystem globbing copies each
//! match into buffer-owned storage; path-list filtering stores borrowed
//! pointers straight into the caller's strings. Which of the two applies
//! is recorded at construction and never mixed within one buffer, so a
//! single teardown can release exactly what the buffer owns.

use crate::error::GlobError;
use crate::flags::GlobFlags;

/// Ownership discriminator, fixed when the first call populates the
/// buffer.
enum Storage<'a> {
    /// Zero-initialized, not yet populated.
    Empty,
    /// Strings copied during a filesystem glob.
    Owned(Vec<String>),
    /// Pointers into caller-owned path strings.
    Borrowed(Vec<&'a str>),
}

/// Glob result buffer.
///
/// Mirrors the classic `glob_t` layout: a count, a conceptually
/// null-terminated path array with optional leading null reservations, and
/// a parallel byte-length array. [`GlobBuf::path`] models the pointer
/// array, returning `None` for reserved leading slots and for every index
/// past the last match.
///
/// In borrowing mode the caller must keep the input path strings alive for
/// the buffer's lifetime; the borrow checker enforces exactly that through
/// the `'a` parameter.
pub struct GlobBuf<'a> {
    storage: Storage<'a>,
    lengths: Vec<usize>,
    /// Leading reservations requested by the caller; applied when
    /// [`GlobFlags::DOOFFS`] is set.
    reserve: usize,
    /// Active leading reservations of the current contents.
    offs: usize,
    flags: GlobFlags,
}

impl Default for GlobBuf<'_> {
    fn default() -> Self {
        GlobBuf {
            storage: Storage::Empty,
            lengths: Vec::new(),
            reserve: 0,
            offs: 0,
            flags: GlobFlags::NONE,
        }
    }
}

impl<'a> GlobBuf<'a> {
    /// An empty, zero-initialized buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty buffer that reserves `n` leading null slots when a call
    /// runs with [`GlobFlags::DOOFFS`].
    pub fn with_offs(n: usize) -> Self {
        GlobBuf {
            reserve: n,
            ..Self::default()
        }
    }

    /// Change the requested number of leading reservations for the next
    /// populating call.
    pub fn set_offs(&mut self, n: usize) {
        self.reserve = n;
    }

    /// Number of matches, excluding leading reservations.
    pub fn pathc(&self) -> usize {
        match &self.storage {
            Storage::Empty => 0,
            Storage::Owned(v) => v.len(),
            Storage::Borrowed(v) => v.len(),
        }
    }

    /// Number of leading null slots before the first match.
    pub fn offs(&self) -> usize {
        self.offs
    }

    /// Entry `i` of the conceptual path array: `None` for the leading
    /// reserved slots and for anything past the last match (the trailing
    /// null), `Some(path)` in between.
    pub fn path(&self, i: usize) -> Option<&str> {
        let idx = i.checked_sub(self.offs)?;
        match &self.storage {
            Storage::Empty => None,
            Storage::Owned(v) => v.get(idx).map(|s| s.as_str()),
            Storage::Borrowed(v) => v.get(idx).copied(),
        }
    }

    /// Iterate over the matches in order, skipping reservations.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match &self.storage {
            Storage::Empty => Box::new(std::iter::empty()),
            Storage::Owned(v) => Box::new(v.iter().map(|s| s.as_str())),
            Storage::Borrowed(v) => Box::new(v.iter().copied()),
        }
    }

    /// The parallel length array: `offs()` zeros followed by the byte
    /// length of each match. `lengths()[i]` is the length of `path(i)`.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Flag snapshot of the populating call, with
    /// [`GlobFlags::MAGCHAR`] set when the pattern contained
    /// metacharacters.
    pub fn flags(&self) -> GlobFlags {
        self.flags
    }

    /// True when the buffer borrows caller-owned strings.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }

    /// True when the buffer holds no matches.
    pub fn is_empty(&self) -> bool {
        self.pathc() == 0
    }

    /// The single teardown for both ownership modes.
    ///
    /// Owned contents are released; borrowed contents only drop the
    /// pointer and length arrays, never the string bodies. Calling this on
    /// a fresh buffer is a no-op, and the buffer is reusable afterwards
    /// (the reservation request survives). `Drop` performs the same
    /// release automatically.
    pub fn clear(&mut self) {
        self.storage = Storage::Empty;
        self.lengths.clear();
        self.offs = 0;
        self.flags = GlobFlags::NONE;
    }

    /// Bind the buffer to an ownership mode for a populating call,
    /// honoring [`GlobFlags::APPEND`] and [`GlobFlags::DOOFFS`].
    pub(crate) fn prepare(&mut self, borrowed: bool, flags: GlobFlags) -> Result<(), GlobError> {
        if !flags.contains(GlobFlags::APPEND) {
            self.clear();
        }

        if matches!(self.storage, Storage::Empty) {
            self.offs = if flags.contains(GlobFlags::DOOFFS) {
                self.reserve
            } else {
                0
            };
            self.lengths = vec![0; self.offs];
            self.storage = if borrowed {
                Storage::Borrowed(Vec::new())
            } else {
                Storage::Owned(Vec::new())
            };
            return Ok(());
        }

        // Appending across ownership modes would leave teardown ambiguous.
        let same_mode = if borrowed {
            matches!(self.storage, Storage::Borrowed(_))
        } else {
            matches!(self.storage, Storage::Owned(_))
        };
        if same_mode {
            Ok(())
        } else {
            Err(GlobError::Aborted)
        }
    }

    pub(crate) fn push_owned(&mut self, path: String) -> Result<(), GlobError> {
        match &mut self.storage {
            Storage::Owned(v) => {
                self.lengths.push(path.len());
                v.push(path);
                Ok(())
            }
            _ => Err(GlobError::Aborted),
        }
    }

    pub(crate) fn push_borrowed(&mut self, path: &'a str) -> Result<(), GlobError> {
        match &mut self.storage {
            Storage::Borrowed(v) => {
                self.lengths.push(path.len());
                v.push(path);
                Ok(())
            }
            _ => Err(GlobError::Aborted),
        }
    }

    pub(crate) fn record_flags(&mut self, flags: GlobFlags) {
        self.flags = flags;
    }
}
