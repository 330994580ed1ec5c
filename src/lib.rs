//! A POSIX-style glob engine with brace expansion, `**` recursion, tilde
//! expansion, extended groups and gitignore filtering.
//!
//! Two closely related services share one pattern pipeline:
//!
//! - **Filesystem globbing** ([`glob`], [`glob_at`]) resolves a pattern
//!   into the set of existing pathnames under the working directory or a
//!   given base directory.
//! - **Path-set filtering** ([`match_paths`], [`match_paths_at`]) selects
//!   the matching subset of an in-memory path list without touching the
//!   filesystem; the result buffer borrows the caller's strings, so
//!   filtering never copies a path.
//!
//! Both land their results in a [`GlobBuf`], which also carries a parallel
//! byte-length array so callers can slice results without a length scan.
//!
//! ```no_run
//! use zlob::{glob, GlobBuf, GlobFlags};
//!
//! let mut buf = GlobBuf::new();
//! glob("src/**/*.rs", GlobFlags::RECOMMENDED, &mut buf)?;
//! for path in buf.iter() {
//!     println!("{path}");
//! }
//! # Ok::<(), zlob::GlobError>(())
//! ```
//!
//! Behavior is controlled by the bit-addressed [`GlobFlags`] set. Pattern
//! syntax: `*`, `?`, `[...]`/`[!...]` with ranges, `**` for zero or more
//! path components, `\` escapes, `{a,b}`/`{1..9}` under
//! [`GlobFlags::BRACE`], `~`/`~user` under [`GlobFlags::TILDE`], and
//! `?( *( +( @( !(` groups under [`GlobFlags::EXTGLOB`].

#![deny(clippy::all)]

pub mod braces;
pub mod cache;
pub mod error;
pub mod filter;
pub mod flags;
pub mod fs;
pub mod glob;
pub mod ignore;
pub mod matcher;
pub mod pattern;
pub mod results;
pub mod tilde;
pub mod walker;

pub use error::GlobError;
pub use flags::GlobFlags;
pub use fs::{DirAccess, DirEntry, DirStream, EntryKind, LocalDirAccess};
pub use glob::{glob, glob_at, match_paths, match_paths_at, Glob};
pub use ignore::{GitignoreFilter, IgnorePredicate};
pub use pattern::{Pattern, Segment};
pub use results::GlobBuf;
pub use tilde::{HomeLookup, SystemHome};
pub use walker::ErrHandler;

/// Escape metacharacters in a pattern so it matches itself literally.
pub fn escape(pattern: &str) -> String {
    pattern::escape_pattern(pattern)
}

/// Reverse [`escape`]: remove one level of backslash escaping.
pub fn unescape(pattern: &str) -> String {
    pattern::unescape_pattern(pattern)
}

/// Check whether a pattern contains any unescaped metacharacter under the
/// given flags. This is the same scan that drives the
/// [`GlobFlags::MAGCHAR`] snapshot bit and the [`GlobFlags::NOMAGIC`]
/// fallback.
pub fn has_magic(pattern: &str, flags: GlobFlags) -> bool {
    pattern::has_magic_in_pattern(pattern, flags)
}
