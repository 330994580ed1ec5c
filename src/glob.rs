//! The glob driver.
//!
//! [`Glob`] wires the pipeline together: tilde expansion, brace expansion,
//! per-sub-pattern compilation through the pattern cache, then either the
//! filesystem walker or the in-memory path filter, with results landing in
//! a [`GlobBuf`]. The free functions at the bottom cover the common calls;
//! the builder exists for injection (base directory, directory access,
//! home lookup, ignore predicate).

use std::path::{Path, PathBuf};

use ahash::AHashSet;

use crate::braces::expand_braces;
use crate::cache;
use crate::error::GlobError;
use crate::filter::{path_matches, strip_base};
use crate::flags::GlobFlags;
use crate::fs::{DirAccess, LocalDirAccess};
use crate::ignore::{GitignoreFilter, IgnorePredicate};
use crate::matcher::MatchOpts;
use crate::pattern::{has_magic_in_pattern, strip_dot_slash};
use crate::results::GlobBuf;
use crate::tilde::{expand_tilde, HomeLookup, SystemHome};
use crate::walker::{ErrHandler, FsWalker};

static SYSTEM_HOME: SystemHome = SystemHome;
static LOCAL_DIR_ACCESS: LocalDirAccess = LocalDirAccess;

/// A configured glob call.
///
/// ```no_run
/// use zlob::{Glob, GlobBuf, GlobFlags};
///
/// let mut buf = GlobBuf::new();
/// Glob::new(GlobFlags::BRACE)
///     .base("/srv/project")
///     .glob_into("src/**/*.{c,h}", None, &mut buf)?;
/// # Ok::<(), zlob::GlobError>(())
/// ```
pub struct Glob<'g> {
    flags: GlobFlags,
    base: Option<PathBuf>,
    access: Option<&'g dyn DirAccess>,
    home: Option<&'g dyn HomeLookup>,
    ignore: Option<&'g dyn IgnorePredicate>,
}

impl<'g> Glob<'g> {
    /// Start a call with the given flag set.
    pub fn new(flags: GlobFlags) -> Glob<'g> {
        Glob {
            flags,
            base: None,
            access: None,
            home: None,
            ignore: None,
        }
    }

    /// Resolve relative patterns against this directory instead of the
    /// working directory.
    pub fn base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Inject a directory source, used when
    /// [`GlobFlags::ALTDIRFUNC`] is set.
    pub fn dir_access(mut self, access: &'g dyn DirAccess) -> Self {
        self.access = Some(access);
        self
    }

    /// Inject a home-directory provider for tilde expansion.
    pub fn home_lookup(mut self, home: &'g dyn HomeLookup) -> Self {
        self.home = Some(home);
        self
    }

    /// Inject an ignore predicate, overriding the `.gitignore` loading
    /// that [`GlobFlags::GITIGNORE`] would perform.
    pub fn ignore_with(mut self, ignore: &'g dyn IgnorePredicate) -> Self {
        self.ignore = Some(ignore);
        self
    }

    /// Resolve the pattern against the filesystem into `buf`.
    ///
    /// `errfunc` is invoked for every failed directory read; returning
    /// `true` (or setting [`GlobFlags::ERR`]) aborts the call.
    pub fn glob_into(
        &self,
        pattern: &str,
        errfunc: Option<&mut ErrHandler<'_>>,
        buf: &mut GlobBuf<'_>,
    ) -> Result<(), GlobError> {
        buf.prepare(false, self.flags)?;
        match self.run_fs(pattern, errfunc, buf) {
            Ok(()) => Ok(()),
            // No-match leaves appended prior contents intact.
            Err(GlobError::NoMatch) => Err(GlobError::NoMatch),
            Err(err) => {
                buf.clear();
                Err(err)
            }
        }
    }

    /// Filter an in-memory path list into `buf` without touching the
    /// filesystem. Matching entries are stored zero-copy: the buffer
    /// borrows the caller's strings. `base`, when given, must be absolute
    /// and is stripped from every path before matching.
    pub fn filter_into<'a>(
        &self,
        base: Option<&str>,
        pattern: &'a str,
        paths: &[&'a str],
        buf: &mut GlobBuf<'a>,
    ) -> Result<(), GlobError> {
        if let Some(base) = base {
            if !base.starts_with('/') {
                // Reported before the buffer is opened.
                return Err(GlobError::Aborted);
            }
        }

        buf.prepare(true, self.flags)?;
        match self.run_filter(base, pattern, paths, buf) {
            Ok(()) => Ok(()),
            Err(GlobError::NoMatch) => Err(GlobError::NoMatch),
            Err(err) => {
                buf.clear();
                Err(err)
            }
        }
    }

    /// Expand tilde and braces, yielding the ordered sub-pattern list.
    fn preprocess(&self, pattern: &str) -> Result<Vec<String>, GlobError> {
        let home = self.home.unwrap_or(&SYSTEM_HOME);
        let expanded = expand_tilde(pattern, self.flags, home)?;

        if self.flags.contains(GlobFlags::BRACE) {
            expand_braces(&expanded, self.flags.contains(GlobFlags::NOESCAPE))
        } else {
            Ok(vec![expanded.into_owned()])
        }
    }

    fn snapshot(&self, magic: bool) -> GlobFlags {
        let cleared = self.flags - GlobFlags::MAGCHAR;
        if magic {
            cleared | GlobFlags::MAGCHAR
        } else {
            cleared
        }
    }

    fn run_fs(
        &self,
        pattern: &str,
        errfunc: Option<&mut ErrHandler<'_>>,
        buf: &mut GlobBuf<'_>,
    ) -> Result<(), GlobError> {
        let flags = self.flags;
        let magic = has_magic_in_pattern(pattern, flags);
        buf.record_flags(self.snapshot(magic));

        let subs = self.preprocess(pattern)?;

        let base = self.base.clone().unwrap_or_else(|| PathBuf::from("."));

        let loaded_ignore = if flags.contains(GlobFlags::GITIGNORE) && self.ignore.is_none() {
            GitignoreFilter::from_dir(&base)
        } else {
            None
        };
        let ignore: Option<&dyn IgnorePredicate> = self
            .ignore
            .or_else(|| loaded_ignore.as_ref().map(|g| g as &dyn IgnorePredicate));

        let access: &dyn DirAccess = if flags.contains(GlobFlags::ALTDIRFUNC) {
            self.access.unwrap_or(&LOCAL_DIR_ACCESS)
        } else {
            &LOCAL_DIR_ACCESS
        };

        let mut walker = FsWalker::new(access, &base, flags, ignore, errfunc);
        for sub in &subs {
            let stripped = strip_dot_slash(sub);
            if stripped.is_empty() {
                continue;
            }
            let compiled = cache::get_or_compile(stripped, flags);
            walker.walk(&compiled)?;
        }

        let matches = walker.into_matches();
        if matches.is_empty() {
            return self.fallback_owned(pattern, magic, buf);
        }
        for path in matches {
            buf.push_owned(path)?;
        }
        Ok(())
    }

    fn run_filter<'a>(
        &self,
        base: Option<&str>,
        pattern: &'a str,
        paths: &[&'a str],
        buf: &mut GlobBuf<'a>,
    ) -> Result<(), GlobError> {
        let flags = self.flags;
        let magic = has_magic_in_pattern(pattern, flags);
        buf.record_flags(self.snapshot(magic));

        let subs = self.preprocess(pattern)?;
        let opts = MatchOpts::from_flags(flags);

        let mut seen: AHashSet<&'a str> = AHashSet::new();
        let mut all: Vec<&'a str> = Vec::new();

        for sub in &subs {
            let stripped = strip_dot_slash(sub);
            if stripped.is_empty() {
                continue;
            }
            let compiled = cache::get_or_compile(stripped, flags);

            let mut matched: Vec<&'a str> = Vec::new();
            for &path in paths {
                let rel = match base {
                    Some(base) => match strip_base(path, base) {
                        Some(rel) => rel,
                        None => continue,
                    },
                    None => path,
                };
                if path_matches(&compiled, rel, &opts) {
                    matched.push(path);
                }
            }

            // Per sub-pattern ordering mirrors the per-directory sort of
            // the filesystem walk.
            if !flags.contains(GlobFlags::NOSORT) {
                matched.sort_unstable();
            }
            for path in matched {
                if seen.insert(path) {
                    all.push(path);
                }
            }
        }

        if all.is_empty() {
            return self.fallback_borrowed(pattern, magic, buf);
        }
        for path in all {
            buf.push_borrowed(path)?;
        }
        Ok(())
    }

    /// Zero matches: apply the no-check and no-magic fallbacks, which
    /// return the pattern exactly as the caller passed it.
    fn applies_fallback(&self, magic: bool) -> bool {
        self.flags.contains(GlobFlags::NOCHECK)
            || (self.flags.contains(GlobFlags::NOMAGIC) && !magic)
    }

    fn fallback_owned(&self, pattern: &str, magic: bool, buf: &mut GlobBuf<'_>) -> Result<(), GlobError> {
        if self.applies_fallback(magic) {
            buf.push_owned(pattern.to_string())
        } else {
            Err(GlobError::NoMatch)
        }
    }

    fn fallback_borrowed<'a>(
        &self,
        pattern: &'a str,
        magic: bool,
        buf: &mut GlobBuf<'a>,
    ) -> Result<(), GlobError> {
        if self.applies_fallback(magic) {
            buf.push_borrowed(pattern)
        } else {
            Err(GlobError::NoMatch)
        }
    }
}

/// Resolve a pattern against the working directory.
pub fn glob(pattern: &str, flags: GlobFlags, buf: &mut GlobBuf<'_>) -> Result<(), GlobError> {
    Glob::new(flags).glob_into(pattern, None, buf)
}

/// Resolve a pattern against an absolute base directory. A relative base
/// aborts without opening the buffer.
pub fn glob_at(
    base: &Path,
    pattern: &str,
    flags: GlobFlags,
    buf: &mut GlobBuf<'_>,
) -> Result<(), GlobError> {
    if !base.is_absolute() {
        return Err(GlobError::Aborted);
    }
    Glob::new(flags).base(base).glob_into(pattern, None, buf)
}

/// Filter a path list with a pattern, zero-copy.
pub fn match_paths<'a>(
    pattern: &'a str,
    paths: &[&'a str],
    flags: GlobFlags,
    buf: &mut GlobBuf<'a>,
) -> Result<(), GlobError> {
    Glob::new(flags).filter_into(None, pattern, paths, buf)
}

/// Filter a path list relative to an absolute base directory, zero-copy.
/// The base tolerates one trailing `/`; paths outside the base never
/// match.
pub fn match_paths_at<'a>(
    base: &str,
    pattern: &'a str,
    paths: &[&'a str],
    flags: GlobFlags,
    buf: &mut GlobBuf<'a>,
) -> Result<(), GlobError> {
    Glob::new(flags).filter_into(Some(base), pattern, paths, buf)
}
