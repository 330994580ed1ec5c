//! Filesystem walking.
//!
//! The walker drives a compiled segment list against a [`DirAccess`]
//! source one directory at a time. Literal segments are probed without a
//! directory read, glob segments filter a directory listing through the
//! matcher, and a `**` segment first tries to match zero components and
//! then recurses into every subdirectory with itself still at the head.
//! Every emitted path passes the dedup set exactly once, so reconverging
//! `**` derivations cannot produce duplicates.

use std::io;
use std::path::{Path, PathBuf};

use ahash::AHashSet;

use crate::error::GlobError;
use crate::flags::GlobFlags;
use crate::fs::{DirAccess, DirEntry, DirStream, EntryKind};
use crate::ignore::IgnorePredicate;
use crate::matcher::{segment_matches, MatchOpts};
use crate::pattern::{Pattern, Segment};

/// Error callback invoked when a directory read fails. Receives the
/// offending path and the error; returning `true` aborts the call.
pub type ErrHandler<'e> = dyn FnMut(&Path, &io::Error) -> bool + 'e;

/// Join relative path pieces with `/`, keeping the empty base clean.
fn join(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

pub(crate) struct FsWalker<'g, 'e> {
    access: &'g dyn DirAccess,
    base: &'g Path,
    flags: GlobFlags,
    opts: MatchOpts,
    ignore: Option<&'g dyn IgnorePredicate>,
    errfunc: Option<&'g mut ErrHandler<'e>>,
    seen: AHashSet<String>,
    out: Vec<String>,
    // Per-pattern state, reset by `walk`.
    absolute: bool,
    need_dir: bool,
}

impl<'g, 'e> FsWalker<'g, 'e> {
    pub fn new(
        access: &'g dyn DirAccess,
        base: &'g Path,
        flags: GlobFlags,
        ignore: Option<&'g dyn IgnorePredicate>,
        errfunc: Option<&'g mut ErrHandler<'e>>,
    ) -> Self {
        FsWalker {
            access,
            base,
            flags,
            opts: MatchOpts::from_flags(flags),
            ignore,
            errfunc,
            seen: AHashSet::new(),
            out: Vec::new(),
            absolute: false,
            need_dir: false,
        }
    }

    /// Walk one compiled sub-pattern, accumulating matches. The dedup set
    /// spans all sub-patterns of the call, so brace alternatives that
    /// reconverge emit once.
    pub fn walk(&mut self, pattern: &Pattern) -> Result<(), GlobError> {
        self.absolute = pattern.is_absolute();
        self.need_dir = pattern.requires_dir() || self.flags.contains(GlobFlags::ONLYDIR);

        if pattern.segments().is_empty() {
            if self.absolute {
                // The pattern was `/`.
                self.emit("", Some(EntryKind::Dir));
            }
            return Ok(());
        }

        self.walk_segments("", pattern.segments())
    }

    /// The matches collected so far, in emission order.
    pub fn into_matches(self) -> Vec<String> {
        self.out
    }

    /// Physical location of a traversal-relative path.
    fn physical(&self, rel: &str) -> PathBuf {
        let root = if self.absolute {
            PathBuf::from("/")
        } else {
            self.base.to_path_buf()
        };
        if rel.is_empty() {
            root
        } else {
            root.join(rel)
        }
    }

    fn walk_segments(&mut self, rel: &str, segs: &[Segment]) -> Result<(), GlobError> {
        let Some((head, tail)) = segs.split_first() else {
            self.emit(rel, None);
            return Ok(());
        };

        match head {
            Segment::Literal(name) => {
                let child = join(rel, name);
                if tail.is_empty() {
                    // Direct probe, no directory read.
                    if let Some(kind) = self.access.probe(&self.physical(&child)) {
                        self.emit(&child, Some(kind));
                    }
                } else if !self.subtree_ignored(&child) && self.descendable(&child, None) {
                    self.walk_segments(&child, tail)?;
                }
                Ok(())
            }

            Segment::Glob(raw) => {
                let entries = self.read_dir(rel)?;
                for entry in entries {
                    if !segment_matches(raw.as_bytes(), entry.name.as_bytes(), &self.opts) {
                        continue;
                    }
                    let child = join(rel, &entry.name);
                    if tail.is_empty() {
                        self.emit(&child, Some(entry.kind));
                    } else if !self.subtree_ignored(&child)
                        && self.descendable(&child, Some(entry.kind))
                    {
                        self.walk_segments(&child, tail)?;
                    }
                }
                Ok(())
            }

            Segment::Recursive => {
                // Zero intermediate components first: `a/**/b` covers `a/b`.
                self.walk_segments(rel, tail)?;

                let entries = self.read_dir(rel)?;
                for entry in entries {
                    // Components consumed by `**` follow the wildcard
                    // hidden-file rule.
                    if !self.opts.period && entry.name.starts_with('.') {
                        continue;
                    }
                    let child = join(rel, &entry.name);
                    if self.subtree_ignored(&child) || !self.recursable(&child, entry.kind) {
                        continue;
                    }
                    // Same segment list, `**` still at the head.
                    self.walk_segments(&child, segs)?;
                }
                Ok(())
            }
        }
    }

    /// Is this directory's whole subtree excluded? Every descent — literal,
    /// glob and `**` alike — is gated on this, so an ignored directory is
    /// never entered no matter which segment kind reaches it.
    fn subtree_ignored(&self, rel: &str) -> bool {
        self.ignore.is_some_and(|ignore| ignore.subtree_ignored(rel))
    }

    /// Can an explicit (literal or glob) segment advance through this
    /// entry? Symlinks and unknowns resolve through a probe, so links to
    /// directories are followed just like a shell would.
    fn descendable(&self, rel: &str, kind: Option<EntryKind>) -> bool {
        match kind {
            Some(EntryKind::Dir) => true,
            Some(EntryKind::File) => false,
            Some(EntryKind::Symlink) | Some(EntryKind::Unknown) | None => {
                self.access.probe(&self.physical(rel)) == Some(EntryKind::Dir)
            }
        }
    }

    /// Can `**` recurse into this entry? Unknown types are resolved by
    /// probing; symlinks are not followed, keeping cyclic trees finite.
    fn recursable(&self, rel: &str, kind: EntryKind) -> bool {
        match kind {
            EntryKind::Dir => true,
            EntryKind::Unknown => self.access.probe(&self.physical(rel)) == Some(EntryKind::Dir),
            EntryKind::File | EntryKind::Symlink => false,
        }
    }

    /// Read one directory, routing failures through the error callback.
    /// A skipped directory reads as empty.
    fn read_dir(&mut self, rel: &str) -> Result<Vec<DirEntry>, GlobError> {
        let path = self.physical(rel);
        let access = self.access;

        let mut stream = match access.open_dir(&path) {
            Ok(stream) => stream,
            Err(err) => {
                self.report(&path, err)?;
                return Ok(Vec::new());
            }
        };

        let mut entries = Vec::new();
        loop {
            match stream.next_entry() {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => break,
                Err(err) => {
                    drop(stream);
                    self.report(&path, err)?;
                    return Ok(Vec::new());
                }
            }
        }

        if !self.flags.contains(GlobFlags::NOSORT) {
            entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        }
        Ok(entries)
    }

    fn report(&mut self, path: &Path, err: io::Error) -> Result<(), GlobError> {
        let abort = match self.errfunc.as_mut() {
            Some(f) => (**f)(path, &err),
            None => false,
        };
        if abort || self.flags.contains(GlobFlags::ERR) {
            Err(GlobError::Aborted)
        } else {
            Ok(())
        }
    }

    fn emit(&mut self, rel: &str, kind: Option<EntryKind>) {
        if rel.is_empty() && !self.absolute {
            // The walk base itself is not a pathname the caller asked for.
            return;
        }

        // Directory-ness is only resolved when a filter actually needs it.
        let wants_kind =
            self.need_dir || self.flags.contains(GlobFlags::MARK) || self.ignore.is_some();
        let is_dir = wants_kind && self.resolve_is_dir(rel, kind);

        if self.need_dir && !is_dir {
            return;
        }
        if let Some(ignore) = self.ignore {
            if ignore.is_ignored(rel, is_dir) {
                return;
            }
        }

        let mut path = if self.absolute {
            format!("/{rel}")
        } else {
            rel.to_string()
        };
        if self.flags.contains(GlobFlags::MARK) && is_dir && !path.ends_with('/') {
            path.push('/');
        }

        if self.seen.insert(path.clone()) {
            self.out.push(path);
        }
    }

    /// Resolve whether the entry is (or links to) a directory, probing
    /// when the iterator could not classify it.
    fn resolve_is_dir(&self, rel: &str, kind: Option<EntryKind>) -> bool {
        match kind {
            Some(EntryKind::Dir) => true,
            Some(EntryKind::File) => false,
            Some(EntryKind::Symlink) | Some(EntryKind::Unknown) | None => {
                self.access.probe(&self.physical(rel)) == Some(EntryKind::Dir)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalDirAccess;
    use std::fs::{self, File};
    use tempfile::TempDir;

    /// Deterministic in-memory directory source for iterator-injection
    /// tests. Paths are keyed by their full string form.
    pub(crate) struct MemDirAccess {
        dirs: Vec<(String, Vec<(String, EntryKind)>)>,
    }

    impl MemDirAccess {
        pub fn new(dirs: &[(&str, &[(&str, EntryKind)])]) -> Self {
            MemDirAccess {
                dirs: dirs
                    .iter()
                    .map(|(path, entries)| {
                        (
                            path.to_string(),
                            entries
                                .iter()
                                .map(|(n, k)| (n.to_string(), *k))
                                .collect(),
                        )
                    })
                    .collect(),
            }
        }
    }

    struct MemStream {
        entries: Vec<(String, EntryKind)>,
        pos: usize,
    }

    impl crate::fs::DirStream for MemStream {
        fn next_entry(&mut self) -> io::Result<Option<DirEntry>> {
            match self.entries.get(self.pos) {
                None => Ok(None),
                Some((name, kind)) => {
                    self.pos += 1;
                    Ok(Some(DirEntry {
                        name: name.clone(),
                        kind: *kind,
                    }))
                }
            }
        }
    }

    impl DirAccess for MemDirAccess {
        fn open_dir(&self, path: &Path) -> io::Result<Box<dyn crate::fs::DirStream + '_>> {
            let key = path.to_string_lossy();
            for (dir, entries) in &self.dirs {
                if dir == key.as_ref() {
                    return Ok(Box::new(MemStream {
                        entries: entries.clone(),
                        pos: 0,
                    }));
                }
            }
            Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"))
        }
    }

    fn create_test_fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        let base = temp.path();

        File::create(base.join("foo.txt")).unwrap();
        File::create(base.join("bar.txt")).unwrap();
        File::create(base.join("baz.js")).unwrap();
        File::create(base.join(".hidden")).unwrap();

        fs::create_dir_all(base.join("src")).unwrap();
        File::create(base.join("src/main.js")).unwrap();
        File::create(base.join("src/util.js")).unwrap();

        fs::create_dir_all(base.join("src/lib")).unwrap();
        File::create(base.join("src/lib/helper.js")).unwrap();

        fs::create_dir_all(base.join(".git")).unwrap();
        File::create(base.join(".git/config")).unwrap();

        temp
    }

    fn walk(temp: &TempDir, pattern: &str, flags: GlobFlags) -> Vec<String> {
        let access = LocalDirAccess;
        let compiled = Pattern::compile(pattern, flags);
        let mut walker = FsWalker::new(&access, temp.path(), flags, None, None);
        walker.walk(&compiled).unwrap();
        walker.into_matches()
    }

    #[test]
    fn test_simple_glob() {
        let temp = create_test_fixture();
        let results = walk(&temp, "*.txt", GlobFlags::NONE);
        assert_eq!(results, vec!["bar.txt", "foo.txt"]);
    }

    #[test]
    fn test_literal_segment_probe() {
        let temp = create_test_fixture();
        let results = walk(&temp, "src/main.js", GlobFlags::NONE);
        assert_eq!(results, vec!["src/main.js"]);

        assert!(walk(&temp, "src/missing.js", GlobFlags::NONE).is_empty());
        assert!(walk(&temp, "nope/main.js", GlobFlags::NONE).is_empty());
    }

    #[test]
    fn test_glob_then_literal() {
        let temp = create_test_fixture();
        let results = walk(&temp, "*/main.js", GlobFlags::NONE);
        assert_eq!(results, vec!["src/main.js"]);
    }

    #[test]
    fn test_recursive_glob() {
        let temp = create_test_fixture();
        // Zero-component matches of each directory come before descents.
        let results = walk(&temp, "**/*.js", GlobFlags::NONE);
        assert_eq!(
            results,
            vec!["baz.js", "src/main.js", "src/util.js", "src/lib/helper.js"]
        );
    }

    #[test]
    fn test_recursive_zero_components() {
        let temp = create_test_fixture();
        let results = walk(&temp, "src/**/helper.js", GlobFlags::NONE);
        assert_eq!(results, vec!["src/lib/helper.js"]);

        // `a/**/b` also matches `a/b` directly.
        let results = walk(&temp, "src/**/main.js", GlobFlags::NONE);
        assert_eq!(results, vec!["src/main.js"]);
    }

    #[test]
    fn test_recursive_trailing_emits_dirs_once() {
        let temp = create_test_fixture();
        let results = walk(&temp, "src/**", GlobFlags::NONE);
        assert_eq!(results, vec!["src", "src/lib"]);
    }

    #[test]
    fn test_hidden_file_rule() {
        let temp = create_test_fixture();
        let results = walk(&temp, "*", GlobFlags::NONE);
        assert!(!results.iter().any(|r| r.starts_with('.')));

        let results = walk(&temp, "*", GlobFlags::PERIOD);
        assert!(results.contains(&".hidden".to_string()));
        assert!(results.contains(&".git".to_string()));

        // An explicit dot always matches.
        let results = walk(&temp, ".hidden", GlobFlags::NONE);
        assert_eq!(results, vec![".hidden"]);
    }

    #[test]
    fn test_recursive_skips_hidden_dirs() {
        let temp = create_test_fixture();
        let results = walk(&temp, "**/config", GlobFlags::NONE);
        assert!(results.is_empty());

        let results = walk(&temp, "**/config", GlobFlags::PERIOD);
        assert_eq!(results, vec![".git/config"]);
    }

    #[test]
    fn test_onlydir_filter() {
        let temp = create_test_fixture();
        let results = walk(&temp, "*", GlobFlags::ONLYDIR);
        assert_eq!(results, vec!["src"]);
    }

    #[test]
    fn test_trailing_slash_requires_dir() {
        let temp = create_test_fixture();
        let results = walk(&temp, "s*/", GlobFlags::NONE);
        assert_eq!(results, vec!["src"]);
    }

    #[test]
    fn test_mark_appends_slash() {
        let temp = create_test_fixture();
        let results = walk(&temp, "*", GlobFlags::MARK);
        assert!(results.contains(&"src/".to_string()));
        assert!(results.contains(&"foo.txt".to_string()));
        assert!(!results.contains(&"src".to_string()));
    }

    #[test]
    fn test_no_matches_is_empty() {
        let temp = create_test_fixture();
        assert!(walk(&temp, "*.xyz", GlobFlags::NONE).is_empty());
    }

    #[test]
    fn test_unreadable_dir_skipped_without_err_flag() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let temp = create_test_fixture();
            let locked = temp.path().join("src/lib");
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

            let results = walk(&temp, "**/*.js", GlobFlags::NONE);

            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

            // The unreadable directory reads as empty; the rest matches.
            assert!(results.contains(&"src/main.js".to_string()));
            assert!(!results.contains(&"src/lib/helper.js".to_string()));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_err_flag_aborts_on_unreadable_dir() {
        use std::os::unix::fs::PermissionsExt;

        let temp = create_test_fixture();
        let locked = temp.path().join("src/lib");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let access = LocalDirAccess;
        let flags = GlobFlags::ERR;
        let compiled = Pattern::compile("**/*.js", flags);
        let mut walker = FsWalker::new(&access, temp.path(), flags, None, None);
        let result = walker.walk(&compiled);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(result, Err(GlobError::Aborted));
    }

    #[cfg(unix)]
    #[test]
    fn test_error_callback_sees_path_and_can_abort() {
        use std::os::unix::fs::PermissionsExt;

        let temp = create_test_fixture();
        let locked = temp.path().join("src/lib");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let access = LocalDirAccess;
        let mut seen_paths: Vec<PathBuf> = Vec::new();
        let mut handler = |path: &Path, _err: &io::Error| {
            seen_paths.push(path.to_path_buf());
            true
        };
        let compiled = Pattern::compile("**/*.js", GlobFlags::NONE);
        let mut walker = FsWalker::new(
            &access,
            temp.path(),
            GlobFlags::NONE,
            None,
            Some(&mut handler),
        );
        let result = walker.walk(&compiled);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(result, Err(GlobError::Aborted));
        assert_eq!(seen_paths, vec![locked]);
    }

    #[test]
    fn test_nosort_keeps_iterator_order() {
        let access = MemDirAccess::new(&[(
            "mem",
            &[
                ("zeta.c", EntryKind::File),
                ("alpha.c", EntryKind::File),
                ("mid.c", EntryKind::File),
            ],
        )]);

        let flags = GlobFlags::NOSORT;
        let compiled = Pattern::compile("*.c", flags);
        let mut walker = FsWalker::new(&access, Path::new("mem"), flags, None, None);
        walker.walk(&compiled).unwrap();
        assert_eq!(walker.into_matches(), vec!["zeta.c", "alpha.c", "mid.c"]);

        let flags = GlobFlags::NONE;
        let compiled = Pattern::compile("*.c", flags);
        let mut walker = FsWalker::new(&access, Path::new("mem"), flags, None, None);
        walker.walk(&compiled).unwrap();
        assert_eq!(walker.into_matches(), vec!["alpha.c", "mid.c", "zeta.c"]);
    }

    #[test]
    fn test_injected_iterator_with_unknown_kinds() {
        // Unknown entry types force probe-by-descent through the default
        // parent-scan probe.
        let access = MemDirAccess::new(&[
            (
                "mem",
                &[
                    ("sub", EntryKind::Unknown),
                    ("file.c", EntryKind::Unknown),
                ],
            ),
            ("mem/sub", &[("inner.c", EntryKind::File)]),
        ]);

        let flags = GlobFlags::NONE;
        let compiled = Pattern::compile("**/*.c", flags);
        let mut walker = FsWalker::new(&access, Path::new("mem"), flags, None, None);
        walker.walk(&compiled).unwrap();
        let results = walker.into_matches();
        assert_eq!(results, vec!["file.c", "sub/inner.c"]);
    }

    #[test]
    fn test_dedup_across_subpatterns() {
        let temp = create_test_fixture();
        let access = LocalDirAccess;
        let flags = GlobFlags::NONE;
        let mut walker = FsWalker::new(&access, temp.path(), flags, None, None);
        // Two sub-patterns matching the same file, as brace expansion
        // would produce.
        walker.walk(&Pattern::compile("*.txt", flags)).unwrap();
        walker.walk(&Pattern::compile("foo.*", flags)).unwrap();

        let results = walker.into_matches();
        let count = results.iter().filter(|r| *r == "foo.txt").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_gitignore_filter() {
        use crate::ignore::GitignoreFilter;

        let temp = create_test_fixture();
        fs::write(temp.path().join(".gitignore"), "*.js\nlib/\n").unwrap();

        let filter = GitignoreFilter::from_dir(temp.path()).unwrap();
        let access = LocalDirAccess;
        let flags = GlobFlags::NONE;
        let compiled = Pattern::compile("**/*", flags);
        let mut walker = FsWalker::new(&access, temp.path(), flags, Some(&filter), None);
        walker.walk(&compiled).unwrap();
        let results = walker.into_matches();

        assert!(results.contains(&"foo.txt".to_string()));
        assert!(results.contains(&"src".to_string()));
        assert!(!results.iter().any(|r| r.ends_with(".js")));
        assert!(!results.iter().any(|r| r.contains("lib")));
    }

    #[test]
    fn test_gitignore_blocks_explicit_descent() {
        use crate::ignore::GitignoreFilter;

        let temp = create_test_fixture();
        fs::write(temp.path().join(".gitignore"), "lib/\n").unwrap();
        let filter = GitignoreFilter::from_dir(temp.path()).unwrap();

        let access = LocalDirAccess;
        let flags = GlobFlags::NONE;

        // Literal descent: the ignored directory is never entered.
        let mut walker = FsWalker::new(&access, temp.path(), flags, Some(&filter), None);
        walker.walk(&Pattern::compile("src/lib/*.js", flags)).unwrap();
        assert!(walker.into_matches().is_empty());

        // Glob descent hits the same gate.
        let mut walker = FsWalker::new(&access, temp.path(), flags, Some(&filter), None);
        walker.walk(&Pattern::compile("src/*/helper.js", flags)).unwrap();
        assert!(walker.into_matches().is_empty());

        // Sibling files outside the ignored subtree still match.
        let mut walker = FsWalker::new(&access, temp.path(), flags, Some(&filter), None);
        walker.walk(&Pattern::compile("src/*.js", flags)).unwrap();
        assert_eq!(walker.into_matches(), vec!["src/main.js", "src/util.js"]);
    }

    #[test]
    fn test_gitignore_ancestor_rule_covers_literal_leaf() {
        use crate::ignore::GitignoreFilter;

        let temp = create_test_fixture();
        fs::write(temp.path().join(".gitignore"), "lib/\n").unwrap();
        let filter = GitignoreFilter::from_dir(temp.path()).unwrap();

        // A fully literal path to a file under the ignored directory: the
        // descent gate stops at `src/lib`, so the leaf is never probed.
        let access = LocalDirAccess;
        let flags = GlobFlags::NONE;
        let mut walker = FsWalker::new(&access, temp.path(), flags, Some(&filter), None);
        walker
            .walk(&Pattern::compile("src/lib/helper.js", flags))
            .unwrap();
        assert!(walker.into_matches().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_recursive_does_not_follow_symlinks() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("dir")).unwrap();
        File::create(temp.path().join("dir/file.c")).unwrap();
        // A cycle back to the root must not hang the walk.
        symlink(temp.path(), temp.path().join("dir/loop")).unwrap();

        let results = walk(&temp, "**/*.c", GlobFlags::NONE);
        assert_eq!(results, vec!["dir/file.c"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_segments_follow_symlinks() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        File::create(temp.path().join("real/file.c")).unwrap();
        symlink(temp.path().join("real"), temp.path().join("link")).unwrap();

        let results = walk(&temp, "link/*.c", GlobFlags::NONE);
        assert_eq!(results, vec!["link/file.c"]);
    }
}
