//! In-memory path filtering.
//!
//! The same compiled segments that drive the filesystem walker are matched
//! here against `/`-split path components, with no directory hierarchy to
//! enumerate. Matching is pure list-vs-list, which is what makes zero-copy
//! results possible: a path either survives the filter or it does not, and
//! the caller's string is never touched.

use crate::matcher::{segment_matches, MatchOpts};
use crate::pattern::{Pattern, Segment};

/// Match a compiled pattern against one path string.
///
/// Absolute patterns only match absolute paths and vice versa. Empty
/// components (doubled or trailing separators) are skipped.
pub(crate) fn path_matches(pattern: &Pattern, path: &str, opts: &MatchOpts) -> bool {
    if pattern.is_absolute() != path.starts_with('/') {
        return false;
    }

    let components: Vec<&[u8]> = path
        .split('/')
        .filter(|c| !c.is_empty())
        .map(str::as_bytes)
        .collect();

    match_components(pattern.segments(), &components, opts)
}

/// Segment list against component list. `**` either matches zero
/// components or consumes one (subject to the wildcard hidden-file rule)
/// and stays at the head.
fn match_components(segs: &[Segment], comps: &[&[u8]], opts: &MatchOpts) -> bool {
    let Some((head, tail)) = segs.split_first() else {
        return comps.is_empty();
    };

    match head {
        Segment::Literal(name) => match comps.split_first() {
            Some((comp, rest)) => *comp == name.as_bytes() && match_components(tail, rest, opts),
            None => false,
        },
        Segment::Glob(raw) => match comps.split_first() {
            Some((comp, rest)) => {
                segment_matches(raw.as_bytes(), comp, opts) && match_components(tail, rest, opts)
            }
            None => false,
        },
        Segment::Recursive => {
            if match_components(tail, comps, opts) {
                return true;
            }
            match comps.split_first() {
                Some((comp, rest)) => {
                    (opts.period || comp.first() != Some(&b'.'))
                        && match_components(segs, rest, opts)
                }
                None => false,
            }
        }
    }
}

/// Strip an absolute base prefix plus one separator from a path. The base
/// may carry one trailing `/`. Returns `None` when the path is not under
/// the base.
pub(crate) fn strip_base<'p>(path: &'p str, base: &str) -> Option<&'p str> {
    let base = base.strip_suffix('/').unwrap_or(base);
    let rest = path.strip_prefix(base)?;
    rest.strip_prefix('/')
}
