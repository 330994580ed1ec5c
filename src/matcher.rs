//! Per-segment matching.
//!
//! The matcher answers one question: does a single pattern segment match a
//! single directory-entry name in full. Plain segments (`*`, `?`, `[...]`,
//! escapes, literals) run through an iterative two-pointer scan with star
//! backtracking, which is linear in practice. Segments containing extended
//! groups switch to a recursive driver that enumerates alternatives under a
//! fixed structural depth budget.

use crate::flags::GlobFlags;

/// Nesting budget for extended-group recursion. Patterns nested deeper than
/// this fail to match instead of exhausting the stack.
const MAX_GROUP_DEPTH: usize = 32;

/// Matching options derived from the call's flag set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOpts {
    /// Wildcards may match a leading `.` in a name.
    pub period: bool,
    /// Backslash is an ordinary character.
    pub noescape: bool,
    /// `?( *( +( @( !(` groups are recognized.
    pub extglob: bool,
}

impl MatchOpts {
    /// Derive matching options from a flag set.
    pub fn from_flags(flags: GlobFlags) -> MatchOpts {
        MatchOpts {
            period: flags.contains(GlobFlags::PERIOD),
            noescape: flags.contains(GlobFlags::NOESCAPE),
            extglob: flags.contains(GlobFlags::EXTGLOB),
        }
    }
}

/// Match one glob segment against one candidate name in full.
///
/// The candidate is a single path component and never contains `/`.
pub fn segment_matches(pat: &[u8], name: &[u8], opts: &MatchOpts) -> bool {
    // Hidden-file rule: a leading dot is only matched by a literal dot.
    if !opts.period && name.first() == Some(&b'.') && !literal_dot_prefix(pat, opts.noescape) {
        return false;
    }

    if opts.extglob && has_ext_group(pat, opts.noescape) {
        match_ext(pat, name, opts, 0)
    } else {
        match_iterative(pat, name, opts.noescape)
    }
}

/// True if the segment begins with a literal (possibly escaped) dot.
fn literal_dot_prefix(pat: &[u8], noescape: bool) -> bool {
    match pat.first() {
        Some(&b'.') => true,
        Some(&b'\\') if !noescape => pat.get(1) == Some(&b'.'),
        _ => false,
    }
}

/// Scan for an unescaped `X(` group opener.
fn has_ext_group(pat: &[u8], noescape: bool) -> bool {
    let mut i = 0;
    while i < pat.len() {
        if pat[i] == b'\\' && !noescape && i + 1 < pat.len() {
            i += 2;
            continue;
        }
        if matches!(pat[i], b'?' | b'*' | b'+' | b'@' | b'!') && pat.get(i + 1) == Some(&b'(') {
            return true;
        }
        i += 1;
    }
    false
}

/// Two-pointer scan with star backtracking: remember the last `*` and the
/// name position it started consuming at; on mismatch, let that star
/// swallow one more byte and retry.
fn match_iterative(pat: &[u8], name: &[u8], noescape: bool) -> bool {
    let mut p = 0;
    let mut n = 0;
    let mut star_p: Option<usize> = None;
    let mut star_n = 0;

    while n < name.len() {
        if p < pat.len() && pat[p] == b'*' {
            star_p = Some(p);
            star_n = n;
            p += 1;
            continue;
        }

        let advanced = if p < pat.len() {
            match_one(pat, p, name[n], noescape)
        } else {
            None
        };

        if let Some(next_p) = advanced {
            p = next_p;
            n += 1;
            continue;
        }

        match star_p {
            Some(sp) => {
                star_n += 1;
                n = star_n;
                p = sp + 1;
            }
            None => return false,
        }
    }

    // Name exhausted. Only trailing stars may remain in the pattern.
    while p < pat.len() && pat[p] == b'*' {
        p += 1;
    }
    p == pat.len()
}

/// Try to consume exactly one name byte with the pattern atom at `p`.
/// Returns the pattern index after the atom, or `None` on mismatch.
fn match_one(pat: &[u8], p: usize, ch: u8, noescape: bool) -> Option<usize> {
    match pat[p] {
        b'?' => (ch != b'/').then_some(p + 1),
        b'[' => match match_class(pat, p, ch, noescape) {
            Some((matched, next)) => (matched && ch != b'/').then_some(next),
            // Unterminated class: the bracket is a literal.
            None => (ch == b'[').then_some(p + 1),
        },
        b'\\' if !noescape && p + 1 < pat.len() => (pat[p + 1] == ch).then_some(p + 2),
        lit => (lit == ch).then_some(p + 1),
    }
}

/// Evaluate a bracket class starting at `pat[p] == b'['` against one byte.
///
/// Returns `(matched, index_past_closing_bracket)`, or `None` when the
/// class is unterminated. A leading `!` or `^` negates; `]` is literal in
/// first position; `a-z` is an inclusive byte range; `/` never matches.
fn match_class(pat: &[u8], p: usize, ch: u8, noescape: bool) -> Option<(bool, usize)> {
    debug_assert_eq!(pat[p], b'[');
    let mut i = p + 1;

    let mut negate = false;
    if matches!(pat.get(i), Some(&b'!') | Some(&b'^')) {
        negate = true;
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    while i < pat.len() {
        if pat[i] == b']' && !first {
            return Some((ch != b'/' && (matched != negate), i + 1));
        }
        first = false;

        let (lo, next) = class_atom(pat, i, noescape);
        i = next;

        if i + 1 < pat.len() && pat[i] == b'-' && pat[i + 1] != b']' {
            let (hi, next) = class_atom(pat, i + 1, noescape);
            i = next;
            if lo <= ch && ch <= hi {
                matched = true;
            }
        } else if lo == ch {
            matched = true;
        }
    }

    None
}

/// One class member, resolving a backslash escape when enabled.
fn class_atom(pat: &[u8], i: usize, noescape: bool) -> (u8, usize) {
    if pat[i] == b'\\' && !noescape && i + 1 < pat.len() {
        (pat[i + 1], i + 2)
    } else {
        (pat[i], i + 1)
    }
}

/// A parsed extended group `X(a|b|...)` and the pattern remainder after it.
struct Group<'p> {
    kind: u8,
    alts: Vec<&'p [u8]>,
    rest: &'p [u8],
}

/// Parse a group at the head of the pattern. Returns `None` when the head
/// is not a group opener or the group is unterminated (in which case the
/// characters match literally).
fn parse_group<'p>(pat: &'p [u8], noescape: bool) -> Option<Group<'p>> {
    let kind = *pat.first()?;
    if !matches!(kind, b'?' | b'*' | b'+' | b'@' | b'!') || pat.get(1) != Some(&b'(') {
        return None;
    }

    let mut depth = 1usize;
    let mut alts = Vec::new();
    let mut start = 2;
    let mut i = 2;
    while i < pat.len() {
        match pat[i] {
            b'\\' if !noescape && i + 1 < pat.len() => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    alts.push(&pat[start..i]);
                    return Some(Group {
                        kind,
                        alts,
                        rest: &pat[i + 1..],
                    });
                }
            }
            b'|' if depth == 1 => {
                alts.push(&pat[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Recursive matcher used when the segment contains extended groups.
/// `depth` counts structural descents into group alternatives.
fn match_ext(pat: &[u8], name: &[u8], opts: &MatchOpts, depth: usize) -> bool {
    if depth > MAX_GROUP_DEPTH {
        return false;
    }
    if pat.is_empty() {
        return name.is_empty();
    }

    if let Some(group) = parse_group(pat, opts.noescape) {
        return match_group(&group, name, opts, depth);
    }

    match pat[0] {
        b'*' => {
            // Collapse consecutive stars, but stop before a `*(` opener.
            let mut p = 1;
            while p < pat.len() && pat[p] == b'*' && pat.get(p + 1) != Some(&b'(') {
                p += 1;
            }
            (0..=name.len()).any(|k| match_ext(&pat[p..], &name[k..], opts, depth))
        }
        b'?' => {
            !name.is_empty() && name[0] != b'/' && match_ext(&pat[1..], &name[1..], opts, depth)
        }
        b'[' => {
            if name.is_empty() {
                return false;
            }
            match match_class(pat, 0, name[0], opts.noescape) {
                Some((true, next)) => match_ext(&pat[next..], &name[1..], opts, depth),
                Some((false, _)) => false,
                None => name[0] == b'[' && match_ext(&pat[1..], &name[1..], opts, depth),
            }
        }
        b'\\' if !opts.noescape && pat.len() > 1 => {
            !name.is_empty() && name[0] == pat[1] && match_ext(&pat[2..], &name[1..], opts, depth)
        }
        lit => !name.is_empty() && name[0] == lit && match_ext(&pat[1..], &name[1..], opts, depth),
    }
}

fn match_group(g: &Group<'_>, name: &[u8], opts: &MatchOpts, depth: usize) -> bool {
    if depth >= MAX_GROUP_DEPTH {
        return false;
    }
    let d = depth + 1;
    match g.kind {
        b'@' => match_once(g, name, opts, d),
        b'?' => match_ext(g.rest, name, opts, d) || match_once(g, name, opts, d),
        b'*' => match_ext(g.rest, name, opts, d) || match_repeat(g, name, opts, d),
        b'+' => match_repeat(g, name, opts, d),
        b'!' => match_negated(g, name, opts, d),
        _ => false,
    }
}

/// Exactly one occurrence of some alternative, then the rest of the segment.
fn match_once(g: &Group<'_>, name: &[u8], opts: &MatchOpts, depth: usize) -> bool {
    for alt in &g.alts {
        for k in 0..=name.len() {
            if match_ext(alt, &name[..k], opts, depth)
                && match_ext(g.rest, &name[k..], opts, depth)
            {
                return true;
            }
        }
    }
    false
}

/// One or more nonempty occurrences, then the rest of the segment.
///
/// Occurrence starts are explored with an explicit worklist over name
/// positions, so stack depth stays bounded by the pattern's structure and
/// never by the name length: an adversarial multi-megabyte component
/// cannot overflow the stack. Every position is expanded at most once.
fn match_repeat(g: &Group<'_>, name: &[u8], opts: &MatchOpts, depth: usize) -> bool {
    // Fixed-size alternatives cap how far one occurrence can reach, which
    // keeps the common `+(ab)`-style repetition linear in the name.
    let reach: Vec<Option<usize>> = g
        .alts
        .iter()
        .map(|alt| alt_max_len(alt, opts.noescape))
        .collect();

    let mut visited = vec![false; name.len() + 1];
    let mut work = vec![0usize];
    visited[0] = true;

    while let Some(start) = work.pop() {
        for (alt, max) in g.alts.iter().zip(&reach) {
            let limit = match max {
                Some(max) => name.len().min(start + max),
                None => name.len(),
            };
            for k in start + 1..=limit {
                if visited[k] || !match_ext(alt, &name[start..k], opts, depth) {
                    continue;
                }
                if match_ext(g.rest, &name[k..], opts, depth) {
                    return true;
                }
                visited[k] = true;
                work.push(k);
            }
        }
    }
    false
}

/// Upper bound on the bytes one occurrence of an alternative can consume,
/// or `None` when it is unbounded (`*`, a nested group) or not cheaply
/// sized (a bracket class).
fn alt_max_len(alt: &[u8], noescape: bool) -> Option<usize> {
    let mut max = 0usize;
    let mut i = 0;
    while i < alt.len() {
        let c = alt[i];
        if c == b'\\' && !noescape && i + 1 < alt.len() {
            max += 1;
            i += 2;
            continue;
        }
        if c == b'*' || c == b'[' {
            return None;
        }
        if matches!(c, b'?' | b'+' | b'@' | b'!') && alt.get(i + 1) == Some(&b'(') {
            return None;
        }
        max += 1;
        i += 1;
    }
    Some(max)
}

/// For each prefix of the name: succeed when no alternative matches that
/// prefix and the rest of the segment matches the rest of the name.
fn match_negated(g: &Group<'_>, name: &[u8], opts: &MatchOpts, depth: usize) -> bool {
    'prefix: for k in 0..=name.len() {
        for alt in &g.alts {
            if match_ext(alt, &name[..k], opts, depth) {
                continue 'prefix;
            }
        }
        if match_ext(g.rest, &name[k..], opts, depth) {
            return true;
        }
    }
    false
}
