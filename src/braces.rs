//! Brace expansion.
//!
//! `a{b,c{d,e}}f` expands to `abf`, `acdf`, `acef`. Alternatives are
//! separated by commas at the top nesting level of each brace pair;
//! `{x..y}` and `{x..y..step}` generate numeric or alphabetic sequences.
//! Unbalanced and empty braces are emitted literally, and the result list
//! is deduplicated preserving first occurrence.

use ahash::AHashSet;

use crate::error::GlobError;

// Sentinel tokens standing in for escaped characters while braces are
// parsed. NUL cannot occur in a pathname, so these never collide.
const ESC_SLASH: &str = "\x00SLASH\x00";
const ESC_OPEN: &str = "\x00OPEN\x00";
const ESC_CLOSE: &str = "\x00CLOSE\x00";
const ESC_COMMA: &str = "\x00COMMA\x00";

/// Nesting budget. Brace pairs nested deeper than this stop expanding and
/// pass through literally.
const MAX_BRACE_DEPTH: usize = 64;

/// Hard cap on the number of generated sub-patterns.
const MAX_EXPANSIONS: usize = 1 << 16;

/// Expand all brace constructs in a pattern.
///
/// Returns the ordered, first-occurrence-deduplicated list of sub-patterns.
/// A pattern without braces expands to itself. Whitespace inside braces is
/// significant: `{a, b}` produces `a` and ` b`.
pub fn expand_braces(pattern: &str, noescape: bool) -> Result<Vec<String>, GlobError> {
    if pattern.is_empty() {
        return Ok(vec![String::new()]);
    }

    let escaped = if noescape {
        pattern.to_string()
    } else {
        escape_braces(pattern)
    };

    let expanded = expand_internal(&escaped, 0)?;

    let mut seen: AHashSet<String> = AHashSet::with_capacity(expanded.len());
    let mut out = Vec::with_capacity(expanded.len());
    for sub in expanded {
        let restored = if noescape { sub } else { unescape_braces(&sub) };
        if seen.insert(restored.clone()) {
            out.push(restored);
        }
    }
    Ok(out)
}

/// Hide escaped metacharacters from the brace parser.
fn escape_braces(s: &str) -> String {
    s.replace("\\\\", ESC_SLASH)
        .replace("\\{", ESC_OPEN)
        .replace("\\}", ESC_CLOSE)
        .replace("\\,", ESC_COMMA)
}

/// Restore hidden escapes, keeping the backslashes so later compilation
/// stages still see them as escaped.
fn unescape_braces(s: &str) -> String {
    s.replace(ESC_SLASH, "\\\\")
        .replace(ESC_OPEN, "\\{")
        .replace(ESC_CLOSE, "\\}")
        .replace(ESC_COMMA, "\\,")
}

/// Find the first balanced `{...}` pair, returning the byte offsets of the
/// opening and closing braces.
fn find_balanced(s: &str) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    let mut open_idx = None;
    let mut depth = 0usize;

    for (i, &c) in bytes.iter().enumerate() {
        if c == b'{' {
            if open_idx.is_none() {
                open_idx = Some(i);
            }
            depth += 1;
        } else if c == b'}' && depth > 0 {
            depth -= 1;
            if depth == 0 {
                return open_idx.map(|start| (start, i));
            }
        }
    }
    None
}

/// Split into (prefix, brace body, suffix) around the first balanced pair.
fn balanced_match(s: &str) -> Option<(&str, &str, &str)> {
    find_balanced(s).map(|(start, end)| (&s[..start], &s[start + 1..end], &s[end + 1..]))
}

/// Split a brace body on top-level commas, leaving nested braces intact.
fn split_alternatives(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, &c) in bytes.iter().enumerate() {
        match c {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_single_alpha(s: &str) -> bool {
    s.len() == 1 && s.as_bytes()[0].is_ascii_alphabetic()
}

/// A number string with leading zeros requests zero padding of the output.
fn is_padded(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    digits.len() > 1 && digits.starts_with('0')
}

/// Parse `x..y` or `x..y..step` into the generated sequence, or `None` if
/// the body is not a sequence at all.
fn parse_sequence(body: &str) -> Option<Vec<String>> {
    let parts: Vec<&str> = body.split("..").collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    if parts.len() == 3 && !is_integer(parts[2]) {
        return None;
    }

    if is_integer(parts[0]) && is_integer(parts[1]) {
        Some(generate_sequence(&parts, false))
    } else if is_single_alpha(parts[0]) && is_single_alpha(parts[1]) {
        Some(generate_sequence(&parts, true))
    } else {
        None
    }
}

fn sequence_value(s: &str, alpha: bool) -> i64 {
    if alpha {
        s.bytes().next().unwrap_or(0) as i64
    } else {
        s.parse::<i64>().unwrap_or(0)
    }
}

fn generate_sequence(parts: &[&str], alpha: bool) -> Vec<String> {
    let x = sequence_value(parts[0], alpha);
    let y = sequence_value(parts[1], alpha);
    let width = parts[0].len().max(parts[1].len());
    let mut step = if parts.len() == 3 {
        sequence_value(parts[2], false).abs().max(1)
    } else {
        1
    };

    let reverse = y < x;
    if reverse {
        step = -step;
    }

    let pad = !alpha && parts.iter().take(2).any(|p| is_padded(p));

    let mut out = Vec::new();
    let mut i = x;
    loop {
        let in_range = if reverse { i >= y } else { i <= y };
        if !in_range {
            break;
        }

        if alpha {
            out.push(((i as u8) as char).to_string());
        } else {
            let mut s = i.to_string();
            if pad {
                let need = width.saturating_sub(s.len());
                if need > 0 {
                    let zeros = "0".repeat(need);
                    s = if i < 0 {
                        format!("-{}{}", zeros, &s[1..])
                    } else {
                        format!("{zeros}{s}")
                    };
                }
            }
            out.push(s);
        }

        i += step;
    }
    out
}

/// Cross-product expansion around the first balanced brace pair, recursing
/// into the suffix and into each alternative.
fn expand_internal(s: &str, depth: usize) -> Result<Vec<String>, GlobError> {
    if depth > MAX_BRACE_DEPTH {
        return Ok(vec![s.to_string()]);
    }

    let Some((pre, body, post)) = balanced_match(s) else {
        return Ok(vec![s.to_string()]);
    };

    let post_expansions = if post.is_empty() {
        vec![String::new()]
    } else {
        expand_internal(post, depth + 1)?
    };

    // A body with neither top-level commas nor a sequence is not an
    // expansion: the braces themselves are literal.
    let parts: Vec<String> = if let Some(seq) = parse_sequence(body) {
        seq
    } else if split_alternatives(body).len() > 1 {
        let mut parts = Vec::new();
        for alt in split_alternatives(body) {
            parts.extend(expand_internal(alt, depth + 1)?);
        }
        parts
    } else {
        // The brace pair itself is literal, but the body and the suffix
        // may still contain expandable groups.
        let inner = expand_internal(body, depth + 1)?;
        if inner.len().saturating_mul(post_expansions.len()) > MAX_EXPANSIONS {
            return Err(GlobError::NoSpace);
        }
        let mut out = Vec::with_capacity(inner.len() * post_expansions.len());
        for b in &inner {
            for p in &post_expansions {
                out.push(format!("{pre}{{{b}}}{p}"));
            }
        }
        return Ok(out);
    };

    if parts.len().saturating_mul(post_expansions.len()) > MAX_EXPANSIONS {
        return Err(GlobError::NoSpace);
    }

    let mut out = Vec::with_capacity(parts.len() * post_expansions.len());
    for part in &parts {
        for post_exp in &post_expansions {
            out.push(format!("{pre}{part}{post_exp}"));
        }
    }
    Ok(out)
}
