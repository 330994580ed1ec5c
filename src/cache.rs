//! Global cache of compiled patterns.
//!
//! Brace expansion fans one input out into many sub-patterns, and callers
//! routinely re-run the same patterns. Compilation is cheap but not free,
//! so compiled patterns are shared through a small LRU keyed on the
//! pattern text plus the flag bits that affect compilation.

use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock, RwLock};

use lru::LruCache;

use crate::flags::GlobFlags;
use crate::pattern::Pattern;

const CACHE_SIZE: usize = 1024;

/// Only these bits change the compiled form; everything else is matching
/// or walking behavior.
fn compile_bits(flags: GlobFlags) -> u32 {
    flags.bits() & (GlobFlags::NOESCAPE.bits() | GlobFlags::EXTGLOB.bits())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PatternCacheKey {
    pattern: String,
    bits: u32,
}

static PATTERN_CACHE: OnceLock<RwLock<LruCache<PatternCacheKey, Arc<Pattern>>>> = OnceLock::new();

fn cache() -> &'static RwLock<LruCache<PatternCacheKey, Arc<Pattern>>> {
    PATTERN_CACHE.get_or_init(|| {
        RwLock::new(LruCache::new(
            NonZeroUsize::new(CACHE_SIZE).expect("cache size is nonzero"),
        ))
    })
}

/// Fetch a compiled pattern, compiling and inserting on miss.
///
/// Reads take the shared lock so concurrent callers do not serialize on
/// cache hits; the write lock re-checks before inserting in case another
/// thread compiled the same key in between.
pub(crate) fn get_or_compile(pattern: &str, flags: GlobFlags) -> Arc<Pattern> {
    let key = PatternCacheKey {
        pattern: pattern.to_string(),
        bits: compile_bits(flags),
    };

    if let Ok(guard) = cache().read() {
        if let Some(cached) = guard.peek(&key) {
            return Arc::clone(cached);
        }
    }

    let compiled = Arc::new(Pattern::compile(pattern, flags));

    if let Ok(mut guard) = cache().write() {
        if let Some(cached) = guard.peek(&key) {
            return Arc::clone(cached);
        }
        guard.put(key, Arc::clone(&compiled));
    }

    compiled
}
