use thiserror::Error;

/// Status codes returned by the glob and path-filtering entry points.
///
/// `Ok(())` is the success status; everything else maps onto one of these
/// three variants. The engine is permissive about pattern syntax, so there
/// is deliberately no "malformed pattern" variant: unterminated classes,
/// unbalanced braces and trailing backslashes all match literally.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GlobError {
    /// An allocation failed, or an internal recursion budget was exhausted
    /// by an adversarial pattern.
    #[error("out of memory")]
    NoSpace,

    /// A directory read failed fatally (the error callback returned `true`
    /// or [`GlobFlags::ERR`](crate::GlobFlags::ERR) was set), a base path
    /// was not absolute, or result-buffer ownership modes were mixed under
    /// [`GlobFlags::APPEND`](crate::GlobFlags::APPEND).
    #[error("read error or invalid base path")]
    Aborted,

    /// The pattern matched nothing and no fallback flag applied.
    #[error("no matches found")]
    NoMatch,
}
