use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Sub};

/// Bit-addressed flag set controlling a glob or path-filtering call.
///
/// The bit layout is caller-visible and stable. Flags compose with `|`:
///
/// ```
/// use zlob::GlobFlags;
///
/// let flags = GlobFlags::BRACE | GlobFlags::MARK;
/// assert!(flags.contains(GlobFlags::BRACE));
/// assert!(!flags.contains(GlobFlags::PERIOD));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GlobFlags(u32);

impl GlobFlags {
    /// The empty flag set.
    pub const NONE: GlobFlags = GlobFlags(0);

    /// Abort on directory read errors instead of skipping the directory.
    pub const ERR: GlobFlags = GlobFlags(1 << 0);
    /// Append a `/` to each directory result.
    pub const MARK: GlobFlags = GlobFlags(1 << 1);
    /// Keep directory iteration order instead of sorting entries.
    pub const NOSORT: GlobFlags = GlobFlags(1 << 2);
    /// Reserve the buffer's configured number of leading null slots before
    /// the first result (see [`GlobBuf::with_offs`](crate::GlobBuf::with_offs)).
    pub const DOOFFS: GlobFlags = GlobFlags(1 << 3);
    /// If nothing matches, return the pattern itself as the single result.
    pub const NOCHECK: GlobFlags = GlobFlags(1 << 4);
    /// Append results to the buffer's existing contents.
    pub const APPEND: GlobFlags = GlobFlags(1 << 5);
    /// Backslashes are ordinary characters, not escapes.
    pub const NOESCAPE: GlobFlags = GlobFlags(1 << 6);
    /// Allow `*`, `?` and `[...]` to match a leading `.` in a name.
    pub const PERIOD: GlobFlags = GlobFlags(1 << 7);

    /// Output flag: set in the buffer's flag snapshot when the pattern
    /// contained any unescaped metacharacter. Ignored on input.
    pub const MAGCHAR: GlobFlags = GlobFlags(1 << 8);
    /// Read directories through the injected [`DirAccess`](crate::DirAccess)
    /// instead of the local filesystem.
    pub const ALTDIRFUNC: GlobFlags = GlobFlags(1 << 9);
    /// Expand `{a,b}` brace alternatives and `{x..y}` sequences.
    pub const BRACE: GlobFlags = GlobFlags(1 << 10);
    /// If the pattern contains no metacharacters, return it verbatim.
    pub const NOMAGIC: GlobFlags = GlobFlags(1 << 11);
    /// Expand `~` and `~user` prefixes to home directories.
    pub const TILDE: GlobFlags = GlobFlags(1 << 12);
    /// Match only directories.
    pub const ONLYDIR: GlobFlags = GlobFlags(1 << 13);
    /// Like [`TILDE`](Self::TILDE), but fail with no-match when the home
    /// directory cannot be resolved.
    pub const TILDE_CHECK: GlobFlags = GlobFlags(1 << 14);
    /// Filter filesystem results through the base directory's `.gitignore`.
    pub const GITIGNORE: GlobFlags = GlobFlags(1 << 15);
    /// Accepted for compatibility: `**` recursion is always recognized, so
    /// this bit only shows up in the flag snapshot.
    pub const GLOBSTAR: GlobFlags = GlobFlags(1 << 16);
    /// Enable extended groups `?(..)`, `*(..)`, `+(..)`, `@(..)`, `!(..)`.
    pub const EXTGLOB: GlobFlags = GlobFlags(1 << 17);

    /// The recommended flag combination for general-purpose matching.
    pub const RECOMMENDED: GlobFlags =
        GlobFlags(Self::BRACE.0 | Self::GLOBSTAR.0 | Self::EXTGLOB.0);

    /// Returns true if every bit of `other` is set in `self`.
    #[inline]
    pub fn contains(self, other: GlobFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if no bit is set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The raw bit representation.
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Reconstructs a flag set from raw bits. Unknown bits are kept as-is
    /// so that snapshots round-trip.
    #[inline]
    pub fn from_bits(bits: u32) -> GlobFlags {
        GlobFlags(bits)
    }
}

impl BitOr for GlobFlags {
    type Output = GlobFlags;
    fn bitor(self, rhs: GlobFlags) -> GlobFlags {
        GlobFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for GlobFlags {
    fn bitor_assign(&mut self, rhs: GlobFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for GlobFlags {
    type Output = GlobFlags;
    fn bitand(self, rhs: GlobFlags) -> GlobFlags {
        GlobFlags(self.0 & rhs.0)
    }
}

impl Sub for GlobFlags {
    type Output = GlobFlags;
    fn sub(self, rhs: GlobFlags) -> GlobFlags {
        GlobFlags(self.0 & !rhs.0)
    }
}

impl fmt::Debug for GlobFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u32, &str); 18] = [
            (1 << 0, "ERR"),
            (1 << 1, "MARK"),
            (1 << 2, "NOSORT"),
            (1 << 3, "DOOFFS"),
            (1 << 4, "NOCHECK"),
            (1 << 5, "APPEND"),
            (1 << 6, "NOESCAPE"),
            (1 << 7, "PERIOD"),
            (1 << 8, "MAGCHAR"),
            (1 << 9, "ALTDIRFUNC"),
            (1 << 10, "BRACE"),
            (1 << 11, "NOMAGIC"),
            (1 << 12, "TILDE"),
            (1 << 13, "ONLYDIR"),
            (1 << 14, "TILDE_CHECK"),
            (1 << 15, "GITIGNORE"),
            (1 << 16, "GLOBSTAR"),
            (1 << 17, "EXTGLOB"),
        ];

        if self.0 == 0 {
            return write!(f, "GlobFlags(NONE)");
        }

        write!(f, "GlobFlags(")?;
        let mut first = true;
        for (bit, name) in NAMES {
            if self.0 & bit != 0 {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(GlobFlags::default().is_empty());
        assert_eq!(GlobFlags::default(), GlobFlags::NONE);
    }

    #[test]
    fn test_bit_positions_are_stable() {
        assert_eq!(GlobFlags::ERR.bits(), 0x0001);
        assert_eq!(GlobFlags::MARK.bits(), 0x0002);
        assert_eq!(GlobFlags::NOSORT.bits(), 0x0004);
        assert_eq!(GlobFlags::DOOFFS.bits(), 0x0008);
        assert_eq!(GlobFlags::NOCHECK.bits(), 0x0010);
        assert_eq!(GlobFlags::APPEND.bits(), 0x0020);
        assert_eq!(GlobFlags::NOESCAPE.bits(), 0x0040);
        assert_eq!(GlobFlags::PERIOD.bits(), 0x0080);
        assert_eq!(GlobFlags::MAGCHAR.bits(), 0x0100);
        assert_eq!(GlobFlags::ALTDIRFUNC.bits(), 0x0200);
        assert_eq!(GlobFlags::BRACE.bits(), 0x0400);
        assert_eq!(GlobFlags::NOMAGIC.bits(), 0x0800);
        assert_eq!(GlobFlags::TILDE.bits(), 0x1000);
        assert_eq!(GlobFlags::ONLYDIR.bits(), 0x2000);
        assert_eq!(GlobFlags::TILDE_CHECK.bits(), 0x4000);
    }

    #[test]
    fn test_compose_and_contains() {
        let flags = GlobFlags::BRACE | GlobFlags::TILDE | GlobFlags::MARK;
        assert!(flags.contains(GlobFlags::BRACE));
        assert!(flags.contains(GlobFlags::BRACE | GlobFlags::MARK));
        assert!(!flags.contains(GlobFlags::PERIOD));
        assert!(!flags.contains(flags | GlobFlags::ERR));
    }

    #[test]
    fn test_subtract() {
        let flags = GlobFlags::MAGCHAR | GlobFlags::NOSORT;
        let cleared = flags - GlobFlags::MAGCHAR;
        assert!(!cleared.contains(GlobFlags::MAGCHAR));
        assert!(cleared.contains(GlobFlags::NOSORT));
    }

    #[test]
    fn test_recommended_preset() {
        assert!(GlobFlags::RECOMMENDED.contains(GlobFlags::BRACE));
        assert!(GlobFlags::RECOMMENDED.contains(GlobFlags::GLOBSTAR));
        assert!(GlobFlags::RECOMMENDED.contains(GlobFlags::EXTGLOB));
        assert!(!GlobFlags::RECOMMENDED.contains(GlobFlags::PERIOD));
    }

    #[test]
    fn test_bits_round_trip() {
        let flags = GlobFlags::BRACE | GlobFlags::ONLYDIR;
        assert_eq!(GlobFlags::from_bits(flags.bits()), flags);
    }

    #[test]
    fn test_debug_lists_names() {
        let flags = GlobFlags::BRACE | GlobFlags::MARK;
        let repr = format!("{flags:?}");
        assert!(repr.contains("MARK"));
        assert!(repr.contains("BRACE"));
        assert_eq!(format!("{:?}", GlobFlags::NONE), "GlobFlags(NONE)");
    }
}
