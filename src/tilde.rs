//! Tilde expansion.
//!
//! `~`, `~/rest` and `~user/rest` are rewritten at position 0 of the
//! pattern only, and only when the tilde flags request it. Resolution goes
//! through the [`HomeLookup`] trait so tests and embedders can supply
//! deterministic homes; the default implementation reads `$HOME` and the
//! passwd database.

use std::borrow::Cow;
use std::path::PathBuf;

use crate::error::GlobError;
use crate::flags::GlobFlags;

/// Home-directory provider consulted for `~` and `~user` prefixes.
pub trait HomeLookup {
    /// The current user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// The named user's home directory.
    fn user_home(&self, user: &str) -> Option<PathBuf>;
}

/// Default provider: `$HOME` for the bare tilde, the passwd database for
/// `~user` (Unix only).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHome;

impl HomeLookup for SystemHome {
    fn home_dir(&self) -> Option<PathBuf> {
        std::env::var_os("HOME").map(PathBuf::from)
    }

    #[cfg(unix)]
    fn user_home(&self, user: &str) -> Option<PathBuf> {
        passwd_home(user)
    }

    #[cfg(not(unix))]
    fn user_home(&self, _user: &str) -> Option<PathBuf> {
        None
    }
}

#[cfg(unix)]
fn passwd_home(user: &str) -> Option<PathBuf> {
    use std::ffi::{CStr, CString};
    use std::os::unix::ffi::OsStrExt;

    let cname = CString::new(user).ok()?;
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let mut buf = vec![0 as libc::c_char; 1024];

    loop {
        let rc = unsafe {
            libc::getpwnam_r(
                cname.as_ptr(),
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < (1 << 16) {
            let new_len = buf.len() * 2;
            buf.resize(new_len, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        let dir = unsafe { CStr::from_ptr(pwd.pw_dir) };
        return Some(PathBuf::from(std::ffi::OsStr::from_bytes(dir.to_bytes())));
    }
}

/// Expand a leading tilde when the flags ask for it.
///
/// Resolution failure leaves the tilde literal, unless
/// [`GlobFlags::TILDE_CHECK`] is set, in which case the call fails with
/// no-match.
pub(crate) fn expand_tilde<'p>(
    pattern: &'p str,
    flags: GlobFlags,
    home: &dyn HomeLookup,
) -> Result<Cow<'p, str>, GlobError> {
    let wanted = flags.contains(GlobFlags::TILDE) || flags.contains(GlobFlags::TILDE_CHECK);
    if !wanted || !pattern.starts_with('~') {
        return Ok(Cow::Borrowed(pattern));
    }

    let after = &pattern[1..];
    let (user, rest) = match after.find('/') {
        Some(idx) => (&after[..idx], &after[idx..]),
        None => (after, ""),
    };

    let dir = if user.is_empty() {
        home.home_dir()
    } else {
        home.user_home(user)
    };

    match dir {
        Some(d) => {
            let mut expanded = d.to_string_lossy().into_owned();
            // `~/` must not produce a doubled separator.
            if expanded.ends_with('/') && rest.starts_with('/') {
                expanded.pop();
            }
            expanded.push_str(rest);
            Ok(Cow::Owned(expanded))
        }
        None if flags.contains(GlobFlags::TILDE_CHECK) => Err(GlobError::NoMatch),
        None => Ok(Cow::Borrowed(pattern)),
    }
}
