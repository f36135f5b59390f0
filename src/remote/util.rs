//! Path helpers for SSH client options.

/// Expands a leading `~/` to the local user's home directory.
///
/// Paths are returned unchanged when they do not start with `~/` or when
/// `HOME` is unset.
///
/// # Examples
///
/// ```
/// # use gab::remote::expand_tilde;
/// assert_eq!(expand_tilde("/etc/ssh/key"), "/etc/ssh/key");
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => format!("{}/{rest}", home.to_string_lossy()),
        _ => path.to_owned(),
    }
}
