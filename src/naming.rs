//! Accessor identifier derivation.
//!
//! Raw keys become lower-case, underscore-separated identifiers; nested
//! accessors chain the parent identifier as a suffix, so the path
//! `settings → notifications → push` yields `push_notifications_settings`.

/// Normalize a raw name into a canonical identifier.
///
/// Lower-cases, collapses every run of non-alphanumeric characters into a
/// single underscore, and trims leading/trailing underscores.
///
/// # Examples
///
/// ```
/// use deepstore::normalize_name;
///
/// assert_eq!(normalize_name("Push Notifications"), "push_notifications");
/// assert_eq!(normalize_name("e-mail!!opt_in"), "e_mail_opt_in");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Derive the accessor identifier for a key nested under a root accessor.
///
/// With `suffix` set this is `<normalized(key)>_<normalized(root)>`;
/// without it, just `<normalized(key)>`.
pub fn deep_accessor_name(root: &str, key: &str, suffix: bool) -> String {
    let key = normalize_name(key);
    if suffix {
        format!("{key}_{}", normalize_name(root))
    } else {
        key
    }
}
