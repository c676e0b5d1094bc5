//! Local filename derivation.

use std::time::{SystemTime, UNIX_EPOCH};

/// Derive the local filename for a locator.
///
/// Works on the locator text as written: the query and fragment are cut off
/// and whatever follows the last `/` is the name, so a host-only locator
/// names the file after its host and non-ASCII names are kept unescaped. A
/// candidate that is empty, lacks an extension separator, or is a dot
/// segment is replaced by `file_<unix-millis>` taken from `now`.
pub fn derive_filename(locator: &str, now: SystemTime) -> String {
    let without_query = locator.split(['?', '#']).next().unwrap_or("");
    let candidate = without_query.rsplit('/').next().unwrap_or("");

    if is_usable(candidate) {
        candidate.to_string()
    } else {
        synthetic_name(now)
    }
}

fn is_usable(segment: &str) -> bool {
    !segment.is_empty()
        && segment.contains('.')
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

fn synthetic_name(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("file_{}", millis)
}
