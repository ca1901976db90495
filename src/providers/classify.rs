use super::ErrorKind;

const NOT_FOUND_MARKER: &str = "404";
const QUOTA_MARKER: &str = "429";
const EXHAUSTED_MARKER: &str = "RESOURCE_EXHAUSTED";

/// Maps an HTTP status and/or raw error text to an [`ErrorKind`].
///
/// The status wins when present; otherwise the text is searched for the
/// `404`, `429` and `RESOURCE_EXHAUSTED` markers the API puts in its messages.
pub fn classify_error(status: Option<u16>, text: &str) -> ErrorKind {
    match status {
        Some(404) => return ErrorKind::NotFound,
        Some(429) => return ErrorKind::QuotaExhausted,
        _ => {}
    }
    if text.contains(QUOTA_MARKER) || text.contains(EXHAUSTED_MARKER) {
        return ErrorKind::QuotaExhausted;
    }
    if text.contains(NOT_FOUND_MARKER) {
        return ErrorKind::NotFound;
    }
    ErrorKind::Other
}
