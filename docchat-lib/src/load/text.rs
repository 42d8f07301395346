use tracing::warn;

const BOM: &str = "\u{feff}";

/// Decode plain text as UTF-8, replacing invalid sequences.
pub(super) fn extract(name: &str, bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) => {
            warn!(name, error = %e, "invalid UTF-8, decoding lossily");
            String::from_utf8_lossy(bytes).into_owned()
        }
    };

    match text.strip_prefix(BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    }
}
