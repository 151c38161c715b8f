//! The single line written to stdout.
use serde::Serialize;
use trawl_common::ErrorRecord;

/// Serialize `value` on one line; a serialization failure becomes an error record.
pub fn render<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        tracing::error!(error = %err, "output.serialize_failed");
        fallback(&ErrorRecord::new("failed to serialize output", err.to_string()))
    })
}

/// An error is always emitted as a one-element array.
pub fn render_error(record: &ErrorRecord) -> String {
    render(std::slice::from_ref(record))
}

fn fallback(record: &ErrorRecord) -> String {
    serde_json::to_string(std::slice::from_ref(record))
        .unwrap_or_else(|_| r#"[{"error":"failed to serialize output","detail":""}]"#.to_string())
}
