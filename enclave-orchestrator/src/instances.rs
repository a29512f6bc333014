use serde_json::Deserializer;

use crate::{error::Error, types::InstanceDescriptor};

/// Parse the runtime's listing of running enclaves.
///
/// Accepts either a JSON array of records or a sequence of JSON records,
/// however they are broken across lines. Blank output means nothing is
/// running.
pub fn parse_instances(raw: &str) -> Result<Vec<InstanceDescriptor>, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| Error::QueryParseFailed(e.to_string()));
    }

    Deserializer::from_str(trimmed)
        .into_iter::<InstanceDescriptor>()
        .map(|record| record.map_err(|e| Error::QueryParseFailed(e.to_string())))
        .collect()
}

/// Pull the launched enclave's descriptor out of the runtime's launch output.
///
/// The runtime may print progress lines around the record, so the outermost
/// `{ ... }` span is tried when the whole output is not a record.
pub fn parse_launch(raw: &str) -> Option<InstanceDescriptor> {
    let trimmed = raw.trim();
    if let Ok(instance) = serde_json::from_str(trimmed) {
        return Some(instance);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}
