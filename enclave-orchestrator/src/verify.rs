use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::{
    error::Error,
    orchestrator::Orchestrator,
    toolchain::{Tool, Toolchain},
    types::Verification,
};

/// Smallest byte length accepted as an attestation document
pub const MIN_DOCUMENT_LEN: usize = 100;

/// Word the verification engine prints for a valid document
pub const VALIDITY_MARKER: &str = "VALID";

impl<T: Toolchain> Orchestrator<T> {
    /// Check an attestation document.
    ///
    /// Only the size check is mandatory. When the verification engine is
    /// missing or fails, the result is [`Verification::Degraded`] rather than
    /// an error.
    pub async fn verify_attestation(&self, document: &Path) -> Result<Verification, Error> {
        let data = fs::read(document).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::FileNotFound(document.to_path_buf()),
            _ => Error::Unreadable {
                path: document.to_path_buf(),
                source: e,
            },
        })?;
        if data.len() < MIN_DOCUMENT_LEN {
            return Err(Error::InvalidDocument { len: data.len() });
        }

        if !self.toolchain().is_available(Tool::Runtime) {
            return Ok(degraded(format!(
                "{} not found",
                self.config().tools.program(Tool::Runtime).display()
            )));
        }

        let verification = match self.toolchain().verify_attestation(document).await {
            Err(e) => degraded(e.to_string()),
            Ok(output) if !output.success => degraded(output.output.trim().to_string()),
            Ok(output) if reports_valid(&output.output) => {
                info!("Certificate chain verified for {}", document.display());
                Verification::Confirmed
            }
            Ok(_) => Verification::Unconfirmed,
        };
        Ok(verification)
    }
}

fn degraded(reason: String) -> Verification {
    warn!("Full verification unavailable: {}", reason);
    Verification::Degraded { reason }
}

fn reports_valid(output: &str) -> bool {
    output
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word == VALIDITY_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_must_be_a_whole_word() {
        assert!(reports_valid("Attestation document: VALID\n"));
        assert!(reports_valid("status=VALID;chain=ok"));
        assert!(!reports_valid("Attestation document: INVALID"));
        assert!(!reports_valid("VALIDATION SKIPPED"));
        assert!(!reports_valid(""));
    }
}
