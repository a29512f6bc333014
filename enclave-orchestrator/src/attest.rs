use std::path::Path;
use tracing::{info, warn};

use crate::{
    error::Error,
    naming::sanitize_path,
    orchestrator::Orchestrator,
    toolchain::{Tool, Toolchain},
    types::Attestation,
};

impl<T: Toolchain> Orchestrator<T> {
    /// Write a signed attestation document for a running enclave to `output`.
    ///
    /// Without `instance_id` the first enclave the runtime lists is used.
    pub async fn generate_attestation(
        &self,
        output: &Path,
        instance_id: Option<&str>,
    ) -> Result<Attestation, Error> {
        let output = sanitize_path(output)?;
        self.require(Tool::Runtime)?;

        let instances = self.running_instances().await?;
        if instances.is_empty() {
            return Err(Error::NoRunningInstance);
        }
        let instance = match instance_id {
            Some(id) => instances
                .into_iter()
                .find(|instance| instance.id == id)
                .ok_or_else(|| Error::InstanceNotFound(id.to_string()))?,
            None => {
                if instances.len() > 1 {
                    warn!(
                        "{} enclaves are running; attesting the first one listed",
                        instances.len()
                    );
                }
                instances
                    .into_iter()
                    .next()
                    .ok_or(Error::NoRunningInstance)?
            }
        };

        info!("Requesting attestation for enclave {}", instance.id);
        let result = self
            .toolchain()
            .generate_attestation(&instance.id, &output)
            .await?;
        if !result.success {
            return Err(Error::AttestationFailed(result.output));
        }

        Ok(Attestation {
            path: output,
            instance,
        })
    }
}
