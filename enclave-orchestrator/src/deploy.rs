use std::path::Path;
use tokio::{fs, time};
use tracing::{debug, info, warn};

use crate::{
    error::Error,
    instances::parse_launch,
    orchestrator::Orchestrator,
    toolchain::{Tool, Toolchain},
    types::{Deployment, VsockEndpoint},
};

impl<T: Toolchain> Orchestrator<T> {
    /// Launch `artifact` as the only running enclave.
    ///
    /// Resource bounds, bridge port and settle delay come from the
    /// configuration. Every enclave already running is terminated first.
    pub async fn deploy(&self, artifact: &Path) -> Result<Deployment, Error> {
        let config = self.config();
        let bounds = config.bounds();
        bounds.validate()?;

        check_artifact(artifact).await?;

        self.require(Tool::Runtime)?;
        let bridge_port = config.bridge_port();
        if bridge_port.is_some() {
            self.require(Tool::Bridge)?;
        }

        self.terminate_running().await;

        info!(
            "Launching {} with {} vCPU(s) and {} MiB",
            artifact.display(),
            bounds.cpu_count,
            bounds.memory_mb
        );
        let launch = self
            .toolchain()
            .launch(&bounds, artifact, config.debug_mode)
            .await?;
        if !launch.success {
            return Err(Error::RuntimeLaunchFailed(launch.output));
        }

        let instance = parse_launch(&launch.output);
        match &instance {
            Some(instance) => info!(
                "Enclave {} running at cid {}",
                instance.id, instance.vsock_address
            ),
            None => warn!("Could not read enclave details from launch output"),
        }

        let bridge = match (&instance, bridge_port) {
            (Some(instance), Some(local_port)) => match instance.vsock_cid() {
                Some(cid) => {
                    let remote = VsockEndpoint {
                        cid,
                        port: config.remote_port,
                    };
                    info!("Bridging local port {} to {}", local_port, remote);
                    Some(self.toolchain().start_bridge(local_port, remote))
                }
                None => {
                    warn!("Enclave {} has no vsock address; not bridging", instance.id);
                    None
                }
            },
            _ => None,
        };

        if !config.settle_delay.is_zero() {
            debug!("Waiting {:?} for the enclave to settle", config.settle_delay);
            time::sleep(config.settle_delay).await;
        }

        Ok(Deployment { instance, bridge })
    }

    /// Best-effort teardown of everything the runtime reports as running
    async fn terminate_running(&self) {
        let instances = match self.running_instances().await {
            Ok(instances) => instances,
            Err(e) => {
                debug!("Skipping teardown, running enclaves unknown: {}", e);
                return;
            }
        };

        for instance in instances {
            match self.toolchain().terminate(&instance.id).await {
                Ok(output) if output.success => info!("Terminated enclave {}", instance.id),
                Ok(output) => warn!(
                    "Failed to terminate enclave {}: {}",
                    instance.id,
                    output.output.trim()
                ),
                Err(e) => warn!("Failed to terminate enclave {}: {}", instance.id, e),
            }
        }
    }
}

async fn check_artifact(artifact: &Path) -> Result<(), Error> {
    let metadata = fs::metadata(artifact)
        .await
        .map_err(|_| Error::ArtifactNotFound(artifact.to_path_buf()))?;
    if !metadata.is_file() {
        return Err(Error::ArtifactNotFound(artifact.to_path_buf()));
    }
    if metadata.len() == 0 {
        return Err(Error::ArtifactEmpty(artifact.to_path_buf()));
    }
    Ok(())
}
