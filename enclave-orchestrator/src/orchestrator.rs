use tracing::debug;

use crate::{
    config::Config,
    error::Error,
    instances::parse_instances,
    toolchain::{ProcessToolchain, Tool, Toolchain},
    types::InstanceDescriptor,
};

/// Drives the build, deploy and attestation stages through a [`Toolchain`].
///
/// Holds no state between calls beyond its configuration; running enclaves
/// are queried from the runtime every time they are needed.
pub struct Orchestrator<T> {
    toolchain: T,
    config: Config,
}

impl Orchestrator<ProcessToolchain> {
    /// Orchestrator using the programs named in `config`
    pub fn from_config(config: Config) -> Self {
        let toolchain = ProcessToolchain::new(config.tools.clone());
        Self::new(toolchain, config)
    }
}

impl<T: Toolchain> Orchestrator<T> {
    pub fn new(toolchain: T, config: Config) -> Self {
        Self { toolchain, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    pub(crate) fn require(&self, tool: Tool) -> Result<(), Error> {
        if self.toolchain.is_available(tool) {
            return Ok(());
        }
        Err(Error::MissingDependency {
            program: self.config.tools.program(tool).display().to_string(),
            hint: tool.install_hint(),
        })
    }

    /// Ask the runtime what is running right now
    pub(crate) async fn running_instances(&self) -> Result<Vec<InstanceDescriptor>, Error> {
        let output = self.toolchain.describe_running().await?;
        if !output.success {
            return Err(Error::DescribeFailed(output.output));
        }
        let instances = parse_instances(&output.output)?;
        debug!("Runtime reports {} running enclave(s)", instances.len());
        Ok(instances)
    }
}
