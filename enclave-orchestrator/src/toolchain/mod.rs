//! The external programs the orchestrator drives

use async_trait::async_trait;
use std::fmt;
use std::path::Path;

pub mod process;

pub use process::ProcessToolchain;

use crate::{
    bridge::BridgeHandle,
    error::Error,
    types::{ResourceBounds, ToolOutput, VsockEndpoint},
};

/// External collaborators, by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Turns a container image into an enclave image
    Builder,
    /// Controls enclaves: launch, list, terminate, attest
    Runtime,
    /// Builds and removes container images
    Container,
    /// Forwards a local port to an enclave's vsock address
    Bridge,
}

impl Tool {
    pub fn install_hint(&self) -> &'static str {
        match self {
            Tool::Builder | Tool::Runtime => "sudo yum install aws-nitro-enclaves-cli",
            Tool::Container => "sudo yum install docker",
            Tool::Bridge => "vsock-proxy ships with aws-nitro-enclaves-cli and is needed for port mapping",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::Builder => "builder",
            Tool::Runtime => "runtime",
            Tool::Container => "container",
            Tool::Bridge => "bridge",
        };
        f.write_str(name)
    }
}

/// Everything the orchestrator needs from the outside world.
///
/// Each method runs its collaborator exactly once. An `Err` means the program
/// could not be run at all; a program that ran and failed comes back as an
/// unsuccessful [`ToolOutput`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Returns true if the program for `tool` can be found
    fn is_available(&self, tool: Tool) -> bool;

    /// Build an enclave image from a container image reference
    async fn build_image(&self, source_uri: &str, output: &Path) -> Result<ToolOutput, Error>;

    /// Build a container image tagged `tag` from the context in `context_dir`
    async fn build_container(&self, tag: &str, context_dir: &Path) -> Result<ToolOutput, Error>;

    /// Remove a container image
    async fn remove_container(&self, tag: &str) -> Result<ToolOutput, Error>;

    /// List running enclaves
    async fn describe_running(&self) -> Result<ToolOutput, Error>;

    /// Launch an enclave image
    async fn launch(
        &self,
        bounds: &ResourceBounds,
        artifact: &Path,
        debug_mode: bool,
    ) -> Result<ToolOutput, Error>;

    /// Terminate a running enclave
    async fn terminate(&self, instance_id: &str) -> Result<ToolOutput, Error>;

    /// Write a signed attestation document for a running enclave
    async fn generate_attestation(
        &self,
        instance_id: &str,
        output: &Path,
    ) -> Result<ToolOutput, Error>;

    /// Ask the verification engine about an attestation document
    async fn verify_attestation(&self, document: &Path) -> Result<ToolOutput, Error>;

    /// Start forwarding `local_port` to `remote` in the background
    fn start_bridge(&self, local_port: u16, remote: VsockEndpoint) -> BridgeHandle;
}
