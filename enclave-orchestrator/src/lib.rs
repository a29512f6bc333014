//! # Enclave Orchestrator
//!
//! Builds enclave images from container images, deploys them into the enclave
//! runtime and produces and checks attestation documents. The actual work is
//! done by external programs reached through the [`Toolchain`] trait; this
//! crate sequences them, interprets their output and handles their failures.
//!
//! ```rust,no_run
//! use enclave_orchestrator::{Config, Orchestrator};
//! use std::path::Path;
//!
//! # async fn run() -> enclave_orchestrator::Result<()> {
//! let orchestrator = Orchestrator::from_config(Config::default().with_port(Some(8080)));
//! let image = orchestrator.build_image("nginx:alpine", None, None).await?;
//! let deployment = orchestrator.deploy(&image.path).await?;
//! if let Some(bridge) = deployment.bridge {
//!     bridge.ready().await?;
//! }
//! orchestrator
//!     .generate_attestation(Path::new("nginx-alpine.cbor"), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod attest;
mod bridge;
mod build;
mod config;
mod deploy;
mod entrypoint;
mod error;
mod instances;
mod naming;
mod orchestrator;
mod toolchain;
mod types;
mod verify;


pub use bridge::{BridgeHandle, BridgeNotifier, BridgeStatus};
pub use build::intermediate_tag;
pub use config::{Config, ToolPaths};
pub use entrypoint::EntrypointOverride;
pub use error::{Error, ErrorKind};
pub use instances::{parse_instances, parse_launch};
pub use naming::{artifact_name, attestation_name, safe_name, sanitize_path};
pub use orchestrator::Orchestrator;
pub use toolchain::{ProcessToolchain, Tool, Toolchain};
pub use types::{
    Attestation, Deployment, EnclaveImage, InstanceDescriptor, ResourceBounds, ToolOutput,
    Verification, VsockEndpoint,
};
pub use verify::{MIN_DOCUMENT_LEN, VALIDITY_MARKER};

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, Error>;
