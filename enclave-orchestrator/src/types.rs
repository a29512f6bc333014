use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::{bridge::BridgeHandle, error::Error};

/// CPU and memory handed to the enclave runtime at launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBounds {
    /// Number of vCPUs
    pub cpu_count: u32,
    /// Memory in MiB
    pub memory_mb: u32,
}

impl ResourceBounds {
    pub const CPU_RANGE: RangeInclusive<u32> = 1..=16;
    pub const MEMORY_RANGE: RangeInclusive<u32> = 512..=16384;

    pub fn new(cpu_count: u32, memory_mb: u32) -> Result<Self, Error> {
        let bounds = Self {
            cpu_count,
            memory_mb,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !Self::CPU_RANGE.contains(&self.cpu_count) {
            return Err(Error::InvalidResourceBounds(format!(
                "cpu-count {} must be between {} and {}",
                self.cpu_count,
                Self::CPU_RANGE.start(),
                Self::CPU_RANGE.end()
            )));
        }
        if !Self::MEMORY_RANGE.contains(&self.memory_mb) {
            return Err(Error::InvalidResourceBounds(format!(
                "memory {} must be between {} and {} MB",
                self.memory_mb,
                Self::MEMORY_RANGE.start(),
                Self::MEMORY_RANGE.end()
            )));
        }
        Ok(())
    }
}

impl Default for ResourceBounds {
    fn default() -> Self {
        Self {
            cpu_count: 2,
            memory_mb: 2048,
        }
    }
}

/// A running enclave as reported by the runtime.
///
/// The runtime's own field names are accepted alongside a few
/// lower-case aliases; anything else in the record is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    #[serde(rename = "EnclaveID", alias = "id", alias = "instance_id")]
    pub id: String,
    #[serde(
        rename = "EnclaveCID",
        alias = "cid",
        alias = "vsock_address",
        default
    )]
    pub vsock_address: i64,
}

impl InstanceDescriptor {
    /// The virtual socket CID, if the runtime reported a usable one
    pub fn vsock_cid(&self) -> Option<u64> {
        u64::try_from(self.vsock_address).ok().filter(|cid| *cid > 0)
    }
}

/// Address of a listener inside an enclave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VsockEndpoint {
    pub cid: u64,
    pub port: u16,
}

impl fmt::Display for VsockEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cid, self.port)
    }
}

/// Enclave image file produced by a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclaveImage {
    pub path: PathBuf,
    /// Image reference the enclave image was built from
    pub source: String,
}

/// Attestation document written for a running enclave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    pub path: PathBuf,
    pub instance: InstanceDescriptor,
}

/// Outcome of a successful deploy
#[derive(Debug)]
pub struct Deployment {
    /// Launched enclave, when the runtime output could be parsed
    pub instance: Option<InstanceDescriptor>,
    /// Port bridge, when one was requested and could be addressed
    pub bridge: Option<BridgeHandle>,
}

/// Result of a single collaborator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// stdout followed by stderr
    pub output: String,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            output: output.into(),
        }
    }

    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            output: output.into(),
        }
    }
}

/// Verification outcome for a structurally sound attestation document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The verification engine accepted the document and reported it valid
    Confirmed,
    /// The engine ran cleanly but did not report the document valid
    Unconfirmed,
    /// Deep verification could not be performed
    Degraded { reason: String },
}
