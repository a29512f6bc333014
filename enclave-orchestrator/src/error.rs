use std::path::PathBuf;
use thiserror::Error;

use crate::verify::MIN_DOCUMENT_LEN;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{program} required: {hint}")]
    MissingDependency { program: String, hint: &'static str },

    #[error("invalid output path: path traversal detected in {}", .0.display())]
    PathTraversal(PathBuf),

    #[error("invalid output path: absolute paths are not allowed ({})", .0.display())]
    AbsolutePathNotAllowed(PathBuf),

    #[error("invalid resource bounds: {0}")]
    InvalidResourceBounds(String),

    #[error("invalid entrypoint override: {0}")]
    InvalidEntrypoint(String),

    #[error("invalid image reference: {0:?}")]
    InvalidImageReference(String),

    #[error("enclave image not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("enclave image is empty: {}", .0.display())]
    ArtifactEmpty(PathBuf),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "invalid attestation document: {len} bytes, expected at least {min}",
        min = MIN_DOCUMENT_LEN
    )]
    InvalidDocument { len: usize },

    #[error("enclave image build failed:\n{0}")]
    BuildFailed(String),

    #[error("intermediate container build failed:\n{0}")]
    ContainerBuildFailed(String),

    #[error("failed to start enclave:\n{0}")]
    RuntimeLaunchFailed(String),

    #[error("failed to list running enclaves:\n{0}")]
    DescribeFailed(String),

    #[error("failed to parse running enclaves: {0}")]
    QueryParseFailed(String),

    #[error("no running enclaves found")]
    NoRunningInstance,

    #[error("enclave {0} is not running")]
    InstanceNotFound(String),

    #[error("attestation failed:\n{0}")]
    AttestationFailed(String),

    #[error("port bridge failed: {0}")]
    BridgeFailed(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingDependency,
    InvalidInput,
    NotFound,
    ExternalToolFailure,
    ParseFailure,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingDependency { .. } => ErrorKind::MissingDependency,
            Error::PathTraversal(_)
            | Error::AbsolutePathNotAllowed(_)
            | Error::InvalidResourceBounds(_)
            | Error::InvalidEntrypoint(_)
            | Error::InvalidImageReference(_)
            | Error::InvalidDocument { .. }
            | Error::Config(_) => ErrorKind::InvalidInput,
            Error::ArtifactNotFound(_)
            | Error::ArtifactEmpty(_)
            | Error::FileNotFound(_)
            | Error::NoRunningInstance
            | Error::InstanceNotFound(_) => ErrorKind::NotFound,
            Error::BuildFailed(_)
            | Error::ContainerBuildFailed(_)
            | Error::RuntimeLaunchFailed(_)
            | Error::DescribeFailed(_)
            | Error::AttestationFailed(_)
            | Error::BridgeFailed(_)
            | Error::Spawn { .. } => ErrorKind::ExternalToolFailure,
            Error::QueryParseFailed(_) => ErrorKind::ParseFailure,
            Error::Unreadable { .. } | Error::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failures_keep_raw_output() {
        let err = Error::BuildFailed("E: base image not found\n".to_string());
        assert_eq!(err.kind(), ErrorKind::ExternalToolFailure);
        assert!(err.to_string().ends_with("E: base image not found\n"));
    }

    #[test]
    fn missing_dependency_names_program_and_hint() {
        let err = Error::MissingDependency {
            program: "nitro-cli".to_string(),
            hint: "sudo yum install aws-nitro-enclaves-cli",
        };
        assert_eq!(err.kind(), ErrorKind::MissingDependency);
        assert_eq!(
            err.to_string(),
            "nitro-cli required: sudo yum install aws-nitro-enclaves-cli"
        );
    }

    #[test]
    fn short_document_reports_threshold() {
        let err = Error::InvalidDocument { len: 13 };
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("at least 100"));
    }
}
