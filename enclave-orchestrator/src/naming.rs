//! Output naming and path sanitization

use std::path::{Component, Path, PathBuf};

use crate::error::Error;

pub const ARTIFACT_EXTENSION: &str = "eif";
pub const ATTESTATION_EXTENSION: &str = "cbor";

/// Used when the artifact path has no usable file name
const DEFAULT_ATTESTATION_STEM: &str = "attestation";

/// Turn an image reference into something usable as a file name
pub fn safe_name(reference: &str) -> String {
    reference.replace([':', '/'], "-")
}

/// Default enclave image file name for an image reference
pub fn artifact_name(reference: &str) -> String {
    format!("{}.{}", safe_name(reference), ARTIFACT_EXTENSION)
}

/// Default attestation document name for an enclave image path
pub fn attestation_name(artifact: &Path) -> String {
    let file_name = artifact
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = file_name
        .strip_suffix(&format!(".{}", ARTIFACT_EXTENSION))
        .unwrap_or(&file_name);
    let base = if base.is_empty() {
        DEFAULT_ATTESTATION_STEM
    } else {
        base
    };
    format!("{}.{}", base, ATTESTATION_EXTENSION)
}

/// Lexically normalize `path` and make sure it stays below the working directory.
///
/// Returns the normalized path. Fails with [`Error::PathTraversal`] if a parent
/// segment survives normalization and with [`Error::AbsolutePathNotAllowed`] if
/// the result is absolute.
pub fn sanitize_path(path: impl AsRef<Path>) -> Result<PathBuf, Error> {
    let normalized = normalize(path.as_ref());

    if normalized
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(Error::PathTraversal(normalized));
    }
    if normalized.has_root() || normalized.is_absolute() {
        return Err(Error::AbsolutePathNotAllowed(normalized));
    }
    Ok(normalized)
}

fn normalize(path: &Path) -> PathBuf {
    let mut root: Vec<Component<'_>> = Vec::new();
    let mut segments: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => root.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(segments.last(), Some(Component::Normal(_))) {
                    segments.pop();
                } else if root.is_empty() {
                    segments.push(component);
                }
                // `..` directly under the root stays at the root
            }
            Component::Normal(_) => segments.push(component),
        }
    }

    let normalized: PathBuf = root.into_iter().chain(segments).collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_name_replaces_separators() {
        assert_eq!(safe_name("nginx:alpine"), "nginx-alpine");
        assert_eq!(safe_name("ubuntu"), "ubuntu");
        assert_eq!(
            safe_name("registry.io/user/app:v1.0"),
            "registry.io-user-app-v1.0"
        );
    }

    #[test]
    fn safe_name_is_idempotent() {
        for reference in ["nginx:alpine", "a/b/c:d:e", "::", "plain", ""] {
            let once = safe_name(reference);
            assert_eq!(safe_name(&once), once);
            assert!(!once.contains(':') && !once.contains('/'));
        }
    }

    #[test]
    fn artifact_names_for_common_references() {
        assert_eq!(artifact_name("nginx:alpine"), "nginx-alpine.eif");
        assert_eq!(artifact_name("ubuntu"), "ubuntu.eif");
        assert_eq!(
            artifact_name("registry.io/user/app:v1.0"),
            "registry.io-user-app-v1.0.eif"
        );
    }

    #[test]
    fn attestation_name_swaps_extension() {
        assert_eq!(attestation_name(Path::new("nginx-alpine.eif")), "nginx-alpine.cbor");
        assert_eq!(attestation_name(Path::new("out/app.eif")), "app.cbor");
        assert_eq!(attestation_name(Path::new("image.bin")), "image.bin.cbor");
    }

    #[test]
    fn attestation_name_without_file_name() {
        for artifact in ["..", "/", "", ".eif", "out/.eif"] {
            assert_eq!(
                attestation_name(Path::new(artifact)),
                "attestation.cbor",
                "{artifact:?}"
            );
        }
    }

    #[test]
    fn sanitize_accepts_clean_relative_paths_unchanged() {
        for path in ["app.eif", "out/app.eif", "a/b/c.cbor", "weird..name.eif"] {
            assert_eq!(sanitize_path(path).unwrap(), PathBuf::from(path));
        }
    }

    #[test]
    fn sanitize_collapses_dot_segments() {
        assert_eq!(sanitize_path("./app.eif").unwrap(), PathBuf::from("app.eif"));
        assert_eq!(
            sanitize_path("out/./tmp/../app.eif").unwrap(),
            PathBuf::from("out/app.eif")
        );
        assert_eq!(sanitize_path("a/..").unwrap(), PathBuf::from("."));
    }

    #[test]
    fn sanitize_rejects_traversal() {
        for path in ["../app.eif", "out/../../app.eif", "..", "a/../../b"] {
            assert!(
                matches!(sanitize_path(path), Err(Error::PathTraversal(_))),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn sanitize_rejects_absolute_paths() {
        for path in ["/tmp/app.eif", "/../etc/passwd", "/"] {
            assert!(
                matches!(sanitize_path(path), Err(Error::AbsolutePathNotAllowed(_))),
                "{path} should be rejected"
            );
        }
    }
}
