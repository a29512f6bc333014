use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{
    entrypoint::{EntrypointOverride, DEFINITION_FILE},
    error::Error,
    naming::{artifact_name, sanitize_path},
    orchestrator::Orchestrator,
    toolchain::{Tool, Toolchain},
    types::EnclaveImage,
};

const INTERMEDIATE_PREFIX: &str = "enclave-pack-intermediate-";

/// Tag for the intermediate container image behind `output`.
///
/// Only lowercase alphanumerics, `-` and single `.` between alphanumerics
/// survive; everything else becomes `-`, so the result is always a valid
/// image name.
pub fn intermediate_tag(output: &Path) -> String {
    let name = output.to_string_lossy().to_lowercase();
    let chars: Vec<char> = name.chars().collect();
    let is_alnum =
        |c: Option<&char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());

    let component: String = chars
        .iter()
        .enumerate()
        .map(|(i, c)| match c {
            c if is_alnum(Some(c)) => *c,
            '.' if i > 0 && is_alnum(chars.get(i - 1)) && is_alnum(chars.get(i + 1)) => '.',
            _ => '-',
        })
        .collect();
    let component = component.trim_end_matches('-');

    if component.is_empty() {
        format!("{}image", INTERMEDIATE_PREFIX)
    } else {
        format!("{}{}", INTERMEDIATE_PREFIX, component)
    }
}

impl<T: Toolchain> Orchestrator<T> {
    /// Build an enclave image from a container image reference.
    ///
    /// `output` defaults to a name derived from `image`. With a non-empty
    /// `entrypoint`, an intermediate container image carrying the override is
    /// built first and removed again once the enclave image build has run.
    pub async fn build_image(
        &self,
        image: &str,
        output: Option<&Path>,
        entrypoint: Option<&str>,
    ) -> Result<EnclaveImage, Error> {
        let output = match output {
            Some(path) => sanitize_path(path)?,
            None => sanitize_path(artifact_name(image))?,
        };
        let definition = match entrypoint.map(EntrypointOverride::parse).transpose()? {
            Some(Some(entry)) => Some(entry.render_definition(image)?),
            _ => None,
        };

        self.require(Tool::Builder)?;
        self.require(Tool::Container)?;

        info!("Building enclave image {} from {}", output.display(), image);
        match definition {
            Some(definition) => {
                self.build_with_entrypoint(&definition, &output).await?;
            }
            None => self.build_from_source(image, &output).await?,
        }

        info!("Enclave image written to {}", output.display());
        Ok(EnclaveImage {
            path: output,
            source: image.to_string(),
        })
    }

    async fn build_from_source(&self, source: &str, output: &Path) -> Result<(), Error> {
        let result = self.toolchain().build_image(source, output).await?;
        if !result.success {
            return Err(Error::BuildFailed(result.output));
        }
        Ok(())
    }

    async fn build_with_entrypoint(&self, definition: &str, output: &Path) -> Result<(), Error> {
        // Removed on drop, whichever way this function returns
        let context = tempfile::Builder::new()
            .prefix("enclave-pack-build-")
            .tempdir()?;
        fs::write(context.path().join(DEFINITION_FILE), definition).await?;
        debug!("Wrote image definition to {}", context.path().display());

        let tag = intermediate_tag(output);
        let container = self
            .toolchain()
            .build_container(&tag, context.path())
            .await?;
        if !container.success {
            return Err(Error::ContainerBuildFailed(container.output));
        }

        let result = self.build_from_source(&tag, output).await;
        self.remove_intermediate(&tag).await;
        result
    }

    async fn remove_intermediate(&self, tag: &str) {
        match self.toolchain().remove_container(tag).await {
            Ok(output) if output.success => debug!("Removed intermediate image {}", tag),
            Ok(output) => warn!(
                "Failed to remove intermediate image {}: {}",
                tag,
                output.output.trim()
            ),
            Err(e) => warn!("Failed to remove intermediate image {}: {}", tag, e),
        }
    }
}
