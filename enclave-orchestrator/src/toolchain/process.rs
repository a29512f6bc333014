use async_trait::async_trait;
use std::{path::Path, process::Stdio};
use tokio::{
    process::Command,
    time::{self, Duration},
};
use tracing::{debug, warn};

use super::{Tool, Toolchain};
use crate::{
    bridge::BridgeHandle,
    config::ToolPaths,
    error::Error,
    types::{ResourceBounds, ToolOutput, VsockEndpoint},
};

/// How long a freshly spawned bridge must stay up to count as started
const BRIDGE_STARTUP_WINDOW: Duration = Duration::from_millis(500);

/// [`Toolchain`] backed by the real programs, found via `PATH`
#[derive(Debug, Clone, Default)]
pub struct ProcessToolchain {
    tools: ToolPaths,
}

impl ProcessToolchain {
    pub fn new(tools: ToolPaths) -> Self {
        Self { tools }
    }

    fn command(&self, tool: Tool) -> Command {
        let mut command = Command::new(self.tools.program(tool));
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// Run `command` to completion and capture its combined output
    async fn run(&self, tool: Tool, mut command: Command) -> Result<ToolOutput, Error> {
        let program = self.tools.program(tool).display().to_string();
        debug!("Running {} ({}): {:?}", tool, program, command.as_std());

        let output = command
            .output()
            .await
            .map_err(|source| Error::Spawn { program, source })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!("{} exited with {}", tool, output.status);
        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            output: combined,
        })
    }
}

#[async_trait]
impl Toolchain for ProcessToolchain {
    fn is_available(&self, tool: Tool) -> bool {
        which::which(self.tools.program(tool)).is_ok()
    }

    async fn build_image(&self, source_uri: &str, output: &Path) -> Result<ToolOutput, Error> {
        let mut command = self.command(Tool::Builder);
        command
            .arg("build")
            .arg("--source-uri")
            .arg(source_uri)
            .arg("--output-file")
            .arg(output);
        self.run(Tool::Builder, command).await
    }

    async fn build_container(&self, tag: &str, context_dir: &Path) -> Result<ToolOutput, Error> {
        let mut command = self.command(Tool::Container);
        command.args(["build", "-t", tag]).arg(context_dir);
        self.run(Tool::Container, command).await
    }

    async fn remove_container(&self, tag: &str) -> Result<ToolOutput, Error> {
        let mut command = self.command(Tool::Container);
        command.args(["remove-image", tag]);
        self.run(Tool::Container, command).await
    }

    async fn describe_running(&self) -> Result<ToolOutput, Error> {
        let mut command = self.command(Tool::Runtime);
        command.arg("describe-running");
        self.run(Tool::Runtime, command).await
    }

    async fn launch(
        &self,
        bounds: &ResourceBounds,
        artifact: &Path,
        debug_mode: bool,
    ) -> Result<ToolOutput, Error> {
        let mut command = self.command(Tool::Runtime);
        command
            .arg("launch")
            .arg("--cpu-count")
            .arg(bounds.cpu_count.to_string())
            .arg("--memory")
            .arg(bounds.memory_mb.to_string())
            .arg("--artifact-path")
            .arg(artifact);
        if debug_mode {
            command.arg("--debug-mode");
        }
        self.run(Tool::Runtime, command).await
    }

    async fn terminate(&self, instance_id: &str) -> Result<ToolOutput, Error> {
        let mut command = self.command(Tool::Runtime);
        command.args(["terminate", "--id", instance_id]);
        self.run(Tool::Runtime, command).await
    }

    async fn generate_attestation(
        &self,
        instance_id: &str,
        output: &Path,
    ) -> Result<ToolOutput, Error> {
        let mut command = self.command(Tool::Runtime);
        command
            .args(["generate-attestation", "--id", instance_id])
            .arg("--output-file")
            .arg(output);
        self.run(Tool::Runtime, command).await
    }

    async fn verify_attestation(&self, document: &Path) -> Result<ToolOutput, Error> {
        let mut command = self.command(Tool::Runtime);
        command.args(["verify-attestation", "--document"]).arg(document);
        self.run(Tool::Runtime, command).await
    }

    fn start_bridge(&self, local_port: u16, remote: VsockEndpoint) -> BridgeHandle {
        let (handle, notifier) = BridgeHandle::channel(local_port, remote);
        let program = self.tools.program(Tool::Bridge).to_path_buf();

        let mut command = Command::new(&program);
        command
            .arg(local_port.to_string())
            .arg(remote.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        tokio::spawn(async move {
            let mut child = match command.spawn() {
                Ok(child) => child,
                Err(e) => {
                    warn!("Failed to spawn {}: {}", program.display(), e);
                    notifier.failed(format!("failed to spawn {}: {}", program.display(), e));
                    return;
                }
            };
            let pid = child.id();
            debug!("Bridge {} -> {} spawned with pid {:?}", local_port, remote, pid);

            match time::timeout(BRIDGE_STARTUP_WINDOW, child.wait()).await {
                Ok(Ok(status)) => notifier.failed(format!("bridge exited early with {}", status)),
                Ok(Err(e)) => notifier.failed(format!("failed to watch bridge: {}", e)),
                // Still running; dropping the handle leaves the process alone
                Err(_) => notifier.started(pid),
            }
        });

        handle
    }
}
