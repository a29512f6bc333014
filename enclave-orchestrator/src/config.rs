use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{error::Error, toolchain::Tool, types::ResourceBounds};

/// Settings threaded into every orchestrator operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// vCPUs given to a launched enclave
    pub cpu_count: u32,

    /// Memory in MiB given to a launched enclave
    pub memory_mb: u32,

    /// Local port bridged to the enclave; `None` or 0 disables the bridge
    pub port: Option<u16>,

    /// Port the bridge targets inside the enclave
    pub remote_port: u16,

    /// Launch enclaves with the runtime's debug console enabled
    pub debug_mode: bool,

    /// How long a deploy waits after launch before reporting success
    #[serde(rename = "settle-delay-ms", with = "duration_millis")]
    pub settle_delay: Duration,

    /// Programs used for each collaborator
    pub tools: ToolPaths,
}

impl Default for Config {
    fn default() -> Self {
        let bounds = ResourceBounds::default();
        Self {
            cpu_count: bounds.cpu_count,
            memory_mb: bounds.memory_mb,
            port: None,
            remote_port: 80,
            debug_mode: false,
            settle_delay: Duration::from_secs(2),
            tools: ToolPaths::default(),
        }
    }
}

impl Config {
    /// Load a TOML configuration file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn with_bounds(mut self, bounds: ResourceBounds) -> Self {
        self.cpu_count = bounds.cpu_count;
        self.memory_mb = bounds.memory_mb;
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// Resource bounds as configured; not yet validated
    pub fn bounds(&self) -> ResourceBounds {
        ResourceBounds {
            cpu_count: self.cpu_count,
            memory_mb: self.memory_mb,
        }
    }

    /// The local bridge port, if bridging is enabled
    pub fn bridge_port(&self) -> Option<u16> {
        self.port.filter(|port| *port > 0)
    }
}

/// Program names or paths for the external collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub builder: PathBuf,
    pub runtime: PathBuf,
    pub container: PathBuf,
    pub bridge: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            builder: PathBuf::from("nitro-cli"),
            runtime: PathBuf::from("nitro-cli"),
            container: PathBuf::from("docker"),
            bridge: PathBuf::from("vsock-proxy"),
        }
    }
}

impl ToolPaths {
    pub fn program(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Builder => &self.builder,
            Tool::Runtime => &self.runtime,
            Tool::Container => &self.container,
            Tool::Bridge => &self.bridge,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
