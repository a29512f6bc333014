//! Command line front end for [`enclave_orchestrator`].
//!
//! Each subcommand runs one orchestrator operation. Results go to stdout,
//! progress and failures are logged to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use enclave_orchestrator::{attestation_name, Config, Orchestrator, ResourceBounds, Verification};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, env = "ENCLAVE_PACK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build an enclave image from a container image
    Pack {
        /// Container image reference, e.g. nginx:alpine
        image: String,

        /// Output file; derived from the image reference by default
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Entrypoint override, either a shell command or a JSON array
        #[arg(short, long)]
        entry: Option<String>,
    },

    /// Launch an enclave image, replacing any running enclave
    Deploy(DeployArgs),

    /// Write an attestation document for the running enclave
    Attest {
        /// Enclave image the running enclave was launched from
        artifact: PathBuf,

        /// Output file; the image name with a .cbor extension by default
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Enclave to attest when more than one is running
        #[arg(long)]
        instance_id: Option<String>,
    },

    /// Check an attestation document
    Verify {
        /// Attestation document
        document: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Enclave image file
    pub artifact: PathBuf,

    /// Local port to forward into the enclave
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Number of vCPUs [default: 2]
    #[arg(long)]
    pub cpu_count: Option<u32>,

    /// Memory in MB [default: 2048]
    #[arg(long, value_name = "MB")]
    pub memory: Option<u32>,

    /// Enable the enclave debug console
    #[arg(long)]
    pub debug_mode: bool,
}

impl DeployArgs {
    /// Apply the flags given on the command line on top of `config`
    fn apply(&self, config: Config) -> Config {
        let bounds = ResourceBounds {
            cpu_count: self.cpu_count.unwrap_or(config.cpu_count),
            memory_mb: self.memory.unwrap_or(config.memory_mb),
        };
        let port = self.port.or(config.port);
        let debug_mode = self.debug_mode || config.debug_mode;
        config
            .with_bounds(bounds)
            .with_port(port)
            .with_debug_mode(debug_mode)
    }
}

/// Run a parsed command line to completion
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Pack {
            image,
            output,
            entry,
        } => pack(config, &image, output.as_deref(), entry.as_deref())
            .await
            .context("pack"),
        Command::Deploy(args) => deploy(args.apply(config), &args.artifact)
            .await
            .context("deploy"),
        Command::Attest {
            artifact,
            output,
            instance_id,
        } => attest(config, &artifact, output, instance_id.as_deref())
            .await
            .context("attest"),
        Command::Verify { document } => verify(config, &document).await.context("verify"),
    }
}

/// Log a failed run
pub fn report(err: &anyhow::Error) {
    match err.downcast_ref::<enclave_orchestrator::Error>() {
        Some(cause) => error!(kind = ?cause.kind(), "{:#}", err),
        None => error!("{:#}", err),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).context("config"),
        None => Ok(Config::default()),
    }
}

async fn pack(
    config: Config,
    image: &str,
    output: Option<&Path>,
    entry: Option<&str>,
) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config);
    let image = orchestrator.build_image(image, output, entry).await?;

    info!("Packed {} into {}", image.source, image.path.display());
    println!("{}", image.path.display());
    Ok(())
}

async fn deploy(config: Config, artifact: &Path) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config);
    let deployment = orchestrator.deploy(artifact).await?;

    if let Some(bridge) = deployment.bridge {
        let (local_port, remote) = (bridge.local_port(), bridge.remote());
        match bridge.ready().await {
            Ok(_) => info!("Forwarding localhost:{} to {}", local_port, remote),
            Err(e) => warn!("Enclave is running but {}", e),
        }
    }

    info!("Deployed {}", artifact.display());
    match deployment.instance {
        Some(instance) => println!("{} {}", instance.id, instance.vsock_address),
        None => warn!("Enclave details unknown; check the runtime's enclave list"),
    }
    Ok(())
}

async fn attest(
    config: Config,
    artifact: &Path,
    output: Option<PathBuf>,
    instance_id: Option<&str>,
) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(attestation_name(artifact)));
    let orchestrator = Orchestrator::from_config(config);
    let attestation = orchestrator
        .generate_attestation(&output, instance_id)
        .await?;

    info!(
        "Attestation for enclave {} written to {}",
        attestation.instance.id,
        attestation.path.display()
    );
    println!("{}", attestation.path.display());
    Ok(())
}

async fn verify(config: Config, document: &Path) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config);

    let status = match orchestrator.verify_attestation(document).await? {
        Verification::Confirmed => {
            info!("{} is a valid attestation document", document.display());
            "valid"
        }
        Verification::Unconfirmed => {
            info!(
                "{} passed structural checks; validity not confirmed",
                document.display()
            );
            "unconfirmed"
        }
        Verification::Degraded { .. } => {
            info!("{} passed structural checks only", document.display());
            "structural"
        }
    };
    println!("{}", status);
    Ok(())
}
