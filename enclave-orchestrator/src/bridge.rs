//! Handles for background port bridges

use tokio::sync::oneshot;

use crate::{error::Error, types::VsockEndpoint};

/// Startup outcome reported by a bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeStatus {
    Started { pid: Option<u32> },
    Failed(String),
}

/// A bridge that was asked to start.
///
/// Await [`BridgeHandle::ready`] to learn whether it came up, or call
/// [`BridgeHandle::detach`] to leave it running unobserved.
#[derive(Debug)]
pub struct BridgeHandle {
    local_port: u16,
    remote: VsockEndpoint,
    status: oneshot::Receiver<BridgeStatus>,
}

/// Sending half paired with a [`BridgeHandle`]
#[derive(Debug)]
pub struct BridgeNotifier(oneshot::Sender<BridgeStatus>);

impl BridgeHandle {
    pub fn channel(local_port: u16, remote: VsockEndpoint) -> (Self, BridgeNotifier) {
        let (tx, rx) = oneshot::channel();
        let handle = Self {
            local_port,
            remote,
            status: rx,
        };
        (handle, BridgeNotifier(tx))
    }

    /// A handle whose outcome is already known
    pub fn resolved(local_port: u16, remote: VsockEndpoint, status: BridgeStatus) -> Self {
        let (handle, notifier) = Self::channel(local_port, remote);
        notifier.send(status);
        handle
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn remote(&self) -> VsockEndpoint {
        self.remote
    }

    /// Wait for the startup outcome. Returns the bridge's pid when known.
    pub async fn ready(self) -> Result<Option<u32>, Error> {
        match self.status.await {
            Ok(BridgeStatus::Started { pid }) => Ok(pid),
            Ok(BridgeStatus::Failed(reason)) => Err(Error::BridgeFailed(reason)),
            Err(_) => Err(Error::BridgeFailed(
                "bridge exited without reporting its status".to_string(),
            )),
        }
    }

    /// Stop observing the bridge; the process itself keeps running
    pub fn detach(self) {}
}

impl BridgeNotifier {
    pub fn started(self, pid: Option<u32>) {
        self.send(BridgeStatus::Started { pid });
    }

    pub fn failed(self, reason: impl Into<String>) {
        self.send(BridgeStatus::Failed(reason.into()));
    }

    fn send(self, status: BridgeStatus) {
        // Nobody listening is fine; the handle was detached
        let _ = self.0.send(status);
    }
}
