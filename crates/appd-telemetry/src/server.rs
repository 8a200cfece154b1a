//! Telemetry server implementation

use appd_api::TelemetrySample;
use appd_host_api::TelemetrySource;
use appd_util::PublisherId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use crate::{TelemetryError, TelemetryResult};

/// Peer credentials of a connected publisher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerInfo {
    pub uid: Option<u32>,
    pub pid: Option<i32>,
}

/// Telemetry server
///
/// Every publisher writes NDJSON samples; only the most recent sample is
/// kept; a receiver that falls behind skips straight to it.
pub struct TelemetryServer {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    publishers: Arc<RwLock<HashMap<PublisherId, PeerInfo>>>,
    latest_tx: Arc<watch::Sender<Option<TelemetrySample>>>,
}

impl TelemetryServer {
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        let (latest_tx, _) = watch::channel(None);

        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            listener: None,
            publishers: Arc::new(RwLock::new(HashMap::new())),
            latest_tx: Arc::new(latest_tx),
        }
    }

    /// Bind the socket, replacing a stale one
    pub async fn start(&mut self) -> TelemetryResult<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        // Readable/writable by owner and group
        std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o660))?;

        info!(path = %self.socket_path.display(), "Telemetry server listening");

        self.listener = Some(listener);
        Ok(())
    }

    /// A source yielding samples published after this call
    pub fn receiver(&self) -> TelemetryReceiver {
        TelemetryReceiver {
            rx: self.latest_tx.subscribe(),
        }
    }

    /// Most recent sample from any publisher
    pub fn latest(&self) -> Option<TelemetrySample> {
        *self.latest_tx.borrow()
    }

    /// Accept publishers in a loop
    pub async fn run(&self) -> TelemetryResult<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| TelemetryError::ServerError("Server not started".into()))?;

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let publisher_id = PublisherId::new();
                    let peer = get_peer_info(&stream);

                    info!(
                        publisher_id = %publisher_id,
                        uid = ?peer.uid,
                        pid = ?peer.pid,
                        "Publisher connected"
                    );

                    self.publishers
                        .write()
                        .await
                        .insert(publisher_id.clone(), peer);
                    self.handle_publisher(stream, publisher_id);
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_publisher(&self, stream: UnixStream, publisher_id: PublisherId) {
        let publishers = self.publishers.clone();
        let latest_tx = self.latest_tx.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(stream);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!(publisher_id = %publisher_id, "Publisher disconnected (EOF)");
                        break;
                    }
                    Ok(_) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }

                        match serde_json::from_str::<TelemetrySample>(line) {
                            Ok(sample) => {
                                debug!(
                                    publisher_id = %publisher_id,
                                    started = sample.started,
                                    thermal = %sample.thermal_status,
                                    "Telemetry sample"
                                );
                                latest_tx.send_replace(Some(sample));
                            }
                            Err(e) => {
                                warn!(
                                    publisher_id = %publisher_id,
                                    error = %e,
                                    "Dropping malformed sample"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        debug!(publisher_id = %publisher_id, error = %e, "Read error");
                        break;
                    }
                }
            }

            publishers.write().await.remove(&publisher_id);
        });
    }

    /// Connected publisher count
    pub async fn publisher_count(&self) -> usize {
        self.publishers.read().await.len()
    }

    /// Remove the socket file
    pub fn shutdown(&self) {
        if self.socket_path.exists() {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}

impl Drop for TelemetryServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Supervisor-side handle on the server's latest sample
#[derive(Clone)]
pub struct TelemetryReceiver {
    rx: watch::Receiver<Option<TelemetrySample>>,
}

#[async_trait]
impl TelemetrySource for TelemetryReceiver {
    async fn recv(&mut self) -> Option<TelemetrySample> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let latest = *self.rx.borrow_and_update();
            if latest.is_some() {
                return latest;
            }
        }
    }
}

/// Get peer credentials from a Unix socket
fn get_peer_info(stream: &UnixStream) -> PeerInfo {
    use std::os::unix::io::AsFd;

    let fd = stream.as_fd();

    match nix::sys::socket::getsockopt(&fd, nix::sys::socket::sockopt::PeerCredentials) {
        Ok(cred) => PeerInfo {
            uid: Some(cred.uid()),
            pid: Some(cred.pid()),
        },
        Err(_) => PeerInfo::default(),
    }
}
