//! Monitor-mode report listener.
//!
//! In monitor mode the device streams a 20-byte [`CompositeReport`] to the
//! client every time the physical mouse or keyboard changes.  The stream
//! goes to UDP port `command port + 1` on the client.
//!
//! Lifecycle:
//!
//! ```text
//! Idle ──start()──▶ Starting ──ack──▶ Running ──stop()──▶ Stopping ──▶ Stopped
//!                      │                                                  ▲
//!                      └──────────── no ack / bind failure ───────────────┘
//! ```
//!
//! `Stopped` is terminal.  A client allows one listener at a time; a new one
//! can be created once the previous one is stopped or dropped.
//!
//! Reports are handed to the callback inline on the receive task, so a slow
//! callback delays the next receive.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use kmbox_core::protocol::codec::decode;
use kmbox_core::protocol::messages::{CommandCode, CompositeReport};
use kmbox_core::protocol::nonce;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::dispatch::{CommandDispatcher, Nonce};
use crate::error::ClientError;

/// Receive buffer; reports are 20 bytes.
const REPORT_BUFFER_SIZE: usize = 256;

/// Callback invoked with every decoded report.
pub type ReportCallback = Box<dyn FnMut(CompositeReport) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// State shared by a listener, its receive task and the owning client.
#[derive(Debug)]
pub(crate) struct ListenerStatus {
    state: Mutex<ListenerState>,
}

impl ListenerStatus {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ListenerState::Idle),
        }
    }

    pub(crate) fn get(&self) -> ListenerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, state: ListenerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Marks the listener stopped when the receive task ends, including by panic.
struct StopOnExit(Arc<ListenerStatus>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        self.0.set(ListenerState::Stopped);
    }
}

/// Receives monitor reports from the device.
///
/// Created by `KmBoxClient::create_report_listener`.
pub struct ReportListener {
    dispatcher: Arc<CommandDispatcher>,
    bind_addr: SocketAddr,
    status: Arc<ListenerStatus>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
    /// Set once the enable command has gone out; cleared by the disable.
    monitor_enabled: bool,
}

impl ReportListener {
    pub(crate) fn new(
        dispatcher: Arc<CommandDispatcher>,
        bind_addr: SocketAddr,
        status: Arc<ListenerStatus>,
    ) -> Self {
        Self {
            dispatcher,
            bind_addr,
            status,
            cancel: CancellationToken::new(),
            worker: None,
            monitor_enabled: false,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.status.get()
    }

    /// Local address the listener binds to when started.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Binds the report socket, enables monitor mode and starts receiving.
    ///
    /// Returns `Ok(false)` if the device does not acknowledge the enable
    /// command; the listener is then stopped.
    ///
    /// # Errors
    ///
    /// - [`ClientError::ListenerAlreadyStarted`] unless the listener is idle.
    /// - [`ClientError::Bind`] if the report port is taken.
    /// - Any dispatcher error from the enable command.
    pub async fn start<F>(&mut self, callback: F) -> Result<bool, ClientError>
    where
        F: FnMut(CompositeReport) + Send + 'static,
    {
        if self.status.get() != ListenerState::Idle {
            return Err(ClientError::ListenerAlreadyStarted);
        }
        self.status.set(ListenerState::Starting);

        let socket = match self.open().await {
            Ok(Some(socket)) => socket,
            Ok(None) => {
                warn!(addr = %self.bind_addr, "device did not acknowledge monitor enable");
                self.status.set(ListenerState::Stopped);
                return Ok(false);
            }
            Err(e) => {
                self.status.set(ListenerState::Stopped);
                return Err(e);
            }
        };

        self.status.set(ListenerState::Running);
        self.worker = Some(tokio::spawn(receive_loop(
            socket,
            Box::new(callback),
            self.cancel.clone(),
            StopOnExit(Arc::clone(&self.status)),
        )));
        info!(addr = %self.bind_addr, "report listener started");
        Ok(true)
    }

    async fn open(&mut self) -> Result<Option<UdpSocket>, ClientError> {
        let socket = UdpSocket::bind(self.bind_addr)
            .await
            .map_err(|source| ClientError::Bind {
                addr: self.bind_addr,
                source,
            })?;
        let enable = nonce::monitor_enable(self.bind_addr.port());
        self.monitor_enabled = true;
        let acknowledged = self
            .dispatcher
            .execute(CommandCode::Monitor, Nonce::Value(enable))
            .await?;
        Ok(acknowledged.then_some(socket))
    }

    /// Disables monitor mode and stops the receive task.
    ///
    /// The disable command is sent whenever `start` sent the enable, even if
    /// the receive task has already ended on its own.  It is best-effort:
    /// failures are logged, not returned.  A second `stop` does nothing.
    pub async fn stop(&mut self) {
        if !self.monitor_enabled {
            if matches!(self.status.get(), ListenerState::Idle | ListenerState::Starting) {
                self.status.set(ListenerState::Stopped);
            }
            return;
        }
        self.monitor_enabled = false;
        if self.status.get() == ListenerState::Running {
            self.status.set(ListenerState::Stopping);
        }

        match self
            .dispatcher
            .execute(CommandCode::Monitor, Nonce::Value(nonce::MONITOR_DISABLE))
            .await
        {
            Ok(true) => debug!("monitor mode disabled"),
            Ok(false) => warn!("device did not acknowledge monitor disable"),
            Err(e) => warn!("failed to disable monitor mode: {e}"),
        }

        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!("report listener task ended abnormally: {e}");
            }
        }
        self.status.set(ListenerState::Stopped);
        info!(addr = %self.bind_addr, "report listener stopped");
    }
}

impl Drop for ReportListener {
    fn drop(&mut self) {
        // Monitor mode stays enabled on the device; disabling needs an async exchange.
        self.cancel.cancel();
        self.status.set(ListenerState::Stopped);
    }
}

async fn receive_loop(
    socket: UdpSocket,
    mut callback: ReportCallback,
    cancel: CancellationToken,
    _stop_on_exit: StopOnExit,
) {
    let mut buf = [0u8; REPORT_BUFFER_SIZE];
    loop {
        let received = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = socket.recv_from(&mut buf) => received,
        };

        match received {
            Ok((len, src)) => match decode::<CompositeReport>(&buf[..len]) {
                Ok(report) => callback(report),
                Err(e) => warn!(%src, "skipping monitor datagram: {e}"),
            },
            Err(e) => {
                error!("monitor socket receive failed: {e}");
                break;
            }
        }
    }
    debug!("report receive loop exited");
}
