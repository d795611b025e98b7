//! Loopback stand-in for a KMBox-Net device, shared by the integration tests.
//!
//! The fake binds `127.0.0.1:P` and answers every datagram by echoing its
//! 16-byte header, the way the firmware does.  When it sees a monitor-enable
//! command it remembers the requested port so tests can push reports to the
//! listener with [`FakeDevice::send_report`].

#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kmbox_core::protocol::codec::encode;
use kmbox_core::protocol::messages::HEADER_SIZE;
use kmbox_core::protocol::nonce;
use kmbox_core::{decode, CommandCode, CommandHeader, CompositeReport};
use kmbox_client::ClientConfig;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

pub const DEVICE_UUID: &str = "417F0CD3";

#[derive(Default)]
struct DeviceState {
    requests: Mutex<Vec<Vec<u8>>>,
    monitor_target: Mutex<Option<SocketAddr>>,
    silent: AtomicBool,
    delay_next: Mutex<Option<Duration>>,
}

pub struct FakeDevice {
    socket: Arc<UdpSocket>,
    state: Arc<DeviceState>,
    task: JoinHandle<()>,
}

impl FakeDevice {
    /// Binds a fake device on a loopback port whose successor is also free,
    /// so the client's report listener can take `port + 1`.
    pub async fn spawn() -> anyhow::Result<Self> {
        let socket = loop {
            let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
            let port = socket.local_addr()?.port();
            if port < u16::MAX - 1
                && std::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, port + 1)).is_ok()
            {
                break Arc::new(socket);
            }
        };

        let state = Arc::new(DeviceState::default());
        let task = tokio::spawn(serve(Arc::clone(&socket), Arc::clone(&state)));
        Ok(Self { socket, state, task })
    }

    pub fn port(&self) -> u16 {
        self.socket.local_addr().map(|a| a.port()).unwrap_or_default()
    }

    /// Client config pointing at this device, with the listener on loopback.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(Ipv4Addr::LOCALHOST, self.port(), DEVICE_UUID)
            .with_monitor_bind_addr(Ipv4Addr::LOCALHOST)
    }

    /// Stops answering; requests are still recorded.
    pub fn go_silent(&self) {
        self.state.silent.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.state.silent.store(false, Ordering::SeqCst);
    }

    /// Answers the next request only after `delay`; later requests are
    /// answered immediately.
    pub fn delay_next_reply(&self, delay: Duration) {
        *self.state.delay_next.lock().expect("delay lock") = Some(delay);
    }

    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    pub fn headers(&self) -> Vec<CommandHeader> {
        self.requests()
            .iter()
            .map(|r| decode::<CommandHeader>(r).expect("request header"))
            .collect()
    }

    pub fn commands(&self) -> Vec<CommandCode> {
        self.headers()
            .iter()
            .filter_map(CommandHeader::command_code)
            .collect()
    }

    /// Where the device streams reports, learned from the last monitor enable.
    pub fn monitor_target(&self) -> Option<SocketAddr> {
        *self.state.monitor_target.lock().expect("target lock")
    }

    /// Streams one report to the active listener.
    pub async fn send_report(&self, report: &CompositeReport) -> anyhow::Result<()> {
        self.send_raw(&encode(report)).await
    }

    pub async fn send_raw(&self, datagram: &[u8]) -> anyhow::Result<()> {
        let target = self
            .monitor_target()
            .ok_or_else(|| anyhow::anyhow!("monitor mode was never enabled"))?;
        self.socket.send_to(datagram, target).await?;
        Ok(())
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(socket: Arc<UdpSocket>, state: Arc<DeviceState>) {
    let mut buf = vec![0u8; 2048];
    while let Ok((len, src)) = socket.recv_from(&mut buf).await {
        let request = buf[..len].to_vec();
        state.requests.lock().expect("requests lock").push(request.clone());

        let Ok(header) = decode::<CommandHeader>(&request) else {
            continue;
        };
        if header.command_code() == Some(CommandCode::Monitor) {
            let target = nonce::monitor_port(header.nonce).map(|port| SocketAddr::new(src.ip(), port));
            *state.monitor_target.lock().expect("target lock") = target;
        }

        let echo = request[..HEADER_SIZE].to_vec();
        let delay = state.delay_next.lock().expect("delay lock").take();
        if let Some(delay) = delay {
            let socket = Arc::clone(&socket);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = socket.send_to(&echo, src).await;
            });
            continue;
        }

        if !state.silent.load(Ordering::SeqCst) {
            let _ = socket.send_to(&echo, src).await;
        }
    }
}

/// Installs a test-writer subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}
