//! CommandDispatcher: one request, one correlated reply.
//!
//! Every device command is a single UDP datagram answered by a single 16-byte
//! header echo.  The dispatcher builds headers, sends them through a
//! [`CommandTransport`] and decides whether the reply acknowledges the request.
//!
//! # Why a lock? (for beginners)
//!
//! UDP has no notion of "the reply to my request".  If two tasks sent commands
//! at the same time, each could read the other's reply.  The dispatcher holds
//! an async mutex from header construction until the reply is read, so at most
//! one exchange is in flight and sequence numbers go out in the order they
//! were issued.
//!
//! A reply that does not match is reported as `Ok(false)`; there is no retry.
//! The one exception is a reply carrying an *older* sequence number: that is
//! the late answer to an exchange that already timed out, so it is dropped
//! and the dispatcher keeps waiting, within the same deadline, for its own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kmbox_core::protocol::codec::{decode, encode_header, encode_packet, WireFormat};
use kmbox_core::protocol::messages::{CommandCode, CommandHeader, HEADER_SIZE};
use kmbox_core::protocol::SequenceCounter;
use kmbox_core::DeviceId;
use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Large enough for any reply; the device only ever sends a header.
const REPLY_BUFFER_SIZE: usize = HEADER_SIZE * 4;

/// Datagram transport to the device's command port.
///
/// Implemented by `UdpTransport` in the infrastructure layer and by
/// in-memory fakes in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Sends one datagram to the device.
    async fn send(&self, datagram: &[u8]) -> std::io::Result<usize>;

    /// Waits for the next datagram from the device and copies it into `buf`.
    async fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize>;
}

/// How the header nonce is chosen for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nonce {
    /// A fresh value in `[0, i32::MAX)`.
    Random,
    /// A command-specific value such as a duration or mask.
    Value(u32),
}

/// Serializes command exchanges with one device.
pub struct CommandDispatcher {
    transport: Arc<dyn CommandTransport>,
    device_id: DeviceId,
    sequence: SequenceCounter,
    response_timeout: Option<Duration>,
    exchange: Mutex<()>,
}

impl CommandDispatcher {
    pub fn new(
        transport: Arc<dyn CommandTransport>,
        device_id: DeviceId,
        response_timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            device_id,
            sequence: SequenceCounter::new(),
            response_timeout,
            exchange: Mutex::new(()),
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout
    }

    /// Builds the next header with a random nonce.
    ///
    /// Advances the sequence counter.
    pub fn next_header(&self, command: CommandCode) -> CommandHeader {
        self.header(command, Nonce::Random)
    }

    fn header(&self, command: CommandCode, nonce: Nonce) -> CommandHeader {
        let nonce = match nonce {
            Nonce::Random => rand::thread_rng().gen_range(0..i32::MAX as u32),
            Nonce::Value(value) => value,
        };
        CommandHeader::new(self.device_id.as_u32(), nonce, self.sequence.next(), command)
    }

    /// Builds a header for `command` and sends it with no payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on socket failure, timeout or an undecodable reply.
    pub async fn execute(&self, command: CommandCode, nonce: Nonce) -> Result<bool, ClientError> {
        let _guard = self.exchange.lock().await;
        let header = self.header(command, nonce);
        self.exchange_locked(&header, &encode_header(&header)).await
    }

    /// Builds a header for `command` and sends it followed by `payload`.
    ///
    /// # Errors
    ///
    /// Same as [`CommandDispatcher::execute`].
    pub async fn execute_with<P: WireFormat + Sync>(
        &self,
        command: CommandCode,
        nonce: Nonce,
        payload: &P,
    ) -> Result<bool, ClientError> {
        let _guard = self.exchange.lock().await;
        let header = self.header(command, nonce);
        self.exchange_locked(&header, &encode_packet(&header, payload)).await
    }

    /// Sends a header built by the caller, with no payload.
    ///
    /// # Errors
    ///
    /// Same as [`CommandDispatcher::execute`].
    pub async fn send(&self, header: &CommandHeader) -> Result<bool, ClientError> {
        let _guard = self.exchange.lock().await;
        self.exchange_locked(header, &encode_header(header)).await
    }

    /// Sends a header built by the caller, followed by `payload`.
    ///
    /// # Errors
    ///
    /// Same as [`CommandDispatcher::execute`].
    pub async fn send_with<P: WireFormat + Sync>(
        &self,
        header: &CommandHeader,
        payload: &P,
    ) -> Result<bool, ClientError> {
        let _guard = self.exchange.lock().await;
        self.exchange_locked(header, &encode_packet(header, payload)).await
    }

    /// Caller must hold `self.exchange`.
    async fn exchange_locked(
        &self,
        header: &CommandHeader,
        datagram: &[u8],
    ) -> Result<bool, ClientError> {
        self.transport.send(datagram).await?;

        let deadline = self.response_timeout.map(|limit| (Instant::now() + limit, limit));
        let mut buf = [0u8; REPLY_BUFFER_SIZE];
        let reply = loop {
            let received = match deadline {
                Some((at, limit)) => tokio::time::timeout_at(at, self.transport.recv(&mut buf))
                    .await
                    .map_err(|_| ClientError::Timeout(limit))??,
                None => self.transport.recv(&mut buf).await?,
            };
            let reply: CommandHeader = decode(&buf[..received])?;
            if !is_stale(header, &reply) {
                break reply;
            }

            debug!(
                expected_sequence = header.sequence,
                reply_sequence = reply.sequence,
                "discarding late reply to an earlier command"
            );
            if let Some((at, limit)) = deadline {
                if Instant::now() >= at {
                    return Err(ClientError::Timeout(limit));
                }
            }
        };

        let accepted = header.is_acknowledged_by(&reply);
        debug!(
            command = ?header.command_code(),
            sequence = header.sequence,
            accepted,
            "command exchange complete"
        );
        if !accepted {
            warn!(
                expected_sequence = header.sequence,
                reply_sequence = reply.sequence,
                expected_command = format_args!("0x{:08X}", header.command),
                reply_command = format_args!("0x{:08X}", reply.command),
                "device reply does not match request"
            );
        }
        Ok(accepted)
    }
}

/// `true` if `reply` echoes a sequence issued before `request`.
///
/// Such a reply belongs to an exchange that timed out; it arrived after the
/// caller stopped waiting and is still queued on the socket.
fn is_stale(request: &CommandHeader, reply: &CommandHeader) -> bool {
    let behind = request.sequence.wrapping_sub(reply.sequence);
    behind != 0 && behind <= u32::MAX / 2
}
