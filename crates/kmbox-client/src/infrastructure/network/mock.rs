//! In-memory command transport for tests.
//!
//! # Why a fake transport?
//!
//! The real transport needs a device on the network.  `RecordingTransport`
//! plays the device in memory: every datagram sent is stored, and each one
//! is answered according to a [`ReplyMode`].  Tests can then assert exactly
//! which commands went out and in what order.
//!
//! ```ignore
//! let transport = Arc::new(RecordingTransport::new());
//! let client = KmBoxClient::with_transport(config, transport.clone())?;
//!
//! client.reboot().await?;
//!
//! assert_eq!(transport.headers()[0].command_code(), Some(CommandCode::Reboot));
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use kmbox_core::protocol::codec::{decode, encode_header};
use kmbox_core::protocol::messages::CommandHeader;

use crate::application::dispatch::CommandTransport;

/// How the fake device answers each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    /// Echo every request header.
    #[default]
    Echo,
    /// Echo the first `n` requests, then reply with a mismatched sequence.
    RejectAfter(usize),
    /// Never reply.
    Silent,
}

/// A fake device that records requests and replies from memory.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<Vec<u8>>>,
    replies: Mutex<VecDeque<Vec<u8>>>,
    mode: Mutex<ReplyMode>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingTransport {
    /// Creates a transport that echoes every request.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: ReplyMode) -> Self {
        let transport = Self::default();
        transport.set_mode(mode);
        transport
    }

    pub fn set_mode(&self, mode: ReplyMode) {
        *lock(&self.mode) = mode;
    }

    /// Every datagram sent so far, in order.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        lock(&self.requests).clone()
    }

    /// The decoded header of every request that carried one.
    pub fn headers(&self) -> Vec<CommandHeader> {
        lock(&self.requests)
            .iter()
            .filter_map(|datagram| decode(datagram).ok())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn reply_for(&self, index: usize, datagram: &[u8]) -> Option<Vec<u8>> {
        let mut header: CommandHeader = decode(datagram).ok()?;
        match *lock(&self.mode) {
            ReplyMode::Echo => {}
            ReplyMode::RejectAfter(n) if index < n => {}
            ReplyMode::RejectAfter(_) => header.sequence = header.sequence.wrapping_add(1),
            ReplyMode::Silent => return None,
        }
        Some(encode_header(&header).to_vec())
    }
}

#[async_trait]
impl CommandTransport for RecordingTransport {
    async fn send(&self, datagram: &[u8]) -> std::io::Result<usize> {
        let index = {
            let mut requests = lock(&self.requests);
            requests.push(datagram.to_vec());
            requests.len() - 1
        };
        if let Some(reply) = self.reply_for(index, datagram) {
            lock(&self.replies).push_back(reply);
        }
        Ok(datagram.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        let next = lock(&self.replies).pop_front();
        match next {
            Some(reply) => {
                let n = reply.len().min(buf.len());
                buf[..n].copy_from_slice(&reply[..n]);
                Ok(n)
            }
            None => std::future::pending().await,
        }
    }
}
