//! Protocol module containing message types, header nonces and the binary codec.

pub mod codec;
pub mod messages;
pub mod nonce;
pub mod sequence;

pub use codec::{decode, encode, encode_header, encode_packet, ProtocolError, WireFormat, WireReader};
pub use messages::*;
pub use sequence::SequenceCounter;
