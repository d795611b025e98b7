//! Application layer use cases for the client.
//!
//! # What use cases does the client have?
//!
//! - **`dispatch`** – Builds command headers and performs one correlated
//!   request/reply exchange at a time.  The socket is reached through the
//!   `CommandTransport` trait, injected at construction time.
//!
//! - **`type_text`** – Turns a string into an ordered sequence of keyboard
//!   commands using the US-layout character table.
//!
//! - **`upload_image`** – Splits an LCD frame into 40 lines and uploads them
//!   in order, stopping at the first rejected line.

pub mod dispatch;
pub mod type_text;
pub mod upload_image;
