//! REAC packet codec
//!
//! Stateless conversion between raw Ethernet frames and typed packet
//! headers plus sample payloads.

pub mod encoder;
pub mod decoder;

pub use encoder::encode;
pub use decoder::{decode, DecodedFrame};
