//! Audio pipeline helpers

pub mod buffer;
pub mod pcm;

pub use buffer::{create_shared_queue, PacketQueue, SharedPacketQueue};
pub use pcm::ToneGenerator;
