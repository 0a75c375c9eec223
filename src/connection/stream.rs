//! Header computation for outbound packets
//!
//! The REAC header carries role and stream specific fields beyond the
//! sequence counter. Computing them belongs to a companion data stream; the
//! engine only calls into it once per outbound packet and once per delivered
//! inbound packet.

use crate::error::StreamError;
use crate::protocol::PacketHeader;

/// Companion that fills and consumes protocol headers
pub trait DataStream: Send {
    /// Fill the header of the next outbound packet
    fn process_packet(&mut self, header: &mut PacketHeader) -> Result<(), StreamError>;

    /// Observe the header of a delivered inbound packet
    fn got_packet(&mut self, header: &PacketHeader);
}

/// Data stream that only stamps a wrapping sequence counter
#[derive(Debug, Clone, Default)]
pub struct CounterStream {
    next_counter: u16,
    last_received: Option<PacketHeader>,
}

impl CounterStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header of the most recent inbound packet, if any
    pub fn last_received(&self) -> Option<&PacketHeader> {
        self.last_received.as_ref()
    }
}

impl DataStream for CounterStream {
    fn process_packet(&mut self, header: &mut PacketHeader) -> Result<(), StreamError> {
        header.counter = self.next_counter;
        self.next_counter = self.next_counter.wrapping_add(1);
        Ok(())
    }

    fn got_packet(&mut self, header: &PacketHeader) {
        self.last_received = Some(*header);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_wraps() {
        let mut stream = CounterStream::new();
        stream.next_counter = 65535;

        let mut header = PacketHeader::default();
        stream.process_packet(&mut header).unwrap();
        assert_eq!(header.counter, 65535);
        stream.process_packet(&mut header).unwrap();
        assert_eq!(header.counter, 0);
    }

    #[test]
    fn test_got_packet_remembers_header() {
        let mut stream = CounterStream::new();
        assert!(stream.last_received().is_none());

        stream.got_packet(&PacketHeader::new(42));
        assert_eq!(stream.last_received().map(|h| h.counter), Some(42));
    }
}
