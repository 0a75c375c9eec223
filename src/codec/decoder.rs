//! Inbound frame validation and parsing

use crate::error::DecodeError;
use crate::protocol::{FrameLayout, PacketHeader, ENDING, PACKET_HEADER_LEN};

/// A validated inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    pub header: PacketHeader,
    /// Offset of the sample block inside the frame
    pub samples_offset: usize,
    /// Length of the sample block
    pub samples_len: usize,
}

impl DecodedFrame {
    /// Borrow the sample block from the frame this was decoded from
    ///
    /// Returns `None` if `frame` is too short, which can only happen when a
    /// different frame is passed in.
    pub fn samples<'a>(&self, frame: &'a [u8]) -> Option<&'a [u8]> {
        frame.get(self.samples_offset..self.samples_offset + self.samples_len)
    }
}

/// Validate and parse one REAC frame
///
/// The frame must include the link-layer header. Length is checked first,
/// then the trailing marker; the header is only parsed once both pass.
pub fn decode(frame: &[u8], layout: FrameLayout) -> Result<DecodedFrame, DecodeError> {
    let expected = layout.frame_len();
    if frame.len() != expected {
        return Err(DecodeError::LengthMismatch {
            expected,
            actual: frame.len(),
        });
    }

    let ending = &frame[layout.ending_offset()..];
    if ending != ENDING {
        return Err(DecodeError::BadTrailer {
            found: [ending[0], ending[1]],
        });
    }

    let offset = layout.header_offset();
    let mut raw = [0u8; PACKET_HEADER_LEN];
    raw.copy_from_slice(&frame[offset..offset + PACKET_HEADER_LEN]);

    Ok(DecodedFrame {
        header: PacketHeader::from_bytes(&raw),
        samples_offset: layout.samples_offset(),
        samples_len: layout.samples_len(),
    })
}
