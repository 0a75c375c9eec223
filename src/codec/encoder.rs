//! Outbound frame construction
//!
//! Builds a complete Ethernet frame for one packet, zero-filling the sample
//! block when the pipeline has nothing to send.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::EncodeError;
use crate::protocol::{FrameLayout, PacketHeader, BROADCAST_MAC, ENDING, ETHERTYPE};

/// Encode one REAC frame
///
/// `samples` must hold exactly `layout.samples_len()` bytes. `None` encodes
/// silence.
pub fn encode(
    header: &PacketHeader,
    samples: Option<&[u8]>,
    layout: FrameLayout,
) -> Result<Bytes, EncodeError> {
    let samples_len = layout.samples_len();
    if let Some(samples) = samples {
        if samples.len() != samples_len {
            return Err(EncodeError::SampleSizeMismatch {
                expected: samples_len,
                actual: samples.len(),
            });
        }
    }

    let mut frame = BytesMut::with_capacity(layout.frame_len());

    // Link-layer header
    frame.put_slice(&BROADCAST_MAC);
    frame.put_slice(&BROADCAST_MAC);
    frame.put_slice(&ETHERTYPE);

    frame.put_slice(&header.to_bytes());

    match samples {
        Some(samples) => frame.put_slice(samples),
        None => frame.put_bytes(0, samples_len),
    }

    frame.put_slice(&ENDING);

    debug_assert_eq!(frame.len(), layout.frame_len());
    Ok(frame.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{is_reac_frame, ETHERNET_HEADER_LEN};

    #[test]
    fn test_encode_silence() {
        let layout = FrameLayout::new(8);
        let frame = encode(&PacketHeader::new(7), None, layout).unwrap();

        assert_eq!(frame.len(), layout.frame_len());
        assert!(is_reac_frame(&frame));
        assert_eq!(&frame[..12], &[0xff; 12]);
        assert_eq!(&frame[ETHERNET_HEADER_LEN..ETHERNET_HEADER_LEN + 2], &[7, 0]);
        assert!(frame[layout.samples_offset()..layout.ending_offset()]
            .iter()
            .all(|&b| b == 0));
        assert_eq!(&frame[layout.ending_offset()..], &ENDING);
    }

    #[test]
    fn test_encode_samples() {
        let layout = FrameLayout::new(2);
        let samples: Vec<u8> = (0..layout.samples_len() as u8).collect();
        let frame = encode(&PacketHeader::new(1), Some(&samples), layout).unwrap();

        assert_eq!(&frame[layout.samples_offset()..layout.ending_offset()], &samples[..]);
    }

    #[test]
    fn test_encode_wrong_size() {
        let layout = FrameLayout::new(2);
        let samples = vec![0u8; layout.samples_len() - 1];
        let result = encode(&PacketHeader::new(1), Some(&samples), layout);

        assert_eq!(
            result,
            Err(EncodeError::SampleSizeMismatch {
                expected: layout.samples_len(),
                actual: layout.samples_len() - 1,
            })
        );
    }
}
