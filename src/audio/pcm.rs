//! 24-bit PCM helpers for REAC sample blocks
//!
//! A sample block is interleaved: `SAMPLES_PER_PACKET` frames, each holding
//! one 3-byte little-endian sample per channel.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::{FrameLayout, RESOLUTION_BYTES, SAMPLES_PER_PACKET, SAMPLE_RATE};

/// Largest positive 24-bit sample
pub const I24_MAX: i32 = (1 << 23) - 1;

/// Smallest negative 24-bit sample
pub const I24_MIN: i32 = -(1 << 23);

/// Pack one sample; values outside the 24-bit range are clamped
pub fn pack_i24(sample: i32) -> [u8; RESOLUTION_BYTES] {
    let clamped = sample.clamp(I24_MIN, I24_MAX);
    let bytes = clamped.to_le_bytes();
    [bytes[0], bytes[1], bytes[2]]
}

/// Unpack one sample with sign extension
pub fn unpack_i24(bytes: [u8; RESOLUTION_BYTES]) -> i32 {
    i32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]) << 8 >> 8
}

/// Convert a float sample in `[-1.0, 1.0]` to 24-bit
pub fn f32_to_i24(sample: f32) -> i32 {
    (sample.clamp(-1.0, 1.0) * I24_MAX as f32) as i32
}

/// Convert a 24-bit sample to float
pub fn i24_to_f32(sample: i32) -> f32 {
    sample as f32 / I24_MAX as f32
}

/// Decode an interleaved sample block into per-sample values
pub fn unpack_block(block: &[u8]) -> Vec<i32> {
    block
        .chunks_exact(RESOLUTION_BYTES)
        .map(|c| unpack_i24([c[0], c[1], c[2]]))
        .collect()
}

/// Peak absolute level of a sample block, as a fraction of full scale
pub fn peak_level(block: &[u8]) -> f32 {
    unpack_block(block)
        .into_iter()
        .map(|s| i24_to_f32(s).abs())
        .fold(0.0, f32::max)
}

/// Sine generator producing one sample block per call
///
/// Every channel carries the same tone.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    layout: FrameLayout,
    frequency: f32,
    amplitude: f32,
    phase: f32,
}

impl ToneGenerator {
    pub fn new(layout: FrameLayout, frequency: f32, amplitude: f32) -> Self {
        Self {
            layout,
            frequency,
            amplitude: amplitude.clamp(0.0, 1.0),
            phase: 0.0,
        }
    }

    /// Produce the next packet's worth of samples
    pub fn next_block(&mut self) -> Bytes {
        let step = self.frequency / SAMPLE_RATE as f32;
        let mut block = BytesMut::with_capacity(self.layout.samples_len());

        for _ in 0..SAMPLES_PER_PACKET {
            let value = (self.phase * std::f32::consts::TAU).sin() * self.amplitude;
            let packed = pack_i24(f32_to_i24(value));
            for _ in 0..self.layout.channels() {
                block.put_slice(&packed);
            }
            self.phase = (self.phase + step).fract();
        }

        block.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i24_roundtrip_extremes() {
        for sample in [0, 1, -1, I24_MAX, I24_MIN, 123_456, -654_321] {
            assert_eq!(unpack_i24(pack_i24(sample)), sample);
        }
        assert_eq!(unpack_i24(pack_i24(i32::MAX)), I24_MAX);
        assert_eq!(unpack_i24(pack_i24(i32::MIN)), I24_MIN);
    }

    #[test]
    fn test_tone_block_size() {
        let layout = FrameLayout::new(8);
        let mut tone = ToneGenerator::new(layout, 1000.0, 0.5);

        let block = tone.next_block();
        assert_eq!(block.len(), layout.samples_len());

        // 1kHz at 48kHz: a full period every 48 samples, so four blocks peak
        let mut peak = peak_level(&block);
        for _ in 0..3 {
            peak = peak.max(peak_level(&tone.next_block()));
        }
        assert!((peak - 0.5).abs() < 0.01, "peak {}", peak);
    }

    #[test]
    fn test_silence_has_zero_peak() {
        assert_eq!(peak_level(&[0u8; 36]), 0.0);
    }
}
