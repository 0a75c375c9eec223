//! REAC wire protocol definitions
//!
//! Every REAC frame is a raw Ethernet frame with a fixed layout:
//!
//! ```text
//! +----------+----------+---------+----------------+-------------------+--------+
//! | dst (6)  | src (6)  | type(2) | header (36)    | samples (12*3*ch) | end(2) |
//! +----------+----------+---------+----------------+-------------------+--------+
//!                        0x88 0x19  counter|kind|data                    0xc2 0xea
//! ```
//!
//! The frame length depends only on the channel count, so a receiver can
//! reject foreign or truncated traffic by length and trailing marker alone.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Audio sample rate of a REAC link
pub const SAMPLE_RATE: u32 = 48_000;

/// Samples per channel carried by one packet
pub const SAMPLES_PER_PACKET: usize = 12;

/// Bytes per sample (24-bit)
pub const RESOLUTION_BYTES: usize = 3;

/// Packet rate of a Master
pub const PACKETS_PER_SECOND: u32 = SAMPLE_RATE / SAMPLES_PER_PACKET as u32;

/// Protocol discriminator carried in the Ethernet type field
pub const ETHERTYPE: [u8; 2] = [0x88, 0x19];

/// Offset of the discriminator inside a frame
pub const ETHERTYPE_OFFSET: usize = 12;

/// Trailing marker appended to every packet
pub const ENDING: [u8; 2] = [0xc2, 0xea];

/// Hardware address length
pub const MAC_LEN: usize = 6;

/// Ethernet header length (destination, source, type)
pub const ETHERNET_HEADER_LEN: usize = 2 * MAC_LEN + ETHERTYPE.len();

/// Length of the opaque part of the protocol header
pub const HEADER_DATA_LEN: usize = 32;

/// Protocol header length (counter, kind, data)
pub const PACKET_HEADER_LEN: usize = 2 + 2 + HEADER_DATA_LEN;

/// Placeholder address used by both ends until real addressing exists
pub const BROADCAST_MAC: [u8; MAC_LEN] = [0xff; MAC_LEN];

/// Protocol role of a link endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Drives the packet cadence
    Master,
    /// Replies to every packet received from the Master
    Slave,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Slave => write!(f, "slave"),
        }
    }
}

/// Identity of the peer device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub mac: [u8; MAC_LEN],
    /// Channels received from the peer
    pub in_channels: u16,
    /// Channels sent to the peer
    pub out_channels: u16,
}

impl DeviceIdentity {
    pub fn new(mac: [u8; MAC_LEN], in_channels: u16, out_channels: u16) -> Self {
        Self {
            mac,
            in_channels,
            out_channels,
        }
    }

    /// The identity assumed before any device discovery takes place
    pub fn placeholder() -> Self {
        Self::new([0x00, 0x40, 0xab, 0xc4, 0x80, 0xf6], 16, 8)
    }

    /// Layout of frames received from this device
    pub fn inbound_layout(&self) -> FrameLayout {
        FrameLayout::new(self.in_channels)
    }

    /// Layout of frames sent to this device
    pub fn outbound_layout(&self) -> FrameLayout {
        FrameLayout::new(self.out_channels)
    }

    /// Format the hardware address as `aa:bb:cc:dd:ee:ff`
    pub fn mac_string(&self) -> String {
        format_mac(&self.mac)
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Format a hardware address as colon separated hex
pub fn format_mac(mac: &[u8; MAC_LEN]) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse a colon separated hardware address
pub fn parse_mac(s: &str) -> Option<[u8; MAC_LEN]> {
    let mut mac = [0u8; MAC_LEN];
    let mut parts = s.split(':');
    for byte in mac.iter_mut() {
        let part = parts.next()?;
        if part.len() != 2 {
            return None;
        }
        *byte = u8::from_str_radix(part, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(mac)
}

/// REAC protocol header
///
/// Only the counter has meaning to the connection engine. `kind` and `data`
/// are computed by the data stream for outbound packets and handed back to it
/// for inbound ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub counter: u16,
    pub kind: [u8; 2],
    pub data: [u8; HEADER_DATA_LEN],
}

impl PacketHeader {
    pub fn new(counter: u16) -> Self {
        Self {
            counter,
            ..Self::default()
        }
    }

    /// Serialize into wire order
    pub fn to_bytes(&self) -> [u8; PACKET_HEADER_LEN] {
        let mut out = [0u8; PACKET_HEADER_LEN];
        out[0..2].copy_from_slice(&self.counter.to_le_bytes());
        out[2..4].copy_from_slice(&self.kind);
        out[4..].copy_from_slice(&self.data);
        out
    }

    /// Deserialize from wire order
    pub fn from_bytes(bytes: &[u8; PACKET_HEADER_LEN]) -> Self {
        let mut data = [0u8; HEADER_DATA_LEN];
        data.copy_from_slice(&bytes[4..]);
        Self {
            counter: u16::from_le_bytes([bytes[0], bytes[1]]),
            kind: [bytes[2], bytes[3]],
            data,
        }
    }
}

impl Default for PacketHeader {
    fn default() -> Self {
        Self {
            counter: 0,
            kind: [0; 2],
            data: [0; HEADER_DATA_LEN],
        }
    }
}

/// Byte offsets of a REAC frame for a given channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    channels: u16,
}

impl FrameLayout {
    pub const fn new(channels: u16) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Bytes of one sample frame across all channels
    pub fn bytes_per_sample(&self) -> usize {
        RESOLUTION_BYTES * self.channels as usize
    }

    /// Size of the sample block
    pub fn samples_len(&self) -> usize {
        SAMPLES_PER_PACKET * self.bytes_per_sample()
    }

    pub fn header_offset(&self) -> usize {
        ETHERNET_HEADER_LEN
    }

    pub fn samples_offset(&self) -> usize {
        ETHERNET_HEADER_LEN + PACKET_HEADER_LEN
    }

    pub fn ending_offset(&self) -> usize {
        self.samples_offset() + self.samples_len()
    }

    /// Total frame length
    pub fn frame_len(&self) -> usize {
        self.ending_offset() + ENDING.len()
    }
}

/// Check whether a frame carries the REAC discriminator
///
/// This is the predicate handed to the frame hook; it must stay cheap since
/// it runs on every inbound frame of the interface.
pub fn is_reac_frame(frame: &[u8]) -> bool {
    frame.get(ETHERTYPE_OFFSET..ETHERTYPE_OFFSET + ETHERTYPE.len()) == Some(&ETHERTYPE[..])
}
