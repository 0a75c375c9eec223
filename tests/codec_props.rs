use proptest::prelude::*;

use reac_link::codec::{decode, encode};
use reac_link::error::DecodeError;
use reac_link::protocol::{is_reac_frame, FrameLayout, PacketHeader, HEADER_DATA_LEN};

fn layout_and_samples() -> impl Strategy<Value = (FrameLayout, Vec<u8>)> {
    (1u16..=40).prop_flat_map(|channels| {
        let layout = FrameLayout::new(channels);
        (
            Just(layout),
            prop::collection::vec(any::<u8>(), layout.samples_len()),
        )
    })
}

fn header() -> impl Strategy<Value = PacketHeader> {
    (any::<u16>(), any::<[u8; 2]>(), prop::collection::vec(any::<u8>(), HEADER_DATA_LEN)).prop_map(
        |(counter, kind, data)| {
            let mut header = PacketHeader::new(counter);
            header.kind = kind;
            header.data.copy_from_slice(&data);
            header
        },
    )
}

proptest! {
    #[test]
    fn encoded_frames_decode_to_their_parts(
        (layout, samples) in layout_and_samples(),
        header in header(),
    ) {
        let frame = encode(&header, Some(&samples), layout).unwrap();
        prop_assert_eq!(frame.len(), layout.frame_len());
        prop_assert!(is_reac_frame(&frame));

        let decoded = decode(&frame, layout).unwrap();
        prop_assert_eq!(decoded.header, header);
        prop_assert_eq!(decoded.samples(&frame).unwrap(), &samples[..]);
    }

    #[test]
    fn decode_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..1500),
        channels in 1u16..=40,
    ) {
        let _ = decode(&data, FrameLayout::new(channels));
    }

    #[test]
    fn corrupted_trailer_is_rejected(
        (layout, samples) in layout_and_samples(),
        counter in any::<u16>(),
        flip in 1u8..=255,
        position in 0usize..2,
    ) {
        let mut frame = encode(&PacketHeader::new(counter), Some(&samples), layout)
            .unwrap()
            .to_vec();
        let index = layout.ending_offset() + position;
        frame[index] ^= flip;

        let is_bad_trailer = matches!(
            decode(&frame, layout),
            Err(DecodeError::BadTrailer { .. })
        );
        prop_assert!(is_bad_trailer);
    }

    #[test]
    fn wrong_channel_count_is_rejected(
        (layout, samples) in layout_and_samples(),
        other in 1u16..=40,
    ) {
        prop_assume!(other != layout.channels());
        let frame = encode(&PacketHeader::new(0), Some(&samples), layout).unwrap();

        let is_length_mismatch = matches!(
            decode(&frame, FrameLayout::new(other)),
            Err(DecodeError::LengthMismatch { .. })
        );
        prop_assert!(is_length_mismatch);
    }
}
