use criterion::{black_box, criterion_group, criterion_main, Criterion};

use reac_link::audio::ToneGenerator;
use reac_link::codec::{decode, encode};
use reac_link::protocol::{FrameLayout, PacketHeader};

fn bench_codec(c: &mut Criterion) {
    for channels in [8u16, 16, 40] {
        let layout = FrameLayout::new(channels);
        let samples = ToneGenerator::new(layout, 1000.0, 0.5).next_block();
        let header = PacketHeader::new(1234);
        let frame = encode(&header, Some(&samples[..]), layout).unwrap();

        c.bench_function(&format!("encode_{}ch", channels), |b| {
            b.iter(|| encode(black_box(&header), Some(black_box(&samples[..])), layout))
        });
        c.bench_function(&format!("encode_silence_{}ch", channels), |b| {
            b.iter(|| encode(black_box(&header), None, layout))
        });
        c.bench_function(&format!("decode_{}ch", channels), |b| {
            b.iter(|| decode(black_box(&frame), layout))
        });
    }
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
