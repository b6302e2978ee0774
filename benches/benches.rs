use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use rand::Rng;

use tsmeta::descriptor::{decode, Descriptors};
use tsmeta::record::Record;
use tsmeta::{read_units, Config, StreamProcessor, Unit};

const NUM_UNITS: usize = 1000;

/// NUM_UNITS null units, with a few random bytes of garbage in front of every tenth.
fn stream() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut dat = Vec::with_capacity(NUM_UNITS * 200);
    for i in 0..NUM_UNITS {
        if i % 10 == 0 {
            for _ in 0..rng.gen_range(1..8) {
                // never a sync byte
                dat.push(rng.gen_range(0..0x47u8));
            }
        }
        let mut unit = [0xffu8; 188];
        unit[..4].copy_from_slice(&[0x47, 0x1f, 0xff, 0x10]);
        dat.extend_from_slice(&unit);
    }
    dat
}

fn bench_synchronization(c: &mut Criterion) {
    let data = stream();
    let mut group = c.benchmark_group("synchronize");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("read_units", |b| {
        b.iter(|| {
            let units: Vec<Unit> = read_units(Cursor::new(&data))
                .map_while(Result::ok)
                .collect();
            assert_eq!(units.len(), NUM_UNITS);
        });
    });
    group.bench_function("process", |b| {
        b.iter(|| {
            let mut processor = StreamProcessor::new(Config::default(), Vec::<Record>::new());
            let _ = processor.run(Cursor::new(&data)).unwrap();
        });
    });
    group.finish();
}

fn bench_descriptors(c: &mut Criterion) {
    #[rustfmt::skip]
    let mut dat: Vec<u8> = vec![
        0x4d, 0x0c, b'e', b'n', b'g', 0x05, 0x00, b'N', b'e', b'w', b's', 0x02, 0x00, b'!',
        0x50, 0x0a, 0x05, 0x03, 0x01, b'e', b'n', b'g', 0x00, b'H', b'D', b'!',
    ];
    let ext = b"\x4e\x1d\x01eng\x0f\x05\x00Dir \x08\x00Someone\x08\x00Details";
    dat.extend_from_slice(ext);

    let mut group = c.benchmark_group("descriptors");
    group.throughput(Throughput::Bytes(dat.len() as u64));
    group.bench_function("decode_loop", |b| {
        b.iter(|| {
            for d in Descriptors::new(&dat) {
                let d = d.unwrap();
                let _ = decode(d.tag, d.data).unwrap();
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_synchronization, bench_descriptors);
criterion_main!(benches);
