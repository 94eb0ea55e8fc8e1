use criterion::{black_box, criterion_group, criterion_main, Criterion};

use expander_ec::{graph, Codec};

fn bench_graph_build(c: &mut Criterion) {
	c.bench_function("ramanujan_5_13", |b| b.iter(|| graph::ramanujan(black_box(5), black_box(13)).unwrap()));
}

fn bench_encode(c: &mut Criterion) {
	let mut codec = Codec::by_code_dimension(80_808).unwrap();
	let k = codec.params().unwrap().k;
	let message: Vec<u8> = (0..k).map(|i| (i * 7 + 3) as u8).collect();
	c.bench_function("encode_k80808", |b| {
		b.iter(|| codec.encode(black_box(&message)).unwrap())
	});
}

fn bench_decode_clean(c: &mut Criterion) {
	let mut codec = Codec::by_code_dimension(80_808).unwrap();
	let k = codec.params().unwrap().k;
	let message: Vec<u8> = (0..k).map(|i| (i * 7 + 3) as u8).collect();
	let codeword = codec.encode(&message).unwrap();
	c.bench_function("decode_clean_k80808", |b| {
		b.iter(|| codec.decode(black_box(&codeword), &[], None).unwrap())
	});
}

criterion_group!(benches, bench_graph_build, bench_encode, bench_decode_clean);
criterion_main!(benches);
