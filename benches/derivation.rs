//! Derivation and addressing benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kilt_did_core::crypto::{ss58, DerivationPath, KeyDerivationService, NetworkPrefix};
use kilt_did_core::identity::derive_authentication_did;

const DEV_PHRASE: &str = "bottom drive obey lake curtain smoke basket hold race lonely fit walk";

fn bench_ss58_encode(c: &mut Criterion) {
    let public_key = [0x42u8; 32];

    c.bench_function("ss58_encode_kilt", |b| {
        b.iter(|| {
            let _ = ss58::encode(black_box(&public_key), NetworkPrefix::KILT);
        });
    });

    c.bench_function("ss58_encode_two_byte_prefix", |b| {
        let prefix = NetworkPrefix::new(2007).unwrap();
        b.iter(|| {
            let _ = ss58::encode(black_box(&public_key), prefix);
        });
    });
}

fn bench_ss58_decode(c: &mut Criterion) {
    let address = ss58::encode(&[0x42u8; 32], NetworkPrefix::KILT).unwrap();

    c.bench_function("ss58_decode", |b| {
        b.iter(|| {
            let _ = ss58::decode(black_box(&address));
        });
    });
}

fn bench_path_parse(c: &mut Criterion) {
    c.bench_function("path_parse", |b| {
        b.iter(|| {
            let _ = DerivationPath::parse(black_box("//did//assertion//0/soft"));
        });
    });
}

fn bench_did_derivation(c: &mut Criterion) {
    let service: KeyDerivationService = KeyDerivationService::default();

    c.bench_function("did_derive_authentication", |b| {
        b.iter(|| {
            let _ = derive_authentication_did(&service, black_box(DEV_PHRASE), None);
        });
    });
}

criterion_group!(
    benches,
    bench_ss58_encode,
    bench_ss58_decode,
    bench_path_parse,
    bench_did_derivation,
);

criterion_main!(benches);
