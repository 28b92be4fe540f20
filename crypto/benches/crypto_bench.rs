use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vantage_crypto::{TokenCodec, TokenKey};

const TOTP2_PAYLOAD: &str = "TOTP2;ap-northeast-1;1700000000000;1700000000042;2001:db8:85a3::8a2e:370:7334";

fn codec() -> TokenCodec {
    TokenCodec::new(TokenKey::derive("bench-secret").unwrap())
}

fn encrypt_bench(c: &mut Criterion) {
    let codec = codec();

    c.bench_function("token_encrypt_totp2", |b| {
        b.iter(|| codec.encrypt(black_box(TOTP2_PAYLOAD)))
    });
}

fn decrypt_bench(c: &mut Criterion) {
    let codec = codec();
    let token = codec.encrypt(TOTP2_PAYLOAD).unwrap();

    c.bench_function("token_decrypt_totp2", |b| {
        b.iter(|| codec.decrypt(black_box(&token)))
    });
}

fn key_derivation_bench(c: &mut Criterion) {
    c.bench_function("token_key_derive", |b| {
        b.iter(|| TokenKey::derive(black_box("a reasonably long shared secret")))
    });
}

criterion_group!(benches, encrypt_bench, decrypt_bench, key_derivation_bench);
criterion_main!(benches);
