//! ShangMi algorithm benchmarks.
//!
//! Run with: cargo bench -p gmssl-crypto

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SIZES: [usize; 3] = [1024, 16384, 1048576];

// ---------------------------------------------------------------------------
// SM3 / HMAC-SM3
// ---------------------------------------------------------------------------

fn bench_sm3(c: &mut Criterion) {
    use gmssl_crypto::hmac::Sm3Hmac;
    use gmssl_crypto::sm3::Sm3;

    let mut group = c.benchmark_group("sm3");
    let key = [0x0bu8; 32];

    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        let data = vec![0u8; size];

        group.bench_with_input(BenchmarkId::new("digest", size), &size, |b, _| {
            b.iter(|| Sm3::digest(&data).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("hmac", size), &size, |b, _| {
            b.iter(|| Sm3Hmac::mac(&key, &data).unwrap());
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// SM4 block and modes
// ---------------------------------------------------------------------------

fn bench_sm4(c: &mut Criterion) {
    use gmssl_crypto::modes::{sm4_cbc_decrypt, sm4_cbc_encrypt, sm4_ctr_crypt};
    use gmssl_crypto::sm4::Sm4Key;

    let key = [0x42u8; 16];
    let iv = [0x24u8; 16];

    let cipher = Sm4Key::new(&key).unwrap();
    let mut block = [0u8; 16];
    c.bench_function("sm4/encrypt_block", |b| {
        b.iter(|| cipher.encrypt_block(&mut block).unwrap());
    });

    let mut group = c.benchmark_group("sm4");
    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        let plaintext = vec![0u8; size];

        group.bench_with_input(BenchmarkId::new("cbc-encrypt", size), &size, |b, _| {
            b.iter(|| sm4_cbc_encrypt(&key, &iv, &plaintext).unwrap());
        });

        let ct = sm4_cbc_encrypt(&key, &iv, &plaintext).unwrap();
        group.bench_with_input(BenchmarkId::new("cbc-decrypt", size), &size, |b, _| {
            b.iter(|| sm4_cbc_decrypt(&key, &iv, &ct).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("ctr", size), &size, |b, _| {
            b.iter(|| sm4_ctr_crypt(&key, &iv, &plaintext).unwrap());
        });
    }
    group.finish();
}

fn bench_sm4_gcm(c: &mut Criterion) {
    use gmssl_crypto::modes::{sm4_gcm_decrypt, sm4_gcm_encrypt};

    let mut group = c.benchmark_group("sm4-gcm");

    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));

        let key = [0x42u8; 16];
        let nonce = [0u8; 12];
        let aad = b"benchmark";
        let plaintext = vec![0u8; size];

        group.bench_with_input(BenchmarkId::new("encrypt", size), &size, |b, _| {
            b.iter(|| sm4_gcm_encrypt(&key, &nonce, aad, &plaintext).unwrap());
        });

        let sealed = sm4_gcm_encrypt(&key, &nonce, aad, &plaintext).unwrap();
        group.bench_with_input(BenchmarkId::new("decrypt", size), &size, |b, _| {
            b.iter(|| sm4_gcm_decrypt(&key, &nonce, aad, &sealed).unwrap());
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// ZUC
// ---------------------------------------------------------------------------

fn bench_zuc(c: &mut Criterion) {
    use gmssl_crypto::zuc::zuc_crypt;

    let mut group = c.benchmark_group("zuc");
    let key = [0x3du8; 16];
    let iv = [0x84u8; 16];

    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        let data = vec![0u8; size];
        group.bench_with_input(BenchmarkId::new("keystream", size), &size, |b, _| {
            b.iter(|| zuc_crypt(&key, &iv, &data).unwrap());
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// SM2
// ---------------------------------------------------------------------------

fn bench_sm2(c: &mut Criterion) {
    use gmssl_crypto::sm2::{Sm2KeyPair, SM2_DEFAULT_ID};

    let mut group = c.benchmark_group("sm2");
    let key = Sm2KeyPair::generate().unwrap();
    let msg = b"benchmark message";

    group.bench_function("keygen", |b| {
        b.iter(|| Sm2KeyPair::generate().unwrap());
    });

    group.bench_function("sign", |b| {
        b.iter(|| key.sign_message(SM2_DEFAULT_ID, msg).unwrap());
    });

    let sig = key.sign_message(SM2_DEFAULT_ID, msg).unwrap();
    group.bench_function("verify", |b| {
        b.iter(|| key.verify_message(SM2_DEFAULT_ID, msg, &sig).unwrap());
    });

    let plaintext = [0x5au8; 64];
    group.bench_function("encrypt", |b| {
        b.iter(|| key.encrypt(&plaintext).unwrap());
    });

    let ct = key.encrypt(&plaintext).unwrap();
    group.bench_function("decrypt", |b| {
        b.iter(|| key.decrypt(&ct).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sm3,
    bench_sm4,
    bench_sm4_gcm,
    bench_zuc,
    bench_sm2,
);
criterion_main!(benches);
