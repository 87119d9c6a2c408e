//! # PK-03 Signature Verification Benchmarks
//!
//! - Single verify, strict and with fallback
//! - Fallback cost when the signer migrated to SHA-256
//! - Sequential vs parallel batches

use super::signed_purchases;
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use pk_03_signature_verification::testing::*;
use pk_03_signature_verification::{
    SignatureVerificationApi, SignatureVerificationService, VerificationMode, VerificationRequest,
};
use std::time::Duration;

pub fn bench_single_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("pk-03-signature-verification");
    group.measurement_time(Duration::from_secs(5));
    let service = SignatureVerificationService::new();

    group.bench_function("verify_sha1_strict", |b| {
        b.iter(|| {
            black_box(service.verify_with_mode(
                TEST_PUBLIC_KEY,
                SIGNED_PURCHASE_DATA,
                SIGNED_PURCHASE_SHA1,
                VerificationMode::Strict,
            ))
        })
    });

    group.bench_function("verify_sha256_fallback", |b| {
        b.iter(|| {
            black_box(service.verify_with_mode(
                TEST_PUBLIC_KEY,
                SIGNED_PURCHASE_DATA,
                SIGNED_PURCHASE_SHA256,
                VerificationMode::WithFallback,
            ))
        })
    });

    let tampered = tamper_signature(SIGNED_PURCHASE_SHA1);
    group.bench_function("verify_tampered_fallback", |b| {
        b.iter(|| {
            black_box(service.verify_with_mode(
                TEST_PUBLIC_KEY,
                SIGNED_PURCHASE_DATA,
                &tampered,
                VerificationMode::WithFallback,
            ))
        })
    });

    group.finish();
}

pub fn bench_batch_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("pk-03-batch-verification");
    group.measurement_time(Duration::from_secs(5));
    let service = SignatureVerificationService::new();
    let signer = TestSigner::new();

    for size in [10usize, 50, 200] {
        let requests: Vec<VerificationRequest> = signed_purchases(&signer, size)
            .into_iter()
            .map(|(data, signature)| VerificationRequest {
                public_key: TEST_PUBLIC_KEY.to_string(),
                signed_data: data,
                signature,
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("sequential", size), &requests, |b, requests| {
            b.iter(|| {
                let valid = requests
                    .iter()
                    .filter(|r| {
                        service
                            .verify(&r.public_key, &r.signed_data, &r.signature)
                            .unwrap_or(false)
                    })
                    .count();
                black_box(valid)
            })
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &requests, |b, requests| {
            b.iter(|| black_box(service.batch_verify(requests, VerificationMode::Strict)))
        });
    }

    group.finish();
}
