//! # Poolakey Billing Benchmarks
//!
//! | Subsystem | Path | Target |
//! |-----------|------|--------|
//! | pk-03 Signature Verification | RSA-2048 PKCS#1 v1.5 verify | < 1ms |
//! | pk-04 Result Parser | Verified purchase parse | < 1ms |
//! | pk-04 Result Parser | 100-item page, parallel | < 20ms |

use criterion::{criterion_group, criterion_main};
use pk_tests::benchmarks::{pk_03_signature, pk_04_result_parser};

criterion_group!(
    signature_benches,
    pk_03_signature::bench_single_verification,
    pk_03_signature::bench_batch_verification
);
criterion_group!(
    parser_benches,
    pk_04_result_parser::bench_single_parse,
    pk_04_result_parser::bench_purchase_pages
);
criterion_main!(signature_benches, parser_benches);
