//! # Poolakey Benchmarks
//!
//! Criterion benchmarks for the hot paths run on every purchase: signature
//! verification and result parsing.

pub mod pk_03_signature;
pub mod pk_04_result_parser;

use pk_03_signature_verification::testing::TestSigner;
use rand::Rng;

/// Random purchase data in the service's JSON shape, signed with the test key.
pub fn signed_purchases(signer: &TestSigner, count: usize) -> Vec<(String, String)> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let data = serde_json::json!({
                "orderId": format!("GPA.{}", rng.gen::<u32>()),
                "purchaseToken": format!("tok-{}-{}", i, rng.gen::<u64>()),
                "developerPayload": format!("payload-{i}"),
                "packageName": "com.example.app",
                "purchaseState": rng.gen_range(0..2),
                "purchaseTime": rng.gen_range(1_600_000_000_000u64..1_800_000_000_000),
                "productId": format!("sku_{}", i % 16),
            })
            .to_string();
            let signature = signer.sign_sha1(&data);
            (data, signature)
        })
        .collect()
}
