//! # PK-04 Result Parser Benchmarks
//!
//! Parsing cost with and without the security check, and a full purchase
//! query page through the parallel batch path.

use super::signed_purchases;
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use pk_03_signature_verification::testing::*;
use pk_04_result_parser::{ResultParser, ResultParserApi};
use shared_types::{RawPurchaseList, RawResult, SecurityCheck};
use std::time::Duration;

pub fn bench_single_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("pk-04-result-parser");
    group.measurement_time(Duration::from_secs(5));
    let raw = RawResult::ok(SIGNED_PURCHASE_DATA, SIGNED_PURCHASE_SHA1);

    let unchecked = ResultParser::new(SecurityCheck::Disabled);
    group.bench_function("parse_unchecked", |b| b.iter(|| black_box(unchecked.parse(&raw))));

    let secured = ResultParser::new(SecurityCheck::enabled(TEST_PUBLIC_KEY));
    group.bench_function("parse_verified", |b| b.iter(|| black_box(secured.parse(&raw))));

    group.finish();
}

pub fn bench_purchase_pages(c: &mut Criterion) {
    let mut group = c.benchmark_group("pk-04-purchase-pages");
    group.measurement_time(Duration::from_secs(5));
    let parser = ResultParser::new(SecurityCheck::enabled(TEST_PUBLIC_KEY));
    let signer = TestSigner::new();

    for size in [10usize, 100] {
        let (data, signatures): (Vec<String>, Vec<String>) =
            signed_purchases(&signer, size).into_iter().unzip();
        let page = RawPurchaseList {
            response_code: 0,
            purchase_data_list: data,
            signature_list: signatures,
            continuation_token: None,
        };

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("verified_page", size), &page, |b, page| {
            b.iter(|| black_box(parser.parse_purchase_list(page)))
        });
    }

    group.finish();
}
