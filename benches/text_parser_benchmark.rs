//! Text parser and block extraction throughput
//!
//! A listing page holds a few hundred blocks; parsing runs once per block
//! after the scroll loop settles.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use warehouse_deals_lib::infrastructure::parsing::{BlockExtractor, TextParser};

const BLOCKS: &[&str] = &[
    "123456\nPaper Towels 12pk\n$14.99\n-$3.00\n$11.99\nPRICE AT REGISTER\nEXP. 12/31",
    "87745\nKirkland Signature\nPork Back Ribs\nLESS IN-STORE REBATE\n$2.00 / KG\nREGULAR PRICE: $11.99 / KG",
    "500123\nTide Pods 104ct\nLESS IN-STORE REBATE\n$6.00",
    "990011\nOffice Chair Mesh\n149.97\n199.99",
    "990012\nPatio Set\n4 Piece\n$299.97",
];

fn listing_page(blocks: usize) -> String {
    let containers: String = (0..blocks)
        .map(|i| {
            let text = BLOCKS[i % BLOCKS.len()].replace('\n', "</p><p>");
            format!(
                r#"<div id="productDesc-{i}"><img src="/img/{i}.jpg"><div class="absolute left-0 top-0 min-w-fit"><p>{text}</p></div></div>"#
            )
        })
        .collect();
    format!("<html><body>{containers}</body></html>")
}

fn benchmark_text_parser(c: &mut Criterion) {
    let parser = TextParser::new();

    c.bench_function("parse_single_block", |b| {
        b.iter(|| parser.parse(black_box(BLOCKS[0])));
    });

    c.bench_function("parse_mixed_layouts", |b| {
        b.iter(|| {
            BLOCKS
                .iter()
                .filter_map(|block| parser.parse(black_box(block)))
                .count()
        });
    });
}

fn benchmark_block_extraction(c: &mut Criterion) {
    let extractor = BlockExtractor::new().expect("selectors compile");
    let parser = TextParser::new();
    let page = listing_page(300);

    c.bench_function("extract_and_parse_300_blocks", |b| {
        b.iter(|| {
            extractor
                .extract(black_box(&page))
                .iter()
                .filter_map(|block| parser.parse(&block.text))
                .count()
        });
    });
}

criterion_group!(benches, benchmark_text_parser, benchmark_block_extraction);
criterion_main!(benches);
