// benches/filter_bench.rs
//! Benchmarks for per-item filtering and derived metrics.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tubesift::collector::enrich::{duration_seconds, engagement_rate};
use tubesift::{ChannelAttributes, ChannelId, CollectorConfig, QualityFilter, RawItem, VideoId};

fn sample_items(count: usize) -> Vec<RawItem> {
    (0..count)
        .map(|i| {
            let views = 1_000 + (i as u64 * 37) % 50_000;
            let likes = (i as u64 * 13) % 900;
            RawItem {
                video_id: VideoId::new(format!("video{:06}", i)),
                keyword: "brand".to_string(),
                title: format!("Review number {}", i),
                description: String::new(),
                channel_id: ChannelId::new(format!("UC{:022}", i % 40)),
                channel_title: String::new(),
                published_at: None,
                category_id: if i % 3 == 0 { "10" } else { "22" }.to_string(),
                tags: Vec::new(),
                default_language: "en".to_string(),
                duration: "PT7M42S".to_string(),
                duration_seconds: 462,
                view_count: views,
                like_count: likes,
                comment_count: likes / 10,
                engagement_rate: engagement_rate(views, likes, likes / 10),
                channel: ChannelAttributes {
                    country: if i % 5 == 0 { "GB" } else { "US" }.to_string(),
                    subscriber_count: (i as u64 * 997) % 80_000,
                    channel_view_count: (i as u64 * 45_001) % 3_000_000,
                    ..ChannelAttributes::default()
                },
                quality_filter_passed: false,
                filter_fail_reason: None,
            }
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let filter = QualityFilter::new(CollectorConfig::default().filter_criteria());
    let mut group = c.benchmark_group("quality_filter");

    for size in [100, 1_000, 10_000].iter() {
        let items = sample_items(*size);
        group.bench_with_input(BenchmarkId::new("evaluate", size), &items, |b, items| {
            b.iter(|| {
                items
                    .iter()
                    .filter(|item| filter.evaluate(black_box(item)).passed)
                    .count()
            });
        });
    }

    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    c.bench_function("duration_seconds", |b| {
        b.iter(|| duration_seconds(black_box("P1DT2H3M4S")))
    });
    c.bench_function("engagement_rate", |b| {
        b.iter(|| engagement_rate(black_box(48_213), black_box(1_904), black_box(233)))
    });
}

criterion_group!(benches, bench_filter, bench_metrics);
criterion_main!(benches);
