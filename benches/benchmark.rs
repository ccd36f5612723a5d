//! パフォーマンスベンチマーク
//!
//! ワークブックの解析と、複数ワークブックの並列解析のスループットを測定します。
//! フィクスチャはrust_xlsxwriterでメモリ上に生成します。

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_xlsxwriter::Workbook as XlsxWorkbook;
use sheetstage::{parse_movies, IngestBuilder};

/// 指定行数の映画シートを生成
fn generate_watchlist(rows: u32) -> Vec<u8> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in ["id", "movieId", "title", "rating", "review", "year"]
        .iter()
        .enumerate()
    {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }

    for r in 1..=rows {
        worksheet.write_string(r, 0, format!("movie-{}", r)).unwrap();
        worksheet.write_number(r, 1, f64::from(r)).unwrap();
        worksheet.write_string(r, 2, format!("Title {}", r)).unwrap();
        worksheet.write_string(r, 3, "PG").unwrap();
        worksheet
            .write_string(r, 4, "A perfectly fine evening at the movies.")
            .unwrap();
        worksheet
            .write_number(r, 5, f64::from(1950 + r % 70))
            .unwrap();
    }

    workbook.save_to_buffer().unwrap()
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_movies");

    for rows in [100u32, 1_000, 10_000] {
        let data = generate_watchlist(rows);
        group.throughput(Throughput::Elements(u64::from(rows)));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| {
                let movies = parse_movies(black_box(data)).unwrap();
                black_box(movies)
            });
        });
    }

    group.finish();
}

fn benchmark_parse_many(c: &mut Criterion) {
    let inputs: Vec<Vec<u8>> = (0..16).map(|_| generate_watchlist(1_000)).collect();
    let ingestor = IngestBuilder::new().build().unwrap();

    let mut group = c.benchmark_group("parse_many");
    group.throughput(Throughput::Elements(inputs.len() as u64));
    group.sample_size(10);

    group.bench_function("16_workbooks_x_1000_rows", |b| {
        b.iter(|| {
            let results = ingestor.parse_many(black_box(&inputs));
            black_box(results)
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_parse_many);
criterion_main!(benches);
