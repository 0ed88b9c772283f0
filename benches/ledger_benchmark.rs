use criterion::{black_box, criterion_group, criterion_main, Criterion};
use revest::prelude::*;
use chrono::NaiveDate;
use std::sync::OnceLock;

// Static storage for the synthetic ledger to avoid rebuilding per benchmark
static DATASET: OnceLock<LedgerDataset> = OnceLock::new();

const PAYERS: [&str; 4] = ["Medicare", "Medicaid", "Aetna", "Cigna"];
const PROCEDURES: [(&str, &str); 5] = [
    ("99213", "Office Visit"),
    ("99214", "Extended Visit"),
    ("99285", "ER Visit"),
    ("93000", "EKG"),
    ("J0696", "Injection"),
];

// Helper function to build a deterministic synthetic ledger
fn get_dataset() -> &'static LedgerDataset {
    DATASET.get_or_init(|| {
        let mut records = Vec::with_capacity(100_000);
        for i in 0..100_000usize {
            let (code, description) = PROCEDURES[i % PROCEDURES.len()];
            let day = (i % 364) as u32;
            records.push(LedgerRecord {
                payer: PAYERS[i % PAYERS.len()].to_string(),
                procedure_code: ProcedureCode(code.to_string()),
                procedure_description: description.to_string(),
                service_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Days::new(day as u64),
                amount_paid: 40.0 + (i % 997) as f64 * 0.25,
            });
        }
        LedgerDataset::from_records(records)
    })
}

fn benchmark_aggregation(c: &mut Criterion) {
    let dataset = get_dataset();

    c.bench_function("aggregate_100k_records", |b| {
        b.iter(|| {
            let table = dataset.aggregate_all();
            black_box(table)
        })
    });
}

fn benchmark_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let dataset = get_dataset();

    let window = DateWindow::new(
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
    );

    group.bench_function("window_filter", |b| {
        b.iter(|| {
            dataset.query().window(black_box(window)).count()
        });
    });

    group.bench_function("payer_filter", |b| {
        b.iter(|| {
            dataset
                .query()
                .payer(PayerChoice::One("Medicare".to_string()))
                .count()
        });
    });

    group.bench_function("full_pipeline", |b| {
        let params = PipelineParams::all()
            .with_window(window)
            .with_payer(PayerChoice::One("Medicare".to_string()));
        b.iter(|| {
            let table = dataset.pipeline(black_box(&params));
            black_box(table)
        });
    });

    group.finish();
}

fn benchmark_projection(c: &mut Criterion) {
    let dataset = get_dataset();
    let table = dataset.aggregate_all();
    let key = table.groups[0].key.clone();

    c.bench_function("project_selected_group", |b| {
        b.iter(|| {
            let outcome = project(&table, black_box(&key), black_box(50));
            black_box(outcome)
        })
    });
}

fn benchmark_stats(c: &mut Criterion) {
    let dataset = get_dataset();

    c.bench_function("ledger_stats", |b| {
        b.iter(|| {
            let stats = dataset.statistics();
            black_box(stats)
        })
    });
}

criterion_group!(
    benches,
    benchmark_aggregation,
    benchmark_queries,
    benchmark_projection,
    benchmark_stats
);

criterion_main!(benches);
