mod json_graft;

use criterion::{black_box, criterion_group, Criterion};
use json_graft::{graft_parser, grammar};
use log::trace;

const JSON: &str = "  { \"a\"\t: 42,
  \"b\": [ \"x\", \"y\", 12 ] ,
  \"c\": { \"hello\" : \"world\"
  }
  } ";

pub fn bench_serde_json(c: &mut Criterion) {
    c.bench_function("json_serde", |b| {
        b.iter(|| serde_json::from_str::<serde_json::Value>(black_box(JSON)).unwrap())
    });
}

pub fn bench_graft(c: &mut Criterion) {
    let rule = grammar();
    c.bench_function("json_graft", |b| {
        b.iter(|| graft_parser(&rule, black_box(JSON)))
    });
}

criterion_group!(benches, bench_serde_json, bench_graft);

fn main() {
    env_logger::init();
    trace!(target: "graft", "Logging enabled");
    benches();
    Criterion::default().configure_from_args().final_summary();
}
