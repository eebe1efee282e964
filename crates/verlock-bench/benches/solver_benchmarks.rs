use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use verlock_core::{
  InMemoryRepository, LockfileRepository, Requirement, ResolutionStrategy, SolverOptions,
  parse_lockfile, solve,
};
use verlock_test::load_fixture;

/// `pkg-0` .. `pkg-{depth}`. Every version of a package pins the next package
/// to the same version, but `pkg-{depth}` only exists at `1.0`, so the highest
/// strategy has to backtrack through the whole chain.
fn chain_repository(depth: usize, width: usize) -> InMemoryRepository {
  let mut repository = InMemoryRepository::new();
  for level in 0..depth {
    for version in 1..=width {
      let next = format!("pkg-{} =={version}.0", level + 1);
      repository
        .add(&format!("pkg-{level}"), &format!("{version}.0"), &[&next])
        .expect("generated index is valid");
    }
  }
  repository
    .add(&format!("pkg-{depth}"), "1.0", &[])
    .expect("generated index is valid");
  repository
}

fn benchmark_chain(c: &mut Criterion) {
  let mut group = c.benchmark_group("solve_chain");
  let roots = vec![Requirement::parse("pkg-0").expect("valid requirement")];

  for (depth, width) in [(5, 5), (10, 10), (20, 10)] {
    let repository = chain_repository(depth, width);
    for strategy in [ResolutionStrategy::Highest, ResolutionStrategy::Lowest] {
      let options = SolverOptions::default().with_strategy(strategy);
      group.bench_with_input(
        BenchmarkId::new(format!("{strategy:?}"), format!("{depth}x{width}")),
        &repository,
        |b, repository| {
          b.iter(|| solve(black_box(&roots), repository, &options).expect("chain is solvable"));
        },
      );
    }
  }

  group.finish();
}

fn benchmark_fixtures(c: &mut Criterion) {
  let mut group = c.benchmark_group("solve_fixtures");

  let index = InMemoryRepository::from_json(&load_fixture("index.json")).expect("index fixture");
  let roots = vec![Requirement::parse("requests >=2.27").expect("valid requirement")];
  group.bench_function("index_json", |b| {
    b.iter(|| {
      solve(black_box(&roots), &index, &SolverOptions::default()).expect("index is solvable")
    });
  });

  let lockfile = parse_lockfile(&load_fixture("poetry-1.1.lock")).expect("lock fixture");
  let repository = LockfileRepository::new(&lockfile);
  let roots = vec![
    Requirement::parse("requests[socks]").expect("valid requirement"),
    Requirement::parse("black").expect("valid requirement"),
  ];
  group.bench_function("poetry_1_1_lock", |b| {
    b.iter(|| {
      solve(black_box(&roots), &repository, &SolverOptions::default()).expect("lock is solvable")
    });
  });

  group.finish();
}

criterion_group!(benches, benchmark_chain, benchmark_fixtures);
criterion_main!(benches);
