fn main() {
  // Run registered benchmarks.
  divan::main();
}

mod resolve {
  use api_version_router::RouterConfig;
  use api_version_router::SupportedVersionList;
  use api_version_router::VersionRouter;

  #[divan::bench]
  fn explicit_version(bencher: divan::Bencher) {
    let router = router();
    bencher.bench(|| {
      router
        .resolve(divan::black_box("/api/v2/courses/lectures"))
        .is_match()
    });
  }

  #[divan::bench]
  fn latest_version(bencher: divan::Bencher) {
    let router = router();
    bencher.bench(|| {
      router
        .resolve(divan::black_box("/api/courses/lectures"))
        .is_match()
    });
  }

  #[divan::bench]
  fn no_match(bencher: divan::Bencher) {
    let router = router();
    bencher.bench(|| {
      router
        .resolve(divan::black_box("/api/v9/unknown"))
        .is_match()
    });
  }

  fn router() -> VersionRouter<usize> {
    let config = RouterConfig::with_default_prefix(
      SupportedVersionList::new(vec![1, 2, 3, 4, 5]).unwrap(),
    );
    let mut builder = VersionRouter::builder(config);
    for (i, path) in ["courses", "courses/lectures", "users", "exams"]
      .iter()
      .enumerate()
    {
      builder
        .register_declared(path, "legacy", &["1-3"], i * 2)
        .unwrap()
        .register_declared(path, "current", &["4+"], i * 2 + 1)
        .unwrap();
    }
    builder.build().unwrap()
  }
}

mod classify {
  use api_version_router::VersionInterval;

  #[divan::bench]
  fn bounded() -> api_version_router::RelationKind {
    api_version_router::classify(
      divan::black_box(&VersionInterval::new(1, 4).unwrap()),
      divan::black_box(&VersionInterval::new(3, 8).unwrap()),
    )
  }

  #[divan::bench]
  fn unbounded() -> api_version_router::RelationKind {
    api_version_router::classify(
      divan::black_box(&VersionInterval::from_start(5).unwrap()),
      divan::black_box(&VersionInterval::new(1, 4).unwrap()),
    )
  }
}

mod simplify {
  use api_version_router::normalize;
  use api_version_router::VersionInterval;

  #[divan::bench]
  fn chain() -> usize {
    let intervals = (1..20)
      .rev()
      .map(|start| VersionInterval::new(start * 2, start * 2 + 1).unwrap())
      .collect::<Vec<_>>();
    normalize::simplify(divan::black_box(intervals))
      .unwrap()
      .intervals()
      .len()
  }

  #[divan::bench]
  fn to_string() -> usize {
    normalize::simplify(vec![
      VersionInterval::new(1, 2).unwrap(),
      VersionInterval::new(6, 9).unwrap(),
      VersionInterval::from_start(12).unwrap(),
    ])
    .unwrap()
    .to_string()
    .len()
  }
}
