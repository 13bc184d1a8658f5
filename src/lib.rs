//! Workspace root package; hosts the bignum benchmarks under `benches/`.
