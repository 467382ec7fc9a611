pub mod aggregation;
pub mod benchmark_matcher;
pub mod benchmarks;
pub mod demand;
pub mod floor_area;
pub mod spatial_linker;
pub mod units;
