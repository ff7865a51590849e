//! Benchmark infrastructure for the property lookup caches
//!
//! This crate measures how the lookup sites perform in each of their states.
//! It includes:
//!
//! - Micro-benchmarks for own, inherited, primitive, global and host lookups
//! - Benchmark runner with timing, hit rate and result formatting
//!
//! # Examples
//!
//! ```rust,no_run
//! use benchmarks::micro;
//!
//! let results = micro::run_all();
//! for result in results {
//!     println!("{}: {:.2}ms", result.name, result.duration_ms);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod micro;
pub mod runner;

pub use runner::{Benchmark, BenchmarkResult, BenchmarkSuite, Workload};
