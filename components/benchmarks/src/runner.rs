//! Benchmark runner and result types
//!
//! Provides infrastructure for running lookup workloads against a realm and
//! collecting timing plus cache statistics.

use core_types::JsResult;
use interpreter::{LookupStats, Realm};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One iteration of a prepared workload.
pub type Workload = Box<dyn FnMut(&mut Realm) -> JsResult<()>>;

/// A single benchmark
#[derive(Clone)]
pub struct Benchmark {
    /// Name of the benchmark
    pub name: String,
    /// Description of what the benchmark measures
    pub description: String,
    /// Number of workload iterations per run
    pub iterations: usize,
    /// Builds the objects and sites the workload touches
    pub prepare: fn(&mut Realm) -> Workload,
}

/// Result of running a benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Name of the benchmark
    pub name: String,
    /// Description of the benchmark
    pub description: String,
    /// Duration in milliseconds
    pub duration_ms: f64,
    /// Workload iterations per second
    pub ops_per_sec: Option<f64>,
    /// Fraction of accesses served by a cached strategy during the run
    pub hit_rate: f64,
    /// Resolver runs during the run
    pub resolutions: u64,
    /// Whether the benchmark completed successfully
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
}

fn delta(before: &LookupStats, after: &LookupStats) -> LookupStats {
    LookupStats {
        hits: after.hits - before.hits,
        misses: after.misses - before.misses,
        resolutions: after.resolutions - before.resolutions,
        upgrades: after.upgrades - before.upgrades,
        degradations: after.degradations - before.degradations,
        descriptor_releases: after.descriptor_releases - before.descriptor_releases,
        insertions: after.insertions - before.insertions,
    }
}

impl std::fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmark")
            .field("name", &self.name)
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl Benchmark {
    /// Run this benchmark in the provided realm
    ///
    /// # Arguments
    /// * `realm` - The realm the workload allocates into and reads from
    ///
    /// # Returns
    /// A `BenchmarkResult` containing timing, cache and success information
    pub fn run(&self, realm: &mut Realm) -> BenchmarkResult {
        let mut workload = (self.prepare)(realm);
        let before = realm.stats().snapshot();
        let start = Instant::now();

        let mut outcome = Ok(());
        for _ in 0..self.iterations {
            if let Err(e) = workload(realm) {
                outcome = Err(e);
                break;
            }
        }

        let duration = start.elapsed();
        let duration_ms = duration.as_secs_f64() * 1000.0;
        let counters = delta(&before, realm.stats());
        let ops_per_sec = if duration.as_secs_f64() > 0.0 {
            Some(self.iterations as f64 / duration.as_secs_f64())
        } else {
            None
        };

        BenchmarkResult {
            name: self.name.clone(),
            description: self.description.clone(),
            duration_ms,
            ops_per_sec: outcome.as_ref().ok().and(ops_per_sec),
            hit_rate: counters.hit_rate(),
            resolutions: counters.resolutions,
            success: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    /// Run this benchmark several times, each in a fresh realm, and average
    /// the timings
    pub fn run_multiple(&self, runs: usize) -> BenchmarkResult {
        let mut total_duration_ms = 0.0;
        let mut last = self.run(&mut Realm::default());
        if !last.success {
            return last;
        }
        total_duration_ms += last.duration_ms;

        for _ in 1..runs {
            last = self.run(&mut Realm::default());
            if !last.success {
                return last;
            }
            total_duration_ms += last.duration_ms;
        }

        last.duration_ms = total_duration_ms / runs.max(1) as f64;
        last
    }
}

/// Suite of benchmarks
pub struct BenchmarkSuite {
    /// Name of the suite
    pub name: String,
    /// Benchmarks in this suite
    pub benchmarks: Vec<Benchmark>,
}

impl BenchmarkSuite {
    /// Create a new benchmark suite
    pub fn new(name: String) -> Self {
        Self {
            name,
            benchmarks: Vec::new(),
        }
    }

    /// Add a benchmark to this suite
    pub fn add(&mut self, benchmark: Benchmark) {
        self.benchmarks.push(benchmark);
    }

    /// Run all benchmarks, each in its own realm
    pub fn run(&self) -> Vec<BenchmarkResult> {
        self.benchmarks
            .iter()
            .map(|b| b.run(&mut Realm::default()))
            .collect()
    }

    /// Run all benchmarks multiple times and average
    pub fn run_multiple(&self, runs: usize) -> Vec<BenchmarkResult> {
        self.benchmarks.iter().map(|b| b.run_multiple(runs)).collect()
    }
}

/// Format benchmark results as a human-readable table
pub fn format_results(results: &[BenchmarkResult]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{:<30} {:<15} {:<10} {:<10}\n",
        "Benchmark", "Duration (ms)", "Hit rate", "Status"
    ));
    output.push_str(&format!("{}\n", "=".repeat(70)));

    for result in results {
        let status = if result.success { "PASS" } else { "FAIL" };
        output.push_str(&format!(
            "{:<30} {:>13.2} ms {:>8.1}%  {:<10}\n",
            result.name,
            result.duration_ms,
            result.hit_rate * 100.0,
            status
        ));

        if let Some(error) = &result.error {
            output.push_str(&format!("  Error: {}\n", error));
        }
    }

    output
}

/// Format benchmark results as JSON
pub fn format_results_json(results: &[BenchmarkResult]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(results)
}
