//! Corten Benchmark CLI
//!
//! Runs the lookup micro-benchmarks and prints a table or JSON report.

use benchmarks::{micro, runner, BenchmarkResult, BenchmarkSuite};
use std::process;

const AVERAGED_RUNS: usize = 5;

struct Options {
    json: bool,
    suite: String,
}

fn print_usage() {
    println!("Corten Lookup Cache Benchmark Tool");
    println!();
    println!("Usage:");
    println!("  corten-bench micro              Run micro-benchmarks once");
    println!(
        "  corten-bench averaged           Average micro-benchmarks over {} runs",
        AVERAGED_RUNS
    );
    println!("  corten-bench --json <suite>     Output results as JSON");
}

fn parse_args(args: &[String]) -> Option<Options> {
    let mut json = false;
    let mut suite = None;
    for arg in args {
        match arg.as_str() {
            "--json" => json = true,
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => suite = Some(other.to_string()),
        }
    }
    suite.map(|suite| Options { json, suite })
}

fn run_suite(name: &str) -> Option<Vec<BenchmarkResult>> {
    match name {
        "micro" => Some(micro::run_all()),
        "averaged" => {
            let mut suite = BenchmarkSuite::new("micro".to_string());
            for bench in micro::create_benchmarks() {
                suite.add(bench);
            }
            Some(suite.run_multiple(AVERAGED_RUNS))
        }
        _ => None,
    }
}

fn print_summary(results: &[BenchmarkResult]) {
    let failed = results.iter().filter(|r| !r.success).count();
    let total_time: f64 = results.iter().map(|r| r.duration_ms).sum();
    let resolutions: u64 = results.iter().map(|r| r.resolutions).sum();

    println!("\nSummary:");
    println!("  Benchmarks: {} ({} failed)", results.len(), failed);
    println!("  Resolver runs: {}", resolutions);
    println!("  Total time: {:.2} ms", total_time);
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Some(options) => options,
        None => {
            eprintln!("Error: No benchmark suite specified");
            print_usage();
            process::exit(1);
        }
    };

    let results = match run_suite(&options.suite) {
        Some(results) => results,
        None => {
            eprintln!("Error: Unknown benchmark suite '{}'", options.suite);
            eprintln!("Valid suites: micro, averaged");
            process::exit(1);
        }
    };

    if options.json {
        match runner::format_results_json(&results) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error formatting JSON: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("{}", runner::format_results(&results));
    print_summary(&results);
    if results.iter().any(|r| !r.success) {
        process::exit(1);
    }
}
