use std::process::{Command, Output};

use assert_approx_eq::assert_approx_eq;
use dintir::callbacks::{Comparison, Outcome};
use dintir::integrators::Mode;

fn dintir(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dintir"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8(output.stdout.clone())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn default_run_prints_value_and_seconds() {
    let output = dintir(&[]);
    assert!(output.status.success());

    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 2);

    let value: f64 = lines[0].parse().unwrap();
    let seconds: f64 = lines[1].parse().unwrap();
    assert_approx_eq!(value, 4626.990796800007, 1e-8);
    assert!(seconds >= 0.0);
}

#[test]
fn parallel_run_prints_only_once() {
    let output = dintir(&[
        "--mode",
        "ParallelMonteCarlo",
        "--workers",
        "3",
        "-n",
        "10000",
        "--seed",
        "5",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout_lines(&output).len(), 2);
}

#[test]
fn negative_bounds_and_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("run.json");
    let json = r#"{
        "function": "ricker_wavelet",
        "domain": { "ax": 0.0, "bx": 1.0, "ay": 0.0, "by": 1.0, "n": 300 }
    }"#;
    std::fs::write(&config, json).unwrap();

    let output = dintir(&[
        "--config",
        config.to_str().unwrap(),
        "--ax",
        "-3",
        "--bx",
        "3",
        "--ay",
        "-3",
        "--by",
        "3",
    ]);
    assert!(output.status.success());

    let value: f64 = stdout_lines(&output)[0].parse().unwrap();
    assert_approx_eq!(value, -std::f64::consts::FRAC_1_PI, 1e-9);
}

#[test]
fn report_and_compare() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("outcome.json");

    let output = dintir(&[
        "--mode",
        "ParallelTrapezoid",
        "--workers",
        "2",
        "--compare",
        "--report",
        report.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let comparison: Comparison<f64> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(comparison.sequential.mode, Mode::SequentialTrapezoid);
    assert_eq!(comparison.parallel.mode, Mode::ParallelTrapezoid);
    assert_eq!(comparison.parallel.workers, 2);
    assert_approx_eq!(comparison.sequential.value, 4626.990796800007, 1e-8);

    let text = std::fs::read_to_string(&report).unwrap();
    let outcome: Outcome<f64> = serde_json::from_str(&text).unwrap();
    assert_eq!(outcome, comparison.parallel);
}

#[test]
fn unknown_names_fail() {
    let output = dintir(&["--function", "himmelblau"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let output = dintir(&["--workers", "0", "--mode", "ParallelTrapezoid"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("at least one rank"));
}
