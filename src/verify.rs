//! Runs the picker many times and compares how often each item comes up with its weight
use clap::Parser;
use lunch_gotcha::picker::{pick_weighted_with, total_weight, Candidate};
use lunch_gotcha::restaurant::parse_records;
use lunch_gotcha::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 100000)]
    iterations: usize,
    /// Seed for a reproducible run, otherwise seeded from the OS
    #[arg(short, long)]
    seed: Option<u64>,
    /// A JSON array of {"name", "weight"} records to test instead of the built in cases
    #[arg(short, long)]
    file: Option<PathBuf>,
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

fn builtin_cases() -> Vec<(String, Vec<Value>)> {
    vec![
        (
            "Equal weights (1, 1, 1)".to_string(),
            vec![
                json!({"name": "A", "weight": 1}),
                json!({"name": "B", "weight": 1}),
                json!({"name": "C", "weight": 1}),
            ],
        ),
        (
            "Skewed weights (1, 10, 1)".to_string(),
            vec![
                json!({"name": "A", "weight": 1}),
                json!({"name": "B", "weight": 10}),
                json!({"name": "C", "weight": 1}),
            ],
        ),
        (
            "Progressive weights (0.2, 2, 3)".to_string(),
            vec![
                json!({"name": "A", "weight": 0.2}),
                json!({"name": "B", "weight": 2}),
                json!({"name": "C", "weight": 3}),
            ],
        ),
        (
            "Many items (10 items, weight 1 each)".to_string(),
            (0..10)
                .map(|i| json!({"name": format!("Item{}", i), "weight": 1}))
                .collect(),
        ),
        (
            "Edge cases (10, 0, \"abc\", \"10\")".to_string(),
            vec![
                json!({"name": "Valid", "weight": 10}),
                json!({"name": "Zero", "weight": 0}),
                json!({"name": "Invalid", "weight": "abc"}),
                json!({"name": "StringNum", "weight": "10"}),
            ],
        ),
        (
            "All zero (0, \"abc\")".to_string(),
            vec![
                json!({"name": "A", "weight": 0}),
                json!({"name": "B", "weight": "abc"}),
            ],
        ),
    ]
}

fn name_of(item: &Value) -> String {
    match item.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => other.to_string(),
        None => "?".to_string(),
    }
}

fn run_case(title: &str, items: &[Value], iterations: usize, rng: &mut StdRng) {
    let mut counts = vec![0usize; items.len()];
    for _ in 0..iterations {
        if let Some(picked) = pick_weighted_with(items, rng) {
            if let Some(index) = items.iter().position(|item| std::ptr::eq(item, picked)) {
                counts[index] += 1;
            }
        }
    }

    let total = total_weight(items);
    println!("\n{}", title);
    println!("Name\tWeight\tCount\tObserved\tExpected");
    for (item, count) in items.iter().zip(counts) {
        let weight = item.weight();
        let expected = if total > 0.0 {
            100.0 * weight.max(0.0) / total
        } else {
            100.0 / items.len() as f64
        };
        println!(
            "{}\t{}\t{}\t{:>6.2}%\t{:>6.2}%",
            name_of(item),
            item.get("weight").unwrap_or(&Value::Null),
            count,
            100.0 * count as f64 / iterations as f64,
            expected
        );
    }
}

fn load_case(path: &Path) -> Result<(String, Vec<Value>)> {
    let text = fs::read_to_string(path)?;
    Ok((path.display().to_string(), parse_records(&text)?))
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let cases = match &args.file {
        Some(path) => match load_case(path) {
            Ok(case) => vec![case],
            Err(err) => {
                eprintln!("Failed to load {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => builtin_cases(),
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    println!(
        "===\nIterations: {}, Seed: {}",
        args.iterations,
        args.seed
            .map_or_else(|| "random".to_string(), |seed| seed.to_string())
    );
    println!("---");
    for (title, items) in cases {
        run_case(&title, &items, args.iterations, &mut rng);
    }
    ExitCode::SUCCESS
}
