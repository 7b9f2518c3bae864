//! Retrace CLI
//!
//! Replays the reference traces through every back-end.

use retrace::demo::{self, Scenario};
use retrace::{init_tracing, Compiler, ConstraintCollector, Evaluator, GraphError};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let selected = args.get(1).map_or("all", String::as_str);
    if matches!(selected, "-h" | "--help" | "help") {
        print_usage();
        return;
    }

    let scenarios = match load(selected) {
        Ok(scenarios) => scenarios,
        Err(err) => {
            eprintln!("error: failed to record trace: {err}");
            std::process::exit(1);
        }
    };
    if scenarios.is_empty() {
        eprintln!("error: unknown scenario '{selected}'");
        eprintln!();
        print_usage();
        std::process::exit(1);
    }

    tracing::debug!(selected, count = scenarios.len(), "replaying scenarios");
    let mut failed = false;
    for scenario in &scenarios {
        failed |= !replay(scenario);
    }
    if failed {
        std::process::exit(1);
    }
}

fn load(selected: &str) -> Result<Vec<Scenario>, GraphError> {
    let scenarios = demo::all()?;
    if selected == "all" {
        return Ok(scenarios);
    }
    Ok(scenarios
        .into_iter()
        .filter(|scenario| scenario.name == selected)
        .collect())
}

/// Print one scenario through each back-end. Returns `false` if any run
/// failed.
fn replay(scenario: &Scenario) -> bool {
    let mut ok = true;
    println!("== {} ==", scenario.name);
    for line in scenario.source.lines() {
        println!("  | {line}");
    }
    println!();
    print!("{}", demo::render(&scenario.graph, scenario.root));
    println!();

    match Evaluator::new(&scenario.graph).evaluate(scenario.root) {
        Ok(value) => println!("evaluate: {value}"),
        Err(err) => {
            ok = false;
            println!("evaluate: error: {err}");
        }
    }

    let compiled = Compiler::new(&scenario.graph)
        .with_parameters(scenario.parameters.iter().copied())
        .compile(scenario.root);
    match compiled {
        Ok(expr) => {
            let names: Vec<String> = expr.parameters().iter().map(ToString::to_string).collect();
            for run in &scenario.runs {
                let inputs: Vec<String> = run.iter().map(ToString::to_string).collect();
                match expr.call(run) {
                    Ok(value) => println!(
                        "compiled({}) with ({}): {value}",
                        names.join(", "),
                        inputs.join(", ")
                    ),
                    Err(err) => println!(
                        "compiled({}) with ({}): error: {err}",
                        names.join(", "),
                        inputs.join(", ")
                    ),
                }
            }
        }
        Err(err) => {
            ok = false;
            println!("compile: error: {err}");
        }
    }

    let mut collector = ConstraintCollector::new(&scenario.graph);
    match collector.collect(scenario.root) {
        Ok(table) => {
            println!("constraints ({}):", table.len());
            for constraint in table {
                println!("  {constraint}");
            }
        }
        Err(err) => {
            ok = false;
            println!("constraints: error: {err}");
        }
    }
    println!();
    ok
}

fn print_usage() {
    println!("Retrace - replay recorded traces");
    println!();
    println!("Usage: retrace [scenario]");
    println!();
    println!("Scenarios:");
    println!("  add-two    f(x) = x + 2");
    println!("  add-x      AddX(n).add_to(5, z=2)");
    println!("  nested     AddX2(n).add_to(5, z=2)");
    println!("  all        every scenario (default)");
    println!();
    println!("Set RUST_LOG=retrace_eval=debug for back-end logs.");
}
