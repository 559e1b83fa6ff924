mod config;
mod domain_events;
mod main_lib;
mod script;

use anyhow::Context;
use config::Config;
use main_lib::{build_state, init_tracing};
use std::io::Read;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    let source = match std::env::args().nth(1) {
        Some(path) if path != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read script {}", path))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read script from stdin")?;
            buf
        }
    };

    let state = build_state(&config);
    let report = script::run_script(&state, &source, config.fail_fast).await?;
    for outcome in &report.outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }
    tracing::info!(
        "Ran {} steps: {} succeeded, {} failed as expected, {} failed unexpectedly",
        report.outcomes.len(),
        report.succeeded,
        report.expected_failures,
        report.unexpected_failures
    );
    if report.unexpected_failures > 0 {
        anyhow::bail!("{} step(s) failed", report.unexpected_failures);
    }
    Ok(())
}
