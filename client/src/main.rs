use std::{fs, path::Path, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use client::{ClientConfig, PredictionClient};
use colored::Colorize;
use common::{utils, CustomerProfile, InferenceRequest, InferenceResult, RiskLevel};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the payload a profile normalizes to, without sending it
    Payload { profile: PathBuf },

    /// Send a profile through the relay and print the prediction
    Predict {
        profile: PathBuf,
        /// Print the raw result as JSON
        #[clap(long)]
        json: bool,
    },
}

fn read_profile(path: &Path) -> anyhow::Result<CustomerProfile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid profile {}", path.display()))
}

fn print_payload(payload: &InferenceRequest) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    for (field, kind) in payload.numeric_types() {
        println!("{} {field}: {kind}", "type".dimmed());
    }
    Ok(())
}

fn print_result(result: &InferenceResult) {
    let risk = match result.risk_level {
        RiskLevel::Low => result.risk_level.to_string().green(),
        RiskLevel::Medium => result.risk_level.to_string().yellow(),
        RiskLevel::High => result.risk_level.to_string().red(),
    };

    println!("{} {}", "Status:".bold(), result.predicted_churn_status);
    println!(
        "{} {:.1}% ({})",
        "Churn probability:".bold(),
        result.churn_probability * 100.0,
        if result.predicted_churn { "likely to churn" } else { "likely to stay" }
    );
    println!("{} {risk}", "Risk level:".bold());
    if !result.recommendations.is_empty() {
        println!("{}", "Recommendations:".bold());
        for recommendation in &result.recommendations {
            println!("  - {recommendation}");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::load_dotenv();
    utils::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Payload { profile } => {
            let profile = read_profile(&profile)?;
            print_payload(&InferenceRequest::from_profile(&profile))?;
        }
        Commands::Predict { profile, json } => {
            let profile = read_profile(&profile)?;
            let client = PredictionClient::new(ClientConfig::from_env()?)?;
            let result = client.predict(&profile).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }
    }

    Ok(())
}
