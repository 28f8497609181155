//! Predict command

use anyhow::Result;
use colored::Colorize;
use console_lib::{Gateway, PredictionPanel};

use super::operator_error;
use crate::output::{color_severity, format_confidence, print_json, print_success, OutputFormat};

/// Submit an error message and show the verdict
pub async fn predict(
    gateway: &dyn Gateway,
    error_message: &str,
    user_count: u32,
    format: OutputFormat,
) -> Result<()> {
    let mut panel = PredictionPanel::new();
    let result = panel
        .submit(gateway, error_message, user_count)
        .await
        .map_err(operator_error)?;

    match format {
        OutputFormat::Json => print_json(result)?,
        OutputFormat::Table => {
            print_success("Prediction received");
            println!();
            println!("{}", "Prediction Result".bold());
            println!("{}", "=".repeat(50));
            println!("Severity:       {}", color_severity(&result.severity));
            println!("Confidence:     {}", format_confidence(result.confidence, 2));
            println!("Impact Score:   {}", result.impact_score);
            println!();

            println!("{}", "Root Cause Analysis".bold());
            println!("{}", "-".repeat(50));
            println!(
                "Category:       {}",
                result.category.as_deref().unwrap_or("Unknown").cyan()
            );
            if let Some(root_cause) = &result.root_cause {
                println!();
                println!("{}", "💡 Root Cause".bold());
                println!("{}", root_cause);
            }
            if let Some(fix) = &result.suggested_fix {
                println!();
                println!("{}", "🛠 Suggested Fix".bold());
                println!("{}", fix);
            }
        }
    }

    Ok(())
}
