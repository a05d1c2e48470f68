//! Run command implementation.

use super::output::format_text;
use super::{CliError, MatchSettings, OutputFormat};
use frontier::tournament::run_match;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the match cannot be created.
pub(crate) fn execute(settings: &MatchSettings, format: OutputFormat, quiet: bool) -> Result<(), CliError> {
    let config = &settings.config;

    if !quiet && format == OutputFormat::Text {
        println!(
            "Running {}x{} match with {} bots, seed {}...",
            config.width, config.height, config.ai_countries, config.seed
        );
        println!();
    }

    let report = run_match(config.seed, config, settings.steps)?;

    match format {
        OutputFormat::Text => {
            print!("{}", format_text(&report));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    if report.violations.is_empty() {
        Ok(())
    } else {
        Err(CliError::new(format!(
            "{} invariant violation(s) in seed {}",
            report.violations.len(),
            report.seed
        )))
    }
}
