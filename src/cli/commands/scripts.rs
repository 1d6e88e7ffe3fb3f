//! Scripts command handlers
//!
//! Implements `scripts list` and `scripts show`.

use std::fmt::Write as _;

use crate::cli::args::{OutputFormat, ScriptsListArgs, ScriptsShowArgs};
use crate::config::schema::InterviewType;
use crate::error::{Result, SenseiError};
use crate::scripts;

const ALL_TYPES: [InterviewType; 4] = [
    InterviewType::Technical,
    InterviewType::Behavioral,
    InterviewType::SystemDesign,
    InterviewType::Cultural,
];

/// List built-in scripts.
///
/// Displays scripts grouped by interview type (human) or as a JSON array.
///
/// # Errors
///
/// Returns a JSON error if output serialization fails.
#[allow(clippy::unused_async)]
pub async fn list(args: &ScriptsListArgs) -> Result<()> {
    let results = scripts::list_scripts(args.interview_type);

    match args.format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = results
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "name": s.name,
                        "description": s.description,
                        "interview_type": s.interview_type,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Human => {
            if results.is_empty() {
                println!("No scripts match the given filters.");
                return Ok(());
            }

            println!("Built-in Scripts ({} available)\n", results.len());
            for interview_type in ALL_TYPES {
                let of_type: Vec<_> = results
                    .iter()
                    .filter(|s| s.interview_type == interview_type)
                    .collect();
                if of_type.is_empty() {
                    continue;
                }
                println!("  {}", interview_type.label());
                for s in of_type {
                    println!("    {:<24}{}", s.name, s.description);
                }
                println!();
            }

            println!("Run a script: sensei session run --builtin <name>");
            println!("View YAML:    sensei scripts show <name>");
        }
    }

    Ok(())
}

/// Print the YAML of a built-in script, suitable for piping.
///
/// # Errors
///
/// Returns a usage error if the script name is not found.
#[allow(clippy::unused_async)]
pub async fn show(args: &ScriptsShowArgs) -> Result<()> {
    let script = scripts::find_script(&args.name).ok_or_else(|| {
        let mut message = format!("Unknown script '{}'", args.name);

        if let Some(suggestion) = scripts::suggest_script(&args.name) {
            let _ = write!(message, "\n\nDid you mean '{suggestion}'?");
        }

        message.push_str("\n\nAvailable scripts:");
        for s in scripts::list_scripts(None) {
            let _ = write!(message, "\n  {:<24}{}", s.name, s.description);
        }
        SenseiError::Usage(message)
    })?;

    print!("{}", script.yaml);
    Ok(())
}
