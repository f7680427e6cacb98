use anyhow::{anyhow, Result};
use std::sync::mpsc;

use phenoflow::{execute, Settings};

/// Headless runner: one execution of the analysis workflow from a settings
/// JSON file, feedback messages printed as JSON lines.
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings_path = args
        .next()
        .ok_or_else(|| anyhow!("Usage: phenoflow <settings.json> [script-name]"))?;
    let script_name = args.next().unwrap_or_else(|| "phenoflow".to_owned());

    let settings = Settings::from_file(&settings_path)?;

    let (feedback_queue, feedback) = mpsc::channel();
    execute(&feedback_queue, &script_name, &settings, None)?;
    drop(feedback_queue);

    for message in feedback {
        println!("{}", message.to_payload());
    }

    Ok(())
}
