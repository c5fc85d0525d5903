//! SLDraft CLI library
//!
//! Headless driver for the editing engine: load a diagram, replay an
//! interaction script through the editor, and write the result.

mod args;
pub mod config;
mod error;
pub mod script;

pub use args::Args;
pub use error::CliError;
pub use script::{ReplayReport, Replayer, ScriptStep, StepFailure};

use std::{fs, io::Write, path::Path};

use log::{info, warn};
use sldraft_core::{Diagram, Editor, StaticCatalog};

/// Run the replay tool.
///
/// Steps that fail are logged and reported but do not stop the replay.
/// Failing to read inputs or write the output is an error.
pub fn run(args: &Args) -> Result<ReplayReport, CliError> {
    let config = config::load_config(args.config.as_deref())?;

    let diagram = match &args.input {
        Some(path) => {
            info!("Loading diagram from {}", path.display());
            Diagram::from_json(&read(path)?)?
        }
        None => Diagram::new(),
    };

    let mut editor = Editor::with_diagram(diagram, config);
    if let Some(path) = &args.catalog {
        let catalog = StaticCatalog::from_json(&read(path)?)?;
        info!("Loaded {} catalog templates", catalog.len());
        editor.set_catalog(Some(Box::new(catalog)));
    }

    let steps = script::parse_script(&read(&args.script)?).map_err(|source| CliError::Script {
        path: args.script.clone(),
        source,
    })?;
    info!("Replaying {} steps from {}", steps.len(), args.script.display());

    let report = Replayer::new().replay(&mut editor, &steps);
    if !report.failures.is_empty() {
        warn!(
            "{} of {} steps failed",
            report.failures.len(),
            report.steps
        );
    }

    let json = editor.diagram().to_json()?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            info!("Wrote diagram to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(report)
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| CliError::read(path, e))
}
