//! `maestro validate`: Validate every task without running any.

use clap::Args;
use maestro_common::config::MaestroConfig;

use super::DocumentArg;
use crate::output;

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document to validate.
    #[command(flatten)]
    pub document: DocumentArg,
}

/// Executes the `validate` command.
///
/// # Errors
///
/// Returns an error if loading, resolution, or any task validation fails.
#[allow(clippy::print_stdout)]
pub fn execute(args: &ValidateArgs) -> anyhow::Result<()> {
    let config = MaestroConfig {
        document: args.document.file.clone(),
        validate_only: true,
        ..MaestroConfig::default()
    };
    let report = super::orchestrate(&config)?;
    println!("{}", output::format_report(&report, true));
    Ok(())
}
