//! `maestro apply`: Validate every task, then run them in order.

use clap::Args;
use maestro_common::config::MaestroConfig;
use maestro_common::constants::LIVE_ENV;

use super::DocumentArg;
use crate::output;

/// Arguments for the `apply` command.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Document to apply.
    #[command(flatten)]
    pub document: DocumentArg,

    /// Force live mode, overriding the document's `LIVE_MODE`.
    #[arg(long, env = LIVE_ENV)]
    pub live: bool,
}

/// Executes the `apply` command.
///
/// # Errors
///
/// Returns an error if loading, resolution, or any task fails.
#[allow(clippy::print_stdout)]
pub fn execute(args: &ApplyArgs) -> anyhow::Result<()> {
    let config = MaestroConfig {
        document: args.document.file.clone(),
        validate_only: false,
        live: args.live.then_some(true),
    };
    let report = super::orchestrate(&config)?;
    println!("{}", output::format_report(&report, false));
    Ok(())
}
