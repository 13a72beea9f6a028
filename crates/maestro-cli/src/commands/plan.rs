//! `maestro plan`: Show the task plan a document resolves to.

use clap::Args;
use maestro_compose::context::Context;
use maestro_compose::{cascade, resolver};

use super::DocumentArg;
use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Document to plan.
    #[command(flatten)]
    pub document: DocumentArg,

    /// Print the plan as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `plan` command.
///
/// Loads the document, resolves cross-references, selects the task tier,
/// and binds variables into the task targets. Nothing is validated or run.
///
/// # Errors
///
/// Returns an error if loading or resolution fails.
#[allow(clippy::print_stdout)]
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let document = super::load(&args.document.file)?;
    super::warn_overrides(&document);
    let graph = resolver::resolve(&document)?;
    let mut plan = cascade::build(&graph);

    let context = Context::from_vars(&document.vars);
    for task in &mut plan.tasks {
        let _ = context.bind_vars(&mut task.target);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", output::format_plan(&args.document.file, &plan, context.mode_label()));
    }
    Ok(())
}
