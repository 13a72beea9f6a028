//! `maestro render`: Print the document with all imports folded in.

use clap::Args;

use super::DocumentArg;

/// Arguments for the `render` command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Document to render.
    #[command(flatten)]
    pub document: DocumentArg,
}

/// Executes the `render` command.
///
/// The printed document no longer lists `imports`. Override warnings are
/// logged, not printed, so the output stays valid YAML.
///
/// # Errors
///
/// Returns an error if loading fails or the document cannot be serialized.
#[allow(clippy::print_stdout)]
pub fn execute(args: &RenderArgs) -> anyhow::Result<()> {
    let mut document = super::load(&args.document.file)?;
    document.imports.clear();
    super::warn_overrides(&document);
    print!("{}", document.to_yaml()?);
    Ok(())
}
