//! CLI command definitions and dispatch.

pub mod apply;
pub mod plan;
pub mod render;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use maestro_common::config::MaestroConfig;
use maestro_common::constants::{BIN_NAME, DEFAULT_DOCUMENT, DOCUMENT_ENV};
use maestro_compose::cascade::Plan;
use maestro_compose::document::Document;
use maestro_compose::import;
use maestro_runtime::orchestrator::{ApplyReport, Orchestrator};
use maestro_runtime::provisioner::DryRunProvisioner;

/// Document path meaning standard input.
const STDIN_PATH: &str = "-";

/// Maestro: compile deployment documents into ordered tasks and apply them.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the task plan a document resolves to.
    Plan(plan::PlanArgs),
    /// Resolve, bind, and validate every task without running any.
    Validate(validate::ValidateArgs),
    /// Validate every task, then run them in order.
    Apply(apply::ApplyArgs),
    /// Print the document with all imports folded in.
    Render(render::RenderArgs),
}

/// The document argument shared by every subcommand.
#[derive(Args, Debug)]
pub struct DocumentArg {
    /// Path to the root deployment document, or `-` for stdin.
    #[arg(env = DOCUMENT_ENV, default_value = DEFAULT_DOCUMENT)]
    pub file: PathBuf,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan(args) => plan::execute(&args),
        Command::Validate(args) => validate::execute(&args),
        Command::Apply(args) => apply::execute(&args),
        Command::Render(args) => render::execute(&args),
    }
}

/// Loads a document with its imports. `-` reads the document from stdin,
/// resolving its imports against the working directory.
fn load(path: &Path) -> anyhow::Result<Document> {
    if path == Path::new(STDIN_PATH) {
        let text = std::io::read_to_string(std::io::stdin()).context("cannot read stdin")?;
        return import::load_str(&text, Path::new(".")).context("cannot load document from stdin");
    }
    import::load(path).with_context(|| format!("cannot load {}", path.display()))
}

/// Logs the merge overrides of a document that is not orchestrated.
fn warn_overrides(document: &Document) {
    for warning in document.warnings() {
        tracing::warn!(section = warning.section, key = %warning.key, "entry overridden by import");
    }
}

/// Runs the configured orchestration through the dry-run provisioner.
///
/// Stops after validation when `config.validate_only` is set; the returned
/// report then counts validated tasks.
fn orchestrate(config: &MaestroConfig) -> anyhow::Result<ApplyReport> {
    let document = load(&config.document)?;
    let mut orchestrator =
        Orchestrator::new(document, DryRunProvisioner::new()).with_live(config.live);

    if !config.validate_only {
        return Ok(orchestrator.apply()?);
    }

    let (tier, tasks) = {
        let plan: &Plan = orchestrator.resolve()?;
        (plan.tier, plan.len())
    };
    let context = orchestrator.context();
    orchestrator.validate(&context)?;
    Ok(ApplyReport {
        tier,
        tasks,
        mode: context.mode_label(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use maestro_compose::cascade::Tier;

    use super::*;

    fn document(body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maestro.yml");
        fs::write(&path, body).unwrap();
        (dir, path)
    }

    #[test]
    fn parse_apply_with_live_flag() {
        let cli = Cli::try_parse_from(["maestro", "apply", "prod.yml", "--live"]).unwrap();
        let Command::Apply(args) = cli.command else {
            unreachable!("expected apply");
        };
        assert_eq!(args.document.file, PathBuf::from("prod.yml"));
        assert!(args.live);
    }

    #[test]
    fn parse_plan_json_with_global_log_flag() {
        let cli = Cli::try_parse_from(["maestro", "plan", "--json", "--log-json", "x.yml"]).unwrap();
        assert!(cli.log_json);
        assert!(matches!(cli.command, Command::Plan(ref args) if args.json));
    }

    #[test]
    fn orchestrate_applies_document() {
        let (_dir, path) = document("artifacts: { a: {} }");
        let config = MaestroConfig {
            document: path,
            ..MaestroConfig::default()
        };
        let report = orchestrate(&config).unwrap();
        assert_eq!(report.tier, Tier::DisksAndArtifacts);
        assert_eq!(report.tasks, 1);
        assert_eq!(report.mode, "TEST");
    }

    #[test]
    fn orchestrate_validate_only_with_live_override() {
        let (_dir, path) = document("containers: { web: {} }");
        let config = MaestroConfig {
            document: path,
            validate_only: true,
            live: Some(true),
        };
        let report = orchestrate(&config).unwrap();
        assert_eq!(report.tier, Tier::Containers);
        assert_eq!(report.mode, "LIVE");
    }

    #[test]
    fn missing_document_names_the_path() {
        let config = MaestroConfig {
            document: PathBuf::from("/definitely/not/here.yml"),
            ..MaestroConfig::default()
        };
        let err = orchestrate(&config).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.yml"));
    }
}
