//! Integration tests for document loading across real files.
//!
//! Covers:
//! 1. Relative and nested imports
//! 2. Override warnings when an import redefines a key
//! 3. Missing imports and import cycles
//! 4. Resolution of a merged document into a plan

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};

use maestro_common::error::MaestroError;
use maestro_compose::cascade::{self, Tier};
use maestro_compose::import;
use maestro_compose::resolver;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(&path, body).expect("write document");
    path
}

// ── Imports ──────────────────────────────────────────────────────────

#[test]
fn import_relative_to_importing_file() {
    let dir = tempfile::tempdir().unwrap();
    let _ = write(dir.path(), "shared/disks.yml", "disks: { data: { size_gb: 20 } }");
    let root = write(
        dir.path(),
        "maestro.yml",
        "imports: [shared/disks.yml]\ninstances: { node: { volumes: { d: { data: /mnt } } } }",
    );

    let doc = import::load(&root).expect("load");
    assert!(doc.disks.contains_key("data"));
    assert!(doc.instances.contains_key("node"));
    assert!(doc.warnings().is_empty());
}

#[test]
fn nested_imports_resolve_from_their_own_directory() {
    let dir = tempfile::tempdir().unwrap();
    let _ = write(dir.path(), "lib/base/containers.yml", "containers: { web: { image: nginx } }");
    let _ = write(
        dir.path(),
        "lib/jobs.yml",
        "imports: [base/containers.yml]\njobs: { serve: { container: web } }",
    );
    let root = write(dir.path(), "maestro.yml", "imports: [lib/jobs.yml]\ninstances: { n1: {} }");

    let doc = import::load(&root).expect("load");
    assert!(doc.containers.contains_key("web"));
    assert!(doc.jobs.contains_key("serve"));

    let graph = resolver::resolve(&doc).expect("resolve");
    let plan = cascade::build(&graph);
    assert_eq!(plan.tier, Tier::Jobs);
    assert_eq!(plan.tasks[0].description, "job serve on [n1]");
}

#[test]
fn import_path_expands_environment() {
    let dir = tempfile::tempdir().unwrap();
    let _ = write(dir.path(), "vars.yml", "vars: { region: eu }");
    let root = write(
        dir.path(),
        "maestro.yml",
        "imports: ['${MAESTRO_SURELY_UNSET_VARIABLE_42}vars.yml']",
    );

    let doc = import::load(&root).expect("load");
    assert_eq!(doc.vars["region"], "eu");
}

#[test]
fn imported_value_wins_with_single_warning() {
    let dir = tempfile::tempdir().unwrap();
    let _ = write(dir.path(), "override.yml", "vars: { region: us }");
    let root = write(
        dir.path(),
        "maestro.yml",
        "imports: [override.yml]\nvars: { region: eu, owner: ops }",
    );

    let doc = import::load(&root).expect("load");
    assert_eq!(doc.vars["region"], "us");
    assert_eq!(doc.vars["owner"], "ops");
    assert_eq!(doc.warnings().len(), 1);
    assert_eq!(doc.warnings()[0].to_string(), "vars[region] overridden by import");
}

#[test]
fn later_import_wins_over_earlier_one() {
    let dir = tempfile::tempdir().unwrap();
    let _ = write(dir.path(), "a.yml", "vars: { k: a }");
    let _ = write(dir.path(), "b.yml", "vars: { k: b }");
    let root = write(dir.path(), "maestro.yml", "imports: [a.yml, b.yml]\nvars: { k: base }");

    let doc = import::load(&root).expect("load");
    assert_eq!(doc.vars["k"], "b");
    assert_eq!(doc.warnings().len(), 2);
    assert!(doc.warnings().iter().all(|w| w.section == "vars" && w.key == "k"));
}

#[test]
fn warnings_from_nested_imports_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let _ = write(dir.path(), "inner.yml", "disks: { d: { size_gb: 2 } }");
    let _ = write(dir.path(), "outer.yml", "imports: [inner.yml]\ndisks: { d: { size_gb: 1 } }");
    let root = write(dir.path(), "maestro.yml", "imports: [outer.yml]");

    let doc = import::load(&root).expect("load");
    assert_eq!(doc.disks["d"].size_gb, Some(2));
    assert_eq!(doc.warnings().len(), 1);
}

#[test]
fn deploys_accumulate_across_imports() {
    let dir = tempfile::tempdir().unwrap();
    let _ = write(dir.path(), "more.yml", "deploys: [db]");
    let root = write(dir.path(), "maestro.yml", "imports: [more.yml]\ndeploys: [web]");

    let doc = import::load(&root).expect("load");
    let deploys: Vec<&str> = doc.deploys.iter().map(|k| k.as_str()).collect();
    assert_eq!(deploys, vec!["web", "db"]);
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn missing_root_document_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = import::load(&dir.path().join("absent.yml")).unwrap_err();
    assert!(matches!(err, MaestroError::Io { .. }), "got: {err}");
}

#[test]
fn missing_import_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "maestro.yml", "imports: [nowhere.yml]");
    let err = import::load(&root).unwrap_err();
    assert!(
        matches!(&err, MaestroError::Parse { message, .. } if message.contains("nowhere.yml")),
        "got: {err}"
    );
}

#[test]
fn import_cycle_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let _ = write(dir.path(), "a.yml", "imports: [b.yml]");
    let _ = write(dir.path(), "b.yml", "imports: [a.yml]");
    let err = import::load(&dir.path().join("a.yml")).unwrap_err();
    assert!(
        matches!(&err, MaestroError::Parse { message, .. } if message.starts_with("import cycle")),
        "got: {err}"
    );
}

#[test]
fn malformed_import_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let _ = write(dir.path(), "broken.yml", "jobs: [");
    let root = write(dir.path(), "maestro.yml", "imports: [broken.yml]");
    let err = import::load(&root).unwrap_err();
    assert!(matches!(err, MaestroError::Parse { .. }), "got: {err}");
}

#[test]
fn unknown_top_level_key_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "maestro.yml", "volumes: {}");
    let err = import::load(&root).unwrap_err();
    assert!(matches!(err, MaestroError::Parse { .. }), "got: {err}");
}

// ── Resolution ───────────────────────────────────────────────────────

#[test]
fn container_copies_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(
        dir.path(),
        "maestro.yml",
        r"
containers: { worker: { ssh: [boot] } }
instances: { a: {}, b: {} }
jobs: { crunch: { container: worker } }
",
    );

    let doc = import::load(&root).expect("load");
    let mut graph = resolver::resolve(&doc).expect("resolve");
    let job = graph.jobs.get_mut("crunch").unwrap();
    job.container_instances[0].ssh.push("extra".into());

    assert_eq!(job.container_instances[0].ssh.len(), 2);
    assert_eq!(job.container_instances[1].ssh, vec!["boot".to_string()]);
    assert_eq!(job.template.as_ref().unwrap().ssh.len(), 1);
    assert_eq!(graph.containers["worker"].ssh.len(), 1);
}

#[test]
fn empty_document_plans_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "maestro.yml", "");
    let doc = import::load(&root).expect("load");
    let plan = cascade::build(&resolver::resolve(&doc).expect("resolve"));
    assert_eq!(plan.tier, Tier::Empty);
    assert!(plan.is_empty());
}
