//! Document loading with recursive `imports`.
//!
//! Each import path is environment-expanded, resolved relative to the
//! importing file, loaded (with its own imports), and merged into the
//! importing document. On a key collision the imported value wins and a
//! [`MergeWarning`] is recorded.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use maestro_common::error::{MaestroError, MergeWarning, Result};

use crate::context::expand_env;
use crate::document::Document;

/// Loads a document and everything it imports.
///
/// # Errors
///
/// Returns [`MaestroError::Io`] if `path` cannot be read, and
/// [`MaestroError::Parse`] if any document is malformed, an import is
/// missing, or imports form a cycle.
pub fn load(path: &Path) -> Result<Document> {
    let mut chain = Vec::new();
    load_chained(path, &mut chain)
}

/// Parses in-memory document text and loads its imports relative to `base_dir`.
///
/// # Errors
///
/// Returns [`MaestroError::Parse`] if the text or any import is malformed
/// or cannot be loaded.
pub fn load_str(text: &str, base_dir: &Path) -> Result<Document> {
    let origin = PathBuf::from("<inline>");
    let doc = parse(text, &origin)?;
    let mut chain = Vec::new();
    resolve_imports(doc, &origin, base_dir, &mut chain)
}

fn load_chained(path: &Path, chain: &mut Vec<PathBuf>) -> Result<Document> {
    tracing::info!(path = %path.display(), "loading document");

    let canonical = path.canonicalize().map_err(|e| MaestroError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    if chain.contains(&canonical) {
        let cycle: Vec<String> = chain
            .iter()
            .chain(std::iter::once(&canonical))
            .map(|p| p.display().to_string())
            .collect();
        return Err(MaestroError::Parse {
            path: path.to_path_buf(),
            message: format!("import cycle: {}", cycle.join(" -> ")),
        });
    }

    let text = std::fs::read_to_string(&canonical).map_err(|e| MaestroError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let doc = parse(&text, path)?;

    let base_dir = canonical.parent().map_or_else(PathBuf::new, Path::to_path_buf);
    chain.push(canonical);
    let resolved = resolve_imports(doc, path, &base_dir, chain);
    let _ = chain.pop();
    resolved
}

fn parse(text: &str, path: &Path) -> Result<Document> {
    Document::from_yaml(text).map_err(|e| MaestroError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn resolve_imports(
    mut doc: Document,
    origin: &Path,
    base_dir: &Path,
    chain: &mut Vec<PathBuf>,
) -> Result<Document> {
    for raw in doc.imports.clone() {
        let import_path = base_dir.join(expand_env(&raw));
        tracing::debug!(from = %origin.display(), import = %import_path.display(), "resolving import");

        let imported = load_chained(&import_path, chain).map_err(|err| match err {
            MaestroError::Io { path, source } => MaestroError::Parse {
                path: origin.to_path_buf(),
                message: format!("cannot load import {}: {source}", path.display()),
            },
            other => other,
        })?;

        let inherited = imported.warnings().to_vec();
        let warnings = merge(&mut doc, imported);
        doc.record_warnings(inherited.into_iter().chain(warnings));
    }
    Ok(doc)
}

/// Folds `from` into `into`.
///
/// Deploy entries are appended. Every keyed entry is inserted, replacing an
/// existing value with the same key; each replacement produces one warning.
/// The `imports` list of `from` is not copied.
pub fn merge(into: &mut Document, from: Document) -> Vec<MergeWarning> {
    let mut warnings = Vec::new();

    into.deploys.extend(from.deploys);
    merge_section("vars", &mut into.vars, from.vars, &mut warnings);
    merge_section("artifacts", &mut into.artifacts, from.artifacts, &mut warnings);
    merge_section("images", &mut into.images, from.images, &mut warnings);
    merge_section("containers", &mut into.containers, from.containers, &mut warnings);
    merge_section("disks", &mut into.disks, from.disks, &mut warnings);
    merge_section("instances", &mut into.instances, from.instances, &mut warnings);
    merge_section("jobs", &mut into.jobs, from.jobs, &mut warnings);
    merge_section("services", &mut into.services, from.services, &mut warnings);

    warnings
}

fn merge_section<K, V>(
    section: &'static str,
    into: &mut BTreeMap<K, V>,
    from: BTreeMap<K, V>,
    warnings: &mut Vec<MergeWarning>,
) where
    K: Ord + Display,
{
    for (key, value) in from {
        let label = key.to_string();
        if into.insert(key, value).is_some() {
            tracing::debug!(section, key = %label, "entry overridden by import");
            warnings.push(MergeWarning {
                section,
                key: label,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Document {
        Document::from_yaml(yaml).expect("valid yaml")
    }

    #[test]
    fn imported_var_overrides_with_one_warning() {
        let mut base = doc("vars: { region: eu, owner: ops }");
        let imported = doc("vars: { region: us }");
        let warnings = merge(&mut base, imported);

        assert_eq!(base.vars.len(), 2);
        assert_eq!(base.vars["region"], "us");
        assert_eq!(
            warnings,
            vec![MergeWarning {
                section: "vars",
                key: "region".into()
            }]
        );
    }

    #[test]
    fn merge_keeps_entities_from_both_sides() {
        let mut base = doc("disks: { a: {} }\njobs: { j1: { container: c1 } }");
        let imported = doc("disks: { b: {} }\ncontainers: { c1: {} }");
        let warnings = merge(&mut base, imported);

        assert!(warnings.is_empty());
        assert_eq!(base.disks.len(), 2);
        assert!(base.containers.contains_key("c1"));
        assert!(base.jobs.contains_key("j1"));
    }

    #[test]
    fn deploys_are_appended() {
        let mut base = doc("deploys: [web]");
        let imported = doc("deploys: [db, cache]");
        let _ = merge(&mut base, imported);
        let keys: Vec<&str> = base.deploys.iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["web", "db", "cache"]);
    }

    #[test]
    fn imports_list_is_not_merged() {
        let mut base = doc("imports: [a.yml]");
        let imported = doc("imports: [b.yml]");
        let _ = merge(&mut base, imported);
        assert_eq!(base.imports, vec!["a.yml".to_string()]);
    }

    #[test]
    fn load_str_without_imports() {
        let loaded = load_str("vars: { a: b }", Path::new(".")).expect("load");
        assert_eq!(loaded.vars["a"], "b");
        assert!(loaded.warnings().is_empty());
    }

    #[test]
    fn load_str_reports_yaml_errors_as_parse() {
        let err = load_str("jobs: [", Path::new(".")).unwrap_err();
        assert!(matches!(err, MaestroError::Parse { .. }), "got: {err}");
    }
}
