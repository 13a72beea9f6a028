//! Cross-reference resolution of a loaded document.
//!
//! Tiers are processed in a fixed order because each one reads the tiers
//! before it: disks, instances, artifacts, images, containers, jobs,
//! services, deploys. The first dangling reference or unplaceable job aborts
//! resolution.

use std::collections::BTreeMap;

use maestro_common::error::{MaestroError, MatchFailure, Result};
use maestro_common::types::{
    ArtifactKey, ContainerKey, DiskKey, ImageKey, InstanceKey, JobKey, ServiceKey,
};

use crate::context::{Bindable, Context};
use crate::document::{
    Artifact, Container, Disk, Document, Image, Instance, Job, Service, Volume,
};
use crate::label;

/// Every entity of a document with its references resolved.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Disks by key.
    pub disks: BTreeMap<DiskKey, Disk>,
    /// Instances by key, with parsed labels and mounted volumes.
    pub instances: BTreeMap<InstanceKey, Instance>,
    /// Artifacts by key.
    pub artifacts: BTreeMap<ArtifactKey, Artifact>,
    /// Images by key, with their artifacts.
    pub images: BTreeMap<ImageKey, Image>,
    /// Container templates by key, with their image when local.
    pub containers: BTreeMap<ContainerKey, Container>,
    /// Jobs by key, with matched instances and container copies.
    pub jobs: BTreeMap<JobKey, Job>,
    /// Services by key.
    pub services: BTreeMap<ServiceKey, Service>,
    /// Services to deploy, in declared order.
    pub deploys: Vec<Service>,
}

impl Graph {
    /// Binds context variables into every entity collection.
    ///
    /// Returns the number of fields rewritten.
    pub fn bind_vars(&mut self, context: &Context) -> usize {
        let mut changed = 0;
        changed += bind_all(context, self.disks.values_mut());
        changed += bind_all(context, self.instances.values_mut());
        changed += bind_all(context, self.artifacts.values_mut());
        changed += bind_all(context, self.images.values_mut());
        changed += bind_all(context, self.containers.values_mut());
        changed += bind_all(context, self.jobs.values_mut());
        changed += bind_all(context, self.services.values_mut());
        changed += bind_all(context, self.deploys.iter_mut());
        changed
    }
}

fn bind_all<'a, B, I>(context: &Context, entities: I) -> usize
where
    B: Bindable + 'a,
    I: Iterator<Item = &'a mut B>,
{
    entities.map(|entity| context.bind_vars(entity)).sum()
}

/// Resolves every cross-reference of `doc`.
///
/// # Errors
///
/// Returns the first [`MaestroError::Reference`], [`MaestroError::Match`],
/// or [`MaestroError::PortSpec`] encountered, in tier order.
pub fn resolve(doc: &Document) -> Result<Graph> {
    let mut graph = Graph::default();

    resolve_disks(doc, &mut graph);
    resolve_instances(doc, &mut graph)?;
    resolve_artifacts(doc, &mut graph);
    resolve_images(doc, &mut graph);
    resolve_containers(doc, &mut graph);
    resolve_jobs(doc, &mut graph)?;
    resolve_services(doc, &mut graph)?;
    resolve_deploys(doc, &mut graph)?;

    tracing::debug!(
        disks = graph.disks.len(),
        instances = graph.instances.len(),
        jobs = graph.jobs.len(),
        services = graph.services.len(),
        deploys = graph.deploys.len(),
        "document resolved"
    );
    Ok(graph)
}

fn resolve_disks(doc: &Document, graph: &mut Graph) {
    for (key, disk) in &doc.disks {
        let mut disk = disk.clone();
        disk.name = key.clone();
        let _ = graph.disks.insert(key.clone(), disk);
    }
}

fn resolve_instances(doc: &Document, graph: &mut Graph) -> Result<()> {
    for (key, instance) in &doc.instances {
        let mut instance = instance.clone();
        instance.name = key.clone();
        instance.label_set = instance.labels.parse();
        instance.mounts = Vec::new();

        for (label, disks) in &instance.volumes {
            for (disk_key, mount_point) in disks {
                let disk = graph.disks.get(disk_key).ok_or_else(|| MaestroError::Reference {
                    kind: "disk",
                    key: disk_key.to_string(),
                    referrer: format!("instance '{key}' volume '{label}'"),
                })?;
                instance.mounts.push(Volume {
                    label: label.clone(),
                    disk: disk_key.clone(),
                    mount_point: mount_point.clone(),
                    host: key.clone(),
                    resolved: disk.clone(),
                });
            }
        }

        let _ = graph.instances.insert(key.clone(), instance);
    }
    Ok(())
}

fn resolve_artifacts(doc: &Document, graph: &mut Graph) {
    for (key, artifact) in &doc.artifacts {
        let mut artifact = artifact.clone();
        artifact.name = key.clone();
        let _ = graph.artifacts.insert(key.clone(), artifact);
    }
}

fn resolve_images(doc: &Document, graph: &mut Graph) {
    for (key, image) in &doc.images {
        let mut image = image.clone();
        image.name = key.clone();
        image.resolved_artifacts = image
            .artifacts
            .iter()
            .filter_map(|artifact_key| {
                let found = graph.artifacts.get(artifact_key).cloned();
                if found.is_none() {
                    tracing::debug!(image = %key, artifact = %artifact_key, "artifact not in document, skipped");
                }
                found
            })
            .collect();
        let _ = graph.images.insert(key.clone(), image);
    }
}

fn resolve_containers(doc: &Document, graph: &mut Graph) {
    for (key, container) in &doc.containers {
        let mut container = container.clone();
        container.name = key.clone();
        // A miss means an externally hosted image.
        container.target_image = container
            .image
            .as_deref()
            .and_then(|image| graph.images.get(image))
            .cloned();
        let _ = graph.containers.insert(key.clone(), container);
    }
}

fn resolve_jobs(doc: &Document, graph: &mut Graph) -> Result<()> {
    for (key, job) in &doc.jobs {
        let job = place_job(key, job, graph)?;
        let _ = graph.jobs.insert(key.clone(), job);
    }
    Ok(())
}

/// Matches a job to instances and spawns one container copy per match.
fn place_job(key: &JobKey, job: &Job, graph: &Graph) -> Result<Job> {
    let mut job = job.clone();
    job.name = key.clone();

    let template = graph
        .containers
        .get(&job.container)
        .ok_or_else(|| MaestroError::Reference {
            kind: "container",
            key: job.container.to_string(),
            referrer: format!("job '{key}'"),
        })?;
    job.required_labels = job.instance_labels.parse();

    let match_err = |reason| MaestroError::Match {
        job: key.to_string(),
        reason,
    };

    if graph.instances.is_empty() {
        return Err(match_err(MatchFailure::NoInstances));
    }

    // BTreeMap iteration keeps matches sorted by instance name.
    job.instances = graph
        .instances
        .values()
        .filter(|instance| label::satisfies(&job.required_labels, &instance.label_set))
        .cloned()
        .collect();
    if job.instances.is_empty() {
        return Err(match_err(MatchFailure::NoMatchingInstance));
    }

    job.container_instances = job
        .instances
        .iter()
        .map(|instance| {
            let mut copy = template.clone();
            copy.target_instance = Some(instance.name.clone());
            copy
        })
        .collect();
    if job.container_instances.is_empty() {
        return Err(match_err(MatchFailure::NoContainerInstances));
    }

    tracing::debug!(
        job = %key,
        instances = job.instances.len(),
        "job placed"
    );
    job.template = Some(template.clone());
    Ok(job)
}

fn resolve_services(doc: &Document, graph: &mut Graph) -> Result<()> {
    for (key, entries) in &doc.services {
        let mut service = Service {
            name: key.clone(),
            ..Service::default()
        };

        for entry in entries {
            for (job_key, port_list) in entry {
                let job = graph.jobs.get(job_key).ok_or_else(|| MaestroError::Reference {
                    kind: "job",
                    key: job_key.to_string(),
                    referrer: format!("service '{key}'"),
                })?;
                let ports = port_list.parse().map_err(|e| MaestroError::PortSpec {
                    job: job_key.to_string(),
                    spec: e.spec,
                    message: e.message,
                })?;
                service.jobs.push(job.clone());
                let _ = service.ports.insert(job_key.clone(), ports);
            }
        }

        let _ = graph.services.insert(key.clone(), service);
    }
    Ok(())
}

fn resolve_deploys(doc: &Document, graph: &mut Graph) -> Result<()> {
    for key in &doc.deploys {
        let service = graph.services.get(key).ok_or_else(|| MaestroError::Reference {
            kind: "service",
            key: key.to_string(),
            referrer: "deploys".into(),
        })?;
        graph.deploys.push(service.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_yaml(yaml: &str) -> Result<Graph> {
        resolve(&Document::from_yaml(yaml).expect("valid yaml"))
    }

    #[test]
    fn names_match_map_keys() {
        let graph = resolve_yaml(
            "disks: { d1: {} }\nartifacts: { a1: {} }\nimages: { i1: {} }\ncontainers: { c1: {} }",
        )
        .expect("resolve");
        assert_eq!(graph.disks["d1"].name.as_str(), "d1");
        assert_eq!(graph.artifacts["a1"].name.as_str(), "a1");
        assert_eq!(graph.images["i1"].name.as_str(), "i1");
        assert_eq!(graph.containers["c1"].name.as_str(), "c1");
    }

    #[test]
    fn instance_volumes_resolve_disks() {
        let graph = resolve_yaml(
            "disks: { d1: { size_gb: 10 } }\ninstances: { i1: { volumes: { data: { d1: /data } } } }",
        )
        .expect("resolve");
        let mounts = &graph.instances["i1"].mounts;
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].mount_point, "/data");
        assert_eq!(mounts[0].host.as_str(), "i1");
        assert_eq!(mounts[0].resolved.size_gb, Some(10));
    }

    #[test]
    fn unknown_volume_disk_is_fatal() {
        let err = resolve_yaml("instances: { i1: { volumes: { data: { ghost: /data } } } }")
            .unwrap_err();
        assert!(
            matches!(&err, MaestroError::Reference { kind: "disk", key, .. } if key == "ghost"),
            "got: {err}"
        );
    }

    #[test]
    fn image_skips_unknown_artifacts() {
        let graph = resolve_yaml(
            "artifacts: { a1: { tag: v1 } }\nimages: { img: { artifacts: [a1, nope] } }",
        )
        .expect("resolve");
        let image = &graph.images["img"];
        assert_eq!(image.resolved_artifacts.len(), 1);
        assert_eq!(image.resolved_artifacts[0].name.as_str(), "a1");
    }

    #[test]
    fn container_image_is_optional() {
        let graph = resolve_yaml(
            "images: { web: {} }\ncontainers: { local: { image: web }, hub: { image: redis } }",
        )
        .expect("resolve");
        assert!(graph.containers["local"].target_image.is_some());
        assert!(graph.containers["hub"].target_image.is_none());
    }

    #[test]
    fn job_matches_are_sorted_and_cloned() {
        let graph = resolve_yaml(
            r"
containers: { c1: { ssh: [run] } }
instances:
  zeta: { labels: web }
  alpha: { labels: 'web db' }
  mid: { labels: db }
jobs: { j1: { container: c1, instance_labels: web } }
",
        )
        .expect("resolve");
        let job = &graph.jobs["j1"];
        let names: Vec<&str> = job.instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        let targets: Vec<&str> = job
            .container_instances
            .iter()
            .filter_map(|c| c.target_instance.as_ref().map(InstanceKey::as_str))
            .collect();
        assert_eq!(targets, vec!["alpha", "zeta"]);
        assert!(job.template.as_ref().is_some_and(|t| t.target_instance.is_none()));
    }

    #[test]
    fn job_without_instances_fails() {
        let err = resolve_yaml("containers: { c1: {} }\njobs: { j1: { container: c1 } }")
            .unwrap_err();
        assert!(matches!(
            err,
            MaestroError::Match {
                reason: MatchFailure::NoInstances,
                ..
            }
        ));
    }

    #[test]
    fn job_without_matching_instance_fails() {
        let err = resolve_yaml(
            "containers: { c1: {} }\ninstances: { i1: { labels: db } }\njobs: { j1: { container: c1, instance_labels: gpu } }",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MaestroError::Match {
                reason: MatchFailure::NoMatchingInstance,
                ..
            }
        ));
    }

    #[test]
    fn service_records_jobs_and_ports() {
        let graph = resolve_yaml(
            r#"
containers: { c1: {} }
instances: { i1: {} }
jobs: { web: { container: c1 }, api: { container: c1 } }
services:
  front:
    - web: "80, 443"
    - api: [8080]
deploys: [front]
"#,
        )
        .expect("resolve");
        let service = &graph.services["front"];
        let jobs: Vec<&str> = service.jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(jobs, vec!["web", "api"]);
        assert_eq!(service.ports["web"].len(), 2);
        assert_eq!(service.ports["api"][0].container, 8080);
        assert_eq!(graph.deploys.len(), 1);
    }

    #[test]
    fn service_job_without_ports() {
        let graph = resolve_yaml(
            "containers: { c1: {} }\ninstances: { i1: {} }\njobs: { web: { container: c1 } }\nservices: { front: [ { web: } ] }",
        )
        .expect("resolve");
        let service = &graph.services["front"];
        assert_eq!(service.jobs.len(), 1);
        assert!(service.ports["web"].is_empty());
    }

    #[test]
    fn service_with_unknown_job_fails() {
        let err = resolve_yaml("services: { front: [ { ghost: 80 } ] }").unwrap_err();
        assert!(matches!(&err, MaestroError::Reference { kind: "job", key, .. } if key == "ghost"));
    }

    #[test]
    fn service_with_bad_port_fails() {
        let err = resolve_yaml(
            "containers: { c1: {} }\ninstances: { i1: {} }\njobs: { web: { container: c1 } }\nservices: { front: [ { web: 'http' } ] }",
        )
        .unwrap_err();
        assert!(
            matches!(&err, MaestroError::PortSpec { job, spec, .. } if job == "web" && spec == "http"),
            "got: {err}"
        );
    }

    #[test]
    fn deploy_of_unknown_service_fails() {
        let err = resolve_yaml("deploys: [nope]").unwrap_err();
        assert!(matches!(&err, MaestroError::Reference { kind: "service", .. }));
    }

    #[test]
    fn deploys_keep_declared_order() {
        let graph = resolve_yaml(
            "containers: { c1: {} }\ninstances: { i1: {} }\njobs: { j: { container: c1 } }\nservices: { b: [ { j: 1 } ], a: [ { j: 2 } ] }\ndeploys: [b, a]",
        )
        .expect("resolve");
        let order: Vec<&str> = graph.deploys.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn bind_vars_reaches_nested_copies() {
        let mut graph = resolve_yaml(
            "containers: { c1: { command: 'serve {{.port}}' } }\ninstances: { i1: {}, i2: {} }\njobs: { j1: { container: c1 } }",
        )
        .expect("resolve");
        let mut context = Context::new();
        let _ = context.insert("port", "8080");
        let changed = graph.bind_vars(&context);
        // template container, job template, two job copies
        assert_eq!(changed, 4);
        let job = &graph.jobs["j1"];
        assert!(job
            .container_instances
            .iter()
            .all(|c| c.command.as_deref() == Some("serve 8080")));
    }
}
