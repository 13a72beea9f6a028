//! Selection of the task list from a resolved graph.
//!
//! Only the highest non-empty tier contributes tasks, which lets a document
//! describe just images or artifacts without any runnable deployment.

use std::fmt;

use serde::Serialize;

use crate::resolver::Graph;
use crate::task::{Deploy, Task, Tasked};

/// The entity tier a plan was built from, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Services listed in `deploys`.
    Deploys,
    /// Jobs.
    Jobs,
    /// Containers.
    Containers,
    /// Instances.
    Instances,
    /// Images.
    Images,
    /// Disks followed by artifacts.
    DisksAndArtifacts,
    /// Nothing to do.
    Empty,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deploys => "deploys",
            Self::Jobs => "jobs",
            Self::Containers => "containers",
            Self::Instances => "instances",
            Self::Images => "images",
            Self::DisksAndArtifacts => "disks and artifacts",
            Self::Empty => "empty",
        };
        f.write_str(name)
    }
}

/// The ordered task list of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Tier the tasks come from.
    pub tier: Tier,
    /// Tasks in execution order.
    pub tasks: Vec<Task>,
}

impl Plan {
    /// Returns true when there is nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

fn tasks_of<'a, T: Tasked + 'a>(entities: impl IntoIterator<Item = &'a T>) -> Vec<Task> {
    entities.into_iter().map(Tasked::task).collect()
}

/// Builds the plan from the first non-empty tier of `graph`.
///
/// Only the selected tier is turned into tasks.
#[must_use]
pub fn build(graph: &Graph) -> Plan {
    let tiers: [(Tier, bool, fn(&Graph) -> Vec<Task>); 5] = [
        (Tier::Deploys, graph.deploys.is_empty(), |g| {
            g.deploys.iter().map(|s| Deploy(s).task()).collect()
        }),
        (Tier::Jobs, graph.jobs.is_empty(), |g| tasks_of(g.jobs.values())),
        (Tier::Containers, graph.containers.is_empty(), |g| {
            tasks_of(g.containers.values())
        }),
        (Tier::Instances, graph.instances.is_empty(), |g| {
            tasks_of(g.instances.values())
        }),
        (Tier::Images, graph.images.is_empty(), |g| tasks_of(g.images.values())),
    ];

    if let Some((tier, _, tasks_for)) = tiers.into_iter().find(|(_, empty, _)| !empty) {
        let tasks = tasks_for(graph);
        tracing::debug!(%tier, tasks = tasks.len(), "task tier selected");
        return Plan { tier, tasks };
    }

    let mut tasks = tasks_of(graph.disks.values());
    tasks.extend(tasks_of(graph.artifacts.values()));
    let tier = if tasks.is_empty() {
        Tier::Empty
    } else {
        Tier::DisksAndArtifacts
    };
    Plan { tier, tasks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::resolver::resolve;

    fn plan(yaml: &str) -> Plan {
        let doc = Document::from_yaml(yaml).expect("valid yaml");
        build(&resolve(&doc).expect("resolve"))
    }

    #[test]
    fn empty_document_has_empty_plan() {
        let plan = plan("");
        assert_eq!(plan.tier, Tier::Empty);
        assert!(plan.is_empty());
    }

    #[test]
    fn deploys_shadow_jobs() {
        let plan = plan(
            r"
containers: { c1: {} }
instances: { i1: {} }
jobs: { j1: { container: c1 }, j2: { container: c1 } }
services: { web: [ { j1: 80 } ] }
deploys: [web]
",
        );
        assert_eq!(plan.tier, Tier::Deploys);
        assert_eq!(plan.len(), 1);
        assert!(plan.tasks.iter().all(|t| t.target.kind() == "deploy"));
    }

    #[test]
    fn services_without_deploys_fall_to_jobs() {
        let plan = plan(
            "containers: { c1: {} }\ninstances: { i1: {} }\njobs: { j1: { container: c1 } }\nservices: { web: [ { j1: 80 } ] }",
        );
        assert_eq!(plan.tier, Tier::Jobs);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn containers_shadow_instances_and_images() {
        let plan = plan("containers: { b: {}, a: {} }\ninstances: { i1: {} }\nimages: { img: {} }");
        assert_eq!(plan.tier, Tier::Containers);
        let names: Vec<&str> = plan.tasks.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(names, vec!["container a (-)", "container b (-)"]);
    }

    #[test]
    fn instances_then_images() {
        assert_eq!(plan("instances: { i1: {} }\nimages: { img: {} }").tier, Tier::Instances);
        assert_eq!(plan("images: { img: {} }\ndisks: { d: {} }").tier, Tier::Images);
    }

    #[test]
    fn disks_and_artifacts_share_the_last_tier() {
        let plan = plan("disks: { d1: {} }\nartifacts: { a1: {}, a2: {} }");
        assert_eq!(plan.tier, Tier::DisksAndArtifacts);
        let kinds: Vec<&str> = plan.tasks.iter().map(|t| t.target.kind()).collect();
        assert_eq!(kinds, vec!["disk", "artifact", "artifact"]);
    }
}
