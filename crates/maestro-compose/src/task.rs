//! Tasks produced by resolved entities.
//!
//! A [`Task`] pairs a human-readable description with a snapshot of the
//! entity it provisions. What validating or running a task actually does is
//! up to the provisioner executing the plan.

use std::fmt;

use serde::Serialize;

use crate::context::Bindable;
use crate::document::{Artifact, Container, Disk, Image, Instance, Job, Service};

/// The entity a task provisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Target {
    /// Create a disk.
    Disk(Disk),
    /// Boot an instance.
    Instance(Instance),
    /// Build an artifact.
    Artifact(Artifact),
    /// Build and push an image.
    Image(Image),
    /// Launch a container.
    Container(Container),
    /// Start a job on its instances.
    Job(Job),
    /// Stand up a service.
    Service(Service),
    /// Deploy a service listed in `deploys`.
    Deploy(Service),
}

impl Target {
    /// Short kind name, e.g. `"disk"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Disk(_) => "disk",
            Self::Instance(_) => "instance",
            Self::Artifact(_) => "artifact",
            Self::Image(_) => "image",
            Self::Container(_) => "container",
            Self::Job(_) => "job",
            Self::Service(_) => "service",
            Self::Deploy(_) => "deploy",
        }
    }

    fn inner(&self) -> &dyn Bindable {
        match self {
            Self::Disk(e) => e,
            Self::Instance(e) => e,
            Self::Artifact(e) => e,
            Self::Image(e) => e,
            Self::Container(e) => e,
            Self::Job(e) => e,
            Self::Service(e) | Self::Deploy(e) => e,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Bindable {
        match self {
            Self::Disk(e) => e,
            Self::Instance(e) => e,
            Self::Artifact(e) => e,
            Self::Image(e) => e,
            Self::Container(e) => e,
            Self::Job(e) => e,
            Self::Service(e) | Self::Deploy(e) => e,
        }
    }
}

impl Bindable for Target {
    fn fields(&self) -> Vec<&str> {
        self.inner().fields()
    }

    fn fields_mut(&mut self) -> Vec<&mut String> {
        self.inner_mut().fields_mut()
    }
}

/// A unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// What the task does, e.g. `"job web on [node-1, node-2]"`.
    pub description: String,
    /// The entity being provisioned.
    pub target: Target,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Entities that can produce a task for themselves.
pub trait Tasked {
    /// Builds the task provisioning this entity.
    fn task(&self) -> Task;
}

impl Tasked for Disk {
    fn task(&self) -> Task {
        let mut description = format!("disk {}", self.name);
        if let Some(size) = self.size_gb {
            description.push_str(&format!(" ({size} GB)"));
        }
        Task {
            description,
            target: Target::Disk(self.clone()),
        }
    }
}

impl Tasked for Instance {
    fn task(&self) -> Task {
        Task {
            description: format!("instance {}", self.name),
            target: Target::Instance(self.clone()),
        }
    }
}

impl Tasked for Artifact {
    fn task(&self) -> Task {
        Task {
            description: format!("artifact {}", self.name),
            target: Target::Artifact(self.clone()),
        }
    }
}

impl Tasked for Image {
    fn task(&self) -> Task {
        Task {
            description: format!(
                "image {} ({} artifact(s))",
                self.name,
                self.resolved_artifacts.len()
            ),
            target: Target::Image(self.clone()),
        }
    }
}

impl Tasked for Container {
    fn task(&self) -> Task {
        let image = self.image.as_deref().unwrap_or("-");
        let description = match &self.target_instance {
            Some(instance) => format!("container {} ({image}) on {instance}", self.name),
            None => format!("container {} ({image})", self.name),
        };
        Task {
            description,
            target: Target::Container(self.clone()),
        }
    }
}

impl Tasked for Job {
    fn task(&self) -> Task {
        let instances: Vec<&str> = self.instances.iter().map(|i| i.name.as_str()).collect();
        Task {
            description: format!("job {} on [{}]", self.name, instances.join(", ")),
            target: Target::Job(self.clone()),
        }
    }
}

impl Tasked for Service {
    fn task(&self) -> Task {
        Task {
            description: format!("service {} ({} job(s))", self.name, self.jobs.len()),
            target: Target::Service(self.clone()),
        }
    }
}

/// A service selected by `deploys`.
#[derive(Debug, Clone, Copy)]
pub struct Deploy<'a>(pub &'a Service);

impl Tasked for Deploy<'_> {
    fn task(&self) -> Task {
        let service = self.0;
        Task {
            description: format!("deploy service {} ({} job(s))", service.name, service.jobs.len()),
            target: Target::Deploy(service.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use maestro_common::types::{ContainerKey, DiskKey, InstanceKey};

    use super::*;

    #[test]
    fn disk_task_describes_size() {
        let disk = Disk {
            name: DiskKey::new("d1"),
            size_gb: Some(50),
            ..Disk::default()
        };
        let task = disk.task();
        assert_eq!(task.description, "disk d1 (50 GB)");
        assert_eq!(task.target.kind(), "disk");
    }

    #[test]
    fn container_copy_names_its_instance() {
        let container = Container {
            name: ContainerKey::new("c1"),
            target_instance: Some(InstanceKey::new("node-1")),
            ..Container::default()
        };
        assert_eq!(container.task().description, "container c1 (-) on node-1");
    }

    #[test]
    fn target_binding_reaches_entity() {
        let mut task = Container {
            name: ContainerKey::new("c1"),
            command: Some("run {{.x}}".into()),
            ..Container::default()
        }
        .task();
        assert_eq!(task.target.fields(), vec!["run {{.x}}"]);
        let fields = task.target.fields_mut();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn task_serializes_with_kind_tag() {
        let task = Artifact::default().task();
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(json["target"]["kind"], "artifact");
    }
}
