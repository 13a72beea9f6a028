//! The deployment document and the entities it declares.
//!
//! Entities are deserialized from YAML as written. Their derived fields
//! (names, parsed labels, resolved references) are filled in by the
//! [`resolver`](crate::resolver) and are never read from or written to YAML.

use std::collections::BTreeMap;
use std::fmt;

use maestro_common::error::MergeWarning;
use maestro_common::types::{
    ArtifactKey, ContainerKey, DiskKey, ImageKey, InstanceKey, JobKey, ServiceKey, VolumeLabel,
};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::context::Bindable;
use crate::label::{LabelSet, RawLabels};
use crate::ports::{ExposedPort, PortList};

/// Jobs of one service, as `[{job: ports}, ...]` in declaration order.
pub type ServiceJobs = Vec<BTreeMap<JobKey, PortList>>;

/// Root of a deployment document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Document {
    /// Paths of documents merged into this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    /// Template variables.
    #[serde(deserialize_with = "scalar_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
    /// Services to deploy, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deploys: Vec<ServiceKey>,
    /// Raw service section: each service lists its jobs and their ports.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<ServiceKey, ServiceJobs>,
    /// Build artifacts.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub artifacts: BTreeMap<ArtifactKey, Artifact>,
    /// Container images.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<ImageKey, Image>,
    /// Container templates.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub containers: BTreeMap<ContainerKey, Container>,
    /// Disks.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub disks: BTreeMap<DiskKey, Disk>,
    /// Machine instances.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub instances: BTreeMap<InstanceKey, Instance>,
    /// Jobs placing containers on instances.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub jobs: BTreeMap<JobKey, Job>,

    #[serde(skip)]
    warnings: Vec<MergeWarning>,
}

impl Document {
    /// Parses a document from YAML text. Imports are not followed.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the text is not a valid document.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Serializes the document back to YAML.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Warnings produced while merging imports into this document.
    #[must_use]
    pub fn warnings(&self) -> &[MergeWarning] {
        &self.warnings
    }

    pub(crate) fn record_warnings(&mut self, warnings: impl IntoIterator<Item = MergeWarning>) {
        self.warnings.extend(warnings);
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_yaml() {
            Ok(yaml) => f.write_str(&yaml),
            Err(err) => write!(f, "{err}"),
        }
    }
}

/// Accepts any YAML scalar as a variable value.
fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_yaml::Value;

    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            Value::Bool(b) => Ok((key, b.to_string())),
            Value::Number(n) => Ok((key, n.to_string())),
            Value::Null => Ok((key, String::new())),
            other => Err(D::Error::custom(format!(
                "var '{key}' must be a scalar, got {other:?}"
            ))),
        })
        .collect()
}

/// A disk that can be attached to instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Disk {
    /// Derived from the map key.
    #[serde(skip)]
    pub name: DiskKey,
    /// Cloud provider hosting the disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    /// Disk type, e.g. `pd-ssd`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
    /// Size in gigabytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_gb: Option<u64>,
}

impl Bindable for Disk {
    fn fields(&self) -> Vec<&str> {
        [&self.cloud, &self.disk_type]
            .into_iter()
            .filter_map(Option::as_deref)
            .collect()
    }

    fn fields_mut(&mut self) -> Vec<&mut String> {
        [&mut self.cloud, &mut self.disk_type]
            .into_iter()
            .filter_map(Option::as_mut)
            .collect()
    }
}

/// A disk mounted on an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Volume {
    /// Volume slot on the instance.
    pub label: VolumeLabel,
    /// Key of the mounted disk.
    pub disk: DiskKey,
    /// Mount point inside the instance.
    pub mount_point: String,
    /// Instance the volume belongs to.
    pub host: InstanceKey,
    /// The disk as resolved from the document.
    pub resolved: Disk,
}

impl Bindable for Volume {
    fn fields(&self) -> Vec<&str> {
        let mut fields = vec![self.mount_point.as_str()];
        fields.extend(self.resolved.fields());
        fields
    }

    fn fields_mut(&mut self) -> Vec<&mut String> {
        let mut fields = vec![&mut self.mount_point];
        fields.extend(self.resolved.fields_mut());
        fields
    }
}

/// A machine instance jobs can be placed on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Instance {
    /// Derived from the map key.
    #[serde(skip)]
    pub name: InstanceKey,
    /// Cloud provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,
    /// Cloud project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Availability zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Machine type, e.g. `n1-standard-1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    /// Boot image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Labels offered to jobs.
    #[serde(skip_serializing_if = "RawLabels::is_empty")]
    pub labels: RawLabels,
    /// Volume slots: label → disk key → mount point.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<VolumeLabel, BTreeMap<DiskKey, String>>,

    /// Parsed `labels`.
    #[serde(skip)]
    pub label_set: LabelSet,
    /// Volumes resolved against the document's disks.
    #[serde(skip)]
    pub mounts: Vec<Volume>,
}

impl Bindable for Instance {
    fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = [
            &self.cloud,
            &self.project,
            &self.zone,
            &self.machine_type,
            &self.image,
        ]
        .into_iter()
        .filter_map(Option::as_deref)
        .collect();
        for mount in &self.mounts {
            fields.extend(mount.fields());
        }
        fields
    }

    fn fields_mut(&mut self) -> Vec<&mut String> {
        let mut fields: Vec<&mut String> = [
            &mut self.cloud,
            &mut self.project,
            &mut self.zone,
            &mut self.machine_type,
            &mut self.image,
        ]
        .into_iter()
        .filter_map(Option::as_mut)
        .collect();
        for mount in &mut self.mounts {
            fields.extend(mount.fields_mut());
        }
        fields
    }
}

/// Something built from source, consumed by images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Artifact {
    /// Derived from the map key.
    #[serde(skip)]
    pub name: ArtifactKey,
    /// Project the artifact belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Source repository URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Build command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    /// Version tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Bindable for Artifact {
    fn fields(&self) -> Vec<&str> {
        [&self.project, &self.repository, &self.build, &self.tag]
            .into_iter()
            .filter_map(Option::as_deref)
            .collect()
    }

    fn fields_mut(&mut self) -> Vec<&mut String> {
        [
            &mut self.project,
            &mut self.repository,
            &mut self.build,
            &mut self.tag,
        ]
        .into_iter()
        .filter_map(Option::as_mut)
        .collect()
    }
}

/// A container image built from artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Image {
    /// Derived from the map key.
    #[serde(skip)]
    pub name: ImageKey,
    /// Dockerfile path or URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    /// Registry repository the image is pushed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Image tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Keys of the artifacts baked into the image.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactKey>,

    /// Artifacts found in the document, in declaration order.
    #[serde(skip)]
    pub resolved_artifacts: Vec<Artifact>,
}

impl Bindable for Image {
    fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = [&self.dockerfile, &self.repository, &self.tag]
            .into_iter()
            .filter_map(Option::as_deref)
            .collect();
        for artifact in &self.resolved_artifacts {
            fields.extend(artifact.fields());
        }
        fields
    }

    fn fields_mut(&mut self) -> Vec<&mut String> {
        let mut fields: Vec<&mut String> =
            [&mut self.dockerfile, &mut self.repository, &mut self.tag]
                .into_iter()
                .filter_map(Option::as_mut)
                .collect();
        for artifact in &mut self.resolved_artifacts {
            fields.extend(artifact.fields_mut());
        }
        fields
    }
}

/// A container template; jobs clone it once per instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Container {
    /// Derived from the map key.
    #[serde(skip)]
    pub name: ContainerKey,
    /// Image key in this document, or an externally hosted image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Command the container runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Shell commands run on the instance to launch the container.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh: Vec<String>,
    /// `KEY=value` environment entries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<String>,

    /// The image when it is defined in this document.
    #[serde(skip)]
    pub target_image: Option<Image>,
    /// Instance this copy runs on; unset on templates.
    #[serde(skip)]
    pub target_instance: Option<InstanceKey>,
}

impl Bindable for Container {
    fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = [&self.image, &self.command]
            .into_iter()
            .filter_map(Option::as_deref)
            .collect();
        fields.extend(self.ssh.iter().map(String::as_str));
        fields.extend(self.environment.iter().map(String::as_str));
        if let Some(image) = &self.target_image {
            fields.extend(image.fields());
        }
        fields
    }

    fn fields_mut(&mut self) -> Vec<&mut String> {
        let mut fields: Vec<&mut String> = [&mut self.image, &mut self.command]
            .into_iter()
            .filter_map(Option::as_mut)
            .collect();
        fields.extend(self.ssh.iter_mut());
        fields.extend(self.environment.iter_mut());
        if let Some(image) = &mut self.target_image {
            fields.extend(image.fields_mut());
        }
        fields
    }
}

/// Runs a container on every instance matching a label selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Job {
    /// Derived from the map key.
    #[serde(skip)]
    pub name: JobKey,
    /// Key of the container template.
    pub container: ContainerKey,
    /// Labels an instance must offer to take the job.
    #[serde(skip_serializing_if = "RawLabels::is_empty")]
    pub instance_labels: RawLabels,

    /// Parsed `instance_labels`.
    #[serde(skip)]
    pub required_labels: LabelSet,
    /// The resolved container template.
    #[serde(skip)]
    pub template: Option<Container>,
    /// Matching instances, sorted by name.
    #[serde(skip)]
    pub instances: Vec<Instance>,
    /// One container copy per matching instance, in `instances` order.
    #[serde(skip)]
    pub container_instances: Vec<Container>,
}

impl Bindable for Job {
    fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        if let Some(template) = &self.template {
            fields.extend(template.fields());
        }
        for instance in &self.instances {
            fields.extend(instance.fields());
        }
        for copy in &self.container_instances {
            fields.extend(copy.fields());
        }
        fields
    }

    fn fields_mut(&mut self) -> Vec<&mut String> {
        let mut fields = Vec::new();
        if let Some(template) = &mut self.template {
            fields.extend(template.fields_mut());
        }
        for instance in &mut self.instances {
            fields.extend(instance.fields_mut());
        }
        for copy in &mut self.container_instances {
            fields.extend(copy.fields_mut());
        }
        fields
    }
}

/// A set of jobs deployed together, with the ports each exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Service {
    /// Derived from the `services` key.
    pub name: ServiceKey,
    /// Jobs in declaration order.
    pub jobs: Vec<Job>,
    /// Exposed ports per job.
    pub ports: BTreeMap<JobKey, Vec<ExposedPort>>,
}

impl Bindable for Service {
    fn fields(&self) -> Vec<&str> {
        self.jobs.iter().flat_map(Job::fields).collect()
    }

    fn fields_mut(&mut self) -> Vec<&mut String> {
        self.jobs.iter_mut().flat_map(Job::fields_mut).collect()
    }
}
