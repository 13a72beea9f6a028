//! Domain primitive types used across the Maestro workspace.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a string key newtype naming an entity inside its own mapping.
macro_rules! entity_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a key from a string value.
            #[must_use]
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Returns the inner string representation.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

entity_key!(
    /// Key of a disk in the document's `disks` mapping.
    DiskKey
);
entity_key!(
    /// Key of a machine instance in the `instances` mapping.
    InstanceKey
);
entity_key!(
    /// Key of a build artifact in the `artifacts` mapping.
    ArtifactKey
);
entity_key!(
    /// Key of a container image in the `images` mapping.
    ImageKey
);
entity_key!(
    /// Key of a container template in the `containers` mapping.
    ContainerKey
);
entity_key!(
    /// Key of a job in the `jobs` mapping.
    JobKey
);
entity_key!(
    /// Key of a service in the `services` section.
    ServiceKey
);
entity_key!(
    /// Label naming one volume slot of an instance.
    VolumeLabel
);

/// The two phases a task goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPhase {
    /// Pre-flight checks, no side effects.
    Validate,
    /// Actual provisioning.
    Run,
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validate => write!(f, "validate"),
            Self::Run => write!(f, "run"),
        }
    }
}

/// Lifecycle state of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    /// Document loaded, nothing resolved yet.
    Idle,
    /// Cross-references resolved and task plan built.
    Resolved,
    /// Every task passed validation.
    Validated,
    /// Every task ran successfully.
    Applied,
    /// A transition failed; the run cannot continue.
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Resolved => write!(f, "resolved"),
            Self::Validated => write!(f, "validated"),
            Self::Applied => write!(f, "applied"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
