//! Provisioning boundary for plan execution.
//!
//! The orchestrator only decides *which* tasks run and in what order. What
//! validating or running a task means is delegated to a [`Provisioner`].

use maestro_common::error::TaskError;
use maestro_compose::context::{Bindable, Context};
use maestro_compose::task::Task;

/// Executes the two phases of individual tasks.
///
/// Implementors handle the concrete work of creating disks, booting
/// instances, building artifacts, and launching containers.
pub trait Provisioner {
    /// Checks that `task` can run, without side effects.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskError`] describing why the task cannot run.
    fn validate(&mut self, task: &Task, context: &Context) -> Result<(), TaskError>;

    /// Performs the work of `task`.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskError`] if the work failed.
    fn run(&mut self, task: &Task, context: &Context) -> Result<(), TaskError>;
}

impl<P: Provisioner + ?Sized> Provisioner for &mut P {
    fn validate(&mut self, task: &Task, context: &Context) -> Result<(), TaskError> {
        (**self).validate(task, context)
    }

    fn run(&mut self, task: &Task, context: &Context) -> Result<(), TaskError> {
        (**self).run(task, context)
    }
}

/// A provisioner that only logs what it would do.
///
/// Validation rejects targets that still carry an unexpanded `{{` action.
#[derive(Debug, Default)]
pub struct DryRunProvisioner {
    validated: usize,
    ran: usize,
}

impl DryRunProvisioner {
    /// Creates a dry-run provisioner with zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validated: 0,
            ran: 0,
        }
    }

    /// Number of tasks that passed validation.
    #[must_use]
    pub const fn validated(&self) -> usize {
        self.validated
    }

    /// Number of tasks run.
    #[must_use]
    pub const fn ran(&self) -> usize {
        self.ran
    }
}

impl Provisioner for DryRunProvisioner {
    fn validate(&mut self, task: &Task, _context: &Context) -> Result<(), TaskError> {
        if let Some(field) = task.target.fields().into_iter().find(|f| f.contains("{{")) {
            return Err(TaskError::new(format!("unexpanded template: {field}")));
        }
        self.validated += 1;
        Ok(())
    }

    fn run(&mut self, task: &Task, context: &Context) -> Result<(), TaskError> {
        tracing::info!(
            mode = context.mode_label(),
            kind = task.target.kind(),
            task = %task,
            "dry run"
        );
        self.ran += 1;
        Ok(())
    }
}
