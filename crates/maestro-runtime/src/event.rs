//! Orchestration progress events.
//!
//! The orchestrator reports progress to an [`EventListener`] handed to it at
//! construction. Every event carries the mode label (`TEST` or `LIVE`) in
//! effect when it was emitted.

use maestro_common::error::MergeWarning;
use maestro_common::types::RunPhase;
use maestro_compose::cascade::Tier;

/// A step of an orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationEvent {
    /// An import overwrote an entry of the importing document.
    MergeOverride(MergeWarning),
    /// The document was resolved into a plan.
    Resolved {
        /// Tier the plan was built from.
        tier: Tier,
        /// Number of planned tasks.
        tasks: usize,
    },
    /// Context variables were bound into the graph and the plan.
    Bound {
        /// Number of fields rewritten.
        fields: usize,
    },
    /// A task passed validation.
    TaskValidated {
        /// Position in the plan.
        index: usize,
        /// Task description.
        description: String,
    },
    /// A task ran.
    TaskRan {
        /// Position in the plan.
        index: usize,
        /// Task description.
        description: String,
    },
    /// The plan was empty.
    NothingToDo,
    /// The orchestrator reached a new phase.
    PhaseChanged(RunPhase),
    /// A step failed; the run is over.
    Failed {
        /// Rendered error.
        error: String,
    },
}

/// Receives orchestration events.
pub trait EventListener {
    /// Called once per event, in emission order.
    fn on_event(&mut self, mode: &'static str, event: &OrchestrationEvent);
}

impl<L: EventListener + ?Sized> EventListener for &mut L {
    fn on_event(&mut self, mode: &'static str, event: &OrchestrationEvent) {
        (**self).on_event(mode, event);
    }
}

/// Collects events in memory.
impl EventListener for Vec<(&'static str, OrchestrationEvent)> {
    fn on_event(&mut self, mode: &'static str, event: &OrchestrationEvent) {
        self.push((mode, event.clone()));
    }
}

/// Renders events as `tracing` log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl EventListener for TracingListener {
    fn on_event(&mut self, mode: &'static str, event: &OrchestrationEvent) {
        match event {
            OrchestrationEvent::MergeOverride(warning) => {
                tracing::warn!(mode, section = warning.section, key = %warning.key, "entry overridden by import");
            }
            OrchestrationEvent::Resolved { tier, tasks } => {
                tracing::info!(mode, %tier, tasks, "plan resolved");
            }
            OrchestrationEvent::Bound { fields } => {
                tracing::debug!(mode, fields, "variables bound");
            }
            OrchestrationEvent::TaskValidated { index, description } => {
                tracing::info!(mode, index, task = %description, "task validated");
            }
            OrchestrationEvent::TaskRan { index, description } => {
                tracing::info!(mode, index, task = %description, "task ran");
            }
            OrchestrationEvent::NothingToDo => tracing::info!(mode, "nothing to do"),
            OrchestrationEvent::PhaseChanged(phase) => {
                tracing::debug!(mode, %phase, "phase changed");
            }
            OrchestrationEvent::Failed { error } => tracing::error!(mode, %error, "orchestration failed"),
        }
    }
}
