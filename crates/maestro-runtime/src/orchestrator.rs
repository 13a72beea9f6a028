//! Two-phase execution of a deployment document.
//!
//! An [`Orchestrator`] walks one document through
//! `Idle → Resolved → Validated → Applied`. Every task is validated before
//! any task runs, and both phases stop at the first failing task. Tasks that
//! already ran are left in place.

use maestro_common::error::{MaestroError, Result};
use maestro_common::types::{RunPhase, TaskPhase};
use maestro_compose::cascade::{self, Plan, Tier};
use maestro_compose::context::{Context, ModeFlag};
use maestro_compose::document::Document;
use maestro_compose::resolver::{self, Graph};
use maestro_compose::task::Task;
use serde::Serialize;

use crate::event::{EventListener, OrchestrationEvent, TracingListener};
use crate::provisioner::Provisioner;

/// Summary of a successful [`Orchestrator::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Tier the plan was built from.
    pub tier: Tier,
    /// Number of tasks run.
    pub tasks: usize,
    /// `TEST` or `LIVE`.
    pub mode: &'static str,
}

/// Drives one document through resolution, validation, and execution.
pub struct Orchestrator<P, L = TracingListener> {
    document: Document,
    provisioner: P,
    listener: L,
    live: Option<bool>,
    phase: RunPhase,
    graph: Graph,
    plan: Option<Plan>,
}

impl<P: Provisioner> Orchestrator<P> {
    /// Creates an orchestrator that reports through `tracing`.
    #[must_use]
    pub fn new(document: Document, provisioner: P) -> Self {
        Self::with_listener(document, provisioner, TracingListener)
    }
}

impl<P: Provisioner, L: EventListener> Orchestrator<P, L> {
    /// Creates an orchestrator reporting to `listener`.
    #[must_use]
    pub fn with_listener(document: Document, provisioner: P, listener: L) -> Self {
        Self {
            document,
            provisioner,
            listener,
            live: None,
            phase: RunPhase::Idle,
            graph: Graph::default(),
            plan: None,
        }
    }

    /// Forces live or test mode regardless of the document's `LIVE_MODE`.
    #[must_use]
    pub fn with_live(mut self, live: Option<bool>) -> Self {
        self.live = live;
        self
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Returns the document being orchestrated.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Returns the resolved graph (empty before [`resolve`](Self::resolve)).
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Returns the plan once resolved.
    #[must_use]
    pub const fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Returns the provisioner.
    #[must_use]
    pub const fn provisioner(&self) -> &P {
        &self.provisioner
    }

    /// Returns the listener.
    #[must_use]
    pub const fn listener(&self) -> &L {
        &self.listener
    }

    /// Consumes the orchestrator, returning its provisioner and listener.
    pub fn into_parts(self) -> (P, L) {
        (self.provisioner, self.listener)
    }

    /// Builds a fresh context from the document's variables.
    #[must_use]
    pub fn context(&self) -> Context {
        let context = Context::from_vars(&self.document.vars);
        match self.live {
            Some(live) => context.with_mode(ModeFlag::Numeric(i64::from(live))),
            None => context,
        }
    }

    /// Resolves cross-references and builds the task plan.
    ///
    /// # Errors
    ///
    /// Returns [`MaestroError::Lifecycle`] unless idle, or the first
    /// resolution error of the document.
    pub fn resolve(&mut self) -> Result<&Plan> {
        self.require("resolve", RunPhase::Idle)?;
        let mode = self.context().mode_label();

        for warning in self.document.warnings() {
            self.listener
                .on_event(mode, &OrchestrationEvent::MergeOverride(warning.clone()));
        }

        let graph = match resolver::resolve(&self.document) {
            Ok(graph) => graph,
            Err(err) => return Err(self.fail(mode, err)),
        };
        let plan = cascade::build(&graph);
        self.listener.on_event(
            mode,
            &OrchestrationEvent::Resolved {
                tier: plan.tier,
                tasks: plan.len(),
            },
        );

        self.graph = graph;
        self.enter(mode, RunPhase::Resolved);
        let plan: &Plan = self.plan.insert(plan);
        Ok(plan)
    }

    /// Binds `context` into the graph and the plan, then validates every task.
    ///
    /// # Errors
    ///
    /// Returns [`MaestroError::Lifecycle`] unless resolved, or
    /// [`MaestroError::Task`] for the first task failing validation.
    pub fn validate(&mut self, context: &Context) -> Result<()> {
        self.require("validate", RunPhase::Resolved)?;
        let mode = context.mode_label();
        let Some(plan) = self.plan.as_mut() else {
            return Err(self.lifecycle("validate"));
        };

        let mut fields = self.graph.bind_vars(context);
        for task in &mut plan.tasks {
            fields += context.bind_vars(&mut task.target);
        }
        self.listener
            .on_event(mode, &OrchestrationEvent::Bound { fields });

        let outcome = execute(
            TaskPhase::Validate,
            &plan.tasks,
            context,
            &mut self.provisioner,
            &mut self.listener,
        );
        if let Err(err) = outcome {
            return Err(self.fail(mode, err));
        }
        self.enter(mode, RunPhase::Validated);
        Ok(())
    }

    /// Runs every task in plan order.
    ///
    /// # Errors
    ///
    /// Returns [`MaestroError::Lifecycle`] unless validated, or
    /// [`MaestroError::Task`] for the first task that fails.
    pub fn run(&mut self, context: &Context) -> Result<()> {
        self.require("run", RunPhase::Validated)?;
        let mode = context.mode_label();
        let Some(plan) = self.plan.as_ref() else {
            return Err(self.lifecycle("run"));
        };

        if plan.is_empty() {
            self.listener.on_event(mode, &OrchestrationEvent::NothingToDo);
        }
        let outcome = execute(
            TaskPhase::Run,
            &plan.tasks,
            context,
            &mut self.provisioner,
            &mut self.listener,
        );
        if let Err(err) = outcome {
            return Err(self.fail(mode, err));
        }
        self.enter(mode, RunPhase::Applied);
        Ok(())
    }

    /// Resolves, validates, and runs the document.
    ///
    /// # Errors
    ///
    /// Returns the first error of any step; see [`resolve`](Self::resolve),
    /// [`validate`](Self::validate), and [`run`](Self::run).
    pub fn apply(&mut self) -> Result<ApplyReport> {
        let _ = self.resolve()?;
        let context = self.context();
        tracing::info!(mode = context.mode_label(), vars = context.len(), "applying document");

        self.validate(&context)?;
        self.run(&context)?;

        let (tier, tasks) = self
            .plan
            .as_ref()
            .map_or((Tier::Empty, 0), |plan| (plan.tier, plan.len()));
        Ok(ApplyReport {
            tier,
            tasks,
            mode: context.mode_label(),
        })
    }

    fn require(&self, operation: &'static str, expected: RunPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(self.lifecycle(operation))
        }
    }

    const fn lifecycle(&self, operation: &'static str) -> MaestroError {
        MaestroError::Lifecycle {
            operation,
            phase: self.phase,
        }
    }

    fn enter(&mut self, mode: &'static str, phase: RunPhase) {
        self.phase = phase;
        self.listener
            .on_event(mode, &OrchestrationEvent::PhaseChanged(phase));
    }

    fn fail(&mut self, mode: &'static str, err: MaestroError) -> MaestroError {
        self.enter(mode, RunPhase::Failed);
        self.listener.on_event(
            mode,
            &OrchestrationEvent::Failed {
                error: err.to_string(),
            },
        );
        err
    }
}

/// Runs one phase over `tasks`, stopping at the first failure.
fn execute<P: Provisioner, L: EventListener>(
    phase: TaskPhase,
    tasks: &[Task],
    context: &Context,
    provisioner: &mut P,
    listener: &mut L,
) -> Result<()> {
    let mode = context.mode_label();
    for (index, task) in tasks.iter().enumerate() {
        let outcome = match phase {
            TaskPhase::Validate => provisioner.validate(task, context),
            TaskPhase::Run => provisioner.run(task, context),
        };
        outcome.map_err(|source| MaestroError::Task {
            phase,
            index,
            description: task.description.clone(),
            source,
        })?;

        let description = task.description.clone();
        let event = match phase {
            TaskPhase::Validate => OrchestrationEvent::TaskValidated { index, description },
            TaskPhase::Run => OrchestrationEvent::TaskRan { index, description },
        };
        listener.on_event(mode, &event);
    }
    Ok(())
}
