//! Orchestration of resolved deployment plans for Maestro.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod event;
pub mod orchestrator;
pub mod provisioner;
