//! # maestro-compose
//!
//! Loader and resolver for Maestro deployment documents.
//!
//! Handles:
//! - **Document**: The raw YAML model of disks, instances, artifacts, images,
//!   containers, jobs, services, and the deploy order.
//! - **Import**: Recursive loading of `imports` and merging into the importer.
//! - **Resolver**: Cross-referencing entities into a resolved [`Graph`](resolver::Graph).
//! - **Label**: Instance-to-job label matching.
//! - **Ports**: Exposed-port specifications of service jobs.
//! - **Context**: Variable templating, environment expansion, and field binding.
//! - **Task / Cascade**: Turning the resolved graph into an ordered task plan.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cascade;
pub mod context;
pub mod document;
pub mod import;
pub mod label;
pub mod ports;
pub mod resolver;
pub mod task;
