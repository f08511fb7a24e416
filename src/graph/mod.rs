// ABOUTME: Dependency graph and topological scheduling for service startup.
// ABOUTME: Exports DependencyGraph, Schedule, and graph validation errors.

mod dependency;
mod schedule;

pub use dependency::{DependencyGraph, GraphError};
pub use schedule::Schedule;
