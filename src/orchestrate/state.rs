// ABOUTME: Launch state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce valid per-service start transitions at compile time.

/// Initial state: validated spec, nothing touched yet.
/// Available actions: `pull_image()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Image present locally (pulled or pre-existing).
/// Available actions: `start_container()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePulled;

/// Container created and started.
/// Available actions: `await_ready()`, `await_exit()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Started;

/// Long-running service reached Running (and its health check passed, if
/// declared). Dependents may start.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ready;

/// One-shot service exited with code 0. Dependents may start.
#[derive(Debug, Clone, Copy, Default)]
pub struct Finished;
