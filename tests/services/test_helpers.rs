//! Shared fixtures for service control BDD scenarios.

use gab::ServiceRegistry;
use gab::test_support::{ScriptedConfirmer, ScriptedExecutor};
use rstest::fixture;

/// Outcome of the action run by a `when` step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The batch completed; holds the number of dispatched commands.
    Completed(usize),
    /// The batch stopped with the rendered error.
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct ServiceContext {
    pub registry: ServiceRegistry,
    pub executor: ScriptedExecutor,
    pub confirmer: ScriptedConfirmer,
    pub outcome: Option<Outcome>,
}

#[fixture]
pub fn service_context() -> ServiceContext {
    ServiceContext {
        registry: ServiceRegistry::builtin(),
        executor: ScriptedExecutor::new(),
        confirmer: ScriptedConfirmer::new(),
        outcome: None,
    }
}

/// Splits a space-separated list of service names from a step.
pub fn names(list: &str) -> Vec<String> {
    list.split_whitespace().map(str::to_owned).collect()
}
