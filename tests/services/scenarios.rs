//! BDD scenarios for service control.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ServiceContext, service_context};

#[scenario(
    path = "tests/features/services.feature",
    name = "Start a supervised service through its alias"
)]
fn scenario_start_alias(service_context: ServiceContext) {
    drop(service_context);
}

#[scenario(
    path = "tests/features/services.feature",
    name = "Start an unregistered service with the legacy init style"
)]
fn scenario_start_fallback(service_context: ServiceContext) {
    drop(service_context);
}

#[scenario(
    path = "tests/features/services.feature",
    name = "Restart a service without native restart support"
)]
fn scenario_restart_stop_then_start(service_context: ServiceContext) {
    drop(service_context);
}

#[scenario(
    path = "tests/features/services.feature",
    name = "Restart mysql with its compound stop command"
)]
fn scenario_restart_mysql(service_context: ServiceContext) {
    drop(service_context);
}

#[scenario(
    path = "tests/features/services.feature",
    name = "Abort the batch when a failed stop is declined"
)]
fn scenario_stop_declined(service_context: ServiceContext) {
    drop(service_context);
}

#[scenario(
    path = "tests/features/services.feature",
    name = "Continue the batch when a failed stop is confirmed"
)]
fn scenario_stop_confirmed(service_context: ServiceContext) {
    drop(service_context);
}

#[scenario(
    path = "tests/features/services.feature",
    name = "Query a newly registered supervised service"
)]
fn scenario_status_registered(service_context: ServiceContext) {
    drop(service_context);
}

#[scenario(
    path = "tests/features/services.feature",
    name = "Reject unknown names under the strict policy"
)]
fn scenario_reject_unknown(service_context: ServiceContext) {
    drop(service_context);
}

#[scenario(
    path = "tests/features/services.feature",
    name = "Run an elevated shell command in a directory"
)]
fn scenario_shell_in_directory(service_context: ServiceContext) {
    drop(service_context);
}
