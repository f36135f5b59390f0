//! BDD step definitions for service control, covering name resolution,
//! restart fallbacks, and the stop-failure confirmation flow.

use gab::services::{Dispatched, ServiceError};
use gab::test_support::{ScriptedConfirmer, ScriptedExecutor};
use gab::{Decision, ManagementStyle, ServiceController, UnknownServicePolicy};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{Outcome, ServiceContext, names};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("invalid step argument: {0}")]
    Argument(String),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

type Action = fn(
    &mut ServiceController<'_, ScriptedExecutor, ScriptedConfirmer>,
    &[String],
) -> Result<Vec<Dispatched>, ServiceError>;

fn run_action(mut service_context: ServiceContext, list: &str, action: Action) -> ServiceContext {
    let mut controller = ServiceController::new(
        &service_context.registry,
        service_context.executor.clone(),
        service_context.confirmer.clone(),
    );
    let outcome = match action(&mut controller, &names(list)) {
        Ok(dispatched) => Outcome::Completed(dispatched.len()),
        Err(err) => Outcome::Failed(err.to_string()),
    };
    drop(controller);
    service_context.outcome = Some(outcome);
    service_context
}

#[given("the built-in service registry")]
fn builtin_registry(service_context: ServiceContext) -> ServiceContext {
    service_context
}

#[given("unknown services are rejected")]
fn reject_unknown(mut service_context: ServiceContext) -> ServiceContext {
    service_context.registry = service_context
        .registry
        .with_policy(UnknownServicePolicy::Reject);
    service_context
}

#[given("\"{name}\" is registered with the \"{style}\" style")]
fn register_service(
    mut service_context: ServiceContext,
    name: String,
    style: String,
) -> Result<ServiceContext, StepError> {
    let parsed: ManagementStyle = style
        .parse()
        .map_err(|err| StepError::Argument(format!("{err}")))?;
    service_context
        .registry
        .register(name, parsed)
        .map_err(|err| StepError::Argument(err.to_string()))?;
    Ok(service_context)
}

#[given("the next remote command fails with exit code \"{code}\"")]
fn next_command_fails(service_context: ServiceContext, code: i32) -> ServiceContext {
    service_context.executor.push_failure(code);
    service_context
}

#[given("the operator declines to continue")]
fn operator_declines(service_context: ServiceContext) -> ServiceContext {
    service_context.confirmer.push(Decision::Abort);
    service_context
}

#[given("the operator agrees to continue")]
fn operator_agrees(service_context: ServiceContext) -> ServiceContext {
    service_context.confirmer.push(Decision::Continue);
    service_context
}

#[when("I start \"{services}\"")]
fn start_services(service_context: ServiceContext, services: String) -> ServiceContext {
    run_action(service_context, &services, |controller, names| {
        controller.start(names)
    })
}

#[when("I stop \"{services}\"")]
fn stop_services(service_context: ServiceContext, services: String) -> ServiceContext {
    run_action(service_context, &services, |controller, names| {
        controller.stop(names)
    })
}

#[when("I restart \"{services}\"")]
fn restart_services(service_context: ServiceContext, services: String) -> ServiceContext {
    run_action(service_context, &services, |controller, names| {
        controller.restart(names)
    })
}

#[when("I query the status of \"{services}\"")]
fn query_status(service_context: ServiceContext, services: String) -> ServiceContext {
    run_action(service_context, &services, |controller, names| {
        controller.status(names)
    })
}

#[when("I run the shell line \"{line}\" in \"{dir}\"")]
fn run_shell_line(mut service_context: ServiceContext, line: String, dir: String) -> ServiceContext {
    let outcome = match gab::shell(&service_context.executor, &line, Some(&dir)) {
        Ok(_) => Outcome::Completed(1),
        Err(err) => Outcome::Failed(err.to_string()),
    };
    service_context.outcome = Some(outcome);
    service_context
}

#[then("the batch succeeds")]
fn batch_succeeds(service_context: &ServiceContext) -> Result<(), StepError> {
    match service_context.outcome {
        Some(Outcome::Completed(_)) => Ok(()),
        Some(Outcome::Failed(ref message)) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

fn expect_failure(service_context: &ServiceContext, message: &str) -> Result<(), StepError> {
    match service_context.outcome {
        Some(Outcome::Failed(ref actual)) if actual.contains(message) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected failure mentioning {message:?}, got {other:?}"
        ))),
    }
}

#[then("the batch fails with \"{message}\"")]
fn batch_fails_with(service_context: &ServiceContext, message: String) -> Result<(), StepError> {
    expect_failure(service_context, &message)
}

#[then("the batch is aborted at \"{service}\"")]
fn batch_aborted_at(service_context: &ServiceContext, service: String) -> Result<(), StepError> {
    expect_failure(
        service_context,
        &format!("aborted after {service} failed to stop"),
    )?;
    let prompts = service_context.confirmer.prompts();
    if prompts == [service.clone()] {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected a single prompt for {service}, got {prompts:?}"
        )))
    }
}

#[then("exactly \"{count}\" commands are sent")]
fn commands_sent(service_context: &ServiceContext, count: usize) -> Result<(), StepError> {
    let commands = service_context.executor.commands();
    if commands.len() == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} commands, got {commands:?}"
        )))
    }
}

#[then("command \"{index}\" is \"{command}\"")]
fn command_at(
    service_context: &ServiceContext,
    index: usize,
    command: String,
) -> Result<(), StepError> {
    let commands = service_context.executor.commands();
    let actual = index
        .checked_sub(1)
        .and_then(|position| commands.get(position))
        .ok_or_else(|| {
            StepError::Assertion(format!("no command {index} in {commands:?}"))
        })?;
    if *actual == command {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected command {index} to be {command:?}, got {actual:?}"
        )))
    }
}

#[then("every command is elevated")]
fn every_command_elevated(service_context: &ServiceContext) -> Result<(), StepError> {
    let invocations = service_context.executor.invocations();
    if invocations.iter().all(|command| command.elevated) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected only elevated commands, got {invocations:?}"
        )))
    }
}
