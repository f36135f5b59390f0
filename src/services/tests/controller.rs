//! Tests for the start, stop, restart, and status actions.

use std::cell::RefCell;

use rstest::rstest;

use super::super::*;
use super::fixtures::{confirmer, executor, registry};
use crate::remote::RemoteError;
use crate::test_support::{ScriptedConfirmer, ScriptedExecutor};

fn controller<'r>(
    registry: &'r ServiceRegistry,
    executor: &ScriptedExecutor,
    confirmer: &ScriptedConfirmer,
) -> ServiceController<'r, ScriptedExecutor, ScriptedConfirmer> {
    ServiceController::new(registry, executor.clone(), confirmer.clone())
}

#[rstest]
#[case("apache", "service apache2 start")]
#[case("apache2", "service apache2 start")]
#[case("jetty", "service jetty start")]
#[case("memcached", "service memcached start")]
#[case("mysql", "service mysql start")]
#[case("nginx", "service nginx start")]
#[case("rabbitmq", "service rabbitmq-server start")]
#[case("celeryd", "start celeryd")]
fn start_issues_exactly_one_style_command(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
    #[case] name: &str,
    #[case] expected: &str,
) {
    let mut services = controller(&registry, &executor, &confirmer);

    services.start(&[name]).expect("start should succeed");

    assert_eq!(executor.commands(), [expected]);
}

#[rstest]
fn every_service_command_is_elevated(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    let mut services = controller(&registry, &executor, &confirmer);

    services
        .restart(&["nginx", "jetty", "celeryd"])
        .expect("restart should succeed");
    services.status(&["mysql"]).expect("status should succeed");

    let invocations = executor.invocations();
    assert!(!invocations.is_empty());
    assert!(invocations.iter().all(|command| command.elevated));
    assert!(invocations.iter().all(|command| command.working_dir.is_none()));
}

#[rstest]
fn batches_run_in_caller_order(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    let mut services = controller(&registry, &executor, &confirmer);

    let dispatched = services
        .stop(&["nginx", "apache", "celeryd"])
        .expect("stop should succeed");

    assert_eq!(
        executor.commands(),
        [
            "service nginx stop",
            "service apache2 stop",
            "stop celeryd"
        ]
    );
    let names: Vec<&str> = dispatched.iter().map(|d| d.service.as_str()).collect();
    assert_eq!(names, ["nginx", "apache2", "celeryd"]);
    assert!(confirmer.prompts().is_empty());
}

#[rstest]
fn restart_without_native_support_stops_then_starts(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    let mut services = controller(&registry, &executor, &confirmer);

    let dispatched = services.restart(&["jetty"]).expect("restart should succeed");

    assert_eq!(
        executor.commands(),
        ["service jetty stop", "service jetty start"]
    );
    let actions: Vec<Action> = dispatched.iter().map(|d| d.action).collect();
    assert_eq!(actions, [Action::Stop, Action::Start]);
}

#[rstest]
fn restart_mysql_uses_compound_stop_command(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    let mut services = controller(&registry, &executor, &confirmer);

    services.restart(&["mysql"]).expect("restart should succeed");

    assert_eq!(
        executor.commands(),
        [MYSQL_STOP_COMMAND, "service mysql start"]
    );
}

#[rstest]
fn restart_uses_native_command_when_supported(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    let mut services = controller(&registry, &executor, &confirmer);

    services
        .restart(&["apache", "rabbitmq"])
        .expect("restart should succeed");

    assert_eq!(
        executor.commands(),
        ["service apache2 restart", "service rabbitmq-server restart"]
    );
}

#[rstest]
fn restart_prefers_literal_restart_command(
    mut registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    registry
        .register(
            "apache2",
            ServiceDescriptor::with_style(ManagementStyle::Supervised)
                .restart(RestartSupport::Command(String::from("apache2ctl graceful"))),
        )
        .expect("register");
    let mut services = controller(&registry, &executor, &confirmer);

    services.restart(&["apache"]).expect("restart should succeed");

    assert_eq!(executor.commands(), ["apache2ctl graceful"]);
}

#[rstest]
fn status_passes_output_through(
    mut registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    registry
        .register("newsvc", ManagementStyle::Supervised)
        .expect("register");
    executor.push_output(Some(3), "newsvc is not running", "");
    let mut services = controller(&registry, &executor, &confirmer);

    let dispatched = services
        .status(&["newsvc"])
        .expect("status never interprets exit codes");

    assert_eq!(executor.commands(), ["service newsvc status"]);
    let [entry] = dispatched.as_slice() else {
        panic!("expected one status entry, got {dispatched:?}");
    };
    assert_eq!(entry.output.exit_code, Some(3));
    assert_eq!(entry.output.stdout, "newsvc is not running");
}

#[rstest]
fn start_failure_ends_the_batch(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    executor.push_failure(1);
    let mut services = controller(&registry, &executor, &confirmer);

    let err = services
        .start(&["nginx", "memcached"])
        .expect_err("failed start should surface");

    let ServiceError::CommandFailed {
        service,
        action,
        command,
        status_text,
        stdout,
        stderr,
    } = err
    else {
        panic!("expected CommandFailed, got {err:?}");
    };
    assert_eq!(service, "nginx");
    assert_eq!(action, Action::Start);
    assert_eq!(command, "service nginx start");
    assert_eq!(status_text, "1");
    assert_eq!(stdout, "");
    assert_eq!(stderr, "simulated failure");
    assert_eq!(executor.commands(), ["service nginx start"]);
}

#[rstest]
fn dispatch_errors_carry_the_service_name(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    executor.push_spawn_failure("ssh");
    let mut services = controller(&registry, &executor, &confirmer);

    let err = services.status(&["rabbitmq"]).expect_err("spawn failure");

    assert!(
        matches!(
            err,
            ServiceError::Dispatch {
                ref service,
                action: Action::Status,
                source: RemoteError::Spawn { .. },
            } if service == "rabbitmq-server"
        ),
        "unexpected error: {err:?}"
    );
}

#[rstest]
fn stop_failure_declined_aborts_remaining_names(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    executor.push_failure(1);
    confirmer.push(Decision::Abort);
    let mut services = controller(&registry, &executor, &confirmer);

    let err = services
        .stop(&["mysql", "nginx"])
        .expect_err("declining should abort");

    assert!(
        matches!(err, ServiceError::Aborted { ref service } if service == "mysql"),
        "unexpected error: {err:?}"
    );
    assert_eq!(confirmer.prompts(), ["mysql"]);
    assert_eq!(executor.commands(), [MYSQL_STOP_COMMAND]);
}

#[rstest]
fn stop_failure_confirmed_continues_with_the_batch(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    executor.push_failure(1);
    confirmer.push(Decision::Continue);
    let mut services = controller(&registry, &executor, &confirmer);

    let dispatched = services
        .stop(&["mysql", "nginx"])
        .expect("confirmed failure should continue");

    assert_eq!(
        executor.commands(),
        [MYSQL_STOP_COMMAND, "service nginx stop"]
    );
    assert_eq!(dispatched.len(), 2);
    assert_eq!(
        dispatched.first().map(|d| d.output.succeeded()),
        Some(false)
    );
}

#[rstest]
fn restart_fallback_stop_failure_declined_skips_start(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    executor.push_failure(1);
    let mut services = controller(&registry, &executor, &confirmer);

    let err = services
        .restart(&["jetty", "nginx"])
        .expect_err("unconfirmed stop failure should abort");

    assert!(matches!(err, ServiceError::Aborted { .. }));
    assert_eq!(executor.commands(), ["service jetty stop"]);
}

#[rstest]
fn rejected_names_are_not_dispatched(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    let strict = registry.with_policy(UnknownServicePolicy::Reject);
    let mut services = controller(&strict, &executor, &confirmer);

    let err = services
        .start(&["nginx", "ngnix"])
        .expect_err("unknown name should be rejected");

    assert!(matches!(
        err,
        ServiceError::Registry(RegistryError::UnknownService { .. })
    ));
    assert_eq!(executor.commands(), ["service nginx start"]);
}

#[rstest]
fn observer_sees_output_of_commands_before_a_failure(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    executor.push_output(Some(0), "nginx started", "");
    executor.push_output(Some(1), "celeryd: job failed", "no such job");
    let seen = RefCell::new(Vec::new());
    let mut services = ServiceController::new(&registry, executor.clone(), confirmer.clone())
        .on_dispatch(|dispatched| {
            seen.borrow_mut().push((
                dispatched.command.clone(),
                dispatched.output.stdout.clone(),
            ));
        });

    let err = services
        .start(&["nginx", "celeryd"])
        .expect_err("second start should fail");
    drop(services);

    assert!(
        matches!(
            err,
            ServiceError::CommandFailed { ref stdout, .. } if stdout == "celeryd: job failed"
        ),
        "unexpected error: {err:?}"
    );
    assert_eq!(
        seen.into_inner(),
        [
            (
                String::from("service nginx start"),
                String::from("nginx started")
            ),
            (
                String::from("start celeryd"),
                String::from("celeryd: job failed")
            ),
        ]
    );
}

#[rstest]
fn observer_sees_confirmed_stop_failures(
    registry: ServiceRegistry,
    executor: ScriptedExecutor,
    confirmer: ScriptedConfirmer,
) {
    executor.push_output(Some(1), "", "mysqld_safe still running");
    confirmer.push(Decision::Continue);
    let mut failures = 0_usize;
    let mut services = ServiceController::new(&registry, executor.clone(), confirmer.clone())
        .on_dispatch(|dispatched| {
            if !dispatched.output.succeeded() {
                failures += 1;
            }
        });

    services
        .stop(&["mysql", "nginx"])
        .expect("confirmed failure should continue");
    drop(services);

    assert_eq!(failures, 1);
}
