//! Binary entry point for the `gab` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use shell_escape::unix::escape;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use gab::remote::RemoteConfigLoadError;
use gab::services::{AssumeYes, Dispatched, ServicesConfigError};
use gab::{
    Action, Confirmer, PromptConfirmer, RemoteCommandOutput, RemoteConfig, RemoteError,
    ServiceController, ServiceError, ServiceRegistry, ServicesConfig, ShellError, SshExecutor,
};

mod cli;

use cli::{BatchArgs, Cli, Command, ServiceArgs, ShellArgs, TargetArgs};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "GAB_LOG";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Shell(#[from] ShellError),
    #[error("remote command terminated without an exit status")]
    MissingExitCode,
    #[error("invalid command argument: {0}")]
    InvalidCommand(String),
}

impl From<RemoteConfigLoadError> for CliError {
    fn from(value: RemoteConfigLoadError) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<ServicesConfigError> for CliError {
    fn from(value: ServicesConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let Cli { target, command } = cli;
    match command {
        Command::Resolve(args) => resolve(&args),
        Command::Start(args) => {
            let registry = load_registry()?;
            let mut controller =
                ServiceController::new(&registry, connect(&target)?, AssumeYes)
                    .on_dispatch(|dispatched| write_output(&dispatched.output));
            controller.start(&args.services)?;
            Ok(0)
        }
        Command::Status(args) => {
            let registry = load_registry()?;
            let mut controller =
                ServiceController::new(&registry, connect(&target)?, AssumeYes)
                    .on_dispatch(|dispatched| write_output(&dispatched.output));
            controller.status(&args.services)?;
            Ok(0)
        }
        Command::Stop(args) => run_batch(&target, &args, |controller, names| {
            controller.stop(names)
        }),
        Command::Restart(args) => run_batch(&target, &args, |controller, names| {
            controller.restart(names)
        }),
        Command::Shell(args) => run_shell(&target, &args),
    }
}

type Controller<'r> =
    ServiceController<'r, SshExecutor<gab::ProcessCommandRunner>, Box<dyn Confirmer>>;

fn run_batch<F>(target: &TargetArgs, args: &BatchArgs, action: F) -> Result<i32, CliError>
where
    F: FnOnce(&mut Controller<'_>, &[String]) -> Result<Vec<Dispatched>, ServiceError>,
{
    let registry = load_registry()?;
    let prompting = !args.yes;
    let confirmer: Box<dyn Confirmer> = if prompting {
        Box::new(PromptConfirmer::terminal())
    } else {
        Box::new(AssumeYes)
    };
    let mut controller = ServiceController::new(&registry, connect(target)?, confirmer)
        .on_dispatch(move |dispatched| {
            // The prompt reports a failed stop's output itself.
            let prompted = prompting
                && dispatched.action == Action::Stop
                && !dispatched.output.succeeded();
            if !prompted {
                write_output(&dispatched.output);
            }
        });
    action(&mut controller, &args.services)?;
    Ok(0)
}

fn run_shell(target: &TargetArgs, args: &ShellArgs) -> Result<i32, CliError> {
    validate_command_args(&args.command)?;
    let executor = connect(target)?;
    let line = render_remote_command(&args.command);
    let output = gab::shell(&executor, &line, args.cwd.as_deref())?;
    write_output(&output);
    output.exit_code.ok_or(CliError::MissingExitCode)
}

fn resolve(args: &ServiceArgs) -> Result<i32, CliError> {
    let registry = load_registry()?;
    let mut stdout = io::stdout();
    for name in &args.services {
        let service = registry
            .lookup(name)
            .map_err(|err| CliError::Service(err.into()))?;
        writeln!(
            stdout,
            "{} -> {} ({})",
            service.requested, service.name, service.style
        )
        .ok();
    }
    Ok(0)
}

fn load_registry() -> Result<ServiceRegistry, CliError> {
    Ok(ServicesConfig::load_without_cli_args()?.build_registry()?)
}

fn connect(target: &TargetArgs) -> Result<SshExecutor<gab::ProcessCommandRunner>, CliError> {
    let config = RemoteConfig::load_without_cli_args()?.with_overrides(
        target.host.clone(),
        target.user.clone(),
        target.port,
    );
    Ok(SshExecutor::with_process_runner(config)?)
}

fn write_output(output: &RemoteCommandOutput) {
    write!(io::stdout(), "{}", output.stdout).ok();
    write!(io::stderr(), "{}", output.stderr).ok();
}

fn render_remote_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| escape(arg.as_str().into()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn validate_command_args(args: &[String]) -> Result<(), CliError> {
    for arg in args {
        if arg.chars().any(|ch| ch.is_ascii_control()) {
            return Err(CliError::InvalidCommand(String::from(concat!(
                "command arguments must not contain control characters (ASCII ",
                "0x00-0x1F or 0x7F, e.g. newline, carriage return, tab, NUL)"
            ))));
        }
    }
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
