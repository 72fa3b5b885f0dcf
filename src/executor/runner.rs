// Main Executor implementation

use crate::executor::config::ExecutorConfig;
use crate::executor::error::{ExecError, Result};
use crate::executor::spawner::{ForkSpawner, ProcessSpawner};
use crate::executor::types::{ArgVector, ExitOutcome, RedirectTarget};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs shell command lines and absolute-path executables.
///
/// Every call is synchronous: at most one child is created and it has been
/// reaped before the call returns.
#[derive(Clone)]
pub struct Executor {
    config: ExecutorConfig,
    spawner: Arc<dyn ProcessSpawner>,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_spawner(config, Arc::new(ForkSpawner))
    }

    /// Use a custom process spawner
    pub fn with_spawner(config: ExecutorConfig, spawner: Arc<dyn ProcessSpawner>) -> Self {
        debug!(
            shell = %config.shell.display(),
            redirect_mode = %format!("{:o}", config.redirect_mode),
            "initializing executor"
        );
        Self { config, spawner }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run a command line through the configured shell
    pub fn shell_outcome<'a>(&self, command: impl Into<Option<&'a str>>) -> Result<ExitOutcome> {
        let command = command
            .into()
            .ok_or_else(|| ExecError::invalid("command is absent"))?;
        self.spawner.system(&self.config.shell, command)
    }

    /// Execute `argv[0]` directly with `argv` as its arguments
    pub fn exec_outcome<S: AsRef<str>>(&self, argv: &[S]) -> Result<ExitOutcome> {
        let argv = ArgVector::new(argv)?;
        self.spawner.spawn_and_replace(&argv, None)
    }

    /// Like [`Executor::exec_outcome`], with the child's stdout written to `output_path`
    pub fn exec_redirect_outcome<S: AsRef<str>>(
        &self,
        output_path: impl AsRef<Path>,
        argv: &[S],
    ) -> Result<ExitOutcome> {
        let argv = ArgVector::new(argv)?;
        let target = RedirectTarget::new(output_path, self.config.redirect_mode)?;
        self.spawner.spawn_and_replace(&argv, Some(&target))
    }

    pub fn try_shell<'a>(&self, command: impl Into<Option<&'a str>>) -> Result<()> {
        self.shell_outcome(command)?.into_result()
    }

    pub fn try_exec<S: AsRef<str>>(&self, argv: &[S]) -> Result<()> {
        self.exec_outcome(argv)?.into_result()
    }

    pub fn try_exec_redirect<S: AsRef<str>>(
        &self,
        output_path: impl AsRef<Path>,
        argv: &[S],
    ) -> Result<()> {
        self.exec_redirect_outcome(output_path, argv)?.into_result()
    }

    /// Returns true only if the shell ran and the command exited with 0
    pub fn run_shell<'a>(&self, command: impl Into<Option<&'a str>>) -> bool {
        let command = command.into();
        let result = self.try_shell(command);
        report("shell", command.unwrap_or("<absent>"), result)
    }

    /// Returns true only if the program ran and exited with 0
    pub fn exec_direct<S: AsRef<str>>(&self, argv: &[S]) -> bool {
        let result = self.try_exec(argv);
        report("exec", &describe(argv), result)
    }

    /// Returns true only if stdout was redirected, the program ran, and it exited with 0
    pub fn exec_redirect<S: AsRef<str>>(&self, output_path: impl AsRef<Path>, argv: &[S]) -> bool {
        let output_path = output_path.as_ref();
        let result = self.try_exec_redirect(output_path, argv);
        let command = format!("{} > {}", describe(argv), output_path.display());
        report("exec_redirect", &command, result)
    }

    /// [`Executor::try_shell`] on the blocking thread pool
    pub async fn shell_async(&self, command: String) -> Result<()> {
        let executor = self.clone();
        blocking(move || executor.try_shell(command.as_str())).await
    }

    /// [`Executor::try_exec`] on the blocking thread pool
    pub async fn exec_async(&self, argv: Vec<String>) -> Result<()> {
        let executor = self.clone();
        blocking(move || executor.try_exec(argv.as_slice())).await
    }

    /// [`Executor::try_exec_redirect`] on the blocking thread pool
    pub async fn exec_redirect_async(&self, output_path: PathBuf, argv: Vec<String>) -> Result<()> {
        let executor = self.clone();
        blocking(move || executor.try_exec_redirect(&output_path, argv.as_slice())).await
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

async fn blocking<F>(f: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExecError::TaskFailed(e.to_string()))?
}

fn describe<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ")
}

/// Collapse a result to a bool, logging the failure at the point it is seen
fn report(operation: &str, command: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => {
            info!(operation, command = %command, "command succeeded");
            true
        }
        Err(e @ ExecError::InvalidArgument(_)) => {
            warn!(operation, command = %command, error = %e, "command rejected");
            false
        }
        Err(e) => {
            error!(operation, command = %command, error = %e, "command failed");
            false
        }
    }
}
