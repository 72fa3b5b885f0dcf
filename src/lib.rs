//! Process execution helpers.
//!
//! Run a shell command line, or execute a program by absolute path without a
//! shell, optionally sending its stdout to a file. Each helper blocks until the
//! child has terminated and reports success only for exit code 0.
//!
//! The boolean helpers emit their failure diagnostics as `tracing` events.
//! Install a subscriber writing to stderr (for example
//! `tracing_subscriber::fmt().with_writer(std::io::stderr).init()`) to see
//! them; without one the text is discarded. Use [`Executor::try_shell`],
//! [`Executor::try_exec`] or [`Executor::try_exec_redirect`] to get the
//! failure as an [`ExecError`] instead.
//!
//! ```no_run
//! assert!(sysexec::run_shell("true"));
//! assert!(sysexec::exec_direct(&["/bin/echo", "hello"]));
//! assert!(sysexec::exec_redirect("/tmp/out.txt", &["/bin/sh", "-c", "echo hi"]));
//! ```

pub mod executor;

pub use executor::{
    ArgVector, ConfigError, ExecError, ExecReport, Executor, ExecutorConfig, ExitOutcome,
    ForkSpawner, ProcessSpawner, RedirectTarget, Result, is_absolute,
};

use std::path::Path;

/// Run `command` through `/bin/sh -c`. `None` fails without spawning anything.
///
/// Diagnostics go through `tracing`; see the crate docs.
pub fn run_shell<'a>(command: impl Into<Option<&'a str>>) -> bool {
    Executor::default().run_shell(command)
}

/// Execute `argv[0]`, which must be an absolute path, with `argv` as its arguments
pub fn exec_direct<S: AsRef<str>>(argv: &[S]) -> bool {
    Executor::default().exec_direct(argv)
}

/// Like [`exec_direct`], writing the child's stdout to `output_path`
/// (created with mode 0644, truncated if it exists)
pub fn exec_redirect<S: AsRef<str>>(output_path: impl AsRef<Path>, argv: &[S]) -> bool {
    Executor::default().exec_redirect(output_path, argv)
}
