// Executor module - shell and direct process execution
//
// Three operations, all synchronous and boolean at the outer contract:
// a shell command line, a direct exec of an absolute path, and a direct exec
// with stdout redirected to a file. Structured results are available through
// the `try_*` and `*_outcome` methods on `Executor`.

pub mod config;
pub mod error;
pub mod path;
pub mod runner;
pub mod spawner;
pub mod types;

pub use config::ExecutorConfig;
pub use error::{ConfigError, ExecError, Result};
pub use path::is_absolute;
pub use runner::Executor;
pub use spawner::{ForkSpawner, ProcessSpawner};
pub use types::{ArgVector, ExecReport, ExitOutcome, RedirectTarget};
