// Integration tests for Executor module
// This file should be run with cargo test --test test_executor

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use sysexec::{
    ArgVector, ExecError, Executor, ExecutorConfig, ExitOutcome, ProcessSpawner, RedirectTarget,
};

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    });
}

fn temp_output() -> PathBuf {
    std::env::temp_dir().join(format!("sysexec-test-{}.txt", rand::random::<u64>()))
}

/// Counts process creation requests and never creates a process
#[derive(Default)]
struct CountingSpawner {
    calls: AtomicUsize,
}

impl CountingSpawner {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProcessSpawner for CountingSpawner {
    fn system(&self, _shell: &Path, _command: &str) -> sysexec::Result<ExitOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExitOutcome::Exited { code: 0 })
    }

    fn spawn_and_replace(
        &self,
        _argv: &ArgVector,
        _redirect: Option<&RedirectTarget>,
    ) -> sysexec::Result<ExitOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExitOutcome::Exited { code: 0 })
    }
}

/// Fails every request at the OS level
struct FailingSpawner;

impl ProcessSpawner for FailingSpawner {
    fn system(&self, _shell: &Path, _command: &str) -> sysexec::Result<ExitOutcome> {
        Err(ExecError::invocation("shell spawn", "resource temporarily unavailable"))
    }

    fn spawn_and_replace(
        &self,
        _argv: &ArgVector,
        _redirect: Option<&RedirectTarget>,
    ) -> sysexec::Result<ExitOutcome> {
        Err(ExecError::invocation("fork", "resource temporarily unavailable"))
    }
}

fn spy_executor() -> (Executor, Arc<CountingSpawner>) {
    let spawner = Arc::new(CountingSpawner::default());
    let executor = Executor::with_spawner(ExecutorConfig::default(), spawner.clone());
    (executor, spawner)
}

#[cfg(test)]
mod validation {
    use super::*;

    /// Absent command never reaches the shell
    #[test]
    fn test_absent_command_spawns_nothing() {
        init_tracing();
        let (executor, spawner) = spy_executor();

        assert!(!executor.run_shell(None));
        assert!(executor.try_shell(None).unwrap_err().is_invalid_argument());
        assert_eq!(spawner.calls(), 0);
    }

    /// Empty and relative argument lists never fork
    #[test]
    fn test_invalid_argv_spawns_nothing() {
        init_tracing();
        let (executor, spawner) = spy_executor();
        let empty: Vec<String> = Vec::new();

        assert!(!executor.exec_direct(empty.as_slice()));
        for program in ["ls", "", "./a.out", "bin/echo"] {
            assert!(!executor.exec_direct(&[program, "arg"]));
            assert!(!executor.exec_redirect("/tmp/unused.txt", &[program]));
        }
        assert_eq!(spawner.calls(), 0);
    }

    #[test]
    fn test_bad_output_path_spawns_nothing() {
        init_tracing();
        let (executor, spawner) = spy_executor();

        assert!(!executor.exec_redirect("", &["/bin/echo", "hi"]));
        assert!(!executor.exec_redirect("/tmp/a\0b", &["/bin/echo", "hi"]));
        assert_eq!(spawner.calls(), 0);
    }

    /// Valid input reaches the spawner exactly once per call
    #[test]
    fn test_valid_input_spawns_once() {
        init_tracing();
        let (executor, spawner) = spy_executor();

        assert!(executor.run_shell("true"));
        assert!(executor.exec_direct(&["/bin/echo", "hello"]));
        assert!(executor.exec_redirect("/tmp/unused.txt", &["/bin/echo"]));
        assert_eq!(spawner.calls(), 3);
    }

    #[test]
    fn test_invocation_failure_is_false() {
        init_tracing();
        let executor = Executor::with_spawner(ExecutorConfig::default(), Arc::new(FailingSpawner));

        assert!(!executor.run_shell("true"));
        assert!(!executor.exec_direct(&["/bin/echo", "hello"]));
        assert!(!executor.exec_redirect("/tmp/unused.txt", &["/bin/echo"]));
        assert!(matches!(
            executor.try_exec(&["/bin/echo"]),
            Err(ExecError::InvocationFailed { .. })
        ));
    }
}

#[cfg(test)]
mod shell {
    use super::*;

    #[test]
    fn test_shell_exit_codes() {
        init_tracing();

        assert!(sysexec::run_shell("true"));
        assert!(!sysexec::run_shell("false"));
        assert!(!sysexec::run_shell("exit 7"));
    }

    #[test]
    fn test_shell_structured_errors() {
        init_tracing();
        let executor = Executor::default();

        assert!(matches!(
            executor.try_shell("exit 7"),
            Err(ExecError::NonZeroExit(7))
        ));
        assert!(matches!(
            executor.try_shell("kill -9 $$"),
            Err(ExecError::Signaled(9))
        ));
    }

    /// Quoting and pipes are the shell's business
    #[test]
    fn test_shell_interprets_metacharacters() {
        init_tracing();

        assert!(sysexec::run_shell("echo 'a b' | grep -q 'a b'"));
        assert!(!sysexec::run_shell("echo abc | grep -q xyz"));
    }

    #[test]
    fn test_configured_shell_missing() {
        init_tracing();
        let config = ExecutorConfig {
            shell: PathBuf::from("/nonexistent/shell-xyz"),
            ..Default::default()
        };
        let executor = Executor::new(config);

        assert!(!executor.run_shell("true"));
        assert!(matches!(
            executor.try_shell("true"),
            Err(ExecError::InvocationFailed { .. })
        ));
    }
}

#[cfg(test)]
mod direct {
    use super::*;

    #[test]
    fn test_exec_echo() {
        init_tracing();
        assert!(sysexec::exec_direct(&["/bin/echo", "hello"]));
    }

    #[test]
    fn test_exec_nonzero_exit() {
        init_tracing();
        let executor = Executor::default();

        assert!(!executor.exec_direct(&["/bin/sh", "-c", "exit 4"]));
        assert!(matches!(
            executor.try_exec(&["/bin/sh", "-c", "exit 4"]),
            Err(ExecError::NonZeroExit(4))
        ));
    }

    #[test]
    fn test_exec_missing_program() {
        init_tracing();
        assert!(!sysexec::exec_direct(&["/bin/nonexistent-xyz"]));
    }

    #[test]
    fn test_exec_killed_by_signal() {
        init_tracing();
        let executor = Executor::default();

        assert!(matches!(
            executor.try_exec(&["/bin/sh", "-c", "kill -KILL $$"]),
            Err(ExecError::Signaled(9))
        ));
    }

    /// Programs start with SIGPIPE at its default disposition, as under the shell
    #[test]
    fn test_exec_sigpipe_terminates_child() {
        init_tracing();
        let executor = Executor::default();

        assert!(matches!(
            executor.try_shell("kill -PIPE $$"),
            Err(ExecError::Signaled(13))
        ));
        assert!(matches!(
            executor.try_exec(&["/bin/sh", "-c", "kill -PIPE $$"]),
            Err(ExecError::Signaled(13))
        ));
        assert!(!executor.exec_direct(&["/bin/sh", "-c", "kill -PIPE $$"]));
    }

    /// Arguments are passed verbatim: no globbing or variable expansion
    #[test]
    fn test_exec_passes_arguments_verbatim() {
        init_tracing();
        let executor = Executor::default();

        assert!(executor.exec_direct(&["/bin/sh", "-c", "test \"$1\" = '$HOME *'", "sh", "$HOME *"]));
    }

    #[test]
    fn test_exec_idempotent() {
        init_tracing();
        let executor = Executor::default();

        let first = executor.exec_direct(&["/bin/sh", "-c", "exit 2"]);
        let second = executor.exec_direct(&["/bin/sh", "-c", "exit 2"]);
        assert_eq!(first, second);

        assert!(executor.exec_direct(&["/bin/echo", "again"]));
        assert!(executor.exec_direct(&["/bin/echo", "again"]));
    }
}

#[cfg(test)]
mod redirect {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_redirect_captures_stdout() {
        init_tracing();
        let output = temp_output();

        assert!(sysexec::exec_redirect(&output, &["/bin/echo", "hello"]));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "hello\n");

        let mode = std::fs::metadata(&output).unwrap().permissions().mode();
        assert_eq!(mode & 0o600, 0o600);
        assert_eq!(mode & 0o133, 0);

        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn test_redirect_truncates() {
        init_tracing();
        let output = temp_output();
        std::fs::write(&output, "stale content that is longer\n").unwrap();

        assert!(sysexec::exec_redirect(&output, &["/bin/sh", "-c", "echo hi"]));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "hi\n");

        assert!(sysexec::exec_redirect(&output, &["/bin/sh", "-c", "echo hi"]));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "hi\n");

        std::fs::remove_file(&output).ok();
    }

    /// Only stdout goes to the file
    #[test]
    fn test_redirect_leaves_stderr_alone() {
        init_tracing();
        let output = temp_output();

        assert!(sysexec::exec_redirect(
            &output,
            &["/bin/sh", "-c", "echo out; echo err >&2"]
        ));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "out\n");

        std::fs::remove_file(&output).ok();
    }

    /// Neither ignored signals nor a blocked mask leak into the child
    #[test]
    fn test_redirect_child_signal_state() {
        init_tracing();
        let executor = Executor::default();
        let output = temp_output();

        assert!(matches!(
            executor.try_exec_redirect(&output, &["/bin/sh", "-c", "kill -PIPE $$"]),
            Err(ExecError::Signaled(13))
        ));

        assert!(executor.exec_redirect(
            &output,
            &["/bin/sh", "-c", "grep -E '^Sig(Ign|Blk):' /proc/self/status"]
        ));
        let status = std::fs::read_to_string(&output).unwrap();
        for line in status.lines() {
            let (_, mask) = line.split_once(':').unwrap();
            let mask = u64::from_str_radix(mask.trim(), 16).unwrap();
            assert_eq!(mask & (1 << 12), 0, "SIGPIPE set in {}", line);
        }

        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn test_redirect_open_failure() {
        init_tracing();
        let executor = Executor::default();
        let output = Path::new("/nonexistent-dir-xyz/out.txt");

        assert!(!executor.exec_redirect(output, &["/bin/echo", "hello"]));
        assert!(matches!(
            executor.try_exec_redirect(output, &["/bin/echo", "hello"]),
            Err(ExecError::NonZeroExit(1))
        ));
    }

    #[test]
    fn test_redirect_nonzero_still_writes() {
        init_tracing();
        let executor = Executor::default();
        let output = temp_output();

        assert!(matches!(
            executor.try_exec_redirect(&output, &["/bin/sh", "-c", "echo partial; exit 3"]),
            Err(ExecError::NonZeroExit(3))
        ));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "partial\n");

        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn test_redirect_custom_mode() {
        init_tracing();
        let config = ExecutorConfig {
            redirect_mode: 0o600,
            ..Default::default()
        };
        let executor = Executor::new(config);
        let output = temp_output();

        assert!(executor.exec_redirect(&output, &["/bin/echo", "private"]));
        let mode = std::fs::metadata(&output).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        std::fs::remove_file(&output).ok();
    }
}

#[cfg(test)]
mod asynchronous {
    use super::*;

    #[tokio::test]
    async fn test_exec_async() {
        init_tracing();
        let executor = Executor::default();

        let result = executor
            .exec_async(vec!["/bin/echo".to_string(), "hello".to_string()])
            .await;
        assert!(result.is_ok());

        let result = executor.exec_async(vec!["echo".to_string()]).await;
        assert!(result.unwrap_err().is_invalid_argument());
    }

    #[tokio::test]
    async fn test_exec_redirect_async() {
        init_tracing();
        let executor = Executor::default();
        let output = temp_output();

        let result = executor
            .exec_redirect_async(
                output.clone(),
                vec!["/bin/sh".to_string(), "-c".to_string(), "echo async".to_string()],
            )
            .await;
        assert!(result.is_ok());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "async\n");

        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn test_shell_async_block_on() {
        init_tracing();
        let executor = Executor::default();

        tokio_test::block_on(async {
            assert!(executor.shell_async("true".to_string()).await.is_ok());
            assert!(matches!(
                executor.shell_async("exit 7".to_string()).await,
                Err(ExecError::NonZeroExit(7))
            ));
        });
    }
}
