// Process creation seam: shell invocation and fork/exec/waitpid

use crate::executor::error::{ExecError, Result};
use crate::executor::types::{ArgVector, ExitOutcome, RedirectTarget};
use nix::errno::Errno;
use nix::fcntl::{OFlag, open};
use nix::sys::signal::{SigHandler, SigSet, SigmaskHow, Signal, signal, sigprocmask};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, close, dup2, fork};
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Exit status used by the child when setup or exec fails
pub const CHILD_SETUP_FAILURE: i32 = 1;

/// Creates processes on behalf of the executor.
///
/// The executor validates every input before calling into a spawner, so an
/// implementation is only ever asked to run well-formed requests.
pub trait ProcessSpawner: Send + Sync {
    /// Run `command` through `shell -c` and wait for it
    fn system(&self, shell: &Path, command: &str) -> Result<ExitOutcome>;

    /// Fork, optionally rebind stdout to `redirect`, replace the child image
    /// with `argv`, and wait for that child
    fn spawn_and_replace(
        &self,
        argv: &ArgVector,
        redirect: Option<&RedirectTarget>,
    ) -> Result<ExitOutcome>;
}

/// Spawner backed by the real OS primitives
#[derive(Debug, Default, Clone, Copy)]
pub struct ForkSpawner;

impl ProcessSpawner for ForkSpawner {
    fn system(&self, shell: &Path, command: &str) -> Result<ExitOutcome> {
        debug!(shell = %shell.display(), command = %command, "spawning shell");

        let status = Command::new(shell)
            .arg("-c")
            .arg(command)
            .status()
            .map_err(|e| ExecError::invocation("shell spawn", e))?;

        Ok(status.into())
    }

    fn spawn_and_replace(
        &self,
        argv: &ArgVector,
        redirect: Option<&RedirectTarget>,
    ) -> Result<ExitOutcome> {
        // SAFETY: everything the child touches was prepared before fork, and
        // the child only makes async-signal-safe calls until execv or _exit.
        match unsafe { fork() } {
            Err(errno) => Err(ExecError::invocation("fork", errno)),
            Ok(ForkResult::Child) => replace_image(argv, redirect),
            Ok(ForkResult::Parent { child }) => {
                debug!(pid = child.as_raw(), command = %argv, "forked child");
                wait_for(child)
            }
        }
    }
}

/// Child side. Never returns: either execv succeeds or the child exits.
fn replace_image(argv: &ArgVector, redirect: Option<&RedirectTarget>) -> ! {
    reset_signals();

    if let Some(target) = redirect {
        let fd = match open(
            target.path(),
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            target.mode(),
        ) {
            Ok(fd) => fd,
            Err(errno) => child_fatal("open", errno),
        };

        // stdout was closed in the parent and open() reused fd 1
        if fd != libc::STDOUT_FILENO {
            if let Err(errno) = dup2(fd, libc::STDOUT_FILENO) {
                let _ = close(fd);
                child_fatal("dup2", errno);
            }
            if let Err(errno) = close(fd) {
                child_fatal("close", errno);
            }
        }
    }

    // SAFETY: both pointers come from ArgVector, which keeps the strings and
    // the null-terminated pointer array alive for this call.
    unsafe {
        libc::execv(argv.program().as_ptr(), argv.as_ptr());
    }
    child_fatal("execv", Errno::last())
}

/// The Rust runtime ignores SIGPIPE and exec keeps ignored dispositions, so
/// restore the default along with an empty signal mask before exec.
fn reset_signals() {
    // SAFETY: installing SIG_DFL runs no handler code in this process
    if let Err(errno) = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) } {
        child_fatal("signal", errno);
    }
    if let Err(errno) = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::empty()), None) {
        child_fatal("sigprocmask", errno);
    }
}

/// Report a child-side failure on fd 2 and terminate without running exit
/// hooks or flushing buffers inherited from the parent.
fn child_fatal(operation: &str, errno: Errno) -> ! {
    let parts: [&[u8]; 4] = [
        operation.as_bytes(),
        b": ",
        errno.desc().as_bytes(),
        b"\n",
    ];
    for part in parts {
        // SAFETY: write(2) on a borrowed buffer; the result is irrelevant here
        unsafe {
            libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len());
        }
    }
    // SAFETY: _exit(2) terminates immediately and touches no shared state
    unsafe { libc::_exit(CHILD_SETUP_FAILURE) }
}

/// Block until `child` terminates and decode its status
fn wait_for(child: Pid) -> Result<ExitOutcome> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitOutcome::Exited { code }),
            Ok(WaitStatus::Signaled(_, signal, core_dumped)) => {
                debug!(pid = child.as_raw(), signal = %signal, core_dumped, "child killed");
                return Ok(ExitOutcome::Signaled {
                    signal: signal as i32,
                });
            }
            Ok(status) => {
                warn!(pid = child.as_raw(), status = ?status, "unexpected wait status");
                return Ok(ExitOutcome::Other);
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(ExecError::invocation("waitpid", errno)),
        }
    }
}
