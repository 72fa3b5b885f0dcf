// Data types for Executor module

use crate::executor::error::{ExecError, Result};
use crate::executor::path::is_absolute;
use nix::sys::stat::Mode;
use serde::Serialize;
use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::c_char;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;

/// How a child process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitOutcome {
    /// Ran to completion with the given exit code
    Exited { code: i32 },
    /// Killed by a signal
    Signaled { signal: i32 },
    /// Stopped, continued, or anything else the OS reported
    Other,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited { code: 0 })
    }

    /// Only `Exited { code: 0 }` is success
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Exited { code: 0 } => Ok(()),
            Self::Exited { code } => Err(ExecError::NonZeroExit(code)),
            Self::Signaled { signal } => Err(ExecError::Signaled(signal)),
            Self::Other => Err(ExecError::Abnormal),
        }
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            Self::Exited { code }
        } else if let Some(signal) = status.signal() {
            Self::Signaled { signal }
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited { code } => write!(f, "exited with code {}", code),
            Self::Signaled { signal } => write!(f, "killed by signal {}", signal),
            Self::Other => write!(f, "terminated abnormally"),
        }
    }
}

/// Serializable per-call report, printed by the CLI in JSON mode
#[derive(Debug, Clone, Serialize)]
pub struct ExecReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ExitOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecReport {
    pub fn from_result(result: &Result<ExitOutcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                success: outcome.success(),
                outcome: Some(*outcome),
                error: outcome.into_result().err().map(|e| e.to_string()),
            },
            Err(e) => Self {
                success: false,
                outcome: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Null-terminated argument list for `execv`, built before fork.
///
/// Owns the C strings and the pointer array that references them, so the
/// forked child only reads memory and never allocates. Dropping it releases
/// both on every return path.
pub struct ArgVector {
    args: Vec<CString>,
    ptrs: Vec<*const c_char>,
}

impl ArgVector {
    pub fn new<S: AsRef<str>>(argv: &[S]) -> Result<Self> {
        let program = argv
            .first()
            .map(AsRef::as_ref)
            .ok_or_else(|| ExecError::invalid("argument list is empty"))?;

        if !is_absolute(program) {
            return Err(ExecError::invalid(format!(
                "command must be an absolute path, got '{}'",
                program
            )));
        }

        let args = argv
            .iter()
            .map(|arg| {
                CString::new(arg.as_ref()).map_err(|_| {
                    ExecError::invalid(format!("argument contains a NUL byte: {:?}", arg.as_ref()))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut ptrs: Vec<*const c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
        ptrs.push(std::ptr::null());

        Ok(Self { args, ptrs })
    }

    /// Executable path (`argv[0]`)
    pub fn program(&self) -> &CStr {
        &self.args[0]
    }

    /// Pointer array terminated by a null entry
    pub fn as_ptr(&self) -> *const *const c_char {
        self.ptrs.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl fmt::Display for ArgVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&arg.to_string_lossy())?;
        }
        Ok(())
    }
}

impl fmt::Debug for ArgVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.args.iter()).finish()
    }
}

/// File that receives the child's stdout
#[derive(Debug, Clone)]
pub struct RedirectTarget {
    path: CString,
    mode: Mode,
}

impl RedirectTarget {
    pub fn new(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ExecError::invalid("output path is empty"));
        }

        let path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            ExecError::invalid(format!("output path contains a NUL byte: {}", path.display()))
        })?;

        Ok(Self {
            path,
            mode: Mode::from_bits_truncate(mode as libc::mode_t),
        })
    }

    pub fn path(&self) -> &CStr {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}
