use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Fuzzer binary {program:?} not found")]
    NotFound {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to spawn fuzzer {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fully assembled engine command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl EngineInvocation {
    /// Space-joined program and arguments, lossily converted. For logging only.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy())
            .chain(self.args.iter().map(|arg| arg.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineExit {
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
}

impl EngineExit {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn describe(&self) -> String {
        match (self.exit_code, self.signal) {
            (Some(code), _) => format!("Exited with code {code}"),
            (None, Some(signal)) => format!("Terminated by signal {signal}"),
            (None, None) => "Exited abnormally".to_string(),
        }
    }
}

impl From<ExitStatus> for EngineExit {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            exit_code: status.code(),
            signal,
        }
    }
}

/// The external fuzzing engine. Runs to completion before returning.
pub trait FuzzEngine {
    fn run(&mut self, invocation: &EngineInvocation) -> Result<EngineExit, EngineError>;
}

/// Launches the engine as a child process sharing our stdio.
#[derive(Debug, Default)]
pub struct CentipedeEngine;

impl FuzzEngine for CentipedeEngine {
    fn run(&mut self, invocation: &EngineInvocation) -> Result<EngineExit, EngineError> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|source| {
                let program = invocation.program.clone();
                match source.kind() {
                    io::ErrorKind::NotFound => EngineError::NotFound { program, source },
                    _ => EngineError::Spawn { program, source },
                }
            })?;
        Ok(EngineExit::from(status))
    }
}
