//! Launching the fuzzing engine against an instrumented target.

use crate::config::RunnerSettings;
use crate::dictionary::{DictionaryError, DictionaryLookup, OptionsFileLookup};
use crate::engine::{CentipedeEngine, EngineError, EngineExit, EngineInvocation, FuzzEngine};
use crate::flags::{EngineFlag, EngineFlags};
use crate::layout::RunLayout;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to create run directories: {0}")]
    Layout(#[source] io::Error),

    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The engine ran but did not exit cleanly.
    #[error("Fuzzer {program:?} failed: {}", .exit.describe())]
    FuzzerFailed { program: PathBuf, exit: EngineExit },
}

pub struct FuzzRunner<E, D> {
    settings: RunnerSettings,
    engine: E,
    dictionaries: D,
}

impl FuzzRunner<CentipedeEngine, OptionsFileLookup> {
    /// Runner spawning the real engine binary, with dictionary lookup
    /// unless the settings turn it off.
    pub fn from_settings(settings: RunnerSettings) -> Self {
        let dictionaries = if settings.no_dictionaries {
            OptionsFileLookup::disabled()
        } else {
            OptionsFileLookup::new()
        };
        Self::new(settings, CentipedeEngine, dictionaries)
    }
}

impl<E: FuzzEngine, D: DictionaryLookup> FuzzRunner<E, D> {
    pub fn new(settings: RunnerSettings, engine: E, dictionaries: D) -> Self {
        Self {
            settings,
            engine,
            dictionaries,
        }
    }

    /// Fuzzes with the default flag set only.
    pub fn fuzz(
        &mut self,
        input_corpus: &Path,
        output_corpus: &Path,
        target_binary: &Path,
    ) -> Result<(), RunnerError> {
        self.run_fuzzer::<&str>(input_corpus, output_corpus, target_binary, &[])
    }

    /// Creates the run layout under `output_corpus` and blocks on the engine
    /// until it exits. `extra_flags` go after every standard flag.
    pub fn run_fuzzer<S: AsRef<OsStr>>(
        &mut self,
        input_corpus: &Path,
        output_corpus: &Path,
        target_binary: &Path,
        extra_flags: &[S],
    ) -> Result<(), RunnerError> {
        let layout = RunLayout::new(output_corpus);
        layout.create().map_err(RunnerError::Layout)?;

        let invocation =
            self.build_invocation(&layout, input_corpus, target_binary, extra_flags)?;
        log::info!("Running command: {}", invocation.command_line());

        let exit = self.engine.run(&invocation)?;
        if exit.success() {
            Ok(())
        } else {
            Err(RunnerError::FuzzerFailed {
                program: invocation.program,
                exit,
            })
        }
    }

    /// Assembles the complete engine command line for an existing layout.
    pub fn build_invocation<S: AsRef<OsStr>>(
        &self,
        layout: &RunLayout,
        input_corpus: &Path,
        target_binary: &Path,
        extra_flags: &[S],
    ) -> Result<EngineInvocation, RunnerError> {
        let mut flags = EngineFlags::standard(layout, input_corpus, target_binary, &self.settings);
        if let Some(dictionary) = self.dictionaries.dictionary_for(target_binary)? {
            flags.push(EngineFlag::Dictionary(dictionary));
        }
        flags.extend_extra(extra_flags.iter().map(|f| f.as_ref().to_owned()));

        Ok(EngineInvocation {
            program: self.settings.fuzzer_binary.clone(),
            args: flags.to_args(),
        })
    }
}
