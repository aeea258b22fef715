//! Compiler configuration for coverage-instrumented benchmark builds.

use crate::config::BuildSettings;
use crate::env::BuildEnvironment;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

pub const CFLAGS: &str = "CFLAGS";
pub const CXXFLAGS: &str = "CXXFLAGS";
pub const CC: &str = "CC";
pub const CXX: &str = "CXX";
pub const FUZZER_LIB: &str = "FUZZER_LIB";
pub const LIB_FUZZING_ENGINE: &str = "LIB_FUZZING_ENGINE";

#[derive(Error, Debug)]
pub enum BuildError {
    /// The builder process could not be started at all.
    #[error("Failed to run {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The build ran and exited unsuccessfully. `None` when killed by a signal.
    #[error("Benchmark build failed with exit code {code:?}")]
    Failed { code: Option<i32> },
}

/// What the benchmark build needs to know to link against the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub cc: String,
    pub cxx: String,
    pub coverage_flags: Vec<String>,
    pub fuzzer_libs: Vec<PathBuf>,
}

impl BuildConfig {
    /// `FUZZER_LIB` value: the archives joined by single spaces.
    pub fn fuzzer_lib_value(&self) -> OsString {
        let mut value = OsString::new();
        for (i, lib) in self.fuzzer_libs.iter().enumerate() {
            if i > 0 {
                value.push(" ");
            }
            value.push(lib);
        }
        value
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::from(&BuildSettings::default())
    }
}

impl From<&BuildSettings> for BuildConfig {
    fn from(settings: &BuildSettings) -> Self {
        Self {
            cc: settings.cc.clone(),
            cxx: settings.cxx.clone(),
            coverage_flags: settings.coverage_flags.clone(),
            fuzzer_libs: settings.fuzzer_libs.clone(),
        }
    }
}

/// Anything able to compile the benchmark from a prepared environment.
pub trait ExternalBuilder {
    fn build(&self, env: &BuildEnvironment) -> Result<(), BuildError>;
}

/// Applies `config` to `env`. Coverage flags are appended to both
/// `CFLAGS` and `CXXFLAGS`, so a second call appends them again.
pub fn configure_build(config: &BuildConfig, env: &mut BuildEnvironment) {
    env.append_flags(CFLAGS, &config.coverage_flags);
    env.append_flags(CXXFLAGS, &config.coverage_flags);

    env.set(CC, config.cc.as_str());
    env.set(CXX, config.cxx.as_str());
    env.set(FUZZER_LIB, config.fuzzer_lib_value());
}

/// Configures `env` and hands it to `builder`. Build failures are passed
/// through untouched.
pub fn build_benchmark(
    config: &BuildConfig,
    env: &mut BuildEnvironment,
    builder: &dyn ExternalBuilder,
) -> Result<(), BuildError> {
    configure_build(config, env);
    builder.build(env)
}

/// Runs the benchmark's shell build script with the prepared environment
/// as its entire environment.
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    shell: PathBuf,
    script: PathBuf,
}

impl ScriptBuilder {
    pub fn new(shell: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            script: script.into(),
        }
    }

    /// `build.sh` under the `SRC` directory recorded in `env`.
    pub fn from_src_dir(shell: impl Into<PathBuf>, env: &BuildEnvironment) -> Option<Self> {
        env.get_os("SRC")
            .map(|src| Self::new(shell, Path::new(src).join("build.sh")))
    }

    pub fn script(&self) -> &Path {
        &self.script
    }
}

impl ExternalBuilder for ScriptBuilder {
    fn build(&self, env: &BuildEnvironment) -> Result<(), BuildError> {
        let mut env = env.clone();
        if let Some(libs) = env.get_os(FUZZER_LIB).map(ToOwned::to_owned) {
            env.set(LIB_FUZZING_ENGINE, libs);
        }

        log::info!(
            "Building benchmark {} with fuzzer {}",
            env.get("BENCHMARK").unwrap_or("<unset>"),
            env.get("FUZZER").unwrap_or("<unset>"),
        );

        let status = Command::new(&self.shell)
            .arg("-ex")
            .arg(&self.script)
            .env_clear()
            .envs(env.iter())
            .status()
            .map_err(|source| BuildError::Spawn {
                program: self.shell.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::Failed {
                code: status.code(),
            })
        }
    }
}
