use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_COVERAGE_FLAG: &str = "-fsanitize-coverage=trace-pc-guard,pc-table,trace-cmp";

const CENTIPEDE_BAZEL_BIN: &str = "/src/centipede/bazel-bin";

const CENTIPEDE_LIBS: [&str; 6] = [
    "libfuzz_target_runner.a",
    "libfuzz_target_runner_no_main.a",
    "libshared_memory_blob_sequence.a",
    "libexecution_request.a",
    "libexecution_result.a",
    "libbyte_array_mutator.a",
];

/// How the target binary is passed to the engine.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BinaryFlag {
    /// `--binary=<target>` glued onto the end of the `--corpus_dir` value,
    /// which is the form existing benchmark images have always emitted.
    #[default]
    Joined,
    /// `--binary=<target>` as its own argument.
    Separate,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct BuildSettings {
    #[serde(default = "default_cc")]
    pub cc: String,
    #[serde(default = "default_cxx")]
    pub cxx: String,
    #[serde(default = "default_coverage_flags")]
    pub coverage_flags: Vec<String>,
    #[serde(default = "default_fuzzer_libs")]
    pub fuzzer_libs: Vec<PathBuf>,
    #[serde(default = "default_shell")]
    pub shell: PathBuf,
    /// Falls back to `$SRC/build.sh` when unset.
    pub build_script: Option<PathBuf>,
}

fn default_cc() -> String {
    "clang".to_string()
}

fn default_cxx() -> String {
    "clang++".to_string()
}

pub fn default_coverage_flags() -> Vec<String> {
    vec![DEFAULT_COVERAGE_FLAG.to_string()]
}

pub fn default_fuzzer_libs() -> Vec<PathBuf> {
    CENTIPEDE_LIBS
        .iter()
        .map(|lib| Path::new(CENTIPEDE_BAZEL_BIN).join(lib))
        .collect()
}

fn default_shell() -> PathBuf {
    PathBuf::from("/bin/bash")
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            cc: default_cc(),
            cxx: default_cxx(),
            coverage_flags: default_coverage_flags(),
            fuzzer_libs: default_fuzzer_libs(),
            shell: default_shell(),
            build_script: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct RunnerSettings {
    #[serde(default = "default_fuzzer_binary")]
    pub fuzzer_binary: PathBuf,
    #[serde(default = "default_num_runs")]
    pub num_runs: u64,
    #[serde(default = "default_fork_server")]
    pub fork_server: bool,
    /// Per-execution timeout in seconds, 0 disables it.
    #[serde(default)]
    pub timeout: u64,
    #[serde(default)]
    pub binary_flag: BinaryFlag,
    #[serde(default)]
    pub no_dictionaries: bool,
}

pub fn default_fuzzer_binary() -> PathBuf {
    PathBuf::from("/out/centipede")
}

pub fn default_num_runs() -> u64 {
    100
}

fn default_fork_server() -> bool {
    true
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            fuzzer_binary: default_fuzzer_binary(),
            num_runs: default_num_runs(),
            fork_server: default_fork_server(),
            timeout: 0,
            binary_flag: BinaryFlag::default(),
            no_dictionaries: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct CentibenchConfig {
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub runner: RunnerSettings,
}

impl CentibenchConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        Self::from_toml_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
