use crate::config::{BinaryFlag, RunnerSettings};
use crate::layout::RunLayout;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// One engine command-line flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineFlag {
    Workdir(PathBuf),
    /// `--corpus_dir=a,b`. With `joined_binary` set the `--binary=` flag is
    /// appended to the value without a separator.
    CorpusDirs {
        dirs: Vec<PathBuf>,
        joined_binary: Option<PathBuf>,
    },
    Binary(PathBuf),
    NumRuns(u64),
    ForkServer(bool),
    Timeout(u64),
    Dictionary(PathBuf),
    /// Passed through verbatim.
    Extra(OsString),
}

fn with_value(name: &str, value: impl AsRef<OsStr>) -> OsString {
    let mut flag = OsString::from(name);
    flag.push(value);
    flag
}

impl EngineFlag {
    /// Paths are kept as raw OS strings so the engine sees exactly the
    /// directories that were created.
    pub fn render(&self) -> OsString {
        match self {
            EngineFlag::Workdir(dir) => with_value("--workdir=", dir),
            EngineFlag::CorpusDirs {
                dirs,
                joined_binary,
            } => {
                let mut flag = OsString::from("--corpus_dir=");
                for (i, dir) in dirs.iter().enumerate() {
                    if i > 0 {
                        flag.push(",");
                    }
                    flag.push(dir);
                }
                if let Some(binary) = joined_binary {
                    flag.push(with_value("--binary=", binary));
                }
                flag
            }
            EngineFlag::Binary(binary) => with_value("--binary=", binary),
            EngineFlag::NumRuns(n) => format!("--num_runs={n}").into(),
            EngineFlag::ForkServer(on) => format!("--fork_server={}", u8::from(*on)).into(),
            EngineFlag::Timeout(secs) => format!("--timeout={secs}").into(),
            EngineFlag::Dictionary(path) => with_value("--dictionary=", path),
            EngineFlag::Extra(raw) => raw.clone(),
        }
    }
}

/// Ordered flag list for one engine invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineFlags {
    flags: Vec<EngineFlag>,
}

impl EngineFlags {
    /// Workdir, corpus dirs, binary and run limits, in the order the engine
    /// has always been invoked with.
    pub fn standard(
        layout: &RunLayout,
        input_corpus: &Path,
        target_binary: &Path,
        settings: &RunnerSettings,
    ) -> Self {
        let dirs = vec![layout.corpus_dir.clone(), input_corpus.to_path_buf()];
        let mut flags = vec![EngineFlag::Workdir(layout.work_dir.clone())];
        match settings.binary_flag {
            BinaryFlag::Joined => flags.push(EngineFlag::CorpusDirs {
                dirs,
                joined_binary: Some(target_binary.to_path_buf()),
            }),
            BinaryFlag::Separate => {
                flags.push(EngineFlag::CorpusDirs {
                    dirs,
                    joined_binary: None,
                });
                flags.push(EngineFlag::Binary(target_binary.to_path_buf()));
            }
        }
        flags.push(EngineFlag::NumRuns(settings.num_runs));
        // Fork server keeps fuzzing past ooms, timeouts and crashes.
        flags.push(EngineFlag::ForkServer(settings.fork_server));
        flags.push(EngineFlag::Timeout(settings.timeout));
        Self { flags }
    }

    pub fn push(&mut self, flag: EngineFlag) {
        self.flags.push(flag);
    }

    pub fn extend_extra<I, S>(&mut self, extra: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.flags
            .extend(extra.into_iter().map(|raw| EngineFlag::Extra(raw.into())));
    }

    pub fn to_args(&self) -> Vec<OsString> {
        self.flags.iter().map(EngineFlag::render).collect()
    }
}
