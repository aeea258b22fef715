use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CRASHES_DIR: &str = "crashes";
pub const CORPUS_DIR: &str = "corpus";
pub const WORK_DIR: &str = "WD";

/// Directories of a single fuzzing run under the output directory.
///
/// Crashes are kept beside the corpus, not inside it, so reloading the
/// corpus directory never picks them up as seeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub crashes_dir: PathBuf,
    pub corpus_dir: PathBuf,
    pub work_dir: PathBuf,
}

impl RunLayout {
    pub fn new(output_corpus: &Path) -> Self {
        let corpus_dir = output_corpus.join(CORPUS_DIR);
        Self {
            crashes_dir: output_corpus.join(CRASHES_DIR),
            work_dir: corpus_dir.join(WORK_DIR),
            corpus_dir,
        }
    }

    /// Creates the three directories. Fails with `AlreadyExists` if any of
    /// them is already there; directories made before the failure stay.
    pub fn create(&self) -> io::Result<()> {
        for dir in [&self.crashes_dir, &self.corpus_dir, &self.work_dir] {
            create_fresh_dir(dir)?;
            log::debug!("Created {dir:?}");
        }
        Ok(())
    }
}

fn create_fresh_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir(path)
}
