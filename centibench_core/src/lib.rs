pub mod build;
pub mod config;
pub mod dictionary;
pub mod engine;
pub mod env;
pub mod flags;
pub mod layout;
pub mod runner;

pub use build::{BuildConfig, BuildError, ExternalBuilder, ScriptBuilder, build_benchmark};
pub use config::{BinaryFlag, BuildSettings, CentibenchConfig, RunnerSettings};
pub use dictionary::{DictionaryError, DictionaryLookup, OptionsFileLookup};
pub use engine::{CentipedeEngine, EngineError, EngineExit, EngineInvocation, FuzzEngine};
pub use env::BuildEnvironment;
pub use flags::{EngineFlag, EngineFlags};
pub use layout::RunLayout;
pub use runner::{FuzzRunner, RunnerError};
