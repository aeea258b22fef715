use centibench_core::build::{BuildConfig, ScriptBuilder, build_benchmark};
use centibench_core::config::CentibenchConfig;
use centibench_core::env::BuildEnvironment;
use centibench_core::runner::FuzzRunner;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "centibench.toml";

#[derive(Parser, Debug)]
#[clap(author, version, about = "Builds and fuzzes benchmarks with the centipede engine", long_about = None)]
struct Cli {
    #[clap(short, long, value_parser, global = true)]
    config_file: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the benchmark with coverage instrumentation and the engine's libraries
    Build {
        /// Benchmark build script, defaults to $SRC/build.sh
        #[clap(long)]
        build_script: Option<PathBuf>,
    },
    /// Run the engine against an instrumented target
    Fuzz {
        #[clap(long)]
        input_corpus: PathBuf,
        #[clap(long)]
        output_corpus: PathBuf,
        #[clap(long)]
        target_binary: PathBuf,
        #[clap(long)]
        fuzzer_binary: Option<PathBuf>,
        /// Passed to the engine after the standard flags
        #[clap(last = true)]
        extra_flags: Vec<OsString>,
    },
}

fn load_config(config_file: Option<PathBuf>) -> Result<CentibenchConfig, anyhow::Error> {
    match config_file {
        Some(config_path) => {
            log::info!("Loading configuration from specified path: {config_path:?}");
            CentibenchConfig::load_from_file(&config_path)
        }
        None => {
            let default_config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_config_path.exists() {
                log::info!(
                    "No config file specified via CLI, loading default: {default_config_path:?}"
                );
                CentibenchConfig::load_from_file(&default_config_path)
            } else {
                log::debug!("No config file found, using built-in defaults");
                Ok(CentibenchConfig::default())
            }
        }
    }
}

fn dictionaries_disabled_by_env() -> bool {
    std::env::var_os("NO_DICTIONARIES").is_some_and(|v| !v.is_empty())
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config_file)?;

    match cli.command {
        Command::Build { build_script } => {
            if let Some(script) = build_script {
                config.build.build_script = Some(script);
            }
            log::debug!("Effective configuration: {config:#?}");

            let mut env = BuildEnvironment::from_process();
            let builder = match &config.build.build_script {
                Some(script) => ScriptBuilder::new(&config.build.shell, script),
                None => ScriptBuilder::from_src_dir(&config.build.shell, &env).context(
                    "No build script configured and SRC is not set; pass --build-script",
                )?,
            };

            build_benchmark(&BuildConfig::from(&config.build), &mut env, &builder)
                .with_context(|| format!("Building with {:?}", builder.script()))?;
        }
        Command::Fuzz {
            input_corpus,
            output_corpus,
            target_binary,
            fuzzer_binary,
            extra_flags,
        } => {
            if let Some(binary) = fuzzer_binary {
                config.runner.fuzzer_binary = binary;
            }
            if dictionaries_disabled_by_env() {
                config.runner.no_dictionaries = true;
            }
            log::debug!("Effective configuration: {config:#?}");

            let mut runner = FuzzRunner::from_settings(config.runner);
            runner.run_fuzzer(&input_corpus, &output_corpus, &target_binary, &extra_flags)?;
        }
    }

    Ok(())
}
