mod app;
mod commands;
mod output;

use anyhow::Context;
use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .context("failed to set Ctrl+C handler")?;

    let cli = Cli::parse();

    // Show serialver info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("serialver", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Process {
            class_dir,
            output_dir,
            keep_original,
            overwrite,
            strict,
            classpath,
            threads,
            details,
        } => commands::process::run(
            &commands::process::ProcessOptions {
                class_dir,
                output_dir: output_dir.as_deref(),
                keep_original: *keep_original,
                overwrite: *overwrite,
                strict: *strict,
                classpath,
                threads: *threads,
                details: *details,
            },
            &cli.global,
        ),
        Command::Fingerprint { paths, classpath } => {
            commands::fingerprint::run(paths, classpath, &cli.global)
        }
    }
}
