use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// serialver - pin serialVersionUID values into compiled JVM classes
#[derive(Debug, Parser)]
#[command(name = "serialver", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inject computed serialVersionUID fields into every eligible class of a directory.
    Process {
        /// Root of the compiled classes (e.g. target/classes).
        #[arg(value_name = "CLASS_DIR")]
        class_dir: PathBuf,

        /// Where processed classes are written [default: <CLASS_DIR>/../processed-classes].
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Leave the input class files in place.
        #[arg(long)]
        keep_original: bool,

        /// Replace a stored serialVersionUID that differs from the computed one.
        #[arg(long)]
        overwrite: bool,

        /// Abort on the first class file that cannot be parsed.
        #[arg(long)]
        strict: bool,

        /// Extra class directory consulted for supertypes (repeatable).
        #[arg(long, value_name = "DIR")]
        classpath: Vec<PathBuf>,

        /// Number of worker threads [default: one per core].
        #[arg(short = 'j', long, value_name = "N")]
        threads: Option<usize>,

        /// List every class file with its outcome, not just the totals.
        #[arg(long)]
        details: bool,
    },

    /// Print the computed serialVersionUID of class files.
    Fingerprint {
        /// Paths to .class files.
        #[arg(value_name = "FILE", required = true)]
        paths: Vec<PathBuf>,

        /// Class directory consulted for supertypes (repeatable).
        #[arg(long, value_name = "DIR")]
        classpath: Vec<PathBuf>,
    },
}
