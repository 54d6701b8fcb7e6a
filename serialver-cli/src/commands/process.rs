use std::path::{Path, PathBuf};

use serde::Serialize;
use serialver::{Batch, BatchReport, Config, Outcome};

use crate::{
    app::GlobalOptions,
    output::{print_output, Align, TabWriter},
};

pub struct ProcessOptions<'a> {
    pub class_dir: &'a Path,
    pub output_dir: Option<&'a Path>,
    pub keep_original: bool,
    pub overwrite: bool,
    pub strict: bool,
    pub classpath: &'a [PathBuf],
    pub threads: Option<usize>,
    pub details: bool,
}

#[derive(Debug, Serialize)]
pub struct ProcessSummary {
    pub class_dir: String,
    pub output_dir: String,
    pub total: usize,
    pub counts: Vec<OutcomeCount>,
    pub removed: usize,
    pub artifacts: Vec<ArtifactInfo>,
}

#[derive(Debug, Serialize)]
pub struct OutcomeCount {
    pub outcome: &'static str,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ArtifactInfo {
    pub path: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn build_config(options: &ProcessOptions<'_>) -> Config {
    let mut config = Config::new(options.class_dir)
        .keep_original(options.keep_original)
        .overwrite(options.overwrite)
        .strict(options.strict);
    if let Some(output_dir) = options.output_dir {
        config = config.output_dir(output_dir);
    }
    for dir in options.classpath {
        config = config.with_classpath(dir);
    }
    if let Some(threads) = options.threads {
        config = config.threads(threads);
    }
    config
}

fn summarize(config: &Config, report: &BatchReport) -> ProcessSummary {
    ProcessSummary {
        class_dir: config.class_dir.display().to_string(),
        output_dir: config.output_dir.display().to_string(),
        total: report.total(),
        counts: report
            .counts()
            .map(|(outcome, count)| OutcomeCount {
                outcome: outcome.label(),
                count,
            })
            .collect(),
        removed: report.removed.len(),
        artifacts: report
            .artifacts
            .iter()
            .map(|artifact| ArtifactInfo {
                path: artifact.path.display().to_string(),
                outcome: artifact.outcome.label(),
                fingerprint: artifact.fingerprint.map(|f| f.value()),
                existing: artifact.existing,
                output: artifact.output.as_ref().map(|p| p.display().to_string()),
                detail: artifact.detail.clone(),
            })
            .collect(),
    }
}

fn print_summary(summary: &ProcessSummary, details: bool) {
    println!("Class directory:  {}", summary.class_dir);
    println!("Output directory: {}", summary.output_dir);
    println!("Class files:      {}", summary.total);
    if summary.removed > 0 {
        println!("Inputs removed:   {}", summary.removed);
    }
    println!();

    let mut counts = TabWriter::new(vec![("OUTCOME", Align::Left), ("COUNT", Align::Right)]);
    for entry in &summary.counts {
        counts.row(vec![entry.outcome.to_string(), entry.count.to_string()]);
    }
    counts.print();

    if details && !summary.artifacts.is_empty() {
        println!();
        let mut table = TabWriter::new(vec![
            ("CLASS", Align::Left),
            ("OUTCOME", Align::Left),
            ("FINGERPRINT", Align::Right),
            ("EXISTING", Align::Right),
        ]);
        for artifact in &summary.artifacts {
            table.row(vec![
                artifact.path.clone(),
                artifact.outcome.to_string(),
                artifact.fingerprint.map_or_else(String::new, |v| v.to_string()),
                artifact.existing.map_or_else(String::new, |v| v.to_string()),
            ]);
        }
        table.print();
    }
}

pub fn run(options: &ProcessOptions<'_>, opts: &GlobalOptions) -> anyhow::Result<()> {
    let batch = Batch::new(build_config(options))?;
    let report = batch.run()?;
    let summary = summarize(batch.config(), &report);

    print_output(&summary, opts, |summary| {
        print_summary(summary, options.details);
    })?;

    if report.count(Outcome::Malformed) > 0 {
        log::warn!(
            "{} class files could not be parsed and were left untouched",
            report.count(Outcome::Malformed)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_options() {
        let classpath = vec![PathBuf::from("lib/classes")];
        let options = ProcessOptions {
            class_dir: Path::new("target/classes"),
            output_dir: Some(Path::new("out")),
            keep_original: true,
            overwrite: true,
            strict: false,
            classpath: &classpath,
            threads: Some(2),
            details: false,
        };

        let config = build_config(&options);
        assert_eq!(config.class_dir, PathBuf::from("target/classes"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.keep_original);
        assert!(config.overwrite);
        assert!(!config.strict);
        assert_eq!(config.classpath, classpath);
        assert_eq!(config.threads, Some(2));
    }
}
