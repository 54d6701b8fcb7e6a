//! Aggregated results of a batch run.

use std::path::PathBuf;

use strum::{EnumCount, IntoEnumIterator};

use crate::batch::{ArtifactReport, Outcome};

/// Per-artifact outcomes and per-outcome counts of one batch.
///
/// # Examples
///
/// ```rust,no_run
/// use serialver::{Batch, Config, Outcome};
///
/// let report = Batch::new(Config::new("target/classes"))?.run()?;
/// println!("{} classes, {} injected", report.total(), report.count(Outcome::Injected));
/// for artifact in report.with_outcome(Outcome::Warned) {
///     println!("conflict in {}", artifact.path.display());
/// }
/// # Ok::<(), serialver::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    /// One entry per discovered class file, in discovery order
    pub artifacts: Vec<ArtifactReport>,
    /// Inputs deleted after publishing
    pub removed: Vec<PathBuf>,
    counts: [usize; Outcome::COUNT],
}

impl BatchReport {
    /// Builds a report from per-artifact results.
    #[must_use]
    pub fn new(artifacts: Vec<ArtifactReport>) -> Self {
        let mut counts = [0; Outcome::COUNT];
        for artifact in &artifacts {
            counts[artifact.outcome as usize] += 1;
        }

        BatchReport {
            artifacts,
            removed: Vec::new(),
            counts,
        }
    }

    /// Number of artifacts processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.artifacts.len()
    }

    /// Number of artifacts that ended in `outcome`.
    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.counts[outcome as usize]
    }

    /// Counts for every outcome, in declaration order.
    pub fn counts(&self) -> impl Iterator<Item = (Outcome, usize)> + '_ {
        Outcome::iter().map(|outcome| (outcome, self.count(outcome)))
    }

    /// Artifacts that ended in `outcome`.
    pub fn with_outcome(&self, outcome: Outcome) -> impl Iterator<Item = &ArtifactReport> {
        self.artifacts
            .iter()
            .filter(move |artifact| artifact.outcome == outcome)
    }

    /// Number of artifacts whose published bytes differ from the input.
    #[must_use]
    pub fn patched_count(&self) -> usize {
        self.count(Outcome::Injected) + self.count(Outcome::Overwritten)
    }

    /// Returns `true` if any artifact could not be parsed.
    #[must_use]
    pub fn has_malformed(&self) -> bool {
        self.count(Outcome::Malformed) > 0
    }

    /// Returns `true` if any artifact has a fingerprint conflict that was left in place.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        self.count(Outcome::Warned) > 0
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} class files:", self.total())?;
        for (outcome, count) in self.counts() {
            write!(f, " {}={}", outcome.label(), count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, outcome: Outcome) -> ArtifactReport {
        ArtifactReport {
            path: PathBuf::from(name),
            outcome,
            fingerprint: None,
            existing: None,
            output: None,
            detail: None,
        }
    }

    #[test]
    fn counts() {
        let report = BatchReport::new(vec![
            artifact("A.class", Outcome::Injected),
            artifact("B.class", Outcome::Injected),
            artifact("C.class", Outcome::Skipped),
            artifact("D.class", Outcome::Warned),
        ]);

        assert_eq!(report.total(), 4);
        assert_eq!(report.count(Outcome::Injected), 2);
        assert_eq!(report.count(Outcome::Malformed), 0);
        assert_eq!(report.patched_count(), 2);
        assert!(report.has_conflicts());
        assert!(!report.has_malformed());
        assert_eq!(report.with_outcome(Outcome::Skipped).count(), 1);
        assert_eq!(report.counts().map(|(_, n)| n).sum::<usize>(), 4);
        assert_eq!(
            report.to_string(),
            "4 class files: skip=1 inject=2 conflict-overwrite=0 match=0 conflict-warn=1 parse-error=0"
        );
    }
}
