//! Processing of a single class file.
//!
//! [`crate::batch::processor::process`] runs one artifact through the whole pipeline:
//!
//! 1. read and parse the class file
//! 2. classify it with the batch's [`crate::fingerprint::ContractGraph`]
//! 3. compute its fingerprint and look up an existing `serialVersionUID`
//! 4. decide between adding, replacing or leaving the field alone
//! 5. publish the result under the output directory
//!
//! Each artifact ends in exactly one [`crate::batch::Outcome`] and one log line of the form
//! `class=<path> outcome=<kind> [fingerprint=<value>] [existing=<value>]`.

use std::path::{Path, PathBuf};

use strum::{EnumCount, EnumIter};

use crate::{
    batch::{output::Output, BatchContext},
    classfile::ClassFile,
    file::File,
    fingerprint::{self, Eligibility, Fingerprint},
    patch::{self, FieldSpec, PatchOp, LONG_DESCRIPTOR, SERIAL_VERSION_UID},
    Result,
};

/// Final state of one artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum Outcome {
    /// Not eligible; nothing was written
    Skipped,
    /// The fingerprint field was added
    Injected,
    /// A conflicting fingerprint was replaced
    Overwritten,
    /// The stored fingerprint already matches
    Unchanged,
    /// The stored fingerprint conflicts and was left in place
    Warned,
    /// The class file could not be parsed
    Malformed,
}

impl Outcome {
    /// The `outcome=` value used in log lines and reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Skipped => "skip",
            Outcome::Injected => "inject",
            Outcome::Overwritten => "conflict-overwrite",
            Outcome::Unchanged => "match",
            Outcome::Warned => "conflict-warn",
            Outcome::Malformed => "parse-error",
        }
    }

    /// Returns `true` for outcomes that publish the artifact and release its input.
    #[must_use]
    pub fn is_published(self) -> bool {
        matches!(
            self,
            Outcome::Injected | Outcome::Overwritten | Outcome::Unchanged | Outcome::Warned
        )
    }

    /// Returns `true` if the published bytes differ from the input.
    #[must_use]
    pub fn is_patched(self) -> bool {
        matches!(self, Outcome::Injected | Outcome::Overwritten)
    }
}

/// What happened to one artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactReport {
    /// Path relative to the class directory
    pub path: PathBuf,
    /// Final state
    pub outcome: Outcome,
    /// The computed fingerprint, for eligible classes
    pub fingerprint: Option<Fingerprint>,
    /// The stored `serialVersionUID` constant, if the class had one
    pub existing: Option<i64>,
    /// Where the artifact was published
    pub output: Option<PathBuf>,
    /// Why the artifact was skipped or could not be parsed
    pub detail: Option<String>,
}

impl ArtifactReport {
    fn new(path: &Path, outcome: Outcome) -> Self {
        ArtifactReport {
            path: path.to_path_buf(),
            outcome,
            fingerprint: None,
            existing: None,
            output: None,
            detail: None,
        }
    }

    /// The structured log line for this artifact.
    #[must_use]
    pub fn log_line(&self) -> String {
        let mut line = format!(
            "class={} outcome={}",
            self.path.display(),
            self.outcome.label()
        );
        if let Some(fingerprint) = self.fingerprint {
            line.push_str(&format!(" fingerprint={fingerprint}"));
        }
        if let Some(existing) = self.existing {
            line.push_str(&format!(" existing={existing}"));
        }
        if let Some(detail) = &self.detail {
            line.push_str(&format!(" detail=\"{detail}\""));
        }
        line
    }

    fn log(&self) {
        match self.outcome {
            Outcome::Skipped | Outcome::Unchanged => log::debug!("{}", self.log_line()),
            Outcome::Injected | Outcome::Overwritten => log::info!("{}", self.log_line()),
            Outcome::Warned | Outcome::Malformed => log::warn!("{}", self.log_line()),
        }
    }
}

/// State of the fingerprint field in an eligible class.
enum Existing {
    Absent,
    Matching(i64),
    Conflicting(Option<i64>),
}

/// Processes the class file at `relative` below the class directory.
///
/// Unparsable input becomes [`Outcome::Malformed`] unless the configuration is strict.
///
/// # Errors
///
/// - [`crate::Error::FileError`] or [`crate::Error::WriteFailed`] if reading or publishing fails
/// - [`crate::Error::InvariantViolation`] if an existing `serialVersionUID` is not a `long`
///   or the patch cannot be represented
/// - any malformed-input error when the configuration is strict
pub fn process(context: &BatchContext, relative: &Path) -> Result<ArtifactReport> {
    let report = match run(context, relative) {
        Ok(report) => report,
        Err(error) if error.is_malformed() && !context.config.strict => {
            let mut report = ArtifactReport::new(relative, Outcome::Malformed);
            report.detail = Some(error.to_string());
            report
        }
        Err(error) => {
            log::error!("class={} error=\"{}\"", relative.display(), error);
            return Err(error);
        }
    };

    report.log();
    Ok(report)
}

fn run(context: &BatchContext, relative: &Path) -> Result<ArtifactReport> {
    let config = &context.config;
    let file = File::from_file(&config.class_dir.join(relative))?;
    let class = ClassFile::parse(file.data())?;

    let eligibility = context.graph.classify(&class)?;
    if !eligibility.is_eligible() {
        let mut report = ArtifactReport::new(relative, Outcome::Skipped);
        report.detail = Some(describe(relative, &eligibility));
        return Ok(report);
    }

    let fingerprint = fingerprint::fingerprint(&class)?;
    let existing = existing_field(&class, fingerprint)?;

    let (outcome, stored, patched) = match existing {
        Existing::Absent => {
            let op = PatchOp::Add(FieldSpec::serial_version_uid(fingerprint.value()));
            (Outcome::Injected, None, Some(patch::apply(&class, &op)?))
        }
        Existing::Matching(value) => (Outcome::Unchanged, Some(value), None),
        Existing::Conflicting(value) if config.overwrite => {
            let op = PatchOp::Replace {
                name: SERIAL_VERSION_UID.to_string(),
                value: fingerprint.value(),
            };
            (Outcome::Overwritten, value, Some(patch::apply(&class, &op)?))
        }
        Existing::Conflicting(value) => (Outcome::Warned, value, None),
    };

    let target = config.output_dir.join(relative);
    match patched {
        Some(patched) => Output::publish(&target, &patched.to_bytes()?)?,
        None => Output::publish(&target, file.data())?,
    }

    Ok(ArtifactReport {
        path: relative.to_path_buf(),
        outcome,
        fingerprint: Some(fingerprint),
        existing: stored,
        output: Some(target),
        detail: None,
    })
}

fn existing_field(class: &ClassFile, fingerprint: Fingerprint) -> Result<Existing> {
    let Some(position) = class.find_field(SERIAL_VERSION_UID)? else {
        return Ok(Existing::Absent);
    };

    let descriptor = class.fields[position].descriptor(&class.constant_pool)?;
    if descriptor != LONG_DESCRIPTOR {
        return Err(invariant_error!(
            "{} of {} has descriptor {}, expected J",
            SERIAL_VERSION_UID,
            class.class_name()?,
            descriptor
        ));
    }

    Ok(match class.field_constant(SERIAL_VERSION_UID)? {
        Some(value) if value == fingerprint.value() => Existing::Matching(value),
        other => Existing::Conflicting(other),
    })
}

fn describe(relative: &Path, eligibility: &Eligibility) -> String {
    match eligibility {
        Eligibility::Eligible => "eligible".to_string(),
        Eligibility::Externalizable => "externalizable".to_string(),
        Eligibility::NotSerializable => "not serializable".to_string(),
        Eligibility::Interface => "interface".to_string(),
        Eligibility::Undetermined {
            missing,
            serializable_seen,
        } => {
            let missing = missing.join(",");
            if *serializable_seen {
                log::warn!(
                    "class={} is serializable but supertypes could not be resolved: {}",
                    relative.display(),
                    missing
                );
            } else {
                log::debug!(
                    "class={} has unresolved supertypes: {}",
                    relative.display(),
                    missing
                );
            }
            format!("unresolved supertypes: {missing}")
        }
    }
}
