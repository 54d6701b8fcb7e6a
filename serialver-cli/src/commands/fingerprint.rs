use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use serialver::{
    fingerprint::{self, ContractGraph, DirectorySource, TypeSource},
    ClassFile, Eligibility, File,
};

use crate::{app::GlobalOptions, output::print_output};

#[derive(Debug, Serialize)]
pub struct FingerprintInfo {
    pub path: String,
    pub class: String,
    pub eligibility: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_version_uid: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl FingerprintInfo {
    fn display(&self) {
        match (self.serial_version_uid, self.eligibility.as_str()) {
            (Some(value), _) => println!(
                "{}:    private static final long serialVersionUID = {value}L;",
                self.class
            ),
            (None, "undetermined") => println!(
                "Class {} has unresolved supertypes: {}",
                self.class,
                self.missing.join(", ")
            ),
            (None, _) => println!("Class {} is not Serializable.", self.class),
        }
    }
}

/// Directory a class file was compiled into, derived from its package depth.
fn class_root(path: &Path, internal_name: &str) -> Option<PathBuf> {
    let depth = internal_name.matches('/').count();
    let mut root = path.parent()?;
    for _ in 0..depth {
        root = root.parent()?;
    }
    Some(root.to_path_buf())
}

fn describe(path: &Path, classpath: &[PathBuf]) -> anyhow::Result<FingerprintInfo> {
    let file =
        File::from_file(path).with_context(|| format!("failed to read {}", path.display()))?;
    let class = ClassFile::parse(file.data())
        .with_context(|| format!("failed to parse class file: {}", path.display()))?;
    let internal_name = class.class_name()?;

    let mut roots = classpath.to_vec();
    if let Some(root) = class_root(file.path(), &internal_name) {
        roots.push(root);
    }
    let sources: Vec<Box<dyn TypeSource>> = vec![Box::new(DirectorySource::new(roots))];
    let graph = ContractGraph::new(sources);

    let eligibility = graph.classify(&class)?;
    let (label, missing) = match &eligibility {
        Eligibility::Eligible => ("eligible", Vec::new()),
        Eligibility::Externalizable => ("externalizable", Vec::new()),
        Eligibility::NotSerializable => ("not-serializable", Vec::new()),
        Eligibility::Interface => ("interface", Vec::new()),
        Eligibility::Undetermined { missing, .. } => ("undetermined", missing.clone()),
    };

    let serial_version_uid = match eligibility {
        Eligibility::Eligible | Eligibility::Externalizable => {
            Some(fingerprint::fingerprint(&class)?.value())
        }
        _ => None,
    };

    Ok(FingerprintInfo {
        path: file.path().display().to_string(),
        class: internal_name.replace('/', "."),
        eligibility: label.to_string(),
        serial_version_uid,
        missing,
    })
}

pub fn run(paths: &[PathBuf], classpath: &[PathBuf], opts: &GlobalOptions) -> anyhow::Result<()> {
    let infos = paths
        .iter()
        .map(|path| describe(path, classpath))
        .collect::<anyhow::Result<Vec<_>>>()?;

    print_output(&infos, opts, |infos| {
        for info in infos {
            info.display();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_root_strips_package() {
        let path = Path::new("target/classes/com/example/Plain.class");
        assert_eq!(
            class_root(path, "com/example/Plain"),
            Some(PathBuf::from("target/classes"))
        );
        assert_eq!(
            class_root(Path::new("Top.class"), "Top"),
            Some(PathBuf::from(""))
        );
        assert_eq!(class_root(Path::new("Plain.class"), "com/example/Plain"), None);
    }
}
