//! Field patching on the compiled fixtures.

use std::path::PathBuf;

use serialver::{
    fingerprint,
    patch::{self, FieldSpec, PatchOp},
    AccessFlags, ClassFile, Error,
};

const FIXTURES: &[&str] = &[
    "Account",
    "Account$Entry",
    "Account$Hidden",
    "Color",
    "Custom",
    "CustomChild",
    "Failure",
    "IntUid",
    "NotSerial",
    "Plain",
    "Planet",
    "Planet$1",
    "Point",
    "Savings",
    "Shape",
    "Unicode",
    "WithUid",
];

fn samples() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/samples")
}

fn sample_bytes(name: &str) -> Vec<u8> {
    std::fs::read(samples().join(format!("classes/com/example/{name}.class"))).unwrap()
}

fn sample(name: &str) -> ClassFile {
    ClassFile::parse(&sample_bytes(name)).unwrap()
}

fn replace(name: &str, value: i64) -> PatchOp {
    PatchOp::Replace {
        name: name.to_string(),
        value,
    }
}

#[test]
fn parse_and_write_is_lossless() {
    for name in FIXTURES {
        let data = sample_bytes(name);
        let class = ClassFile::parse(&data).unwrap();
        assert_eq!(class.to_bytes().unwrap(), data, "round trip of {name}");
    }
}

#[test]
fn add_matches_golden_file() {
    let class = sample("Plain");
    let patched = patch::apply(
        &class,
        &PatchOp::Add(FieldSpec::serial_version_uid(350957258087942950)),
    )
    .unwrap();

    let expected = std::fs::read(samples().join("expected/Plain.injected.class")).unwrap();
    assert_eq!(patched.to_bytes().unwrap(), expected);
}

#[test]
fn add_appends_only() {
    let class = sample("Plain");
    let patched = patch::apply(&class, &PatchOp::Add(FieldSpec::serial_version_uid(-7))).unwrap();

    // name, descriptor and attribute name are new Utf8 entries, the Long takes two slots
    assert_eq!(
        patched.constant_pool.count(),
        class.constant_pool.count() + 5
    );
    for (index, constant) in class.constant_pool.iter() {
        assert_eq!(patched.constant_pool.get(index).unwrap(), constant);
    }
    assert_eq!(patched.methods, class.methods);
    assert_eq!(patched.attributes, class.attributes);

    let reparsed = ClassFile::parse(&patched.to_bytes().unwrap()).unwrap();
    assert_eq!(reparsed.field_constant("serialVersionUID").unwrap(), Some(-7));
    let spec = FieldSpec::of(&reparsed, reparsed.fields.len() - 1).unwrap();
    assert_eq!(spec, FieldSpec::serial_version_uid(-7));
    assert_eq!(spec.access_flags, AccessFlags::PRIVATE_STATIC_FINAL);
}

#[test]
fn injected_field_does_not_change_fingerprint() {
    for name in ["Plain", "Account", "Savings", "Unicode"] {
        let class = sample(name);
        let value = fingerprint::fingerprint(&class).unwrap();
        let patched =
            patch::apply(&class, &PatchOp::Add(FieldSpec::serial_version_uid(value.value())))
                .unwrap();
        assert_eq!(fingerprint::fingerprint(&patched).unwrap(), value, "{name}");
    }
}

#[test]
fn add_rejects_duplicates_and_bad_constants() {
    let class = sample("WithUid");
    let duplicate = patch::apply(&class, &PatchOp::Add(FieldSpec::serial_version_uid(1)));
    assert!(matches!(duplicate, Err(Error::InvariantViolation { .. })));

    let mut spec = FieldSpec::serial_version_uid(1);
    spec.name = "other".to_string();
    spec.descriptor = "I".to_string();
    let mismatched = patch::apply(&sample("Plain"), &PatchOp::Add(spec));
    assert!(matches!(mismatched, Err(Error::InvariantViolation { .. })));
}

#[test]
fn replace_existing_constant() {
    let class = sample("WithUid");
    assert_eq!(class.field_constant("serialVersionUID").unwrap(), Some(42));

    let patched = patch::apply(&class, &replace("serialVersionUID", -3688737953058352769)).unwrap();
    assert_eq!(patched.fields.len(), class.fields.len());
    assert_eq!(
        patched.constant_pool.count(),
        class.constant_pool.count() + 2
    );

    let reparsed = ClassFile::parse(&patched.to_bytes().unwrap()).unwrap();
    assert_eq!(
        reparsed.field_constant("serialVersionUID").unwrap(),
        Some(-3688737953058352769)
    );
}

#[test]
fn replace_requires_long_field() {
    let result = patch::apply(&sample("IntUid"), &replace("serialVersionUID", 1));
    assert!(matches!(result, Err(Error::InvariantViolation { .. })));
}

#[test]
fn remove_field() {
    let class = sample("WithUid");
    let patched = patch::apply(
        &class,
        &PatchOp::Remove {
            name: "serialVersionUID".to_string(),
        },
    )
    .unwrap();

    assert_eq!(patched.fields.len(), class.fields.len() - 1);
    assert_eq!(patched.constant_pool, class.constant_pool);
    assert!(patched.find_field("name").unwrap().is_some());
    assert!(matches!(
        patched.field_constant("serialVersionUID"),
        Err(Error::FieldNotFound(_))
    ));

    let reparsed = ClassFile::parse(&patched.to_bytes().unwrap()).unwrap();
    assert_eq!(reparsed, patched);
}

#[test]
fn missing_field() {
    let class = sample("Plain");
    assert!(matches!(
        patch::apply(&class, &replace("serialVersionUID", 1)),
        Err(Error::FieldNotFound(name)) if name == "serialVersionUID"
    ));
    assert!(matches!(
        patch::apply(
            &class,
            &PatchOp::Remove {
                name: "serialVersionUID".to_string()
            }
        ),
        Err(Error::FieldNotFound(_))
    ));
}

#[test]
fn in_place_matches_copy() {
    let class = sample("Account");
    let op = PatchOp::Add(FieldSpec::serial_version_uid(-4182193412286551176));

    let copy = patch::apply(&class, &op).unwrap();
    let mut in_place = class.clone();
    patch::apply_in_place(&mut in_place, &op).unwrap();

    assert_eq!(in_place, copy);
}

#[test]
fn duplicate_name_targets_first_field() {
    let class = sample("WithUid");
    let first = class.find_field("serialVersionUID").unwrap().unwrap();
    let shadow = FieldSpec {
        name: "serialVersionUID".to_string(),
        descriptor: "Ljava/lang/String;".to_string(),
        access_flags: AccessFlags::PRIVATE_STATIC_FINAL,
        constant: None,
    };
    let doubled = patch::apply(&class, &PatchOp::Add(shadow.clone())).unwrap();
    let last = doubled.fields.len() - 1;
    assert!(first < last);

    let replaced = patch::apply(&doubled, &replace("serialVersionUID", 7)).unwrap();
    assert_eq!(replaced.fields.len(), doubled.fields.len());
    assert_eq!(replaced.fields[last], doubled.fields[last]);
    assert_ne!(replaced.fields[first], doubled.fields[first]);
    assert_eq!(replaced.field_constant("serialVersionUID").unwrap(), Some(7));
    assert_eq!(FieldSpec::of(&replaced, last).unwrap(), shadow);

    let removed = patch::apply(
        &doubled,
        &PatchOp::Remove {
            name: "serialVersionUID".to_string(),
        },
    )
    .unwrap();
    assert_eq!(removed.fields.len(), doubled.fields.len() - 1);
    assert_eq!(removed.fields.last(), doubled.fields.last());
    let remaining = removed.find_field("serialVersionUID").unwrap().unwrap();
    assert_eq!(remaining, removed.fields.len() - 1);
    assert_eq!(FieldSpec::of(&removed, remaining).unwrap(), shadow);
}
