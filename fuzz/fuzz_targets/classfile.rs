#![no_main]

use libfuzzer_sys::fuzz_target;
use serialver::{
    fingerprint,
    patch::{self, FieldSpec, PatchOp},
    ClassFile,
};

fuzz_target!(|data: &[u8]| {
    let Ok(class) = ClassFile::parse(data) else {
        return;
    };

    // anything that parses must write back unchanged
    assert_eq!(class.to_bytes().ok().as_deref(), Some(data));

    let _ = fingerprint::fingerprint(&class);
    if let Ok(patched) = patch::apply(&class, &PatchOp::Add(FieldSpec::serial_version_uid(1))) {
        let _ = patched.to_bytes();
    }
});
