pub mod fingerprint;
pub mod process;
