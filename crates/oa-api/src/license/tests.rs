//! Unit tests for license file loading.

use std::fs;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

const LICENSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<key xmlns:core="http://parallels.com/schemas/keys/core/3" core:format="openfusion-3">
  <core:key-number>PPAC.00000042.0001</core:key-number>
  <core:product>PA</core:product>
</key>"#;

#[fixture]
fn workdir() -> TempDir {
    TempDir::new().expect("temp dir")
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write license");
    path
}

#[rstest]
fn key_number_is_extracted(workdir: TempDir) {
    let path = write(&workdir, "license.xml", LICENSE);
    let license = LicenseFile::load(&path).expect("license");
    assert_eq!(license.key_number(), "PPAC.00000042.0001");
    assert_eq!(license.content(), LICENSE.as_bytes());
}

#[rstest]
fn missing_file_is_reported(workdir: TempDir) {
    let path = workdir.path().join("absent.xml");
    let error = LicenseFile::load(&path).expect_err("missing");
    assert!(matches!(error, LicenseError::NotFound { .. }));
    assert!(error.to_string().contains("not found"));
}

#[rstest]
fn directories_are_unreadable(workdir: TempDir) {
    let error = LicenseFile::load(workdir.path()).expect_err("directory");
    assert!(matches!(error, LicenseError::Unreadable { .. }));
}

#[rstest]
fn broken_xml_is_a_parse_error(workdir: TempDir) {
    let path = write(&workdir, "broken.xml", "<key><unclosed></key>");
    let error = LicenseFile::load(&path).expect_err("broken");
    assert!(matches!(error, LicenseError::Parse { .. }));
}

#[rstest]
#[case("<key/>")]
#[case("<key><key-number>PPAC.1</key-number></key>")]
#[case(r#"<key xmlns:core="http://parallels.com/schemas/keys/core/3"><core:key-number> </core:key-number></key>"#)]
fn key_number_must_be_namespaced_and_present(workdir: TempDir, #[case] content: &str) {
    let path = write(&workdir, "license.xml", content);
    let error = LicenseFile::load(&path).expect_err("no key number");
    assert!(matches!(error, LicenseError::MissingKeyNumber { .. }));
}
