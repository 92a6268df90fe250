use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const AWS_VARS: [&str; 8] = [
    "AWS_BUCKET_NAME",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_REGION",
    "AWS_BASE_PREFIX",
    "AWS_ENDPOINT_URL",
    "AWS_PRESIGN_EXPIRY_SECS",
];

/// Command running in `dir` with no bucket configured
fn doc_review(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("doc-review").unwrap();
    cmd.current_dir(dir).env("RUST_LOG", "warn");
    for var in AWS_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn pairs_uses_builtin_sample() {
    let dir = tempfile::tempdir().unwrap();
    doc_review(dir.path())
        .args(["pairs", "B001", "CI"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ver 1 vs 2"));
}

#[test]
fn pairs_warns_on_single_version() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(
        dir.path().join("data/Manual_Review.csv"),
        "Batch,batch_count,portal_status,reason\nB001,1,Pending,\n",
    )
    .unwrap();

    doc_review(dir.path())
        .args(["pairs", "B001", "PL"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not enough versions"));
}

#[test]
fn status_lists_every_batch() {
    let dir = tempfile::tempdir().unwrap();
    doc_review(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("local sample data"))
        .stdout(predicate::str::contains("Documents:   12"))
        .stdout(predicate::str::contains("B003 PL  Ver 1 vs 2"));
}

#[test]
fn demo_pdfs_writes_bucket_layout() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("docs");

    doc_review(dir.path())
        .args(["demo-pdfs", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created 12 sample PDFs"));

    assert!(out.join("CI/B001/B001_1.pdf").is_file());
    assert!(out.join("PL/B003/B003_2.pdf").is_file());
}

#[test]
fn migrate_uploads_to_local_store() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("RB");
    fs::create_dir_all(source.join("BATCH01/CI")).unwrap();
    fs::write(source.join("BATCH01/CI/scan_1.pdf"), b"%PDF-1.5").unwrap();

    doc_review(dir.path())
        .arg("migrate")
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 files uploaded"));

    assert!(dir
        .path()
        .join("static/documents/CI/BATCH01/BATCH01_1.pdf")
        .is_file());
}

#[test]
fn probe_without_bucket_fails() {
    let dir = tempfile::tempdir().unwrap();
    doc_review(dir.path())
        .arg("probe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("S3 bucket name not configured"));
}

#[test]
fn explicit_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    doc_review(dir.path())
        .args(["status", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn config_file_points_at_metadata() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("meta.csv"),
        "Batch,batch_count\nX1,1\nX1,2\nX1,3\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("doc-review.toml"),
        "[paths]\nmetadata = \"meta.csv\"\n",
    )
    .unwrap();

    doc_review(dir.path())
        .args(["pairs", "X1", "CI"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ver 1 vs 2"))
        .stdout(predicate::str::contains("Ver 2 vs 3"))
        .stdout(predicate::str::contains("Ver 1 vs 3"));
}
