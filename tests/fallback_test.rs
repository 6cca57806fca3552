mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{clean_env, fixture};
use predicates::prelude::*;
use std::process::Command;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let mut cmd = Command::new(cargo_bin!("payroute"));
    clean_env(&mut cmd);
    cmd.arg("--payouts")
        .arg(fixture("payouts"))
        .arg("--db-path")
        .arg("some_db")
        .arg("list");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."))
        .stdout(predicate::str::contains("pay-usd"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("payroute"));
    clean_env(&mut cmd);
    cmd.arg("--payouts")
        .arg(fixture("payouts"))
        .arg("--db-path")
        .arg(&db_path)
        .arg("list");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not());
}
