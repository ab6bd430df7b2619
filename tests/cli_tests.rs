use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a rirdb command
fn rirdb_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rirdb"))
}

const APNIC: &str = "\
2|apnic|20240101|4|19830613|20231231|+1000
apnic|*|ipv4|*|3|summary
apnic|*|ipv6|*|1|summary
apnic|CN|ipv4|61.5.208.0|1024|20040709|allocated
apnic|CN|ipv4|61.5.212.0|1024|20040709|allocated
apnic|JP|ipv4|1.0.16.0|4096|20110412|allocated
apnic|JP|ipv6|2001:268:2000::|35|20040706|allocated
";

fn write_input(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help() {
    rirdb_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Registry allocation range index builder"))
        .stdout(predicate::str::contains("\n  rirdb build delegated-*-extended-latest -o ranges.json\n"))
        .stdout(predicate::str::contains("\n  rirdb cidr 103.43.155.0 103.43.155.255"));
}

#[test]
fn test_short_help() {
    rirdb_cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build range indexes"))
        .stdout(predicate::str::contains("Registry allocation").not());
}

#[test]
fn test_version() {
    rirdb_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rirdb"));
}

#[test]
fn test_build_help() {
    rirdb_cmd()
        .arg("build")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Build every registry and family index"));
}

#[test]
fn test_build_json() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "delegated-apnic-latest", APNIC);
    let output = dir.path().join("ranges.json");

    rirdb_cmd()
        .arg("build")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Built 3 entries from 4 records"));

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let rows = doc["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["start"], "61.5.208.0");
    assert_eq!(rows[1]["end"], "61.5.215.255");
    assert_eq!(rows[1]["cidr"], "61.5.208.0/21");
    assert_eq!(rows[1]["country"], "CN");
}

#[test]
fn test_build_csv_sequential() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "delegated-apnic-latest", APNIC);
    let output = dir.path().join("ranges.csv");

    rirdb_cmd()
        .args(["build", "--format", "csv", "--sequential", "-j", "2", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success();

    let csv = fs::read_to_string(&output).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "registry,family,start,end,cidr,cidr_exact,blocks,country,country_code,status,status_code"
    );
    assert!(csv.contains("apnic,ipv4,1.0.16.0,1.0.31.255,1.0.16.0/20,true,1.0.16.0/20,JP,"));
    assert_eq!(csv.lines().count(), 4);
}

#[test]
fn test_build_conflicting_duplicates_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "delegated-arin-latest",
        "2|arin|1|2|1|1|-0400\n\
         arin|US|ipv4|10.0.0.0|10|19950601|allocated\n\
         arin|US|ipv4|10.0.0.0|20|19950601|allocated\n",
    );

    rirdb_cmd()
        .arg("build")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Conflicting duplicate"));
}

#[test]
fn test_build_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    rirdb_cmd()
        .arg("build")
        .arg(dir.path().join("does-not-exist"))
        .arg("-o")
        .arg(dir.path().join("out.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist"));
}

#[test]
fn test_build_with_country_table() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "delegated-apnic-latest", APNIC);
    let table = write_input(&dir, "countries.json", r#"["CN", "JP", "ZZ"]"#);
    let output = dir.path().join("ranges.json");

    rirdb_cmd()
        .arg("build")
        .arg(&input)
        .arg("--countries")
        .arg(&table)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["countries"], serde_json::json!(["CN", "JP", "ZZ"]));
    assert_eq!(doc["rows"][0]["country_code"], 1);
}

#[test]
fn test_build_country_missing_from_table_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "delegated-apnic-latest", APNIC);
    let table = write_input(&dir, "countries.json", r#"["CN", "ZZ"]"#);

    rirdb_cmd()
        .arg("build")
        .arg(&input)
        .arg("--countries")
        .arg(&table)
        .arg("-o")
        .arg(dir.path().join("out.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("JP"));
}

#[test]
fn test_lookup_found() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "delegated-apnic-latest", APNIC);

    rirdb_cmd()
        .args(["lookup", "61.5.215.255", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"country\": \"CN\""))
        .stdout(predicate::str::contains("\"start\": \"61.5.208.0\""));
}

#[test]
fn test_lookup_ipv6() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "delegated-apnic-latest", APNIC);

    rirdb_cmd()
        .args(["lookup", "2001:268:3fff::1", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2001:268:2000::/35"));
}

#[test]
fn test_lookup_not_found() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "delegated-apnic-latest", APNIC);

    rirdb_cmd()
        .args(["lookup", "61.5.216.0", "-i"])
        .arg(&input)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_lookup_quiet() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "delegated-apnic-latest", APNIC);

    rirdb_cmd()
        .args(["lookup", "1.0.20.1", "--quiet", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_lookup_malformed_address() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "delegated-apnic-latest", APNIC);

    rirdb_cmd()
        .args(["lookup", "61.5.256.0", "-i"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed"));
}

#[test]
fn test_cidr_exact_block() {
    rirdb_cmd()
        .args(["cidr", "103.43.155.0", "103.43.155.255"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cidr\": \"103.43.155.0/24\""))
        .stdout(predicate::str::contains("\"exact\": true"))
        .stdout(predicate::str::contains("\"class\": \"A\""))
        .stdout(predicate::str::contains("\"default_mask\": \"255.0.0.0\""));
}

#[test]
fn test_cidr_decomposition() {
    rirdb_cmd()
        .args(["cidr", "10.0.0.0", "10.0.0.9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"exact\": false"))
        .stdout(predicate::str::contains("\"10.0.0.0/29\""))
        .stdout(predicate::str::contains("\"10.0.0.8/31\""));
}

#[test]
fn test_cidr_mixed_families_fails() {
    rirdb_cmd()
        .args(["cidr", "10.0.0.0", "2001:db8::"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("different address families"));
}
