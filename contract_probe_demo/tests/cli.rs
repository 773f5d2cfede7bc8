use std::{fs, path::Path, process::Output};

use assert_cmd::Command;
use tempfile::TempDir;

// hardhat/anvil default account #0
const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Config pointing at a port nothing listens on.
fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("probe.toml");
    let artifacts = dir.join("artifacts");
    fs::write(
        &path,
        format!(
            r#"
            [networks.localhost]
            url = "http://127.0.0.1:1"
            chain-id = 31337
            timeout-secs = 10

            [paths]
            artifacts = "{}"
            "#,
            artifacts.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    path
}

fn write_city_artifact(dir: &Path) {
    let source_dir = dir.join("artifacts/contracts_/City.sol");
    fs::create_dir_all(&source_dir).unwrap();
    fs::write(
        source_dir.join("City.json"),
        r#"{
            "_format": "hh-sol-artifact-1",
            "contractName": "City",
            "sourceName": "contracts_/City.sol",
            "abi": [],
            "bytecode": "0x6080",
            "deployedBytecode": "0x6080",
            "linkReferences": {},
            "deployedLinkReferences": {}
        }"#,
    )
    .unwrap();
}

/// Binary run from inside `dir`, so no `.env` above the crate leaks in.
fn demo_in(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("contract_probe_demo").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn run_default(dir: &Path, config: &Path, key: Option<&str>, extra: &[&str]) -> Output {
    let mut cmd = demo_in(dir);
    cmd.arg("--config")
        .arg(config)
        .args(extra)
        .env_remove("RPC_URL")
        .env("RUST_LOG", "error");
    match key {
        Some(key) => cmd.env("PRIVATE_KEY", key),
        None => cmd.env_remove("PRIVATE_KEY"),
    };
    cmd.output().unwrap()
}

#[test]
fn missing_artifact_exits_with_one_before_touching_the_network() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path());

    // no key either: the lookup has to fail first
    let output = run_default(tmp.path(), &config, None, &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("no artifact for contract `City`"), "{stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn unreachable_node_fails_at_deploy() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path());
    write_city_artifact(tmp.path());

    let output = run_default(tmp.path(), &config, Some(DEV_KEY), &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("deploy failed"), "{stderr}");
    assert!(!stderr.contains("owner_address"), "{stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_key_surfaces_when_client_is_built() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path());
    write_city_artifact(tmp.path());

    let output = run_default(tmp.path(), &config, None, &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("no signing account"), "{stderr}");
}

#[test]
fn network_flag_receives_the_env_key() {
    let tmp = TempDir::new().unwrap();
    write_city_artifact(tmp.path());
    let config = tmp.path().join("two.toml");
    fs::write(
        &config,
        format!(
            r#"
            [networks.localhost]
            url = "http://127.0.0.1:1"
            chain-id = 31337

            [networks.dev]
            url = "http://127.0.0.1:1"
            chain-id = 31337
            timeout-secs = 10

            [paths]
            artifacts = "{}"
            "#,
            tmp.path()
                .join("artifacts")
                .display()
                .to_string()
                .replace('\\', "/")
        ),
    )
    .unwrap();

    let output = run_default(tmp.path(), &config, Some(DEV_KEY), &["--network", "dev"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    // the key reached `dev`, so the run gets as far as the deploy
    assert_eq!(output.status.code(), Some(1));
    assert!(!stderr.contains("no signing account"), "{stderr}");
    assert!(stderr.contains("deploy failed"), "{stderr}");
}

#[test]
fn layout_prints_slots() {
    let tmp = TempDir::new().unwrap();
    let ast = tmp.path().join("ast.json");
    fs::write(
        &ast,
        r#"{"nodes": [{
            "nodeType": "ContractDefinition",
            "name": "City",
            "nodes": [
                { "nodeType": "VariableDeclaration", "name": "population",
                  "typeName": { "nodeType": "ElementaryTypeName", "name": "uint256" } },
                { "nodeType": "VariableDeclaration", "name": "owner_address",
                  "typeName": { "nodeType": "ElementaryTypeName", "name": "address" } }
            ]
        }]}"#,
    )
    .unwrap();

    let output = demo_in(tmp.path())
        .arg("layout")
        .arg("--ast")
        .arg(&ast)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Contract: City (2 slots)"), "{stdout}");
    assert!(
        stdout.contains("Variable: owner_address @ slot 1, offset 0, 20 bytes"),
        "{stdout}"
    );
}
