//! End-to-end driver chains against stub executables.
//!
//! The stubs append the invoked subcommand to `phases.log` inside the
//! working directory, so each test can assert both the final record
//! state and the exact sequence of tool invocations.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde_json::Map;

use stratus_core::config::Config;
use stratus_core::driver::{
    self, AnsibleDriver, DockerDriver, TerraformDriver, ToolDriver,
};
use stratus_core::record::{
    AppKind, AppRecord, AppStatus, DeployStatus, DeploymentRecord, InstanceRef,
};
use stratus_core::{store, Error};

fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!("#!/bin/sh\n[ \"$1\" = \"--version\" ] && exit 0\n{body}");
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

const TERRAFORM_OK: &str = r#"echo "$1" >> phases.log
case "$1" in
  plan) echo "Plan: 2 to add, 0 to change, 0 to destroy." ;;
  output) printf '%s' '{"web":{"value":{"ip":"1.2.3.4","id":"i-42"}},"vpc_id":{"value":"vpc-1"}}' ;;
esac
exit 0
"#;

fn staged_deployment(root: &Path) -> PathBuf {
    let dir = root.join("deployment");
    std::fs::create_dir_all(&dir).unwrap();
    let record = DeploymentRecord::new("d-1".into(), "aws/vpc".into(), Map::new());
    store::create(&dir, &record).unwrap();
    dir
}

fn phases(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("phases.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn terraform_config(stub: &Path) -> Config {
    Config {
        terraform_path: stub.to_string_lossy().into_owned(),
        ..Config::default()
    }
}

#[test]
fn deploy_runs_full_chain_and_captures_outputs() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(tmp.path(), "terraform", TERRAFORM_OK);
    let dir = staged_deployment(tmp.path());
    let driver = TerraformDriver::new(&terraform_config(&stub));

    let mut seen_plan = String::new();
    let record = driver::deploy(&dir, &driver, |plan| {
        seen_plan = plan.to_string();
        true
    })
    .unwrap();

    assert_eq!(record.status, DeployStatus::Deployed);
    assert!(record.deployed_at.is_some());
    assert!(seen_plan.contains("Plan: 2 to add"));

    let outputs = record.outputs.unwrap();
    assert_eq!(outputs["vpc_id"], "vpc-1");
    assert_eq!(outputs["web"]["ip"], "1.2.3.4");

    assert_eq!(phases(&dir), vec!["init", "plan", "apply", "output"]);
}

#[test]
fn failed_plan_stops_before_apply() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(
        tmp.path(),
        "terraform",
        "echo \"$1\" >> phases.log\nif [ \"$1\" = plan ]; then echo 'provider quota exceeded' >&2; exit 1; fi\nexit 0\n",
    );
    let dir = staged_deployment(tmp.path());
    let driver = TerraformDriver::new(&terraform_config(&stub));

    let err = driver::deploy(&dir, &driver, |_| true).unwrap_err();
    match err {
        Error::Tool { stderr, .. } => assert!(stderr.contains("quota exceeded")),
        other => panic!("unexpected error: {other}"),
    }

    let record: DeploymentRecord = store::read(&dir).unwrap().unwrap();
    assert_eq!(record.status, DeployStatus::FailedPlan);
    assert_eq!(phases(&dir), vec!["init", "plan"]);
}

#[test]
fn declined_plan_cancels_without_applying() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(tmp.path(), "terraform", TERRAFORM_OK);
    let dir = staged_deployment(tmp.path());
    let driver = TerraformDriver::new(&terraform_config(&stub));

    let err = driver::deploy(&dir, &driver, |_| false).unwrap_err();
    assert!(matches!(err, Error::Cancelled));

    let record: DeploymentRecord = store::read(&dir).unwrap().unwrap();
    assert_eq!(record.status, DeployStatus::Cancelled);
    assert_eq!(phases(&dir), vec!["init", "plan"]);
}

#[test]
fn destroy_transitions_to_destroyed() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(tmp.path(), "terraform", TERRAFORM_OK);
    let dir = staged_deployment(tmp.path());
    let driver = TerraformDriver::new(&terraform_config(&stub));

    let record = driver::destroy(&dir, &driver).unwrap();
    assert_eq!(record.status, DeployStatus::Destroyed);
    assert_eq!(phases(&dir), vec!["destroy"]);
}

fn staged_app(root: &Path, kind: AppKind) -> PathBuf {
    let dir = root.join("app");
    std::fs::create_dir_all(&dir).unwrap();
    let record = AppRecord::new(
        "app-0badcafe".into(),
        "WordPress".into(),
        kind,
        "aws".into(),
        InstanceRef {
            name: "web".into(),
            ip: "1.2.3.4".into(),
            id: String::new(),
            deployment_id: "d-1".into(),
        },
        Map::new(),
    );
    store::create(&dir, &record).unwrap();
    dir
}

#[test]
fn ansible_install_passes_inventory_and_extra_vars() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(tmp.path(), "ansible-playbook", "echo \"$@\" >> phases.log\nexit 0\n");
    let dir = staged_app(tmp.path(), AppKind::Ansible);

    let config = Config {
        ansible_path: stub.to_string_lossy().into_owned(),
        ..Config::default()
    };
    let inventory = tmp.path().join("hosts.ini");
    std::fs::write(&inventory, "[target]\n1.2.3.4\n").unwrap();
    let driver = AnsibleDriver::new(
        &config,
        "install.yml".into(),
        inventory.clone(),
        Some(r#"{"domain":"example.org"}"#.into()),
    );

    let record = driver::install_app(&dir, &driver).unwrap();
    assert_eq!(record.status, AppStatus::Installed);
    assert!(record.installed_at.is_some());

    let log = phases(&dir).join(" ");
    assert!(log.starts_with("install.yml -i "));
    assert!(log.contains(&inventory.to_string_lossy().into_owned()));
    assert!(log.contains(r#"-e {"domain":"example.org"}"#));
}

#[test]
fn failed_install_marks_record() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(
        tmp.path(),
        "ansible-playbook",
        "echo 'unreachable host' >&2\nexit 4\n",
    );
    let dir = staged_app(tmp.path(), AppKind::Ansible);

    let config = Config {
        ansible_path: stub.to_string_lossy().into_owned(),
        ..Config::default()
    };
    let driver = AnsibleDriver::new(&config, "install.yml".into(), tmp.path().join("h"), None);

    let err = driver::install_app(&dir, &driver).unwrap_err();
    assert!(matches!(err, Error::Tool { .. }));

    let record: AppRecord = store::read(&dir).unwrap().unwrap();
    assert_eq!(record.status, AppStatus::Failed);
}

#[test]
fn docker_uninstall_tears_down_compose() {
    let tmp = tempfile::tempdir().unwrap();
    let stub = write_stub(tmp.path(), "docker", "echo \"$@\" >> phases.log\nexit 0\n");
    let dir = staged_app(tmp.path(), AppKind::Docker);

    let config = Config {
        docker_path: stub.to_string_lossy().into_owned(),
        ..Config::default()
    };
    let driver = DockerDriver::new(&config);

    let record = driver::uninstall_app(&dir, Some(&driver as &dyn ToolDriver)).unwrap();
    assert_eq!(record.status, AppStatus::Uninstalled);
    assert!(record.uninstalled_at.is_some());
    assert_eq!(phases(&dir), vec!["compose down -v"]);
}

#[test]
fn uninstall_without_procedure_transitions_directly() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = staged_app(tmp.path(), AppKind::Ansible);

    let record = driver::uninstall_app(&dir, None).unwrap();
    assert_eq!(record.status, AppStatus::Uninstalled);
    assert!(!dir.join("phases.log").exists());
}
