//! Staging of deployment working directories.
//!
//! Preparing a deployment copies the template content into a fresh
//! per-deployment directory, renders the variable file, and writes the
//! initial record. Nothing here runs external tools; the drivers pick
//! up from the staged directory.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::Config;
use crate::manifest::{self, AppManifest, Parameter, MANIFEST_FILE};
use crate::record::{AppRecord, DeploymentRecord, InstanceRef};
use crate::store;
use crate::{Error, Result};

/// Name of the rendered terraform variable file.
pub const TFVARS_FILE: &str = "terraform.tfvars";

/// A staged infrastructure deployment.
#[derive(Debug)]
pub struct Prepared {
    pub record: DeploymentRecord,
    pub dir: PathBuf,
}

/// A staged application deployment.
#[derive(Debug)]
pub struct PreparedApp {
    pub record: AppRecord,
    pub dir: PathBuf,
}

/// Merge given parameters against the declared ones.
///
/// Declared parameters missing from `given` take their default when
/// one exists. Required parameters with neither a value nor a default
/// are collected and reported together, so the operator sees the full
/// list in one pass instead of one error per retry.
pub fn validate_params(
    declared: &[Parameter],
    given: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut merged = given.clone();
    let mut missing = Vec::new();

    for param in declared {
        if merged.contains_key(&param.name) {
            continue;
        }
        match (&param.default, param.required) {
            (Some(default), _) => {
                merged.insert(param.name.clone(), default.clone());
            }
            (None, true) => missing.push(param.name.clone()),
            (None, false) => {}
        }
    }

    if missing.is_empty() {
        Ok(merged)
    } else {
        Err(Error::MissingParameters(missing))
    }
}

/// Stage an infrastructure deployment from a template.
///
/// # Errors
///
/// Returns `TemplateNotFound` when the template has no manifest,
/// `MissingParameters` when validation fails, and I/O errors from
/// staging the directory.
pub fn prepare(
    config: &Config,
    template_path: &str,
    params: &Map<String, Value>,
) -> Result<Prepared> {
    let manifest =
        manifest::template_info(config, template_path).ok_or_else(|| Error::TemplateNotFound {
            name: template_path.to_string(),
            category: None,
        })?;
    let merged = validate_params(&manifest.parameters, params)?;

    let id = Uuid::new_v4().to_string();
    let dir = config.deployments_dir.join(&id);
    std::fs::create_dir_all(&dir)?;

    copy_contents(&manifest::template_dir(config, template_path), &dir)?;
    write_tfvars(&dir, &merged)?;

    let record = DeploymentRecord::new(id, template_path.to_string(), merged);
    store::create(&dir, &record)?;

    Ok(Prepared { record, dir })
}

/// Stage an application deployment against a target instance.
///
/// Docker applications additionally get a `.env` file rendered from
/// the merged parameters; ansible applications receive theirs as extra
/// vars at install time.
///
/// # Errors
///
/// Returns `MissingParameters` when validation fails and I/O errors
/// from staging the directory.
pub fn prepare_app(
    config: &Config,
    app: &AppManifest,
    instance: InstanceRef,
    platform: &str,
    params: &Map<String, Value>,
) -> Result<PreparedApp> {
    let merged = validate_params(&app.parameters, params)?;

    let id = format!("app-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let dir = config.app_deployments_dir.join(&id);
    std::fs::create_dir_all(&dir)?;

    // Demo catalog apps have no directory on disk; their packaged
    // content is staged at install time instead.
    let source = manifest::app_dir(config, app);
    if source.is_dir() {
        copy_contents(&source, &dir)?;
    }

    if app.kind == crate::record::AppKind::Docker {
        write_env_file(&dir, &merged)?;
    }

    let record = AppRecord::new(
        id,
        app.name.clone(),
        app.kind,
        platform.to_string(),
        instance,
        merged,
    );
    store::create(&dir, &record)?;

    Ok(PreparedApp { record, dir })
}

/// Recursively copy directory contents, skipping manifests.
fn copy_contents(from: &Path, to: &Path) -> Result<()> {
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let src = entry.path();
        let name = entry.file_name();
        if name.to_string_lossy() == MANIFEST_FILE {
            continue;
        }
        let dst = to.join(&name);
        if src.is_dir() {
            std::fs::create_dir_all(&dst)?;
            copy_contents(&src, &dst)?;
        } else {
            std::fs::copy(&src, &dst)?;
        }
    }
    Ok(())
}

/// Render `terraform.tfvars` from the merged parameters.
///
/// Strings are quoted and escaped; booleans and numbers are written
/// literally; lists and maps are written in JSON form, which HCL2
/// accepts for collection values.
fn write_tfvars(dir: &Path, params: &Map<String, Value>) -> Result<()> {
    let mut out = String::new();
    for (key, value) in params {
        out.push_str(&format!("{key} = {}\n", hcl_value(value)));
    }
    std::fs::write(dir.join(TFVARS_FILE), out)?;
    Ok(())
}

fn hcl_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}

/// Render a docker `.env` file from the merged parameters. Keys are
/// upper-cased to match compose conventions.
fn write_env_file(dir: &Path, params: &Map<String, Value>) -> Result<()> {
    let mut out = String::new();
    for (key, value) in params {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push_str(&format!("{}={rendered}\n", key.to_uppercase()));
    }
    std::fs::write(dir.join(".env"), out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AppKind, AppStatus, DeployStatus};
    use serde_json::json;

    fn param(name: &str, default: Option<Value>, required: bool) -> Parameter {
        Parameter {
            name: name.to_string(),
            description: String::new(),
            default,
            required,
        }
    }

    fn test_config(root: &Path) -> Config {
        Config {
            templates_dir: root.join("templates"),
            deployments_dir: root.join("deployments"),
            app_deployments_dir: root.join("app_deployments"),
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_fills_defaults() {
        let declared = vec![
            param("region", Some(json!("us-east-1")), false),
            param("count", Some(json!(2)), false),
        ];
        let merged = validate_params(&declared, &Map::new()).unwrap();
        assert_eq!(merged["region"], "us-east-1");
        assert_eq!(merged["count"], 2);
    }

    #[test]
    fn test_validate_reports_all_missing_at_once() {
        let declared = vec![
            param("a", None, true),
            param("b", Some(json!("x")), true),
            param("c", None, true),
        ];
        let err = validate_params(&declared, &Map::new()).unwrap_err();
        assert_eq!(err.to_string(), "missing required parameters: a, c");
        match err {
            Error::MissingParameters(names) => assert_eq!(names, vec!["a", "c"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_given_wins_over_default() {
        let declared = vec![param("region", Some(json!("us-east-1")), false)];
        let mut given = Map::new();
        given.insert("region".to_string(), json!("eu-west-1"));
        let merged = validate_params(&declared, &given).unwrap();
        assert_eq!(merged["region"], "eu-west-1");
    }

    #[test]
    fn test_prepare_stages_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());

        let template = config.terraform_templates_dir().join("aws/vpc");
        std::fs::create_dir_all(&template).unwrap();
        std::fs::write(template.join("main.tf"), "# tf").unwrap();
        std::fs::write(
            template.join(MANIFEST_FILE),
            "name: VPC\nprovider: aws\nparameters:\n  - name: cidr\n    default: 10.0.0.0/16\n",
        )
        .unwrap();

        let prepared = prepare(&config, "aws/vpc", &Map::new()).unwrap();
        assert_eq!(prepared.record.status, DeployStatus::Prepared);
        assert!(prepared.dir.join("main.tf").is_file());
        assert!(!prepared.dir.join(MANIFEST_FILE).exists());

        let tfvars = std::fs::read_to_string(prepared.dir.join(TFVARS_FILE)).unwrap();
        assert_eq!(tfvars, "cidr = \"10.0.0.0/16\"\n");

        let stored: DeploymentRecord = store::read(&prepared.dir).unwrap().unwrap();
        assert_eq!(stored.id, prepared.record.id);
        assert_eq!(stored.template, "aws/vpc");
    }

    #[test]
    fn test_prepare_unknown_template() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let err = prepare(&config, "aws/nope", &Map::new()).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound { .. }));
    }

    #[test]
    fn test_tfvars_value_forms() {
        assert_eq!(hcl_value(&json!("plain")), "\"plain\"");
        assert_eq!(hcl_value(&json!("say \"hi\"")), "\"say \\\"hi\\\"\"");
        assert_eq!(hcl_value(&json!(3)), "3");
        assert_eq!(hcl_value(&json!(true)), "true");
        assert_eq!(hcl_value(&json!(["a", "b"])), "[\"a\",\"b\"]");
    }

    #[test]
    fn test_prepare_app_docker_env() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());

        let app = AppManifest {
            name: "Nextcloud".to_string(),
            kind: AppKind::Docker,
            description: String::new(),
            platforms: vec!["aws".to_string()],
            parameters: vec![param("data_dir", Some(json!("/srv/nextcloud")), false)],
        };
        let instance = InstanceRef {
            name: "web".to_string(),
            ip: "10.0.0.5".to_string(),
            id: String::new(),
            deployment_id: "d-1".to_string(),
        };

        let prepared = prepare_app(&config, &app, instance, "aws", &Map::new()).unwrap();
        assert!(prepared.record.id.starts_with("app-"));
        assert_eq!(prepared.record.status, AppStatus::Prepared);

        let env = std::fs::read_to_string(prepared.dir.join(".env")).unwrap();
        assert_eq!(env, "DATA_DIR=/srv/nextcloud\n");
    }
}
