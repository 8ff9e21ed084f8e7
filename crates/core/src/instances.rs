//! Instance extraction from deployment outputs.
//!
//! Terraform templates are not required to declare their instances in
//! any fixed shape, so extraction is heuristic over the flattened
//! outputs. Two shapes are recognized: object outputs carrying an
//! address-like key, and plain string outputs whose name carries an
//! address-like suffix.

use serde_json::Value;

use crate::config::Config;
use crate::record::{DeploymentRecord, InstanceRef};
use crate::store;

const ADDRESS_KEYS: [&str; 3] = ["ip", "address", "host"];
const ADDRESS_SUFFIXES: [&str; 3] = ["_ip", "_address", "_host"];

/// Extract target instances from one deployment's outputs.
///
/// An object output with an `ip`, `address` or `host` key becomes an
/// instance named after the output; a string output named `web_ip`
/// (or `_address`, `_host`) becomes an instance named `web`. Other
/// outputs are ignored. Inactive deployments yield nothing.
#[must_use]
pub fn extract_instances(record: &DeploymentRecord) -> Vec<InstanceRef> {
    if !record.status.is_active() {
        return Vec::new();
    }
    let Some(outputs) = &record.outputs else {
        return Vec::new();
    };

    let mut instances = Vec::new();
    for (name, value) in outputs {
        match value {
            Value::Object(obj) => {
                let Some(ip) = ADDRESS_KEYS
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(Value::as_str))
                else {
                    continue;
                };
                let id = obj
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                instances.push(InstanceRef {
                    name: name.clone(),
                    ip: ip.to_string(),
                    id,
                    deployment_id: record.id.clone(),
                });
            }
            Value::String(ip) => {
                let Some(stripped) = ADDRESS_SUFFIXES
                    .iter()
                    .find_map(|s| name.strip_suffix(s))
                else {
                    continue;
                };
                instances.push(InstanceRef {
                    name: stripped.to_string(),
                    ip: ip.clone(),
                    id: String::new(),
                    deployment_id: record.id.clone(),
                });
            }
            _ => {}
        }
    }
    instances
}

/// Collect instances across all active deployments, optionally
/// filtered by platform.
#[must_use]
pub fn running_instances(config: &Config, platform: Option<&str>) -> Vec<InstanceRef> {
    let records: Vec<DeploymentRecord> = store::list(&config.deployments_dir);
    records
        .iter()
        .filter(|r| platform.is_none_or(|p| r.platform() == Some(p)))
        .flat_map(extract_instances)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DeployStatus;
    use serde_json::{json, Map};

    fn deployed_record(template: &str, outputs: Value) -> DeploymentRecord {
        let mut record = DeploymentRecord::new("d-1".into(), template.into(), Map::new());
        record.status = DeployStatus::Deployed;
        record.outputs = match outputs {
            Value::Object(m) => Some(m),
            _ => None,
        };
        record
    }

    #[test]
    fn test_object_outputs() {
        let record = deployed_record(
            "aws/vm",
            json!({
                "web": {"ip": "1.2.3.4", "id": "i-9"},
                "db": {"host": "10.0.0.7"},
                "vpc": {"cidr": "10.0.0.0/16"}
            }),
        );
        let mut instances = extract_instances(&record);
        instances.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].name, "db");
        assert_eq!(instances[0].ip, "10.0.0.7");
        assert_eq!(instances[1].id, "i-9");
        assert_eq!(instances[1].deployment_id, "d-1");
    }

    #[test]
    fn test_string_suffix_outputs() {
        let record = deployed_record(
            "gcp/vm",
            json!({
                "web_ip": "1.2.3.4",
                "bastion_host": "9.8.7.6",
                "vpc_id": "vpc-123",
                "region": "us-east-1"
            }),
        );
        let mut names: Vec<String> = extract_instances(&record)
            .into_iter()
            .map(|i| i.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["bastion", "web"]);
    }

    #[test]
    fn test_inactive_deployment_yields_nothing() {
        let mut record = deployed_record("aws/vm", json!({"web_ip": "1.2.3.4"}));
        record.status = DeployStatus::FailedApply;
        assert!(extract_instances(&record).is_empty());

        record.status = DeployStatus::Updated;
        assert_eq!(extract_instances(&record).len(), 1);
    }

    #[test]
    fn test_platform_filter() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            deployments_dir: tmp.path().to_path_buf(),
            ..Config::default()
        };

        for (id, template) in [("d-aws", "aws/vm"), ("d-gcp", "gcp/vm")] {
            let dir = tmp.path().join(id);
            std::fs::create_dir_all(&dir).unwrap();
            let mut record =
                deployed_record(template, json!({"web_ip": format!("ip-{id}")}));
            record.id = id.to_string();
            store::create(&dir, &record).unwrap();
        }

        assert_eq!(running_instances(&config, None).len(), 2);
        let aws = running_instances(&config, Some("aws"));
        assert_eq!(aws.len(), 1);
        assert_eq!(aws[0].deployment_id, "d-aws");
    }
}
