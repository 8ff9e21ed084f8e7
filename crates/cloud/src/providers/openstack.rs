//! OpenStack.

use super::Provider;

pub struct OpenStack;

impl Provider for OpenStack {
    fn name(&self) -> &'static str {
        "openstack"
    }

    fn cli(&self) -> Option<&'static str> {
        Some("openstack")
    }

    fn install_hint(&self) -> &'static str {
        "install the python-openstackclient package"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["auth_url", "username", "password", "project_name"]
    }

    fn env_mapping(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("auth_url", "OS_AUTH_URL"),
            ("username", "OS_USERNAME"),
            ("password", "OS_PASSWORD"),
            ("project_name", "OS_PROJECT_NAME"),
            ("region", "OS_REGION_NAME"),
        ]
    }
}
