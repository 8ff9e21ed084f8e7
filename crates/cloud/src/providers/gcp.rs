//! Google Cloud Platform.

use super::Provider;

pub struct Gcp;

impl Provider for Gcp {
    fn name(&self) -> &'static str {
        "gcp"
    }

    fn cli(&self) -> Option<&'static str> {
        Some("gcloud")
    }

    fn install_hint(&self) -> &'static str {
        "see https://cloud.google.com/sdk/docs/install"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["project"]
    }

    fn env_mapping(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("project", "CLOUDSDK_CORE_PROJECT"),
            ("credentials_file", "GOOGLE_APPLICATION_CREDENTIALS"),
            ("region", "CLOUDSDK_COMPUTE_REGION"),
        ]
    }
}
