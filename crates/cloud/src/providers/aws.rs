//! Amazon Web Services.

use super::Provider;

pub struct Aws;

impl Provider for Aws {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn cli(&self) -> Option<&'static str> {
        Some("aws")
    }

    fn install_hint(&self) -> &'static str {
        "see https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["access_key_id", "secret_access_key"]
    }

    fn env_mapping(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("access_key_id", "AWS_ACCESS_KEY_ID"),
            ("secret_access_key", "AWS_SECRET_ACCESS_KEY"),
            ("region", "AWS_DEFAULT_REGION"),
        ]
    }
}
