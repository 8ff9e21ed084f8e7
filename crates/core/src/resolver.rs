//! XDG-tiered template content resolution.
//!
//! Templates are looked up across four tiers in strict priority
//! order: user config, user data, system, packaged defaults. User
//! customization therefore always shadows system and package content.
//! Within a tier, `category/name` is tried before the bare `name`,
//! and within a path each configured extension is tried in declared
//! order. The first existing file wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Default extension search order.
const DEFAULT_EXTENSIONS: &[&str] = &[".tf", ".yaml", ".yml", ".json"];

/// Templates shipped inside the binary, used when no on-disk tier has
/// a match. Keys carry their extension.
const PACKAGED: &[(&str, &str)] = &[
    (
        "terraform/aws/vpc.tf",
        include_str!("../assets/templates/terraform/aws/vpc.tf"),
    ),
    (
        "terraform/gcp/vpc.tf",
        include_str!("../assets/templates/terraform/gcp/vpc.tf"),
    ),
    (
        "apps/wordpress.yml",
        include_str!("../assets/templates/apps/wordpress.yml"),
    ),
    (
        "apps/lamp.yml",
        include_str!("../assets/templates/apps/lamp.yml"),
    ),
    (
        "apps/nextcloud.yml",
        include_str!("../assets/templates/apps/nextcloud.yml"),
    ),
    (
        "config/stratus.yaml",
        include_str!("../assets/templates/config/stratus.yaml"),
    ),
];

/// Where a resolved template came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceTier {
    /// `$XDG_CONFIG_HOME/stratus/templates`, user customization.
    UserConfig,
    /// `$XDG_DATA_HOME/stratus/templates`, installed templates.
    UserData,
    /// `/usr/local/share/stratus/templates`, system-wide.
    System,
    /// Compiled-in defaults.
    Package,
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserConfig => write!(f, "user_config"),
            Self::UserData => write!(f, "user_data"),
            Self::System => write!(f, "system"),
            Self::Package => write!(f, "package"),
        }
    }
}

/// A successfully resolved template.
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    /// File content.
    pub content: String,
    /// Tier the winning file came from.
    pub source: SourceTier,
    /// On-disk path; `None` for packaged templates.
    pub path: Option<PathBuf>,
}

/// Tiered template resolver.
pub struct TemplateResolver {
    tiers: Vec<(SourceTier, PathBuf)>,
    extensions: Vec<String>,
}

impl TemplateResolver {
    /// Build the resolver from XDG environment variables, falling back
    /// to the conventional home-relative defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/root".to_string());
        let home = Path::new(&home);
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map_or_else(|_| home.join(".config"), PathBuf::from);
        let data_home = std::env::var("XDG_DATA_HOME")
            .map_or_else(|_| home.join(".local").join("share"), PathBuf::from);

        Self::with_tiers(
            config_home.join("stratus").join("templates"),
            data_home.join("stratus").join("templates"),
            PathBuf::from("/usr/local/share/stratus/templates"),
        )
    }

    /// Build a resolver over explicit tier roots.
    #[must_use]
    pub fn with_tiers(user_config: PathBuf, user_data: PathBuf, system: PathBuf) -> Self {
        Self {
            tiers: vec![
                (SourceTier::UserConfig, user_config),
                (SourceTier::UserData, user_data),
                (SourceTier::System, system),
            ],
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Candidate relative paths for a name, category variant first.
    fn path_variants(name: &str, category: Option<&str>) -> Vec<String> {
        match category {
            Some(category) => vec![format!("{category}/{name}"), name.to_string()],
            None => vec![name.to_string()],
        }
    }

    /// Resolve a template to its content, first hit wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateNotFound`] when no candidate exists in
    /// any tier.
    pub fn resolve(&self, name: &str, category: Option<&str>) -> Result<ResolvedTemplate> {
        let variants = Self::path_variants(name, category);

        for (tier, root) in &self.tiers {
            for variant in &variants {
                for ext in &self.extensions {
                    let candidate = root.join(format!("{variant}{ext}"));
                    if candidate.is_file() {
                        return Ok(ResolvedTemplate {
                            content: std::fs::read_to_string(&candidate)?,
                            source: *tier,
                            path: Some(candidate),
                        });
                    }
                }
            }
        }

        for variant in &variants {
            for ext in &self.extensions {
                let key = format!("{variant}{ext}");
                if let Some((_, content)) = PACKAGED.iter().find(|(k, _)| *k == key) {
                    return Ok(ResolvedTemplate {
                        content: (*content).to_string(),
                        source: SourceTier::Package,
                        path: None,
                    });
                }
            }
        }

        Err(Error::TemplateNotFound {
            name: name.to_string(),
            category: category.map(ToString::to_string),
        })
    }

    /// List template names per tier, extension stripped. Tiers are
    /// scanned independently and deliberately not deduplicated: a name
    /// present in several tiers represents an override relationship
    /// the caller may want to display.
    #[must_use]
    pub fn list(&self, category: Option<&str>) -> BTreeMap<SourceTier, Vec<String>> {
        let mut listing = BTreeMap::new();

        for (tier, root) in &self.tiers {
            let scan_root = match category {
                Some(category) => root.join(category),
                None => root.clone(),
            };
            let mut names = Vec::new();
            self.scan_dir(&scan_root, &scan_root, &mut names);
            names.sort();
            listing.insert(*tier, names);
        }

        let mut packaged: Vec<String> = PACKAGED
            .iter()
            .map(|(key, _)| *key)
            .filter_map(|key| match category {
                Some(c) => key.strip_prefix(&format!("{c}/")).map(str::to_string),
                None => Some(key.to_string()),
            })
            .map(|key| self.strip_extension(&key))
            .collect();
        packaged.sort();
        listing.insert(SourceTier::Package, packaged);

        listing
    }

    fn scan_dir(&self, base: &Path, dir: &Path, names: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.filter_map(std::result::Result::ok) {
            let path = entry.path();
            if path.is_dir() {
                self.scan_dir(base, &path, names);
            } else if self
                .extensions
                .iter()
                .any(|ext| path.to_string_lossy().ends_with(ext.as_str()))
            {
                if let Ok(rel) = path.strip_prefix(base) {
                    names.push(self.strip_extension(&rel.to_string_lossy()));
                }
            }
        }
    }

    fn strip_extension(&self, name: &str) -> String {
        for ext in &self.extensions {
            if let Some(stripped) = name.strip_suffix(ext.as_str()) {
                return stripped.to_string();
            }
        }
        name.to_string()
    }

    /// Install content into the user data tier, for `template install`.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be created or written.
    pub fn install(&self, name: &str, category: Option<&str>, content: &str) -> Result<PathBuf> {
        let (_, user_data) = &self.tiers[1];
        let mut dest_dir = user_data.clone();
        if let Some(category) = category {
            dest_dir = dest_dir.join(category);
        }
        std::fs::create_dir_all(&dest_dir)?;

        let file_name = if self.extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            name.to_string()
        } else {
            format!("{name}{}", self.extensions[0])
        };
        let dest = dest_dir.join(file_name);
        std::fs::write(&dest, content)?;
        Ok(dest)
    }

    /// Remove a template from the user tiers only. Returns `true` when
    /// a file was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion itself fails.
    pub fn remove(&self, name: &str, category: Option<&str>) -> Result<bool> {
        let variants = Self::path_variants(name, category);
        for (_, root) in self.tiers.iter().take(2) {
            for variant in &variants {
                for ext in &self.extensions {
                    let candidate = root.join(format!("{variant}{ext}"));
                    if candidate.is_file() {
                        std::fs::remove_file(&candidate)?;
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }
}
