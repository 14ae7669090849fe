//! Working copy configuration, stored as `config.toml` in the metadata
//! directory.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use arbor_tree::ExtractPolicy;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{SdkError, SdkResult};

pub const AUTHOR: &str = "author";
pub const EMAIL: &str = "email";
pub const COMMITER: &str = "commiter";
pub const COMMITER_EMAIL: &str = "commiter_email";
pub const EXTRACT_POLICY: &str = "extract_policy";

/// Keys accepted by [`Config::set`].
pub const SUPPORTED_KEYS: [&str; 5] = [AUTHOR, EMAIL, COMMITER, COMMITER_EMAIL, EXTRACT_POLICY];

const UNKNOWN: &str = "unknown";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commiter_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_policy: Option<ExtractPolicy>,
}

impl Config {
    /// Load from `path`. A missing file is an empty configuration.
    pub fn load(path: &Path) -> SdkResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text)
                .map_err(|e| SdkError::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to `path` through a temporary file and rename.
    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let text = toml::to_string(self).map_err(|e| SdkError::Config(e.to_string()))?;
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.persist(path).map_err(|e| SdkError::Io(e.error))?;
        Ok(())
    }

    /// The raw configured value of `key`, without defaults.
    pub fn get(&self, key: &str) -> SdkResult<Option<String>> {
        Ok(match key {
            AUTHOR => self.author.clone(),
            EMAIL => self.email.clone(),
            COMMITER => self.commiter.clone(),
            COMMITER_EMAIL => self.commiter_email.clone(),
            EXTRACT_POLICY => self.extract_policy.map(|p| p.to_string()),
            _ => return Err(SdkError::UnsupportedConfig(key.to_string())),
        })
    }

    pub fn set(&mut self, key: &str, value: &str) -> SdkResult<()> {
        let value = value.trim().to_string();
        match key {
            AUTHOR => self.author = Some(value),
            EMAIL => self.email = Some(value),
            COMMITER => self.commiter = Some(value),
            COMMITER_EMAIL => self.commiter_email = Some(value),
            EXTRACT_POLICY => {
                let policy = value.parse().map_err(|reason| SdkError::InvalidConfigValue {
                    key: key.to_string(),
                    reason,
                })?;
                self.extract_policy = Some(policy);
            }
            _ => return Err(SdkError::UnsupportedConfig(key.to_string())),
        }
        Ok(())
    }

    pub fn author(&self) -> String {
        with_default(self.author.as_deref(), "ARBOR_AUTHOR", env_var)
    }

    pub fn email(&self) -> String {
        with_default(self.email.as_deref(), "ARBOR_EMAIL", env_var)
    }

    pub fn commiter(&self) -> String {
        with_default(self.commiter.as_deref(), "ARBOR_COMMITER", env_var)
    }

    pub fn commiter_email(&self) -> String {
        with_default(self.commiter_email.as_deref(), "ARBOR_COMMITER_EMAIL", env_var)
    }

    pub fn extract_policy(&self) -> ExtractPolicy {
        self.extract_policy.unwrap_or_default()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Configured value, else environment variable, else `"unknown"`.
fn with_default(
    value: Option<&str>,
    env_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> String {
    value
        .map(str::to_string)
        .or_else(|| env(env_name).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}
