// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::key::KeySpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current config file version. Increment when making breaking changes.
const CONFIG_VERSION: u32 = 1;

/// Longest lifetime allowed for a fallback certificate.
pub const MAX_FALLBACK_DAYS: u32 = 365;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config file version for future migration support
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    /// Request the OCSP must-staple extension in CSRs
    #[serde(default)]
    pub must_staple: bool,
    /// Lifetime of self-signed fallback certificates
    #[serde(default = "default_fallback_cert_days")]
    pub fallback_cert_days: u32,
    /// Key type for newly generated private keys
    #[serde(default)]
    pub private_keys: KeySpec,
    #[serde(default)]
    pub files: FileModes,
}

fn default_config_version() -> u32 {
    CONFIG_VERSION
}

/// Permission bits for files written by this crate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileModes {
    #[serde(default = "default_key_mode")]
    pub key_mode: u32,
    #[serde(default = "default_cert_mode")]
    pub cert_mode: u32,
}

impl Default for FileModes {
    fn default() -> Self {
        Self {
            key_mode: default_key_mode(),
            cert_mode: default_cert_mode(),
        }
    }
}

fn default_key_mode() -> u32 {
    0o600
}

fn default_cert_mode() -> u32 {
    0o644
}

fn default_fallback_cert_days() -> u32 {
    14
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            private_keys: KeySpec::Default,
            must_staple: false,
            fallback_cert_days: default_fallback_cert_days(),
            files: FileModes::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| Error::NotFound {
                path: path.to_path_buf(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?
        } else {
            Self::default()
        };

        let migrated = Self::migrate(&mut config);

        // Save migrated config back to disk
        if migrated && path.exists() {
            config.save(path)?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Migrate config from older versions to current version.
    /// Returns true if config was modified.
    fn migrate(config: &mut Self) -> bool {
        if config.config_version >= CONFIG_VERSION {
            return false;
        }

        let mut current_version = config.config_version;
        while current_version < CONFIG_VERSION {
            match current_version {
                0 => {
                    // v0 had no lower bound on the fallback lifetime
                    if config.fallback_cert_days == 0 {
                        config.fallback_cert_days = default_fallback_cert_days();
                    }
                    current_version = 1;
                }
                _ => {
                    tracing::warn!("skipping unknown config version {}", current_version);
                    current_version += 1;
                }
            }
        }

        tracing::debug!(
            from = config.config_version,
            to = CONFIG_VERSION,
            "config migrated"
        );
        config.config_version = CONFIG_VERSION;
        true
    }

    fn validate(&self) -> Result<()> {
        if self.config_version > CONFIG_VERSION {
            tracing::warn!(
                "config version {} is newer than supported version {}; some settings may not be recognized",
                self.config_version,
                CONFIG_VERSION
            );
        }

        if self.private_keys == KeySpec::Unsupported {
            return Err(Error::Config("private_keys: unsupported key type".into()));
        }

        if self.fallback_cert_days == 0 {
            return Err(Error::Config("fallback_cert_days cannot be 0".into()));
        }
        if self.fallback_cert_days > MAX_FALLBACK_DAYS {
            return Err(Error::Config(format!(
                "fallback_cert_days cannot exceed {}",
                MAX_FALLBACK_DAYS
            )));
        }

        if self.files.key_mode > 0o777 {
            return Err(Error::Config(format!(
                "files.key_mode {:o} is not a permission mode",
                self.files.key_mode
            )));
        }
        if self.files.key_mode & 0o077 != 0 {
            return Err(Error::Config(format!(
                "files.key_mode {:o} would expose private keys to other users",
                self.files.key_mode
            )));
        }
        if self.files.cert_mode > 0o777 {
            return Err(Error::Config(format!(
                "files.cert_mode {:o} is not a permission mode",
                self.files.cert_mode
            )));
        }

        Ok(())
    }

    /// How long a self-signed fallback certificate stays valid.
    pub fn fallback_validity(&self) -> time::Duration {
        time::Duration::days(i64::from(self.fallback_cert_days))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        crate::fs::replace_file(path, self.files.cert_mode, content.as_bytes())
    }
}
