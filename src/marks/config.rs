// SPDX-License-Identifier: MIT

//! Session settings from environment variables and command-line overrides
//!
//! Environment (a `.env` file is honored by the binary):
//! - `CONDMARK_CONDITIONS_FILES` - comma-separated conditions files
//! - `CONDMARK_TESTBED_FILE` - testbed inventory
//! - `CONDMARK_TESTBED` - testbed `conf-name`
//! - `CONDMARK_IGNORE_MARKS` - `1`/`true`/`yes` disables all marks

use std::path::PathBuf;

use crate::engine::error::MarkError;

pub const ENV_CONDITIONS_FILES: &str = "CONDMARK_CONDITIONS_FILES";
pub const ENV_TESTBED_FILE: &str = "CONDMARK_TESTBED_FILE";
pub const ENV_TESTBED: &str = "CONDMARK_TESTBED";
pub const ENV_IGNORE_MARKS: &str = "CONDMARK_IGNORE_MARKS";

/// Resolved settings for a mark session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub conditions_files: Vec<PathBuf>,
    pub testbed_file: Option<PathBuf>,
    pub testbed: Option<String>,
    pub ignore_marks: bool,
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsOverride {
    pub conditions_files: Vec<PathBuf>,
    pub testbed_file: Option<PathBuf>,
    pub testbed: Option<String>,
    pub ignore_marks: bool,
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let conditions_files = non_empty(ENV_CONDITIONS_FILES)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            conditions_files,
            testbed_file: non_empty(ENV_TESTBED_FILE).map(PathBuf::from),
            testbed: non_empty(ENV_TESTBED),
            ignore_marks: non_empty(ENV_IGNORE_MARKS)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Apply command-line values on top of these settings
    pub fn overlay(mut self, cli: SettingsOverride) -> Self {
        if !cli.conditions_files.is_empty() {
            self.conditions_files = cli.conditions_files;
        }
        if cli.testbed_file.is_some() {
            self.testbed_file = cli.testbed_file;
        }
        if cli.testbed.is_some() {
            self.testbed = cli.testbed;
        }
        self.ignore_marks |= cli.ignore_marks;
        self
    }

    /// Check the settings are usable for a lookup
    pub fn validate(&self) -> Result<(), MarkError> {
        if self.conditions_files.is_empty() {
            return Err(MarkError::config(format!(
                "No conditions files given (use --conditions or {})",
                ENV_CONDITIONS_FILES
            )));
        }
        if self.testbed.is_some() && self.testbed_file.is_none() {
            return Err(MarkError::config(format!(
                "A testbed name requires a testbed file (use --testbed-file or {})",
                ENV_TESTBED_FILE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let settings = Settings::from_lookup(lookup_from(&[
            (ENV_CONDITIONS_FILES, "a.yaml, b.yaml,"),
            (ENV_TESTBED_FILE, "testbed.yaml"),
            (ENV_TESTBED, "vms-kvm-t0"),
            (ENV_IGNORE_MARKS, "Yes"),
        ]));
        assert_eq!(
            settings.conditions_files,
            vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")]
        );
        assert_eq!(settings.testbed_file, Some(PathBuf::from("testbed.yaml")));
        assert_eq!(settings.testbed.as_deref(), Some("vms-kvm-t0"));
        assert!(settings.ignore_marks);
    }

    #[test]
    fn test_empty_environment() {
        let settings = Settings::from_lookup(lookup_from(&[(ENV_TESTBED, "  ")]));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_overlay_prefers_cli() {
        let env = Settings::from_lookup(lookup_from(&[
            (ENV_CONDITIONS_FILES, "env.yaml"),
            (ENV_TESTBED, "env-tb"),
        ]));
        let merged = env.overlay(SettingsOverride {
            conditions_files: vec![PathBuf::from("cli.yaml")],
            testbed: None,
            ..Default::default()
        });
        assert_eq!(merged.conditions_files, vec![PathBuf::from("cli.yaml")]);
        assert_eq!(merged.testbed.as_deref(), Some("env-tb"));
        assert!(!merged.ignore_marks);
    }

    #[test]
    fn test_validate() {
        let err = Settings::default().validate().unwrap_err();
        assert!(err.to_string().contains("--conditions"));
        assert!(err.to_string().contains(ENV_CONDITIONS_FILES));

        let settings = Settings {
            conditions_files: vec![PathBuf::from("a.yaml")],
            testbed: Some("tb".to_string()),
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("testbed file"));
    }
}
