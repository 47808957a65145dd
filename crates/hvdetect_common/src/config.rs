//! Detector configuration
//!
//! Config file: ~/.config/hvdetect/config.toml or /etc/hvdetect/config.toml

use crate::evidence::{HostEvidence, DEFAULT_COMMAND_TIMEOUT};
use crate::probes::{HelperCommands, Probe};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the inspected root directory
pub const ROOT_ENV: &str = "HVDETECT_ROOT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Root of the filesystem to inspect
    pub root: PathBuf,

    /// Upper bound for helper commands
    pub command_timeout_secs: u64,

    /// virt-what style helper
    pub what_vm_command: String,

    /// VMware host tools
    pub vmware_command: String,

    /// Probes to skip, by name
    pub disabled_probes: Vec<Probe>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let commands = HelperCommands::default();
        Self {
            root: PathBuf::from("/"),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT.as_secs(),
            what_vm_command: commands.what_vm,
            vmware_command: commands.vmware,
            disabled_probes: Vec::new(),
        }
    }
}

impl DetectorConfig {
    /// Get default user config path: ~/.config/hvdetect/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(Path::new(&config_home).join("hvdetect").join("config.toml"));
        }
        let home = std::env::var("HOME").context("Cannot determine home directory")?;
        Ok(Path::new(&home)
            .join(".config")
            .join("hvdetect")
            .join("config.toml"))
    }

    /// Get system config path: /etc/hvdetect/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/hvdetect/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. `path`, when given (must exist)
    /// 2. User config (~/.config/hvdetect/config.toml)
    /// 3. System config (/etc/hvdetect/config.toml)
    /// 4. Defaults
    ///
    /// `HVDETECT_ROOT` overrides `root` in every case.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::discover()?,
        };

        if let Ok(root) = std::env::var(ROOT_ENV) {
            if !root.is_empty() {
                config.root = PathBuf::from(root);
            }
        }

        Ok(config)
    }

    fn discover() -> Result<Self> {
        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::from_file(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::from_file(&system_path);
        }

        Ok(Self::default())
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn helper_commands(&self) -> HelperCommands {
        HelperCommands {
            what_vm: self.what_vm_command.clone(),
            vmware: self.vmware_command.clone(),
        }
    }

    /// Evidence source for the configured root
    pub fn evidence(&self) -> HostEvidence {
        HostEvidence::with_root(&self.root).command_timeout(self.command_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Evidence;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.root, PathBuf::from("/"));
        assert_eq!(config.command_timeout(), Duration::from_secs(5));
        assert_eq!(config.helper_commands(), HelperCommands::default());
        assert!(config.disabled_probes.is_empty());
    }

    #[test]
    fn test_parse_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "command_timeout_secs = 2\nwhat_vm_command = \"/usr/local/sbin/virt-what\"\ndisabled_probes = [\"vmware\", \"product_name\"]\n",
        )
        .unwrap();

        let config = DetectorConfig::from_file(&path).unwrap();
        assert_eq!(config.command_timeout_secs, 2);
        assert_eq!(config.what_vm_command, "/usr/local/sbin/virt-what");
        assert_eq!(config.vmware_command, "vmware");
        assert_eq!(config.disabled_probes, vec![Probe::Vmware, Probe::ProductName]);
    }

    #[test]
    fn test_unknown_probe_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "disabled_probes = [\"hyperv\"]\n").unwrap();

        let err = DetectorConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = DetectorConfig::from_file(Path::new("/nonexistent/hvdetect.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_foreign_root_disables_commands() {
        let config = DetectorConfig {
            root: PathBuf::from("/mnt/image"),
            ..DetectorConfig::default()
        };
        let evidence = config.evidence();
        assert_eq!(evidence.root(), Path::new("/mnt/image"));
        assert!(evidence.run("sh", &["-c", "true"]).is_err());
    }
}
