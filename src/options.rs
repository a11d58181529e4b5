//! Builder-style options for [`crate::SvnConfigFiles`].

use std::path::{Path, PathBuf};

/// Default location of the system-wide configuration on Unix.
pub const DEFAULT_SYSTEM_CONFIG_DIR: &str = "/etc/subversion";

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Switches and directory overrides for the configuration engine.
///
/// All switches default to off and all directories default to their
/// platform locations.
pub struct ConfigOptions {
    /// Whether the engine maintains a private, patched copy of the
    /// configuration at all. Without it nothing is ever written.
    pub copy_config_files: bool,
    /// Whether proxy settings come from the injected
    /// [`crate::ProxyResolver`] instead of the system `servers` file.
    pub manage_local_proxy: bool,
    /// Never write SSL client certificate passphrases into snapshots.
    pub suppress_passphrase_persistence: bool,
    /// Replaces the per-user configuration directory (`~/.subversion`).
    pub user_config_dir: Option<PathBuf>,
    /// Replaces the private directory patched snapshots are written to.
    pub ide_config_dir: Option<PathBuf>,
    /// Replaces the system configuration directory (`/etc/subversion`).
    pub system_config_dir: Option<PathBuf>,
}

impl ConfigOptions {
    /// Creates options with every switch off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the private configuration copy.
    #[must_use]
    pub fn with_copy_config_files(mut self, enabled: bool) -> Self {
        self.copy_config_files = enabled;
        self
    }

    /// Takes proxy settings from the injected resolver.
    #[must_use]
    pub fn with_manage_local_proxy(mut self, enabled: bool) -> Self {
        self.manage_local_proxy = enabled;
        self
    }

    /// Keeps SSL client certificate passphrases out of written snapshots.
    #[must_use]
    pub fn with_suppress_passphrase_persistence(mut self, enabled: bool) -> Self {
        self.suppress_passphrase_persistence = enabled;
        self
    }

    #[must_use]
    pub fn with_user_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_config_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_ide_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ide_config_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_system_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.system_config_dir = Some(dir.into());
        self
    }

    /// The effective per-user configuration directory.
    ///
    /// `None` only when no override is set and no home directory is known.
    pub fn resolved_user_config_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.user_config_dir {
            return Some(dir.clone());
        }
        default_user_config_dir()
    }

    /// The effective system-wide configuration directory.
    pub fn resolved_system_config_dir(&self) -> PathBuf {
        self.system_config_dir
            .clone()
            .unwrap_or_else(|| Path::new(DEFAULT_SYSTEM_CONFIG_DIR).to_path_buf())
    }
}

#[cfg(windows)]
fn default_user_config_dir() -> Option<PathBuf> {
    std::env::var_os("APPDATA")
        .filter(|s| !s.is_empty())
        .map(|appdata| PathBuf::from(appdata).join("Subversion"))
}

#[cfg(not(windows))]
fn default_user_config_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".subversion"))
}

#[cfg(not(windows))]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}
