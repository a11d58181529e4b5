//! Subversion client configuration and credential-cache files.
//!
//! This crate reads and writes the on-disk state the Subversion command-line
//! client keeps outside a working copy:
//!
//! - the `K <len>` / `V <len>` record files of the `auth/` credential cache
//!   ([`KvFile`], [`CredentialFile`]);
//! - the `servers` and `config` INI files, merged from the per-user and
//!   system-wide locations ([`SvnConfigFiles`]).
//!
//! A tool driving an external `svn` process can keep a private, patched copy
//! of the configuration and point the process at it with `--config-dir`.
//!
//! ## Getting started
//!
//! ```rust,no_run
//! use svn_config::{Collaborators, ConfigOptions, ConfigRegistry, ConfigRoot, lock_files};
//!
//! let registry = ConfigRegistry::with_options(
//!     ConfigOptions::new().with_copy_config_files(true),
//!     Collaborators::new(),
//! );
//! let files = registry.get(&ConfigRoot::new("local"));
//! let mut files = lock_files(&files);
//!
//! if let Some(sensitive) = files.store_servers_settings("https://svn.example.com/repo") {
//!     // run `svn --config-dir <ide dir> ...`, then:
//!     let _ = std::fs::remove_file(sensitive);
//! }
//! println!("{:?}", files.global_ignores());
//! ```
//!
//! ## Failure policy
//!
//! Record files report corruption through [`SvnConfigError`]. Configuration
//! files are best effort: read and write failures are logged with `tracing`,
//! recorded as [`ConfigDiagnostic`]s, and otherwise ignored.
//!
//! ## Features
//!
//! - `serde`: enables `Serialize`/`Deserialize` for public data types.

#![deny(unsafe_code)]

mod cache;
mod config;
mod credential;
mod error;
pub mod hostgroup;
pub mod ini;
pub mod kvfile;
mod options;
mod persist;
mod provider;
mod registry;
mod types;
mod url;

pub use config::{CONFIG, Collaborators, DEFAULT_GLOBAL_IGNORES, SERVERS, SvnConfigFiles};
pub use credential::{CredentialFile, CredentialKind, file_name_for_realm};
pub use error::{ConfigDiagnostic, DiagnosticKind, Loaded, SvnConfigError};
/// Convenience alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, SvnConfigError>;
pub use ini::{IniDocument, IniSection};
pub use kvfile::{KvFile, LENIENT_LENGTH_PARSE, LengthPolicy, RecordKey};
pub use options::{ConfigOptions, DEFAULT_SYSTEM_CONFIG_DIR};
pub use provider::{ConnectionStore, NoConnections, NoProxy, ProxyResolver};
pub use registry::{ConfigRegistry, SharedConfigFiles, lock_files};
pub use types::{ConfigRoot, ProxySettings, RepositoryConnection};
pub use url::{RepoUrl, UrlKind};
