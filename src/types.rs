//! Public data types shared by the configuration engine and its
//! collaborators.

use std::fmt::{Display, Formatter};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Opaque identity of a configuration root, for example a local or remote
/// filesystem. One [`crate::SvnConfigFiles`] exists per root.
pub struct ConfigRoot(String);

impl ConfigRoot {
    /// Creates a root identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ConfigRoot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigRoot {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// HTTP proxy settings for one repository host.
pub struct ProxySettings {
    /// Proxy host name. Settings with an empty host are ignored.
    pub host: String,
    /// Proxy port.
    pub port: Option<u16>,
    /// Proxy user name.
    pub username: Option<String>,
    /// Proxy password.
    pub password: Option<String>,
    /// Hosts that bypass the proxy, in `servers` syntax (comma-separated
    /// wildcard patterns).
    pub exceptions: Option<String>,
}

impl ProxySettings {
    /// Creates settings for `host:port` without credentials.
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Adds proxy credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the proxy exception list.
    #[must_use]
    pub fn with_exceptions(mut self, exceptions: impl Into<String>) -> Self {
        self.exceptions = Some(exceptions.into());
        self
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Saved connection settings for one repository URL.
pub struct RepositoryConnection {
    /// The repository URL these settings were saved for.
    pub url: String,
    /// Path of the SSL client certificate (PKCS#12) file.
    pub cert_file: Option<String>,
    /// Passphrase protecting `cert_file`.
    pub cert_passphrase: Option<String>,
}

impl RepositoryConnection {
    /// Creates settings for `url` without a client certificate.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the client certificate file and its passphrase.
    #[must_use]
    pub fn with_client_cert(
        mut self,
        cert_file: impl Into<String>,
        passphrase: Option<String>,
    ) -> Self {
        self.cert_file = Some(cert_file.into());
        self.cert_passphrase = passphrase;
        self
    }
}
