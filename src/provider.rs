//! Collaborators the configuration engine consults but does not own.

use std::collections::HashMap;

use crate::{ProxySettings, RepoUrl, RepositoryConnection};

/// Source of the platform's network proxy settings.
pub trait ProxyResolver: Send + Sync {
    /// Returns the proxy to use for `url`, or `None` for a direct connection.
    fn proxy_for(&self, url: &RepoUrl) -> Option<ProxySettings>;
}

/// Source of saved per-repository connection settings.
pub trait ConnectionStore: Send + Sync {
    /// Returns the saved settings for `url`, if any.
    fn connection(&self, url: &str) -> Option<RepositoryConnection>;
}

/// A [`ProxyResolver`] that always connects directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProxy;

impl ProxyResolver for NoProxy {
    fn proxy_for(&self, _url: &RepoUrl) -> Option<ProxySettings> {
        None
    }
}

/// A [`ConnectionStore`] without any saved connections.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoConnections;

impl ConnectionStore for NoConnections {
    fn connection(&self, _url: &str) -> Option<RepositoryConnection> {
        None
    }
}

impl<F> ProxyResolver for F
where
    F: Fn(&RepoUrl) -> Option<ProxySettings> + Send + Sync,
{
    fn proxy_for(&self, url: &RepoUrl) -> Option<ProxySettings> {
        self(url)
    }
}

impl ConnectionStore for HashMap<String, RepositoryConnection> {
    fn connection(&self, url: &str) -> Option<RepositoryConnection> {
        self.get(url).cloned()
    }
}

impl ConnectionStore for Vec<RepositoryConnection> {
    fn connection(&self, url: &str) -> Option<RepositoryConnection> {
        self.iter().find(|c| c.url == url).cloned()
    }
}
