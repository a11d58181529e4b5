use crate::SvnConfigError;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
/// The access scheme of a repository URL.
pub enum UrlKind {
    /// `http://`
    Http,
    /// `https://`
    Https,
    /// `svn://`
    Svn,
    /// `svn+<tunnel>://`, carrying the tunnel name (for example `ssh`).
    Tunnel(String),
    /// `file://`
    File,
}

impl UrlKind {
    /// Whether per-repository `servers` settings apply to this scheme.
    pub fn uses_servers_settings(&self) -> bool {
        matches!(self, Self::Http | Self::Https | Self::Tunnel(_))
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
/// A parsed Subversion repository URL.
///
/// Only the parts the configuration engine needs are kept: scheme, host,
/// port and the normalized URL string.
pub struct RepoUrl {
    kind: UrlKind,
    scheme: String,
    host: String,
    port: Option<u16>,
    url: String,
}

impl RepoUrl {
    /// Parses `http`, `https`, `svn`, `svn+<tunnel>` and `file` URLs.
    ///
    /// # Examples
    ///
    /// ```
    /// # use svn_config::{RepoUrl, UrlKind};
    /// let url = RepoUrl::parse("svn+ssh://alice@example.com/repo").unwrap();
    /// assert_eq!(url.host(), "example.com");
    /// assert_eq!(url.kind(), &UrlKind::Tunnel("ssh".to_string()));
    /// ```
    pub fn parse(input: &str) -> Result<Self, SvnConfigError> {
        let input = input.trim();
        let Some((scheme, rest)) = input.split_once("://") else {
            return Err(SvnConfigError::InvalidUrl(format!(
                "missing scheme in url: {input}"
            )));
        };
        let scheme = scheme.to_ascii_lowercase();
        let kind = match scheme.as_str() {
            "http" => UrlKind::Http,
            "https" => UrlKind::Https,
            "svn" => UrlKind::Svn,
            "file" => UrlKind::File,
            other => match other.strip_prefix("svn+") {
                Some(tunnel) if !tunnel.is_empty() => UrlKind::Tunnel(tunnel.to_string()),
                _ => {
                    return Err(SvnConfigError::InvalidUrl(format!(
                        "unsupported scheme in url: {input}"
                    )));
                }
            },
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        if kind == UrlKind::File {
            return Ok(Self {
                kind,
                url: format!("file://{authority}{path}"),
                scheme,
                host: authority.to_string(),
                port: None,
            });
        }

        let hostport = match authority.rsplit_once('@') {
            Some((user, hostport)) => {
                if user.trim().is_empty() {
                    return Err(SvnConfigError::InvalidUrl(format!(
                        "invalid url (empty username): {input}"
                    )));
                }
                hostport
            }
            None => authority,
        };

        let (host, port) = if let Some(hostport) = hostport.strip_prefix('[') {
            let Some(end) = hostport.find(']') else {
                return Err(SvnConfigError::InvalidUrl(format!("invalid url: {input}")));
            };
            let host = &hostport[..end];
            let after = &hostport[end + 1..];
            let port = if after.is_empty() {
                None
            } else if let Some(port_str) = after.strip_prefix(':') {
                Some(parse_port(port_str, input)?)
            } else {
                return Err(SvnConfigError::InvalidUrl(format!("invalid url: {input}")));
            };
            (host.to_string(), port)
        } else {
            match hostport.matches(':').count() {
                0 => (hostport.to_string(), None),
                1 => {
                    let (h, port_str) = hostport
                        .rsplit_once(':')
                        .ok_or_else(|| SvnConfigError::InvalidUrl(format!("invalid url: {input}")))?;
                    (h.to_string(), Some(parse_port(port_str, input)?))
                }
                _ => {
                    return Err(SvnConfigError::InvalidUrl(
                        "IPv6 addresses must be enclosed in brackets".to_string(),
                    ));
                }
            }
        };

        if host.trim().is_empty() {
            return Err(SvnConfigError::InvalidUrl(format!(
                "missing host in url: {input}"
            )));
        }

        let url = format!("{scheme}://{authority}{path}");
        Ok(Self {
            kind,
            scheme,
            host,
            port,
            url,
        })
    }

    /// The scheme classification.
    pub fn kind(&self) -> &UrlKind {
        &self.kind
    }

    /// The lowercase scheme string, for example `svn+ssh`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host name without any `user@` prefix. IPv6 hosts have no brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, if the URL carried one.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Explicit port, or the scheme's well-known default.
    pub fn port_or_default(&self) -> Option<u16> {
        self.port.or(match &self.kind {
            UrlKind::Http => Some(80),
            UrlKind::Https => Some(443),
            UrlKind::Svn => Some(3690),
            UrlKind::Tunnel(t) if t == "ssh" => Some(22),
            _ => None,
        })
    }

    /// The URL string with a lowercase scheme.
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

fn parse_port(port: &str, input: &str) -> Result<u16, SvnConfigError> {
    port.parse::<u16>()
        .map_err(|_| SvnConfigError::InvalidUrl(format!("invalid port in url: {input}")))
}

impl std::fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

impl std::str::FromStr for RepoUrl {
    type Err = SvnConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
