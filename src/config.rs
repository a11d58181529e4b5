//! The `servers`/`config` merge engine.
//!
//! For one configuration root the engine loads the per-user and system-wide
//! `config` and `servers` files, fills keys missing from the user files with
//! the system values, and (in copy mode) keeps a private patched copy that
//! an external `svn` process can be pointed at with `--config-dir`.
//!
//! All file failures are logged and absorbed: the engine always has some,
//! possibly empty, configuration to work with. Absorbed failures are kept in
//! [`SvnConfigFiles::diagnostics`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::RecentUrlCache;
use crate::credential::{CredentialFile, CredentialKind, md5_hex};
use crate::error::{ConfigDiagnostic, DiagnosticKind, Loaded};
use crate::hostgroup::server_group;
use crate::ini::{IniDocument, IniSection};
use crate::provider::{ConnectionStore, NoConnections, NoProxy, ProxyResolver};
use crate::{ConfigOptions, ConfigRoot, RepoUrl, UrlKind};

/// File name of the server settings document.
pub const SERVERS: &str = "servers";
/// File name of the client settings document.
pub const CONFIG: &str = "config";

/// Used when `[miscellany] global-ignores` is absent or blank.
pub const DEFAULT_GLOBAL_IGNORES: &str = "*.o *.lo *.la #*# .*.rej *.rej .*~ *~ .#* .DS_Store";

const GLOBAL_SECTION: &str = "global";
const AUTH_SECTION: &str = "auth";
const MISCELLANY_SECTION: &str = "miscellany";
const TUNNELS_SECTION: &str = "tunnels";

const GLOBAL_IGNORES: &str = "global-ignores";
const SSL_CLIENT_CERT_FILE: &str = "ssl-client-cert-file";
const SSL_CLIENT_CERT_PASSWORD: &str = "ssl-client-cert-password";

const HTTP_PROXY_HOST: &str = "http-proxy-host";
const HTTP_PROXY_PORT: &str = "http-proxy-port";
const HTTP_PROXY_USERNAME: &str = "http-proxy-username";
const HTTP_PROXY_PASSWORD: &str = "http-proxy-password";
const HTTP_PROXY_EXCEPTIONS: &str = "http-proxy-exceptions";

const PROXY_KEYS: [&str; 5] = [
    HTTP_PROXY_HOST,
    HTTP_PROXY_PORT,
    HTTP_PROXY_USERNAME,
    HTTP_PROXY_PASSWORD,
    HTTP_PROXY_EXCEPTIONS,
];

/// Keys forced into `[auth]` of the private `config` copy so the external
/// client never stores passwords on its own.
const AUTH_PATCH: [(&str, &str); 3] = [
    ("store-auth-creds", "yes"),
    ("store-passwords", "no"),
    ("password-stores", ""),
];

fn is_proxy_key(key: &str) -> bool {
    PROXY_KEYS.contains(&key)
}

/// External services the engine consults.
#[derive(Clone)]
pub struct Collaborators {
    proxy: Arc<dyn ProxyResolver>,
    connections: Arc<dyn ConnectionStore>,
}

impl Collaborators {
    /// No proxy and no saved connections.
    pub fn new() -> Self {
        Self {
            proxy: Arc::new(NoProxy),
            connections: Arc::new(NoConnections),
        }
    }

    #[must_use]
    pub fn with_proxy_resolver(mut self, proxy: impl ProxyResolver + 'static) -> Self {
        self.proxy = Arc::new(proxy);
        self
    }

    #[must_use]
    pub fn with_connection_store(mut self, connections: impl ConnectionStore + 'static) -> Self {
        self.connections = Arc::new(connections);
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Merged Subversion configuration for one [`ConfigRoot`].
#[derive(Debug)]
pub struct SvnConfigFiles {
    root: ConfigRoot,
    options: ConfigOptions,
    collaborators: Collaborators,
    config: IniDocument,
    servers: IniDocument,
    recent_url: RecentUrlCache,
    diagnostics: Vec<ConfigDiagnostic>,
}

impl SvnConfigFiles {
    /// Loads and merges the configuration for `root`.
    ///
    /// In copy mode the patched `config` document is written to
    /// [`SvnConfigFiles::ide_config_dir`]; otherwise nothing is written.
    pub fn new(root: ConfigRoot, options: ConfigOptions, collaborators: Collaborators) -> Self {
        let mut this = Self {
            root,
            options,
            collaborators,
            config: IniDocument::new(),
            servers: IniDocument::new(),
            recent_url: RecentUrlCache::default(),
            diagnostics: Vec::new(),
        };

        this.config = this.load_system_ini_file(CONFIG);
        this.servers = this.load_system_ini_file(SERVERS);

        if this.options.copy_config_files {
            patch_auth(&mut this.config);
            this.store_config();
        }
        debug!(root = %this.root, copy = this.options.copy_config_files, "loaded svn configuration");
        this
    }

    /// Loads the user `name` file and fills in keys it lacks from the system
    /// file of the same name. User values always win.
    pub fn load_system_ini_file(&mut self, name: &str) -> IniDocument {
        let mut user = match self.options.resolved_user_config_dir() {
            Some(dir) => self.absorb(IniDocument::load(&dir.join(name))),
            None => {
                debug!(name, "no user configuration directory; starting empty");
                IniDocument::new()
            }
        };
        let system_path = self.options.resolved_system_config_dir().join(name);
        let system = self.absorb(IniDocument::load(&system_path));
        user.merge_missing_from(&system);
        user
    }

    /// The configuration root this instance belongs to.
    pub fn root(&self) -> &ConfigRoot {
        &self.root
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    /// The merged (and, in copy mode, patched) `config` document.
    pub fn config(&self) -> &IniDocument {
        &self.config
    }

    /// The merged `servers` document.
    pub fn servers(&self) -> &IniDocument {
        &self.servers
    }

    /// Failures absorbed so far, oldest first.
    pub fn diagnostics(&self) -> &[ConfigDiagnostic] {
        &self.diagnostics
    }

    /// The per-user configuration directory (`~/.subversion`).
    pub fn user_config_dir(&self) -> Option<PathBuf> {
        self.options.resolved_user_config_dir()
    }

    /// The system-wide configuration directory (`/etc/subversion`).
    pub fn system_config_dir(&self) -> PathBuf {
        self.options.resolved_system_config_dir()
    }

    /// The private directory holding patched snapshots.
    ///
    /// `None` when copy mode is off.
    pub fn ide_config_dir(&self) -> Option<PathBuf> {
        if !self.options.copy_config_files {
            return None;
        }
        Some(self.options.ide_config_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir()
                .join("svn-config")
                .join(md5_hex(self.root.as_str().as_bytes()))
        }))
    }

    /// The `auth/` directory the external client reads cached credentials
    /// from: below the private directory in copy mode, below the user
    /// directory otherwise.
    pub fn auth_dir(&self) -> Option<PathBuf> {
        self.ide_config_dir()
            .or_else(|| self.user_config_dir())
            .map(|dir| dir.join("auth"))
    }

    /// Opens the cached credential for `realm`.
    pub fn credential_file(&self, kind: CredentialKind, realm: &str) -> Option<CredentialFile> {
        let auth = self.auth_dir()?;
        Some(CredentialFile::for_realm(&auth, kind, realm))
    }

    /// Forgets the last repository URL so the next
    /// [`SvnConfigFiles::store_servers_settings`] call rewrites the snapshot.
    pub fn reset(&mut self) {
        debug!(previous = ?self.recent_url.get(), "resetting servers settings cache");
        self.recent_url.invalidate();
    }

    /// Writes the `servers` snapshot for `url` into the private directory.
    ///
    /// Only `http`, `https` and `svn+<tunnel>` URLs are handled, and only in
    /// copy mode. A repeated call for the URL handled last is skipped.
    ///
    /// Returns the snapshot path when it contains an SSL client certificate
    /// passphrase. The caller should delete that file as soon as the external
    /// client has read it; the URL is not cached in that case, so the next call
    /// writes it again.
    pub fn store_servers_settings(&mut self, url: &str) -> Option<PathBuf> {
        if !self.options.copy_config_files {
            return None;
        }
        let url = url.trim();
        let repo = match RepoUrl::parse(url) {
            Ok(repo) => repo,
            Err(err) => {
                warn!(url, error = %err, "cannot derive servers settings");
                self.diagnostics
                    .push(ConfigDiagnostic::new(url, DiagnosticKind::Url, err));
                return None;
            }
        };
        if !repo.kind().uses_servers_settings() {
            return None;
        }
        if self.recent_url.is_current(url) {
            debug!(url, "servers settings already current");
            return None;
        }
        self.recent_url.put(url);

        let (snapshot, has_passphrase) = self.servers_snapshot(url, &repo);
        let dir = self.ide_config_dir()?;
        let stored = self.store_ini(&snapshot, &dir, SERVERS);

        if has_passphrase || stored.is_none() {
            self.recent_url.invalidate();
        }
        if has_passphrase { stored } else { None }
    }

    fn servers_snapshot(&self, url: &str, repo: &RepoUrl) -> (IniDocument, bool) {
        let mut snapshot = IniDocument::new();
        let global = snapshot.section_or_insert(GLOBAL_SECTION);
        let mut has_passphrase = false;

        let group = server_group(&self.servers, repo.host());
        let system_global = self.servers.section(GLOBAL_SECTION);

        if let UrlKind::Tunnel(_) = repo.kind() {
            merge_sections(global, group, system_global, |k| !is_proxy_key(k));
            return (snapshot, false);
        }

        if !self.options.suppress_passphrase_persistence
            && let Some(conn) = self.collaborators.connections.connection(url)
            && let Some(cert_file) = conn.cert_file.as_deref().filter(|f| !f.is_empty())
            && let Some(passphrase) = conn.cert_passphrase.as_deref().filter(|p| !p.is_empty())
        {
            global.set(SSL_CLIENT_CERT_FILE, cert_file);
            global.set(SSL_CLIENT_CERT_PASSWORD, passphrase);
            has_passphrase = true;
        }

        if self.options.manage_local_proxy {
            merge_sections(global, group, system_global, |k| !is_proxy_key(k));
            if let Some(proxy) = self.collaborators.proxy.proxy_for(repo)
                && !proxy.host.trim().is_empty()
            {
                global.set(HTTP_PROXY_HOST, proxy.host.trim());
                if let Some(port) = proxy.port {
                    global.set(HTTP_PROXY_PORT, port.to_string());
                }
                if let Some(username) = proxy.username.filter(|u| !u.is_empty()) {
                    global.set(HTTP_PROXY_USERNAME, username);
                    if let Some(password) = proxy.password {
                        global.set(HTTP_PROXY_PASSWORD, password);
                    }
                }
                if let Some(exceptions) = proxy.exceptions.filter(|e| !e.is_empty()) {
                    global.set(HTTP_PROXY_EXCEPTIONS, exceptions);
                }
            }
        } else {
            merge_sections(global, group, system_global, |_| true);
        }

        (snapshot, has_passphrase)
    }

    /// Whitespace-separated patterns from `[miscellany] global-ignores`.
    pub fn global_ignores(&self) -> Vec<String> {
        let raw = self
            .config
            .get(MISCELLANY_SECTION, GLOBAL_IGNORES)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_GLOBAL_IGNORES);
        raw.split_whitespace().map(str::to_string).collect()
    }

    /// `ssl-client-cert-file` for `host`: its server group first, then
    /// `[global]`.
    pub fn client_cert_file(&self, host: &str) -> Option<&str> {
        self.host_setting(host, SSL_CLIENT_CERT_FILE)
    }

    /// `ssl-client-cert-password` for `host`: its server group first, then
    /// `[global]`.
    pub fn client_cert_password(&self, host: &str) -> Option<&str> {
        self.host_setting(host, SSL_CLIENT_CERT_PASSWORD)
    }

    fn host_setting(&self, host: &str, key: &str) -> Option<&str> {
        server_group(&self.servers, host)
            .and_then(|section| section.get(key))
            .or_else(|| self.servers.get(GLOBAL_SECTION, key))
    }

    /// The command launching tunnel `tunnel` (`[tunnels]` in `config`).
    pub fn external_command(&self, tunnel: &str) -> Option<&str> {
        self.config.get(TUNNELS_SECTION, tunnel)
    }

    /// Sets the command launching tunnel `tunnel`.
    ///
    /// In copy mode the private `config` copy is rewritten immediately.
    pub fn set_external_command(&mut self, tunnel: &str, command: &str) {
        self.config.set(TUNNELS_SECTION, tunnel, command);
        if self.options.copy_config_files {
            self.store_config();
        }
    }

    fn store_config(&mut self) {
        let Some(dir) = self.ide_config_dir() else {
            return;
        };
        let config = std::mem::take(&mut self.config);
        self.store_ini(&config, &dir, CONFIG);
        self.config = config;
    }

    fn store_ini(&mut self, doc: &IniDocument, dir: &Path, name: &str) -> Option<PathBuf> {
        let path = dir.join(name);
        match doc.store(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "stored svn configuration file");
                Some(path)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to store svn configuration file");
                self.diagnostics
                    .push(ConfigDiagnostic::new(&path, DiagnosticKind::Store, err));
                None
            }
        }
    }

    fn absorb<T>(&mut self, loaded: Loaded<T>) -> T {
        if let Some(diagnostic) = loaded.diagnostic {
            self.diagnostics.push(diagnostic);
        }
        loaded.value
    }
}

fn patch_auth(config: &mut IniDocument) {
    let auth = config.section_or_insert(AUTH_SECTION);
    for (key, value) in AUTH_PATCH {
        auth.set(key, value);
    }
}

/// Fills `target` from the host-group section, then from the global one.
/// The more specific section wins because only absent keys are copied.
fn merge_sections(
    target: &mut IniSection,
    group: Option<&IniSection>,
    global: Option<&IniSection>,
    filter: impl Fn(&str) -> bool,
) {
    for source in [group, global].into_iter().flatten() {
        target.merge_missing_from(source, &filter);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{ProxySettings, RepositoryConnection};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Dirs {
        _temp: tempfile::TempDir,
        user: PathBuf,
        system: PathBuf,
        ide: PathBuf,
    }

    fn dirs() -> Dirs {
        let temp = tempfile::tempdir().unwrap();
        let user = temp.path().join("user");
        let system = temp.path().join("etc");
        let ide = temp.path().join("ide");
        std::fs::create_dir_all(&user).unwrap();
        std::fs::create_dir_all(&system).unwrap();
        Dirs {
            _temp: temp,
            user,
            system,
            ide,
        }
    }

    fn options(d: &Dirs, copy: bool) -> ConfigOptions {
        ConfigOptions::new()
            .with_copy_config_files(copy)
            .with_user_config_dir(&d.user)
            .with_system_config_dir(&d.system)
            .with_ide_config_dir(&d.ide)
    }

    fn engine(opts: ConfigOptions, collaborators: Collaborators) -> SvnConfigFiles {
        SvnConfigFiles::new(ConfigRoot::new("local"), opts, collaborators)
    }

    #[test]
    fn user_values_win_and_system_fills_gaps() {
        let d = dirs();
        std::fs::write(d.user.join(CONFIG), "[global]\na = 1\n").unwrap();
        std::fs::write(d.system.join(CONFIG), "[global]\na = 2\nb = 3\n").unwrap();

        let cfg = engine(options(&d, false), Collaborators::new());
        assert_eq!(cfg.config().get("global", "a"), Some("1"));
        assert_eq!(cfg.config().get("global", "b"), Some("3"));
        assert!(cfg.diagnostics().is_empty());
    }

    #[test]
    fn copy_mode_forces_auth_patch_and_writes_private_copy() {
        let d = dirs();
        std::fs::write(
            d.user.join(CONFIG),
            "[auth]\nstore-auth-creds = no\nstore-passwords = yes\n",
        )
        .unwrap();

        let cfg = engine(options(&d, true), Collaborators::new());
        assert_eq!(cfg.config().get(AUTH_SECTION, "store-auth-creds"), Some("yes"));
        assert_eq!(cfg.config().get(AUTH_SECTION, "store-passwords"), Some("no"));
        assert_eq!(cfg.config().get(AUTH_SECTION, "password-stores"), Some(""));

        let written = IniDocument::load(&d.ide.join(CONFIG)).value;
        assert_eq!(written.get(AUTH_SECTION, "store-auth-creds"), Some("yes"));
        // the user's own file is left alone
        let original = std::fs::read_to_string(d.user.join(CONFIG)).unwrap();
        assert!(original.contains("store-auth-creds = no"));
    }

    #[test]
    fn without_copy_mode_nothing_is_written() {
        let d = dirs();
        std::fs::write(d.user.join(CONFIG), "[auth]\nstore-auth-creds = no\n").unwrap();

        let mut cfg = engine(options(&d, false), Collaborators::new());
        assert_eq!(cfg.config().get(AUTH_SECTION, "store-auth-creds"), Some("no"));
        assert!(cfg.ide_config_dir().is_none());
        assert_eq!(cfg.store_servers_settings("https://svn.example.com/r"), None);
        cfg.set_external_command("ssh", "ssh -q");
        assert!(!d.ide.exists());
    }

    #[test]
    fn global_ignores_fall_back_to_default() {
        let d = dirs();
        let cfg = engine(options(&d, false), Collaborators::new());
        assert_eq!(cfg.global_ignores().join(" "), DEFAULT_GLOBAL_IGNORES);

        std::fs::write(d.user.join(CONFIG), "[miscellany]\nglobal-ignores =   \n").unwrap();
        let cfg = engine(options(&d, false), Collaborators::new());
        assert_eq!(cfg.global_ignores().len(), 10);

        std::fs::write(d.user.join(CONFIG), "[miscellany]\nglobal-ignores = target  *.class\n")
            .unwrap();
        let cfg = engine(options(&d, false), Collaborators::new());
        assert_eq!(cfg.global_ignores(), vec!["target", "*.class"]);
    }

    #[test]
    fn client_cert_lookup_prefers_host_group() {
        let d = dirs();
        std::fs::write(
            d.system.join(SERVERS),
            "[groups]\ncorp = *.corp.example\n[corp]\nssl-client-cert-file = /corp.p12\n\
             [global]\nssl-client-cert-file = /global.p12\nssl-client-cert-password = pw\n",
        )
        .unwrap();
        let cfg = engine(options(&d, false), Collaborators::new());
        assert_eq!(cfg.client_cert_file("svn.corp.example"), Some("/corp.p12"));
        assert_eq!(cfg.client_cert_file("other.org"), Some("/global.p12"));
        assert_eq!(cfg.client_cert_password("svn.corp.example"), Some("pw"));
    }

    #[test]
    fn set_external_command_persists_in_copy_mode() {
        let d = dirs();
        let mut cfg = engine(options(&d, true), Collaborators::new());
        assert_eq!(cfg.external_command("ssh"), None);
        cfg.set_external_command("ssh", "ssh -q -o ControlMaster=no");
        assert_eq!(cfg.external_command("ssh"), Some("ssh -q -o ControlMaster=no"));

        let written = IniDocument::load(&d.ide.join(CONFIG)).value;
        assert_eq!(written.get(TUNNELS_SECTION, "ssh"), Some("ssh -q -o ControlMaster=no"));
        assert_eq!(written.get(AUTH_SECTION, "store-auth-creds"), Some("yes"));
    }

    #[test]
    fn non_servers_schemes_are_ignored() {
        let d = dirs();
        let mut cfg = engine(options(&d, true), Collaborators::new());
        assert_eq!(cfg.store_servers_settings("file:///var/svn/repo"), None);
        assert_eq!(cfg.store_servers_settings("svn://svn.example.com/repo"), None);
        assert!(!d.ide.join(SERVERS).exists());
    }

    #[test]
    fn invalid_url_is_recorded_as_diagnostic() {
        let d = dirs();
        let mut cfg = engine(options(&d, true), Collaborators::new());
        assert_eq!(cfg.store_servers_settings("https://host:notaport/r"), None);
        assert_eq!(cfg.diagnostics().len(), 1);
        assert_eq!(cfg.diagnostics()[0].kind, DiagnosticKind::Url);
    }

    #[test]
    fn local_proxy_mode_uses_resolver_and_keeps_non_proxy_keys() {
        let d = dirs();
        std::fs::write(
            d.system.join(SERVERS),
            "[global]\nhttp-proxy-host = system-proxy\nhttp-timeout = 30\n",
        )
        .unwrap();
        let collaborators = Collaborators::new().with_proxy_resolver(|_: &RepoUrl| {
            Some(ProxySettings::new("local-proxy", Some(8080)).with_credentials("bob", "pw"))
        });
        let mut cfg = engine(options(&d, true).with_manage_local_proxy(true), collaborators);

        assert_eq!(cfg.store_servers_settings("https://svn.example.com/r"), None);
        let written = IniDocument::load(&d.ide.join(SERVERS)).value;
        assert_eq!(written.get(GLOBAL_SECTION, HTTP_PROXY_HOST), Some("local-proxy"));
        assert_eq!(written.get(GLOBAL_SECTION, HTTP_PROXY_PORT), Some("8080"));
        assert_eq!(written.get(GLOBAL_SECTION, HTTP_PROXY_USERNAME), Some("bob"));
        assert_eq!(written.get(GLOBAL_SECTION, HTTP_PROXY_PASSWORD), Some("pw"));
        assert_eq!(written.get(GLOBAL_SECTION, "http-timeout"), Some("30"));
    }

    #[test]
    fn full_merge_mode_copies_system_proxy_keys() {
        let d = dirs();
        std::fs::write(
            d.system.join(SERVERS),
            "[groups]\nlan = 192.168.0.*\n[lan]\nhttp-proxy-host = lan-proxy\n\
             [global]\nhttp-proxy-host = wan-proxy\nhttp-proxy-port = 3128\n",
        )
        .unwrap();
        let mut cfg = engine(options(&d, true), Collaborators::new());

        cfg.store_servers_settings("http://192.168.0.5/repo");
        let written = IniDocument::load(&d.ide.join(SERVERS)).value;
        assert_eq!(written.get(GLOBAL_SECTION, HTTP_PROXY_HOST), Some("lan-proxy"));
        assert_eq!(written.get(GLOBAL_SECTION, HTTP_PROXY_PORT), Some("3128"));

        cfg.store_servers_settings("http://other.org/repo");
        let written = IniDocument::load(&d.ide.join(SERVERS)).value;
        assert_eq!(written.get(GLOBAL_SECTION, HTTP_PROXY_HOST), Some("wan-proxy"));
    }

    #[test]
    fn tunnel_urls_get_no_proxy_or_certificate() {
        let d = dirs();
        std::fs::write(
            d.system.join(SERVERS),
            "[global]\nhttp-proxy-host = p\nhttp-timeout = 9\n",
        )
        .unwrap();
        let conns = vec![
            RepositoryConnection::new("svn+ssh://h/r").with_client_cert("/c.p12", Some("x".into())),
        ];
        let mut cfg = engine(
            options(&d, true),
            Collaborators::new().with_connection_store(conns),
        );
        assert_eq!(cfg.store_servers_settings("svn+ssh://h/r"), None);
        let written = IniDocument::load(&d.ide.join(SERVERS)).value;
        assert_eq!(written.get(GLOBAL_SECTION, "http-timeout"), Some("9"));
        assert_eq!(written.get(GLOBAL_SECTION, HTTP_PROXY_HOST), None);
        assert_eq!(written.get(GLOBAL_SECTION, SSL_CLIENT_CERT_FILE), None);
    }

    struct CountingProxy(Arc<AtomicUsize>);

    impl ProxyResolver for CountingProxy {
        fn proxy_for(&self, _url: &RepoUrl) -> Option<ProxySettings> {
            self.0.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    #[test]
    fn same_url_is_not_recomputed_until_reset() {
        let d = dirs();
        let calls = Arc::new(AtomicUsize::new(0));
        let collaborators = Collaborators::new().with_proxy_resolver(CountingProxy(calls.clone()));
        let mut cfg = engine(options(&d, true).with_manage_local_proxy(true), collaborators);

        cfg.store_servers_settings("https://h/r");
        cfg.store_servers_settings("https://h/r");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cfg.reset();
        cfg.store_servers_settings("https://h/r");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cfg.store_servers_settings("https://other/r");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn embedded_passphrase_returns_path_and_invalidates_cache() {
        let d = dirs();
        let calls = Arc::new(AtomicUsize::new(0));
        let conns = vec![
            RepositoryConnection::new("https://h/r").with_client_cert("/me.p12", Some("s3cret".into())),
        ];
        let collaborators = Collaborators::new()
            .with_proxy_resolver(CountingProxy(calls.clone()))
            .with_connection_store(conns);
        let mut cfg = engine(options(&d, true).with_manage_local_proxy(true), collaborators);

        let path = cfg.store_servers_settings("https://h/r").unwrap();
        assert_eq!(path, d.ide.join(SERVERS));
        let written = IniDocument::load(&path).value;
        assert_eq!(written.get(GLOBAL_SECTION, SSL_CLIENT_CERT_FILE), Some("/me.p12"));
        assert_eq!(written.get(GLOBAL_SECTION, SSL_CLIENT_CERT_PASSWORD), Some("s3cret"));

        std::fs::remove_file(&path).unwrap();
        assert!(cfg.store_servers_settings("https://h/r").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(path.exists());
    }

    #[test]
    fn certificate_needs_passphrase_and_no_suppression() {
        let d = dirs();
        let conns = vec![
            RepositoryConnection::new("https://h/r").with_client_cert("/me.p12", None),
            RepositoryConnection::new("https://h/empty").with_client_cert("/me.p12", Some(String::new())),
        ];
        let mut cfg = engine(options(&d, true), Collaborators::new().with_connection_store(conns));

        for url in ["https://h/r", "https://h/empty"] {
            assert_eq!(cfg.store_servers_settings(url), None);
            let written = IniDocument::load(&d.ide.join(SERVERS)).value;
            assert_eq!(written.get(GLOBAL_SECTION, SSL_CLIENT_CERT_FILE), None);
            assert_eq!(written.get(GLOBAL_SECTION, SSL_CLIENT_CERT_PASSWORD), None);
        }
    }

    #[test]
    fn suppressed_passphrase_writes_no_certificate_keys() {
        let d = dirs();
        let conns = vec![
            RepositoryConnection::new("https://h/r").with_client_cert("/me.p12", Some("s3cret".into())),
        ];
        let mut cfg = engine(
            options(&d, true).with_suppress_passphrase_persistence(true),
            Collaborators::new().with_connection_store(conns),
        );
        assert_eq!(cfg.store_servers_settings("https://h/r"), None);
        let written = IniDocument::load(&d.ide.join(SERVERS)).value;
        assert_eq!(written.get(GLOBAL_SECTION, SSL_CLIENT_CERT_FILE), None);
        assert_eq!(written.get(GLOBAL_SECTION, SSL_CLIENT_CERT_PASSWORD), None);
    }

    #[test]
    fn auth_dir_follows_copy_mode() {
        let d = dirs();
        let cfg = engine(options(&d, true), Collaborators::new());
        assert_eq!(cfg.auth_dir(), Some(d.ide.join("auth")));
        let cfg = engine(options(&d, false), Collaborators::new());
        assert_eq!(cfg.auth_dir(), Some(d.user.join("auth")));

        let mut cred = cfg.credential_file(CredentialKind::Simple, "realm").unwrap();
        cred.set_username("alice");
        cred.store().unwrap();
        assert!(
            d.user
                .join("auth")
                .join("svn.simple")
                .join(crate::file_name_for_realm("realm"))
                .exists()
        );
    }

    #[test]
    fn default_ide_dir_is_keyed_by_root() {
        let d = dirs();
        let opts = ConfigOptions::new()
            .with_copy_config_files(true)
            .with_user_config_dir(&d.user)
            .with_system_config_dir(&d.system);
        let a = SvnConfigFiles::new(ConfigRoot::new("a"), opts.clone(), Collaborators::new());
        let b = SvnConfigFiles::new(ConfigRoot::new("b"), opts, Collaborators::new());
        let dir_a = a.ide_config_dir().unwrap();
        assert_ne!(dir_a, b.ide_config_dir().unwrap());
        assert!(dir_a.starts_with(std::env::temp_dir()));
        let _ = std::fs::remove_dir_all(dir_a);
        let _ = std::fs::remove_dir_all(b.ide_config_dir().unwrap());
    }
}
