//! Credential files in Subversion's `auth/` cache.

use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::SvnConfigError;
use crate::kvfile::KvFile;

const KEY_ASCII_CERT: &str = "ascii_cert";
const KEY_FAILURES: &str = "failures";
const KEY_REALM: &str = "svn:realmstring";
const KEY_USERNAME: &str = "username";
const KEY_PASSWORD: &str = "password";
const KEY_PASSTYPE: &str = "passtype";

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Which area of the auth cache a credential belongs to.
pub enum CredentialKind {
    /// Accepted server certificates (`svn.ssl.server`).
    SslServer,
    /// Username/password pairs (`svn.simple`).
    Simple,
    /// Usernames only (`svn.username`).
    Username,
}

impl CredentialKind {
    /// Directory name of this area below `auth/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::SslServer => "svn.ssl.server",
            Self::Simple => "svn.simple",
            Self::Username => "svn.username",
        }
    }
}

/// Returns the cache file name for `realm`: the lowercase hex MD5 of its
/// UTF-8 bytes.
pub fn file_name_for_realm(realm: &str) -> String {
    md5_hex(realm.as_bytes())
}

pub(crate) fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// A credential-cache file keyed by its realm string.
#[derive(Clone, Debug)]
pub struct CredentialFile {
    kind: CredentialKind,
    file: KvFile,
}

impl CredentialFile {
    /// Opens the credential file for `realm` below `auth_dir`.
    ///
    /// The file is decoded best effort (see [`KvFile::open`]); a new file gets
    /// its realm string set so it is complete once stored.
    pub fn for_realm(auth_dir: &Path, kind: CredentialKind, realm: &str) -> Self {
        let path = Self::path_for(auth_dir, kind, realm);
        let mut file = KvFile::open(path);
        if file.get(KEY_REALM).is_none() {
            file.set(KEY_REALM, realm);
        }
        Self { kind, file }
    }

    /// Wraps an already loaded record file.
    pub fn from_kv_file(kind: CredentialKind, file: KvFile) -> Self {
        Self { kind, file }
    }

    /// Where the file for `realm` lives below `auth_dir`.
    pub fn path_for(auth_dir: &Path, kind: CredentialKind, realm: &str) -> PathBuf {
        auth_dir
            .join(kind.dir_name())
            .join(file_name_for_realm(realm))
    }

    /// The cache area this file belongs to.
    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// The underlying record file.
    pub fn kv_file(&self) -> &KvFile {
        &self.file
    }

    /// Base64 (PEM body) of the accepted server certificate.
    pub fn cert(&self) -> Option<&[u8]> {
        self.file.get(KEY_ASCII_CERT)
    }

    pub fn set_cert(&mut self, cert: impl Into<Vec<u8>>) {
        self.file.set(KEY_ASCII_CERT, cert);
    }

    /// Bitmask of certificate validation failures the user accepted.
    ///
    /// Returns `None` when absent or not a decimal number.
    pub fn accepted_failures(&self) -> Option<u32> {
        let raw = self.file.get(KEY_FAILURES)?;
        std::str::from_utf8(raw).ok()?.trim().parse().ok()
    }

    pub fn set_accepted_failures(&mut self, failures: u32) {
        self.file.set(KEY_FAILURES, failures.to_string());
    }

    pub fn realm_string(&self) -> Option<String> {
        self.text(KEY_REALM)
    }

    /// Sets the realm string. The file keeps its path; the name is derived
    /// from the realm only when opened through [`CredentialFile::for_realm`].
    pub fn set_realm_string(&mut self, realm: &str) {
        self.file.set(KEY_REALM, realm);
    }

    pub fn username(&self) -> Option<String> {
        self.text(KEY_USERNAME)
    }

    pub fn set_username(&mut self, username: &str) {
        self.file.set(KEY_USERNAME, username);
    }

    pub fn password(&self) -> Option<&[u8]> {
        self.file.get(KEY_PASSWORD)
    }

    pub fn set_password(&mut self, password: impl Into<Vec<u8>>) {
        self.file.set(KEY_PASSWORD, password);
    }

    /// Password storage type, for example `simple`.
    pub fn passtype(&self) -> Option<String> {
        self.text(KEY_PASSTYPE)
    }

    pub fn set_passtype(&mut self, passtype: &str) {
        self.file.set(KEY_PASSTYPE, passtype);
    }

    /// Writes the file back to its path.
    pub fn store(&self) -> Result<(), SvnConfigError> {
        self.file.store()
    }

    fn text(&self, key: &str) -> Option<String> {
        self.file
            .get(key)
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }
}
