//! The `K <len>` / `V <len>` record format of Subversion's auth cache.
//!
//! A file is a sequence of named byte strings:
//!
//! ```text
//! K 15
//! svn:realmstring
//! V 30
//! <https://svn.example.com:443>
//! END
//! ```
//!
//! [`KvFile`] keeps the records in their on-disk order so a file written by
//! the command-line client round-trips unchanged.

mod parse;
mod wire;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::SvnConfigError;
use crate::persist::{write_atomic, write_atomic_async};

pub use parse::{LENIENT_LENGTH_PARSE, LengthPolicy, decode_length};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identity of one record inside a [`KvFile`].
///
/// Keys order by `index` (parse or insertion order) and compare equal only
/// when both `index` and `name` match.
pub struct RecordKey {
    /// Position of the record within its file.
    pub index: u32,
    /// Record name, for example `svn:realmstring`.
    pub name: String,
}

impl RecordKey {
    /// Creates a key.
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// In-memory model of one record file.
#[derive(Clone, Debug)]
pub struct KvFile {
    path: PathBuf,
    records: BTreeMap<RecordKey, Vec<u8>>,
    names: HashMap<String, RecordKey>,
    next_index: u32,
    policy: LengthPolicy,
}

impl KvFile {
    /// Creates an empty file bound to `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
            names: HashMap::new(),
            next_index: 0,
            policy: LENIENT_LENGTH_PARSE,
        }
    }

    /// Opens `path`, decoding its records if the file exists.
    ///
    /// This never fails: a file that cannot be read or decoded is logged and
    /// then behaves like a new, empty file. Its previous content is lost on
    /// the next [`KvFile::store`]. Use [`KvFile::load`] to observe the error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(&path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "discarding unreadable record file");
                Self::new(path)
            }
        }
    }

    /// Loads `path` with [`LENIENT_LENGTH_PARSE`].
    ///
    /// A missing file yields an empty `KvFile`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SvnConfigError> {
        Self::load_with_policy(path, LENIENT_LENGTH_PARSE)
    }

    /// Loads `path`, parsing header lengths according to `policy`.
    pub fn load_with_policy(
        path: impl Into<PathBuf>,
        policy: LengthPolicy,
    ) -> Result<Self, SvnConfigError> {
        let path = path.into();
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        Self::from_bytes(path, &data, policy)
    }

    /// Async variant of [`KvFile::load`] using `tokio::fs`.
    pub async fn load_async(path: impl Into<PathBuf>) -> Result<Self, SvnConfigError> {
        let path = path.into();
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        Self::from_bytes(path, &data, LENIENT_LENGTH_PARSE)
    }

    /// Decodes `data` as the content of `path`.
    ///
    /// Every decoded record gets its own sequential index, so a name that
    /// occurs more than once is kept once per occurrence and the file
    /// re-encodes unchanged. Lookups by name ([`KvFile::get`], [`KvFile::set`],
    /// [`KvFile::key`]) resolve to the last occurrence.
    pub fn from_bytes(
        path: impl Into<PathBuf>,
        data: &[u8],
        policy: LengthPolicy,
    ) -> Result<Self, SvnConfigError> {
        let mut file = Self::new(path);
        file.policy = policy;
        for (name, value) in parse::decode_records(&file.path, data, policy)? {
            file.push(name, value);
        }
        debug!(path = %file.path.display(), records = file.len(), "decoded record file");
        Ok(file)
    }

    /// The file this instance was loaded from (and stores to by default).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The length policy used when this file was decoded.
    pub fn length_policy(&self) -> LengthPolicy {
        self.policy
    }

    /// Returns the canonical key for `name`, interning a new one if needed.
    ///
    /// Repeated calls with the same name return equal keys.
    pub fn key(&mut self, name: &str) -> RecordKey {
        if let Some(key) = self.names.get(name) {
            return key.clone();
        }
        let key = RecordKey::new(self.next_index, name);
        self.next_index += 1;
        self.names.insert(name.to_string(), key.clone());
        key
    }

    /// Returns the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        let key = self.names.get(name)?;
        self.records.get(key).map(Vec::as_slice)
    }

    /// Sets the value stored under `name`, keeping its position if it exists.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<Vec<u8>>) {
        let key = self.key(name.as_ref());
        self.records.insert(key, value.into());
    }

    /// Removes the record named `name`, including earlier duplicates read
    /// from disk. Returns the value of the last occurrence.
    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        let key = self.names.remove(name)?;
        let value = self.records.remove(&key);
        self.records.retain(|k, _| k.name != name);
        value
    }

    fn push(&mut self, name: String, value: Vec<u8>) {
        let key = RecordKey::new(self.next_index, name.as_str());
        self.next_index += 1;
        self.records.insert(key.clone(), value);
        self.names.insert(name, key);
    }

    /// Iterates records in file order.
    pub fn records(&self) -> impl Iterator<Item = (&RecordKey, &[u8])> {
        self.records.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of records holding a value.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record holds a value.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Encodes all records, terminated by the `END` line.
    pub fn to_bytes(&self) -> Vec<u8> {
        wire::encode_records(
            self.records
                .iter()
                .map(|(k, v)| (k.name.as_str(), v.as_slice())),
        )
    }

    /// Writes all records back to [`KvFile::path`], replacing its content.
    pub fn store(&self) -> Result<(), SvnConfigError> {
        self.store_to(&self.path)
    }

    /// Writes all records to `target`, creating parent directories.
    ///
    /// The content is written to a temporary sibling first and renamed over
    /// `target`, so a failed write leaves any previous file intact.
    pub fn store_to(&self, target: impl AsRef<Path>) -> Result<(), SvnConfigError> {
        let target = target.as_ref();
        write_atomic(target, &self.to_bytes()).map_err(|err| {
            warn!(path = %target.display(), error = %err, "failed to store record file");
            SvnConfigError::from(err)
        })
    }

    /// Async variant of [`KvFile::store`] using `tokio::fs`.
    pub async fn store_async(&self) -> Result<(), SvnConfigError> {
        write_atomic_async(&self.path, &self.to_bytes())
            .await
            .map_err(|err| {
                warn!(path = %self.path.display(), error = %err, "failed to store record file");
                SvnConfigError::from(err)
            })
    }
}
