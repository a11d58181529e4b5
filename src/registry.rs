//! Per-root memoisation of [`SvnConfigFiles`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::{Collaborators, ConfigOptions, ConfigRoot, SvnConfigFiles};

type Factory = dyn Fn(&ConfigRoot) -> SvnConfigFiles + Send + Sync;

/// A shared handle to the configuration of one root.
///
/// Access through the handle is serialized; callers that issue several
/// dependent calls (for example `reset` followed by `store_servers_settings`)
/// should hold the lock across them.
pub type SharedConfigFiles = Arc<Mutex<SvnConfigFiles>>;

/// Hands out one [`SvnConfigFiles`] per [`ConfigRoot`], constructing each on
/// first use through an injected factory.
pub struct ConfigRegistry {
    factory: Box<Factory>,
    instances: Mutex<HashMap<ConfigRoot, SharedConfigFiles>>,
}

impl ConfigRegistry {
    /// Creates a registry that builds instances with `factory`.
    pub fn new(factory: impl Fn(&ConfigRoot) -> SvnConfigFiles + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a registry where every root shares `options` and
    /// `collaborators`.
    pub fn with_options(options: ConfigOptions, collaborators: Collaborators) -> Self {
        Self::new(move |root| {
            SvnConfigFiles::new(root.clone(), options.clone(), collaborators.clone())
        })
    }

    /// Returns the instance for `root`, constructing it if needed.
    ///
    /// Construction happens under the registry lock, so concurrent first calls
    /// for the same root build it once.
    pub fn get(&self, root: &ConfigRoot) -> SharedConfigFiles {
        let mut instances = self.lock();
        if let Some(existing) = instances.get(root) {
            return Arc::clone(existing);
        }
        debug!(root = %root, "creating svn configuration");
        let created = Arc::new(Mutex::new((self.factory)(root)));
        instances.insert(root.clone(), Arc::clone(&created));
        created
    }

    /// Drops the cached instance for `root`. Outstanding handles stay valid.
    pub fn remove(&self, root: &ConfigRoot) -> Option<SharedConfigFiles> {
        self.lock().remove(root)
    }

    /// Calls [`SvnConfigFiles::reset`] on every cached instance.
    pub fn reset_all(&self) {
        for instance in self.lock().values() {
            lock_files(instance).reset();
        }
    }

    /// Number of cached roots.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConfigRoot, SharedConfigFiles>> {
        self.instances
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Locks a shared instance, recovering from a poisoned lock.
pub fn lock_files(files: &SharedConfigFiles) -> MutexGuard<'_, SvnConfigFiles> {
    files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("roots", &self.len())
            .finish_non_exhaustive()
    }
}
