/// A one-entry cache remembering the last repository URL a `servers`
/// snapshot was written for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RecentUrlCache {
    recent: Option<String>,
}

impl RecentUrlCache {
    /// Whether `url` is the cached entry.
    pub(crate) fn is_current(&self, url: &str) -> bool {
        self.recent.as_deref() == Some(url)
    }

    pub(crate) fn put(&mut self, url: impl Into<String>) {
        self.recent = Some(url.into());
    }

    /// Forgets the cached entry so the next write is not skipped.
    pub(crate) fn invalidate(&mut self) {
        self.recent = None;
    }

    pub(crate) fn get(&self) -> Option<&str> {
        self.recent.as_deref()
    }
}
