use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;

static NEXT_TMP_ID: AtomicU64 = AtomicU64::new(0);

/// Writes `bytes` to `dest` through a sibling temporary file that is renamed
/// over `dest` once fully written. Parent directories are created.
///
/// On Unix the file is created with mode `0600`: snapshots and auth-cache
/// files may carry passphrases and passwords.
pub(crate) fn write_atomic(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(dest);

    let result = (|| {
        let mut out = private_options().open(&tmp)?;
        out.write_all(bytes)?;
        out.flush()?;
        out.sync_all()?;
        drop(out);
        replace(&tmp, dest)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

/// Async counterpart of [`write_atomic`] using `tokio::fs`.
pub(crate) async fn write_atomic_async(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = tmp_path(dest);

    let result = async {
        let mut opts = tokio::fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        opts.mode(PRIVATE_MODE);
        let mut out = opts.open(&tmp).await?;
        out.write_all(bytes).await?;
        out.flush().await?;
        out.sync_all().await?;
        drop(out);
        #[cfg(windows)]
        if tokio::fs::try_exists(dest).await.unwrap_or(false) {
            let _ = tokio::fs::remove_file(dest).await;
        }
        tokio::fs::rename(&tmp, dest).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    result
}

#[cfg(unix)]
const PRIVATE_MODE: u32 = 0o600;

fn private_options() -> std::fs::OpenOptions {
    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(PRIVATE_MODE);
    }
    opts
}

fn replace(tmp: &Path, dest: &Path) -> std::io::Result<()> {
    // rename does not replace an existing file on Windows
    #[cfg(windows)]
    if dest.exists() {
        let _ = std::fs::remove_file(dest);
    }
    std::fs::rename(tmp, dest)
}

fn tmp_path(dest: &Path) -> PathBuf {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());

    name.retain(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if name.is_empty() {
        name = "file".to_string();
    }

    let id = NEXT_TMP_ID.fetch_add(1, Ordering::Relaxed);
    parent.join(format!(
        ".svn-config.{name}.{}.{id}.tmp",
        std::process::id()
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn leftover_tmp_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|e| e == "tmp"))
            .collect()
    }

    #[test]
    fn write_atomic_creates_parents_and_replaces_content() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("a").join("b").join("servers");

        write_atomic(&dest, b"first").unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"first");

        write_atomic(&dest, b"second").unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"second");
        assert!(leftover_tmp_files(dest.parent().unwrap()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn written_files_are_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let sync_dest = temp.path().join("servers");
        write_atomic(&sync_dest, b"[global]\nssl-client-cert-password = pw\n").unwrap();
        let async_dest = temp.path().join("auth").join("svn.simple").join("abc");
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(write_atomic_async(&async_dest, b"K 8\npassword\nV 2\npw\nEND\n"))
            .unwrap();

        for dest in [&sync_dest, &async_dest] {
            let mode = std::fs::metadata(dest).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{}", dest.display());
        }
    }

    #[test]
    fn tmp_path_is_a_hidden_sibling_with_sanitized_name() {
        let tmp = tmp_path(Path::new("/x/y/we ird?name"));
        assert_eq!(tmp.parent().unwrap(), Path::new("/x/y"));
        let name = tmp.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(".svn-config.weirdname."));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn write_atomic_async_writes_file() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("nested").join("config");
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(write_atomic_async(&dest, b"[auth]\n"))
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"[auth]\n");
        assert!(leftover_tmp_files(dest.parent().unwrap()).is_empty());
    }
}
