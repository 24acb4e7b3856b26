//! On-disk layout of the cache.
//!
//! One file per URL, named after the escaped URL plus a short hash of it.
//! Page content goes to `.html` files, redirect targets to `.redirect` files.
//! A file's modification time is the time its content was fetched.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};

use regex::Regex;

use crate::config::CACHE_MAX_NAME_LEN;
use crate::error_handling::FetchError;

/// Characters that cannot safely appear in a cache filename.
static RESERVED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/"'!?\\&=:]"#).expect("static regex is valid"));

/// Hex digits of the URL hash kept in filenames.
const HASH_LEN: usize = 16;

/// Builds the filename for `url` with extension `ext`.
///
/// The escaped part is cut to `CACHE_MAX_NAME_LEN` bytes; the hash suffix,
/// computed over the full URL, keeps long URLs with a common head apart.
pub(crate) fn file_name(url: &str, ext: &str) -> String {
    let escaped = RESERVED.replace_all(&url.replace("://", "_"), "_").into_owned();
    let mut cut = escaped.len().min(CACHE_MAX_NAME_LEN);
    while !escaped.is_char_boundary(cut) {
        cut -= 1;
    }
    let hash = blake3::hash(url.as_bytes()).to_hex();
    format!("{}_{}.{}", &escaped[..cut], &hash[..HASH_LEN], ext)
}

/// A cached file that is still within the freshness window.
#[derive(Debug)]
pub(crate) struct Entry {
    pub content: Vec<u8>,
    pub stored_at: SystemTime,
}

/// File access for one cache directory.
#[derive(Debug, Clone)]
pub(crate) struct Store {
    dir: PathBuf,
}

impl Store {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn path(&self, url: &str, ext: &str) -> PathBuf {
        self.dir.join(file_name(url, ext))
    }

    /// Reads the entry for `url` if it exists and is younger than `refresh`.
    ///
    /// Stale files are left in place; the sweep removes them once they pass
    /// the retention window.
    pub(crate) async fn read_fresh(
        &self,
        url: &str,
        ext: &str,
        refresh: Duration,
    ) -> Result<Option<Entry>, FetchError> {
        let path = self.path(url, ext);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FetchError::io(&path, e)),
        };
        let stored_at = metadata.modified().map_err(|e| FetchError::io(&path, e))?;
        // A timestamp in the future counts as just stored
        let age = stored_at.elapsed().unwrap_or_default();
        if age >= refresh {
            return Ok(None);
        }
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(Some(Entry { content, stored_at })),
            // Removed by a concurrent sweep
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(FetchError::io(&path, e)),
        }
    }

    /// Writes `content` as the entry for `url`, replacing any previous one.
    pub(crate) async fn write(&self, url: &str, ext: &str, content: &[u8]) -> Result<(), FetchError> {
        let path = self.path(url, ext);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| FetchError::io(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_file_name_escapes_reserved_characters() {
        let name = file_name("http://a.com/p?x=1&y='2'!", "html");
        let (stem, rest) = name.split_at(name.len() - (HASH_LEN + ".html".len()));
        assert_eq!(stem, "http_a.com_p_x_1_y__2___");
        assert!(rest.ends_with(".html"));
        assert!(rest[..HASH_LEN].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_file_name_is_stable_and_distinct() {
        assert_eq!(file_name("http://a.com/x", "html"), file_name("http://a.com/x", "html"));
        // Same escaped form, different URLs
        assert_ne!(file_name("http://a.com/x?", "html"), file_name("http://a.com/x!", "html"));
        assert_ne!(file_name("http://a.com/x", "html"), file_name("http://a.com/x", "redirect"));
    }

    #[test]
    fn test_long_urls_are_truncated() {
        let long = format!("http://a.com/{}", "é".repeat(500));
        let other = format!("{long}/tail");
        let name = file_name(&long, "html");
        assert!(name.len() <= CACHE_MAX_NAME_LEN + 1 + HASH_LEN + ".html".len());
        assert_ne!(name, file_name(&other, "html"));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.write("http://a.com", "html", b"content").await.unwrap();
        let entry = store
            .read_fresh("http://a.com", "html", Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.content, b"content");
        assert!(store
            .read_fresh("http://b.com", "html", Duration::from_secs(60))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_stale_entry_not_served_but_kept() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        store.write("http://a.com", "html", b"old").await.unwrap();
        let path = store.path("http://a.com", "html");
        let two_hours_ago = SystemTime::now() - Duration::from_secs(2 * 3600);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(two_hours_ago)
            .unwrap();

        let entry = store
            .read_fresh("http://a.com", "html", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(entry.is_none());
        assert!(path.exists());
    }
}
