use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use tokio::fs;
use zip::ZipArchive;

use crate::error::{CodepromptError, Result};

/// An uploaded project archive opened for entry access.
pub type OpenArchive = ZipArchive<Cursor<Vec<u8>>>;

/// Filesystem store for uploaded ZIP blobs, addressed by filename.
///
/// Saving to an existing filename silently overwrites — one archive per
/// uploaded/fetched project snapshot, no versioning.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    uploads_dir: PathBuf,
}

impl ArchiveStore {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Result<Self> {
        let uploads_dir = uploads_dir.into();
        std::fs::create_dir_all(&uploads_dir)?;
        Ok(Self { uploads_dir })
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Resolve a stored filename, rejecting anything that could escape the
    /// uploads directory.
    fn safe_path(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(CodepromptError::InvalidInput(format!(
                "Invalid archive filename: {}",
                filename
            )));
        }
        Ok(self.uploads_dir.join(filename))
    }

    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<()> {
        let path = self.safe_path(filename)?;
        fs::write(&path, data).await?;
        log::debug!("Stored archive {} ({} bytes)", filename, data.len());
        Ok(())
    }

    pub async fn read(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.safe_path(filename)?;
        if !path.exists() {
            return Err(CodepromptError::NotFound("File not found".to_string()));
        }
        Ok(fs::read(&path).await?)
    }

    pub async fn delete(&self, filename: &str) -> Result<()> {
        let path = self.safe_path(filename)?;
        if !path.exists() {
            return Err(CodepromptError::NotFound("File not found".to_string()));
        }
        fs::remove_file(&path).await?;
        log::debug!("Deleted archive {}", filename);
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.uploads_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Open a ZIP byte buffer for entry access.
pub fn open_archive(data: Vec<u8>) -> Result<OpenArchive> {
    Ok(ZipArchive::new(Cursor::new(data))?)
}

/// List the file entries (directory entries are skipped) in archive order.
pub fn entry_paths(archive: &OpenArchive) -> Vec<String> {
    archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(str::to_string)
        .collect()
}

/// Read one entry decoded as text, or None when the archive has no such
/// entry. Non-UTF8 bytes are replaced rather than failing the read.
pub fn read_entry_text(archive: &mut OpenArchive, path: &str) -> Option<String> {
    let mut entry = archive.by_name(path).ok()?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut cursor);
            let options = SimpleFileOptions::default();
            for (name, content) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    async fn test_store() -> (ArchiveStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ArchiveStore::new(dir.path()).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_save_read_delete() {
        let (store, _dir) = test_store().await;
        let data = zip_bytes(&[("a.txt", "hello")]);

        store.save("proj.zip", &data).await.unwrap();
        let read = store.read("proj.zip").await.unwrap();
        assert_eq!(read, data);

        store.delete("proj.zip").await.unwrap();
        assert!(store.read("proj.zip").await.is_err());
    }

    #[tokio::test]
    async fn test_save_overwrites_silently() {
        let (store, _dir) = test_store().await;
        store.save("p.zip", b"one").await.unwrap();
        store.save("p.zip", b"two").await.unwrap();
        assert_eq!(store.read("p.zip").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let (store, _dir) = test_store().await;
        store.save("b.zip", b"x").await.unwrap();
        store.save("a.zip", b"x").await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["a.zip", "b.zip"]);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.read("../escape.zip").await.is_err());
        assert!(store.save("a/b.zip", b"x").await.is_err());
        assert!(store.save("", b"x").await.is_err());
    }

    #[test]
    fn test_entry_paths_skip_directories() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut cursor);
            let options = SimpleFileOptions::default();
            writer.add_directory("src/", options).unwrap();
            writer.start_file("src/main.rs", options).unwrap();
            writer.write_all(b"fn main() {}").unwrap();
            writer.finish().unwrap();
        }
        let archive = open_archive(cursor.into_inner()).unwrap();
        assert_eq!(entry_paths(&archive), vec!["src/main.rs"]);
    }

    #[test]
    fn test_read_entry_text() {
        let data = zip_bytes(&[("dir/file.txt", "content here")]);
        let mut archive = open_archive(data).unwrap();
        assert_eq!(
            read_entry_text(&mut archive, "dir/file.txt").as_deref(),
            Some("content here")
        );
        assert!(read_entry_text(&mut archive, "nope.txt").is_none());
    }
}
