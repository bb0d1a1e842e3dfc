use super::IKVRepo;
use anyhow::{bail, Context};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores every key as `<key>.json` inside a directory.
///
/// Writes go to a temporary file that is renamed over the old one, so a crash
/// mid-write leaves the previous value in place.
pub struct FileKVRepo {
    dir: PathBuf,
}

impl FileKVRepo {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            bail!("Invalid storage key: {:?}", key);
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait::async_trait]
impl IKVRepo for FileKVRepo {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Unable to read {}", path.display())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Unable to create {}", self.dir.display()))?;

        let tmp_path = self
            .dir
            .join(format!("{}.{}.tmp", key, uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp_path, value)
            .await
            .with_context(|| format!("Unable to write {}", tmp_path.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e).with_context(|| format!("Unable to replace {}", path.display()));
        }
        debug!("Persisted {}", path.display());
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Unable to delete {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn it_rejects_keys_that_could_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileKVRepo::new(dir.path());

        assert!(repo.set("../outside", "1").await.is_err());
        assert!(repo.set("", "1").await.is_err());
        assert!(repo.get("a/b").await.is_err());
    }

    #[tokio::test]
    async fn it_creates_the_directory_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("nested").join("state");
        let repo = FileKVRepo::new(&state_dir);

        repo.set("subtrack-settings", "{}").await.unwrap();
        repo.set("subtrack-settings", "{\"a\":1}").await.unwrap();

        let files = std::fs::read_dir(&state_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(files, vec!["subtrack-settings.json".to_string()]);
        assert_eq!(
            std::fs::read_to_string(state_dir.join("subtrack-settings.json")).unwrap(),
            "{\"a\":1}"
        );
    }
}
