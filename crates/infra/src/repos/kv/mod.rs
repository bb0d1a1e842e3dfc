mod file;
mod inmemory;

pub use file::FileKVRepo;
pub use inmemory::InMemoryKVRepo;

/// Flat string storage the persisted stores are written to
#[async_trait::async_trait]
pub trait IKVRepo: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}
