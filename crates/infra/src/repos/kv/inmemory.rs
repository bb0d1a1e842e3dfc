use super::IKVRepo;
use anyhow::bail;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

pub struct InMemoryKVRepo {
    values: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryKVRepo {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// While failing every write is refused, reads keep working
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_writable(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("In-memory storage is refusing writes");
        }
        Ok(())
    }
}

impl Default for InMemoryKVRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IKVRepo for InMemoryKVRepo {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let values = self.values.lock().unwrap();
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.check_writable()?;
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.check_writable()?;
        let mut values = self.values.lock().unwrap();
        values.remove(key);
        Ok(())
    }
}
