//! Enabled-set store with switchable write failures.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ext_manager::{EnabledStore, Error, MemoryEnabledStore, Result};

/// A [`MemoryEnabledStore`] whose writes fail while `fail_writes` is set.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryEnabledStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            inner: MemoryEnabledStore::new(ids.iter().copied()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.inner.snapshot()
    }
}

#[async_trait]
impl EnabledStore for FlakyStore {
    async fn enabled_ids(&self) -> Result<Vec<String>> {
        self.inner.enabled_ids().await
    }

    async fn set_enabled_ids(&self, ids: &[String]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence {
                message: "disk full".to_string(),
            });
        }
        self.inner.set_enabled_ids(ids).await
    }
}
