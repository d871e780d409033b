// Serialized access to a state file for the long-lived bot process

use crate::error::Result;
use crate::state::JsonStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

/// Funnels every read-modify-write of one state file through a single lock.
///
/// This removes lost updates between handlers inside one process. It does not
/// coordinate with other processes: at most one process may write a given
/// domain's state at a time.
#[derive(Debug)]
pub struct StateGateway<T> {
    store: Mutex<JsonStore<T>>,
}

impl<T> StateGateway<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(store: JsonStore<T>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Current contents; `None` if nothing has been persisted yet
    pub async fn read(&self) -> Option<T> {
        let store = self.store.lock().await;
        if !store.exists() {
            return None;
        }
        Some(store.load_or_default())
    }

    /// Load, apply `mutate`, and save while holding the lock
    pub async fn update<F, R>(&self, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let store = self.store.lock().await;
        let mut value = store.load_or_default();
        let result = mutate(&mut value);
        store.save(&value)?;
        Ok(result)
    }
}
