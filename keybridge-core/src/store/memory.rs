//! In-memory credential storage (development fallback)

use dashmap::DashMap;

use crate::types::UserId;

use super::Credential;

#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: DashMap<String, Credential>,
    /// user id -> credential ids owned by that user
    user_index: DashMap<UserId, Vec<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, credential: Credential) {
        // entry() holds the shard lock across the read-modify-write, so two
        // saves for the same user cannot drop each other's index entry.
        {
            let mut ids = self.user_index.entry(credential.user_id.clone()).or_default();
            if !ids.contains(&credential.id) {
                ids.push(credential.id.clone());
            }
        }
        self.credentials.insert(credential.id.clone(), credential);
    }

    pub fn get_by_id(&self, credential_id: &str) -> Option<Credential> {
        self.credentials
            .get(credential_id)
            .map(|entry| entry.value().clone())
    }

    pub fn get_by_user(&self, user_id: &UserId) -> Vec<Credential> {
        let ids = self
            .user_index
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        ids.iter().filter_map(|id| self.get_by_id(id)).collect()
    }

    pub fn update_counter(&self, credential_id: &str, counter: u32) {
        if let Some(mut entry) = self.credentials.get_mut(credential_id) {
            entry.counter = counter;
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
