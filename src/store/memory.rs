use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use super::{CredentialRecord, CredentialStore, NewCredential, NewUser, StoreError, User};

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    credentials: HashMap<i64, CredentialRecord>,
    by_external_id: HashMap<String, i64>,
    next_user_id: i64,
    next_credential_id: i64,
}

/// In-memory store backend. Serves the tests and demos; a relational engine
/// sits behind the same trait in production. All mutation happens under one
/// lock, which is what makes `create_user_with_credential` atomic and the
/// counter update race-free here.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.inner.read().expect("store lock poisoned").users.len()
    }

    pub fn credential_count(&self) -> usize {
        self.inner
            .read()
            .expect("store lock poisoned")
            .credentials
            .len()
    }
}

impl CredentialStore for MemoryStore {
    // Lookups complete immediately; the timeout is for I/O-backed stores.
    fn find_by_external_id(
        &self,
        external_id: &str,
        _timeout: Duration,
    ) -> Result<Option<(CredentialRecord, User)>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        let Some(credential_id) = inner.by_external_id.get(external_id) else {
            return Ok(None);
        };
        let credential = inner
            .credentials
            .get(credential_id)
            .ok_or_else(|| StoreError::Unavailable("credential index out of sync".into()))?;
        let user = inner
            .users
            .get(&credential.user_id)
            .ok_or_else(|| StoreError::Unavailable("credential without owner".into()))?;
        Ok(Some((credential.clone(), user.clone())))
    }

    fn create_user_with_credential(
        &self,
        user: NewUser,
        credential: NewCredential,
        _timeout: Duration,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if inner.by_external_id.contains_key(&credential.external_id) {
            return Err(StoreError::DuplicateExternalId);
        }

        inner.next_user_id += 1;
        let user_id = inner.next_user_id;
        inner.next_credential_id += 1;
        let credential_id = inner.next_credential_id;

        let user = User {
            id: user_id,
            email: user.email,
            username: user.username,
        };
        let record = CredentialRecord {
            id: credential_id,
            user_id,
            external_id: credential.external_id.clone(),
            public_key: credential.public_key,
            sign_count: credential.sign_count,
        };

        inner.users.insert(user_id, user.clone());
        inner
            .by_external_id
            .insert(credential.external_id, credential_id);
        inner.credentials.insert(credential_id, record);
        Ok(user)
    }

    fn update_sign_count(
        &self,
        credential_id: i64,
        new_count: u32,
        _timeout: Duration,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let record = inner
            .credentials
            .get_mut(&credential_id)
            .ok_or(StoreError::NotFound)?;
        // Write-time monotonicity check: the loser of a racing pair must not
        // rewind the winner's count.
        if new_count <= record.sign_count && record.sign_count != 0 {
            return Err(StoreError::StaleCounter);
        }
        record.sign_count = new_count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_secs(1);

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            username: email.split('@').next().unwrap().into(),
        }
    }

    fn new_credential(external_id: &str) -> NewCredential {
        NewCredential {
            external_id: external_id.into(),
            public_key: vec![0xA5, 0x01, 0x02],
            sign_count: 0,
        }
    }

    #[test]
    fn test_create_then_find() {
        let store = MemoryStore::new();
        let user = store
            .create_user_with_credential(new_user("alice@example.com"), new_credential("cred-a"), T)
            .unwrap();

        let (record, owner) = store.find_by_external_id("cred-a", T).unwrap().unwrap();
        assert_eq!(owner.id, user.id);
        assert_eq!(owner.email, "alice@example.com");
        assert_eq!(record.user_id, user.id);
        assert_eq!(record.sign_count, 0);
        assert_eq!(record.public_key, vec![0xA5, 0x01, 0x02]);
    }

    #[test]
    fn test_find_unknown_returns_none() {
        let store = MemoryStore::new();
        assert!(store.find_by_external_id("missing", T).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_external_id_rejected_atomically() {
        let store = MemoryStore::new();
        store
            .create_user_with_credential(new_user("alice@example.com"), new_credential("cred-a"), T)
            .unwrap();

        let err = store
            .create_user_with_credential(new_user("bob@example.com"), new_credential("cred-a"), T)
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateExternalId));
        // The failed registration must not leave a credential-less user behind.
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.credential_count(), 1);
    }

    #[test]
    fn test_update_sign_count_monotonic() {
        let store = MemoryStore::new();
        store
            .create_user_with_credential(new_user("alice@example.com"), new_credential("cred-a"), T)
            .unwrap();
        let (record, _) = store.find_by_external_id("cred-a", T).unwrap().unwrap();

        store.update_sign_count(record.id, 5, T).unwrap();

        // Same value again: stale.
        let err = store.update_sign_count(record.id, 5, T).unwrap_err();
        assert!(matches!(err, StoreError::StaleCounter));
        // Lower: stale, record unchanged.
        let err = store.update_sign_count(record.id, 3, T).unwrap_err();
        assert!(matches!(err, StoreError::StaleCounter));
        let (record, _) = store.find_by_external_id("cred-a", T).unwrap().unwrap();
        assert_eq!(record.sign_count, 5);

        store.update_sign_count(record.id, 6, T).unwrap();
        let (record, _) = store.find_by_external_id("cred-a", T).unwrap().unwrap();
        assert_eq!(record.sign_count, 6);
    }

    #[test]
    fn test_update_sign_count_zero_sentinel() {
        let store = MemoryStore::new();
        store
            .create_user_with_credential(new_user("alice@example.com"), new_credential("cred-a"), T)
            .unwrap();
        let (record, _) = store.find_by_external_id("cred-a", T).unwrap().unwrap();

        // Counter-less authenticators keep reporting 0; the write must stay legal.
        store.update_sign_count(record.id, 0, T).unwrap();
        store.update_sign_count(record.id, 0, T).unwrap();
        let (record, _) = store.find_by_external_id("cred-a", T).unwrap().unwrap();
        assert_eq!(record.sign_count, 0);
    }

    #[test]
    fn test_update_sign_count_unknown_credential() {
        let store = MemoryStore::new();
        let err = store.update_sign_count(42, 1, T).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn test_racing_updates_single_winner() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        store
            .create_user_with_credential(new_user("alice@example.com"), new_credential("cred-a"), T)
            .unwrap();
        store
            .update_sign_count(
                store.find_by_external_id("cred-a", T).unwrap().unwrap().0.id,
                4,
                T,
            )
            .unwrap();
        let credential_id = store.find_by_external_id("cred-a", T).unwrap().unwrap().0.id;

        // Both threads verified against stored=4 and try to write 5: exactly
        // one may win.
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.update_sign_count(credential_id, 5, T).is_ok())
            })
            .collect();
        let wins: usize = handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();
        assert_eq!(wins, 1, "exactly one racing write may succeed");
    }
}
