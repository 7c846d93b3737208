use std::collections::HashMap;

use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use super::traits::{BoxError, SessionStore};
use crate::codec::SessionCodec;
use crate::session::{Session, SessionRecord};
use crate::types::SessionKey;

/// Keeps the whole session record in the signed cookie.
///
/// Nothing lives server-side, so [`destroy`](SessionStore::destroy) has no
/// effect beyond the clearing cookie the router sends.
#[derive(Clone)]
pub struct CookieSessionStore {
    codec: SessionCodec,
}

impl CookieSessionStore {
    #[must_use]
    pub fn new(codec: SessionCodec) -> Self {
        Self { codec }
    }
}

impl SessionStore for CookieSessionStore {
    fn cookie_name(&self) -> &str {
        self.codec.cookie_name()
    }

    async fn load(&self, cookie: Option<&str>) -> Result<Session, BoxError> {
        let Some(value) = cookie else {
            return Ok(Session::new());
        };
        match self.codec.decode_record(value) {
            Ok(record) => Ok(Session::from_record(record)),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding invalid session cookie");
                Ok(Session::new())
            }
        }
    }

    async fn commit(&self, session: &Session) -> Result<String, BoxError> {
        Ok(self.codec.encode_record(session.record())?)
    }

    async fn destroy(&self, _session: &Session) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Keeps session records in process memory; the cookie carries a signed key.
///
/// Fresh sessions get a key at load time but are only stored on commit.
/// Each commit refreshes the record's expiry; expired records load as fresh
/// sessions and are pruned on the next commit or [`cleanup_expired`](Self::cleanup_expired).
pub struct MemorySessionStore {
    codec: SessionCodec,
    ttl: Duration,
    records: RwLock<HashMap<SessionKey, StoredRecord>>,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    record: SessionRecord,
    expires_at: OffsetDateTime,
}

impl StoredRecord {
    fn is_live(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }
}

impl MemorySessionStore {
    pub const DEFAULT_TTL: Duration = Duration::days(14);

    /// Store whose records live for [`DEFAULT_TTL`](Self::DEFAULT_TTL) after their last commit.
    #[must_use]
    pub fn new(codec: SessionCodec) -> Self {
        Self {
            codec,
            ttl: Self::DEFAULT_TTL,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Record lifetime, counted from the last commit. Match it to the cookie `Max-Age`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Whether a live record exists for `key`.
    pub async fn contains(&self, key: SessionKey) -> bool {
        let now = OffsetDateTime::now_utc();
        self.records
            .read()
            .await
            .get(&key)
            .is_some_and(|stored| stored.is_live(now))
    }

    /// Number of stored records, expired ones included until pruned.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Drop expired records. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut records = self.records.write().await;
        let removed = prune(&mut records, now);
        if removed > 0 {
            tracing::debug!(removed, "Pruned expired sessions");
        }
        removed
    }

    fn fresh() -> Session {
        Session::with_key(SessionKey::generate(), SessionRecord::default())
    }
}

fn prune(records: &mut HashMap<SessionKey, StoredRecord>, now: OffsetDateTime) -> usize {
    let before = records.len();
    records.retain(|_, stored| stored.is_live(now));
    before - records.len()
}

impl SessionStore for MemorySessionStore {
    fn cookie_name(&self) -> &str {
        self.codec.cookie_name()
    }

    async fn load(&self, cookie: Option<&str>) -> Result<Session, BoxError> {
        let Some(key) = cookie
            .and_then(|value| self.codec.verify(value))
            .and_then(|raw| SessionKey::parse(&raw))
        else {
            return Ok(Self::fresh());
        };

        let now = OffsetDateTime::now_utc();
        let records = self.records.read().await;
        Ok(match records.get(&key) {
            Some(stored) if stored.is_live(now) => Session::with_key(key, stored.record.clone()),
            _ => Self::fresh(),
        })
    }

    async fn commit(&self, session: &Session) -> Result<String, BoxError> {
        let key = session
            .key()
            .ok_or("memory store cannot commit a session without a key")?;
        let now = OffsetDateTime::now_utc();
        let mut records = self.records.write().await;
        prune(&mut records, now);
        records.insert(
            key,
            StoredRecord {
                record: session.record().clone(),
                expires_at: now + self.ttl,
            },
        );
        Ok(self.codec.sign(&key.to_string()))
    }

    async fn destroy(&self, session: &Session) -> Result<(), BoxError> {
        if let Some(key) = session.key() {
            self.records.write().await.remove(&key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookie::Key;

    fn codec() -> SessionCodec {
        SessionCodec::new(Key::generate(), "__session")
    }

    #[tokio::test]
    async fn cookie_store_round_trips_through_commit() {
        let store = CookieSessionStore::new(codec());
        let mut session = store.load(None).await.unwrap();
        session.set_csrf_token("tok".into());

        let value = store.commit(&session).await.unwrap();
        let reloaded = store.load(Some(&value)).await.unwrap();
        assert_eq!(reloaded.record(), session.record());
    }

    #[tokio::test]
    async fn cookie_store_treats_bad_cookie_as_fresh() {
        let store = CookieSessionStore::new(codec());
        let session = store.load(Some("bogus")).await.unwrap();
        assert_eq!(session.record(), &SessionRecord::default());
    }

    #[tokio::test]
    async fn memory_store_load_does_not_persist() {
        let store = MemorySessionStore::new(codec());
        let session = store.load(None).await.unwrap();
        assert!(session.key().is_some());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn memory_store_round_trips_through_commit() {
        let store = MemorySessionStore::new(codec());
        let mut session = store.load(None).await.unwrap();
        session.set_identity_credential("cred".into());

        let value = store.commit(&session).await.unwrap();
        let reloaded = store.load(Some(&value)).await.unwrap();
        assert_eq!(reloaded.key(), session.key());
        assert_eq!(reloaded.identity_credential(), Some(&"cred".into()));
    }

    #[tokio::test]
    async fn memory_store_destroy_removes_record() {
        let store = MemorySessionStore::new(codec());
        let session = store.load(None).await.unwrap();
        let value = store.commit(&session).await.unwrap();
        let key = session.key().unwrap();
        assert!(store.contains(key).await);

        store.destroy(&session).await.unwrap();
        assert!(!store.contains(key).await);

        let reloaded = store.load(Some(&value)).await.unwrap();
        assert_ne!(reloaded.key(), Some(key));
    }

    #[tokio::test]
    async fn memory_store_rejects_unsigned_key() {
        let store = MemorySessionStore::new(codec());
        let session = store.load(None).await.unwrap();
        store.commit(&session).await.unwrap();
        let key = session.key().unwrap();

        let forged = store.load(Some(&key.to_string())).await.unwrap();
        assert_ne!(forged.key(), Some(key));
    }

    #[tokio::test]
    async fn memory_store_refuses_keyless_commit() {
        let store = MemorySessionStore::new(codec());
        assert!(store.commit(&Session::new()).await.is_err());
    }

    #[tokio::test]
    async fn expired_record_loads_as_fresh_session() {
        let store = MemorySessionStore::new(codec()).with_ttl(Duration::ZERO);
        let mut session = store.load(None).await.unwrap();
        session.set_identity_credential("cred".into());
        let value = store.commit(&session).await.unwrap();

        let reloaded = store.load(Some(&value)).await.unwrap();
        assert_ne!(reloaded.key(), session.key());
        assert!(reloaded.identity_credential().is_none());
        assert!(!store.contains(session.key().unwrap()).await);
    }

    #[tokio::test]
    async fn commit_prunes_expired_records() {
        let store = MemorySessionStore::new(codec()).with_ttl(Duration::ZERO);
        for _ in 0..50 {
            let session = store.load(None).await.unwrap();
            store.commit(&session).await.unwrap();
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired_records() {
        let expiring = MemorySessionStore::new(codec()).with_ttl(Duration::ZERO);
        let session = expiring.load(None).await.unwrap();
        expiring.commit(&session).await.unwrap();
        assert_eq!(expiring.cleanup_expired().await, 1);
        assert!(expiring.is_empty().await);

        let live = MemorySessionStore::new(codec());
        let session = live.load(None).await.unwrap();
        live.commit(&session).await.unwrap();
        assert_eq!(live.cleanup_expired().await, 0);
        assert_eq!(live.len().await, 1);
    }
}
