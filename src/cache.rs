use std::sync::Arc;

use corvid_proto::{Clock, RecordClass, RecordType, ResourceRecord};

pub type Fingerprint = (String, RecordType, RecordClass);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cannot cache an empty record group")]
    Empty,
}

/// TTL-aware bounded cache of upstream answer groups ("RRsets"), keyed by
/// the question fingerprint they answer.
///
/// Expiry is lazy: a group is only checked against the clock when read. If
/// any single record in the group has expired the whole group is evicted,
/// since a partially-expired RRset would be an inconsistent answer.
pub struct RecordCache {
    inner: moka::future::Cache<Fingerprint, Vec<ResourceRecord>>,
    clock: Arc<dyn Clock>,
}

impl RecordCache {
    pub fn new(capacity: u64, clock: Arc<dyn Clock>) -> Self {
        RecordCache {
            inner: moka::future::Cache::new(capacity),
            clock,
        }
    }

    pub async fn get(&self, key: &Fingerprint) -> Option<Vec<ResourceRecord>> {
        let group = self.inner.get(key).await?;
        let now = self.clock.now();
        if group.iter().any(|record| record.is_expired(now)) {
            self.inner.invalidate(key).await;
            return None;
        }
        Some(group)
    }

    /// Derives the key from the first record's (name, type, class) and
    /// replaces any prior group under that key.
    pub async fn put(&self, records: Vec<ResourceRecord>) -> Result<(), CacheError> {
        let first = records.first().ok_or(CacheError::Empty)?;
        let key = (
            first.name.as_str().to_string(),
            first.rtype,
            first.rclass,
        );
        self.inner.insert(key, records).await;
        Ok(())
    }

    pub async fn delete(&self, key: &Fingerprint) {
        self.inner.invalidate(key).await;
    }

    pub fn keys(&self) -> Vec<Fingerprint> {
        self.inner.iter().map(|(key, _)| (*key).clone()).collect()
    }

    pub fn len(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_proto::{FixedClock, Name};
    use std::time::{Duration, SystemTime};

    fn record(name: &str, ttl: u32, now: SystemTime) -> ResourceRecord {
        ResourceRecord::cached(
            Name::parse(name).unwrap(),
            RecordType::A,
            ttl,
            vec![192, 0, 2, 1],
            Some("192.0.2.1".into()),
            now,
        )
    }

    #[tokio::test]
    async fn hit_then_expiry_evicts_group() {
        let t0 = SystemTime::UNIX_EPOCH;
        let clock = FixedClock::new(t0);
        let cache = RecordCache::new(100, clock.clone());

        cache
            .put(vec![record("cached.test", 60, t0)])
            .await
            .unwrap();

        let key = ("cached.test".to_string(), RecordType::A, RecordClass::Internet);

        clock.advance(Duration::from_secs(59));
        assert!(cache.get(&key).await.is_some());

        clock.advance(Duration::from_secs(2));
        assert!(cache.get(&key).await.is_none());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn put_rejects_empty_group() {
        let clock = FixedClock::new(SystemTime::UNIX_EPOCH);
        let cache = RecordCache::new(10, clock);
        let err = cache.put(vec![]).await.unwrap_err();
        assert_eq!(err, CacheError::Empty);
    }

    #[tokio::test]
    async fn ttl_zero_available_same_instant_then_gone() {
        let t0 = SystemTime::UNIX_EPOCH;
        let clock = FixedClock::new(t0);
        let cache = RecordCache::new(10, clock.clone());
        cache.put(vec![record("zero.test", 0, t0)]).await.unwrap();

        let key = ("zero.test".to_string(), RecordType::A, RecordClass::Internet);
        assert!(cache.get(&key).await.is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&key).await.is_none());
    }
}
