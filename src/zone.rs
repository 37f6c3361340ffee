use std::collections::HashMap;
use std::sync::RwLock;

use corvid_proto::{Name, Question, RecordClass, RecordType, ResourceRecord};

type Fingerprint = (String, RecordType, RecordClass);

/// In-memory authoritative record index, loaded by an external zone loader
/// (file watcher, API, whatever) via [`ZoneStore::put_zone`].
///
/// Multi-reader/single-writer: `find_records` never observes a zone
/// replacement partway through, because the whole apex's records are swapped
/// in behind a single write-lock acquisition.
pub struct ZoneStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    zones: HashMap<String, Vec<ResourceRecord>>,
    index: HashMap<Fingerprint, Vec<ResourceRecord>>,
}

impl ZoneStore {
    pub fn new() -> Self {
        ZoneStore {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Atomically replaces all records owned by `apex` (including records
    /// for subdomains carried in the same zone file).
    pub fn put_zone(&self, apex: Name, records: Vec<ResourceRecord>) {
        let mut inner = self.inner.write().unwrap();
        inner.remove_zone_locked(apex.as_str());

        for record in &records {
            let key = (
                record.name.as_str().to_string(),
                record.rtype,
                record.rclass,
            );
            inner.index.entry(key).or_default().push(record.clone());
        }
        inner.zones.insert(apex.into_string(), records);
    }

    pub fn remove_zone(&self, apex: &Name) {
        let mut inner = self.inner.write().unwrap();
        inner.remove_zone_locked(apex.as_str());
    }

    pub fn find_records(&self, question: &Question) -> Option<Vec<ResourceRecord>> {
        let inner = self.inner.read().unwrap();
        let key = (
            question.name.as_str().to_string(),
            question.qtype,
            question.qclass,
        );
        inner.index.get(&key).cloned()
    }

    pub fn zones(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        inner.zones.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner.zones.values().map(|records| records.len()).sum()
    }
}

impl Inner {
    fn remove_zone_locked(&mut self, apex: &str) {
        if let Some(records) = self.zones.remove(apex) {
            for record in records {
                let key = (record.name.as_str().to_string(), record.rtype, record.rclass);
                if let Some(group) = self.index.get_mut(&key) {
                    group.retain(|r| r.name.as_str() != apex || r.rtype != record.rtype);
                    if group.is_empty() {
                        self.index.remove(&key);
                    }
                }
            }
        }
    }
}

impl Default for ZoneStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_proto::RecordType;

    fn a_record(name: &str) -> ResourceRecord {
        ResourceRecord::authoritative(
            Name::parse(name).unwrap(),
            RecordType::A,
            300,
            vec![192, 0, 2, 1],
            Some("192.0.2.1".into()),
        )
    }

    #[test]
    fn put_then_find_hits() {
        let store = ZoneStore::new();
        let apex = Name::parse("example.com").unwrap();
        store.put_zone(apex.clone(), vec![a_record("example.com")]);

        let question = Question::new(1, apex, RecordType::A);
        let found = store.find_records(&question).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].expires_at.is_none());
    }

    #[test]
    fn put_zone_is_idempotent() {
        let store = ZoneStore::new();
        let apex = Name::parse("example.com").unwrap();
        store.put_zone(apex.clone(), vec![a_record("example.com")]);
        store.put_zone(apex.clone(), vec![a_record("example.com")]);

        assert_eq!(store.count(), 1);
        assert_eq!(store.zones(), vec!["example.com".to_string()]);
    }

    #[test]
    fn replacing_a_zone_drops_old_records() {
        let store = ZoneStore::new();
        let apex = Name::parse("example.com").unwrap();
        store.put_zone(apex.clone(), vec![a_record("example.com")]);
        store.put_zone(apex.clone(), vec![a_record("www.example.com")]);

        let miss = store.find_records(&Question::new(1, apex.clone(), RecordType::A));
        assert!(miss.is_none());

        let hit = store.find_records(&Question::new(
            1,
            Name::parse("www.example.com").unwrap(),
            RecordType::A,
        ));
        assert!(hit.is_some());
    }

    #[test]
    fn miss_when_no_matching_fingerprint() {
        let store = ZoneStore::new();
        let question = Question::new(1, Name::parse("nowhere.test").unwrap(), RecordType::A);
        assert!(store.find_records(&question).is_none());
    }
}
