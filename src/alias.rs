use std::collections::HashSet;

use corvid_proto::{Name, Question, RecordType, ResourceRecord};
use corvid_resolver::Resolver;

use crate::zone::ZoneStore;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ChaseError {
    /// Chain exceeded `max_depth` hops.
    #[error("alias chain exceeded the configured depth limit")]
    DepthExceeded,
    /// The same owner name was visited twice.
    #[error("alias chain revisited an owner name")]
    LoopDetected,
    /// A CNAME's text was empty or unparsable as a target.
    #[error("alias target was empty or unparsable")]
    TargetInvalid,
    /// A follow-up question could not be built from the target name.
    #[error("could not build a follow-up question from the alias target")]
    QuestionBuildFailed,
}

impl ChaseError {
    pub fn is_fatal(self) -> bool {
        matches!(self, ChaseError::DepthExceeded | ChaseError::LoopDetected)
    }
}

/// Result of chasing a CNAME chain. `fatal` is set only for depth/loop
/// errors, which the pipeline turns into SERVFAIL; any other stopping
/// condition (`note`) still returns NOERROR with whatever `chain`
/// accumulated so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasOutcome {
    pub chain: Vec<ResourceRecord>,
    pub fatal: Option<ChaseError>,
    pub note: Option<ChaseError>,
}

impl AliasOutcome {
    fn ok(chain: Vec<ResourceRecord>) -> Self {
        AliasOutcome {
            chain,
            fatal: None,
            note: None,
        }
    }

    fn non_fatal(chain: Vec<ResourceRecord>, note: ChaseError) -> Self {
        AliasOutcome {
            chain,
            fatal: None,
            note: Some(note),
        }
    }

    fn fatal(chain: Vec<ResourceRecord>, error: ChaseError) -> Self {
        AliasOutcome {
            chain,
            fatal: Some(error),
            note: None,
        }
    }
}

/// Expands a CNAME chain returned by the zone store, mixing authoritative
/// lookups with upstream fallback, bounded by `max_depth` (0 = unlimited)
/// and guarded against cycles by owner-name tracking.
pub struct AliasChaser {
    max_depth: u32,
}

impl AliasChaser {
    pub fn new(max_depth: u32) -> Self {
        AliasChaser { max_depth }
    }

    /// True when chasing can be skipped outright: an empty initial set, a
    /// non-CNAME head, or a client asking for CNAME records directly.
    pub fn needs_chase(&self, initial: &[ResourceRecord], original: &Question) -> bool {
        !initial.is_empty()
            && initial[0].rtype == RecordType::Cname
            && original.qtype != RecordType::Cname
    }

    pub async fn chase(
        &self,
        initial: Vec<ResourceRecord>,
        original: &Question,
        zone: &ZoneStore,
        upstream: Option<&(dyn Resolver)>,
    ) -> AliasOutcome {
        if !self.needs_chase(&initial, original) {
            return AliasOutcome::ok(initial);
        }

        let mut chain: Vec<ResourceRecord> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut depth: u32 = 0;
        let mut current = initial;

        loop {
            let head = current[0].clone();
            depth += 1;
            if self.max_depth > 0 && depth > self.max_depth {
                return AliasOutcome::fatal(chain, ChaseError::DepthExceeded);
            }

            let lowercase_name = head.name.as_str().to_lowercase();
            if visited.contains(&lowercase_name) {
                return AliasOutcome::fatal(chain, ChaseError::LoopDetected);
            }
            visited.insert(lowercase_name);
            chain.push(head.clone());

            let target_raw = head.text.as_deref().unwrap_or("").trim();
            if target_raw.is_empty() {
                return AliasOutcome::non_fatal(chain, ChaseError::TargetInvalid);
            }

            let target_name = match Name::parse(target_raw) {
                Ok(name) => name,
                Err(_) => return AliasOutcome::non_fatal(chain, ChaseError::QuestionBuildFailed),
            };

            let follow_up = Question::new(original.id, target_name.clone(), original.qtype);
            let mut next = zone.find_records(&follow_up);

            if next.is_none() && original.qtype != RecordType::Cname {
                let cname_question =
                    Question::new(original.id, target_name.clone(), RecordType::Cname);
                next = zone.find_records(&cname_question);
            }

            if next.is_none() {
                if let Some(resolver) = upstream {
                    if let Ok(response) = resolver.resolve(&follow_up).await {
                        if !response.answers.is_empty() {
                            next = Some(response.answers);
                        }
                    }
                }
            }

            match next {
                None => return AliasOutcome::ok(chain),
                Some(records) if records.is_empty() => return AliasOutcome::ok(chain),
                Some(records) => {
                    if records[0].rtype != RecordType::Cname {
                        chain.extend(records);
                        return AliasOutcome::ok(chain);
                    }
                    current = records;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cname(name: &str, target: &str) -> ResourceRecord {
        ResourceRecord::authoritative(
            Name::parse(name).unwrap(),
            RecordType::Cname,
            300,
            target.as_bytes().to_vec(),
            Some(target.to_string()),
        )
    }

    fn a(name: &str) -> ResourceRecord {
        ResourceRecord::authoritative(
            Name::parse(name).unwrap(),
            RecordType::A,
            300,
            vec![192, 0, 2, 200],
            Some("192.0.2.200".into()),
        )
    }

    #[tokio::test]
    async fn chases_multi_hop_authoritative_chain() {
        let zone = ZoneStore::new();
        zone.put_zone(Name::parse("mh").unwrap(), vec![
            cname("a.mh", "b.mh"),
            cname("b.mh", "c.mh"),
            a("c.mh"),
        ]);

        let chaser = AliasChaser::new(0);
        let original = Question::new(1, Name::parse("a.mh").unwrap(), RecordType::A);
        let initial = zone.find_records(&original).unwrap();
        let outcome = chaser.chase(initial, &original, &zone, None).await;

        assert!(outcome.fatal.is_none());
        assert_eq!(outcome.chain.len(), 3);
        assert_eq!(outcome.chain[2].rtype, RecordType::A);
    }

    #[tokio::test]
    async fn detects_loop() {
        let zone = ZoneStore::new();
        zone.put_zone(Name::parse("loop").unwrap(), vec![
            cname("a.loop", "b.loop"),
            cname("b.loop", "a.loop"),
        ]);

        let chaser = AliasChaser::new(0);
        let original = Question::new(1, Name::parse("a.loop").unwrap(), RecordType::A);
        let initial = zone.find_records(&original).unwrap();
        let outcome = chaser.chase(initial, &original, &zone, None).await;

        assert_eq!(outcome.fatal, Some(ChaseError::LoopDetected));
    }

    #[tokio::test]
    async fn depth_exceeded_past_max() {
        let zone = ZoneStore::new();
        zone.put_zone(Name::parse("d").unwrap(), vec![
            cname("a.d", "b.d"),
            cname("b.d", "c.d"),
            a("c.d"),
        ]);

        let chaser = AliasChaser::new(1);
        let original = Question::new(1, Name::parse("a.d").unwrap(), RecordType::A);
        let initial = zone.find_records(&original).unwrap();
        let outcome = chaser.chase(initial, &original, &zone, None).await;

        assert_eq!(outcome.fatal, Some(ChaseError::DepthExceeded));
    }

    #[tokio::test]
    async fn depth_exactly_at_max_succeeds() {
        let zone = ZoneStore::new();
        zone.put_zone(Name::parse("d2").unwrap(), vec![
            cname("a.d2", "b.d2"),
            a("b.d2"),
        ]);

        let chaser = AliasChaser::new(1);
        let original = Question::new(1, Name::parse("a.d2").unwrap(), RecordType::A);
        let initial = zone.find_records(&original).unwrap();
        let outcome = chaser.chase(initial, &original, &zone, None).await;

        assert!(outcome.fatal.is_none());
        assert_eq!(outcome.chain.len(), 2);
    }

    #[tokio::test]
    async fn fast_path_skips_chase_for_cname_query() {
        let zone = ZoneStore::new();
        zone.put_zone(Name::parse("a.mh").unwrap(), vec![cname("a.mh", "b.mh")]);

        let chaser = AliasChaser::new(0);
        let original = Question::new(1, Name::parse("a.mh").unwrap(), RecordType::Cname);
        let initial = zone.find_records(&original).unwrap();
        let outcome = chaser.chase(initial.clone(), &original, &zone, None).await;

        assert_eq!(outcome.chain, initial);
        assert!(outcome.fatal.is_none());
    }

    #[tokio::test]
    async fn data_exhausted_returns_partial_chain() {
        let zone = ZoneStore::new();
        zone.put_zone(Name::parse("a.gone").unwrap(), vec![cname("a.gone", "b.gone")]);

        let chaser = AliasChaser::new(0);
        let original = Question::new(1, Name::parse("a.gone").unwrap(), RecordType::A);
        let initial = zone.find_records(&original).unwrap();
        let outcome = chaser.chase(initial, &original, &zone, None).await;

        assert!(outcome.fatal.is_none());
        assert_eq!(outcome.chain.len(), 1);
    }
}
