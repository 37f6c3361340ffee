use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwap;
use corvid_proto::Name;

const MAX_SOURCE_LEN: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Exact,
    Suffix,
}

impl RuleKind {
    fn as_u8(self) -> u8 {
        match self {
            RuleKind::Exact => 0,
            RuleKind::Suffix => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => RuleKind::Suffix,
            _ => RuleKind::Exact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRule {
    pub name: Name,
    pub kind: RuleKind,
    pub source: String,
    pub added_at: SystemTime,
}

impl BlockRule {
    pub fn new(name: Name, kind: RuleKind, source: impl Into<String>, added_at: SystemTime) -> Self {
        BlockRule {
            name,
            kind,
            source: source.into(),
            added_at,
        }
    }
}

/// Encodes a rule using the persisted-store contract: `kind(u8) |
/// added_at(u64 BE) | source_len(u16 BE) | source bytes`. Oversized sources
/// are clamped rather than rejected, matching the decode side's tolerance.
pub fn encode_rule_value(rule: &BlockRule) -> Vec<u8> {
    let added_at = rule
        .added_at
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs();
    let source_bytes = rule.source.as_bytes();
    let clamped_len = source_bytes.len().min(MAX_SOURCE_LEN);

    let mut out = Vec::with_capacity(11 + clamped_len);
    out.push(rule.kind.as_u8());
    out.extend_from_slice(&added_at.to_be_bytes());
    out.extend_from_slice(&(clamped_len as u16).to_be_bytes());
    out.extend_from_slice(&source_bytes[..clamped_len]);
    out
}

/// Decodes a persisted rule value. Values shorter than the 11-byte header
/// footprint fall back to `RuleKind::Exact` and a zero timestamp rather than
/// failing, per the persisted-store contract's truncation tolerance.
pub fn decode_rule_value(bytes: &[u8]) -> (RuleKind, SystemTime, String) {
    if bytes.len() < 11 {
        return (RuleKind::Exact, SystemTime::UNIX_EPOCH, String::new());
    }
    let kind = RuleKind::from_u8(bytes[0]);
    let added_at_secs = u64::from_be_bytes(bytes[1..9].try_into().unwrap());
    let added_at = SystemTime::UNIX_EPOCH + Duration::from_secs(added_at_secs);
    let source_len = u16::from_be_bytes(bytes[9..11].try_into().unwrap()) as usize;
    let available = bytes.len() - 11;
    let source_len = source_len.min(available);
    let source = String::from_utf8_lossy(&bytes[11..11 + source_len]).to_string();
    (kind, added_at, source)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub version: u64,
    pub updated_at: Option<SystemTime>,
    pub exact_keys: usize,
    pub suffix_keys: usize,
}

struct Snapshot {
    version: u64,
    updated_at: Option<SystemTime>,
    exact: HashMap<String, BlockRule>,
    /// Sorted ascending by reversed name, so a match is found by scanning
    /// down from the query key's insertion point.
    suffix: Vec<(String, BlockRule)>,
}

impl Snapshot {
    fn empty() -> Self {
        Snapshot {
            version: 0,
            updated_at: None,
            exact: HashMap::new(),
            suffix: Vec::new(),
        }
    }

    fn from_rules(rules: Vec<BlockRule>, version: u64, updated_at: SystemTime) -> Self {
        let mut exact = HashMap::new();
        let mut suffix = Vec::new();
        for rule in rules {
            match rule.kind {
                RuleKind::Exact => {
                    exact.insert(rule.name.as_str().to_string(), rule);
                }
                RuleKind::Suffix => {
                    let key = rule.name.reversed_key();
                    suffix.push((key, rule));
                }
            }
        }
        suffix.sort_by(|(a, _), (b, _)| a.cmp(b));
        Snapshot {
            version,
            updated_at: Some(updated_at),
            exact,
            suffix,
        }
    }

    fn find_suffix_match(&self, name: &Name) -> Option<&BlockRule> {
        let key = name.reversed_key();
        let idx = self.suffix.partition_point(|(k, _)| k.as_str() <= key.as_str());
        for (candidate, rule) in self.suffix[..idx].iter().rev() {
            if key == *candidate || key.starts_with(&format!("{}.", candidate)) {
                return Some(rule);
            }
        }
        None
    }
}

/// Exact + suffix name blocklist, published as an immutable snapshot and
/// swapped atomically on rebuild (read-copy-update). Readers never block a
/// concurrent `rebuild_all`, and keep using their snapshot until they're
/// done even if a new one lands mid-query.
pub struct Blocklist {
    current: ArcSwap<Snapshot>,
}

impl Blocklist {
    pub fn new() -> Self {
        Blocklist {
            current: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    pub fn is_blocked(&self, name: &Name) -> bool {
        self.get_first_match(name).is_some()
    }

    pub fn get_first_match(&self, name: &Name) -> Option<BlockRule> {
        let snapshot = self.current.load();
        if let Some(rule) = snapshot.exact.get(name.as_str()) {
            return Some(rule.clone());
        }
        snapshot.find_suffix_match(name).cloned()
    }

    pub fn rebuild_all(&self, rules: Vec<BlockRule>, version: u64, updated_at: SystemTime) {
        let snapshot = Snapshot::from_rules(rules, version, updated_at);
        self.current.store(std::sync::Arc::new(snapshot));
    }

    pub fn purge(&self) {
        self.current.store(std::sync::Arc::new(Snapshot::empty()));
    }

    pub fn stats(&self) -> Stats {
        let snapshot = self.current.load();
        Stats {
            version: snapshot.version,
            updated_at: snapshot.updated_at,
            exact_keys: snapshot.exact.len(),
            suffix_keys: snapshot.suffix.len(),
        }
    }
}

impl Default for Blocklist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, kind: RuleKind) -> BlockRule {
        BlockRule::new(
            Name::parse(name).unwrap(),
            kind,
            "test-source",
            SystemTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn exact_match_blocks_only_itself() {
        let blocklist = Blocklist::new();
        blocklist.rebuild_all(
            vec![rule("malware.example", RuleKind::Exact)],
            1,
            SystemTime::UNIX_EPOCH,
        );
        assert!(blocklist.is_blocked(&Name::parse("malware.example").unwrap()));
        assert!(!blocklist.is_blocked(&Name::parse("sub.malware.example").unwrap()));
    }

    #[test]
    fn suffix_match_blocks_apex_and_descendants() {
        let blocklist = Blocklist::new();
        blocklist.rebuild_all(
            vec![rule("example.org", RuleKind::Suffix)],
            1,
            SystemTime::UNIX_EPOCH,
        );
        assert!(blocklist.is_blocked(&Name::parse("example.org").unwrap()));
        assert!(blocklist.is_blocked(&Name::parse("a.example.org").unwrap()));
        assert!(blocklist.is_blocked(&Name::parse("a.b.example.org").unwrap()));
        assert!(!blocklist.is_blocked(&Name::parse("notexample.org").unwrap()));
    }

    #[test]
    fn rebuild_all_is_idempotent() {
        let blocklist = Blocklist::new();
        let rules = vec![rule("example.org", RuleKind::Suffix), rule("bad.test", RuleKind::Exact)];
        blocklist.rebuild_all(rules.clone(), 1, SystemTime::UNIX_EPOCH);
        let first = blocklist.stats();
        blocklist.rebuild_all(rules, 1, SystemTime::UNIX_EPOCH);
        let second = blocklist.stats();
        assert_eq!(first.exact_keys, second.exact_keys);
        assert_eq!(first.suffix_keys, second.suffix_keys);
    }

    #[test]
    fn purge_empties_both_indexes() {
        let blocklist = Blocklist::new();
        blocklist.rebuild_all(vec![rule("example.org", RuleKind::Suffix)], 1, SystemTime::UNIX_EPOCH);
        blocklist.purge();
        let stats = blocklist.stats();
        assert_eq!(stats.exact_keys, 0);
        assert_eq!(stats.suffix_keys, 0);
        assert_eq!(stats.version, 0);
    }

    #[test]
    fn persisted_value_round_trips() {
        let rule = rule("example.org", RuleKind::Suffix);
        let encoded = encode_rule_value(&rule);
        let (kind, added_at, source) = decode_rule_value(&encoded);
        assert_eq!(kind, RuleKind::Suffix);
        assert_eq!(added_at, SystemTime::UNIX_EPOCH);
        assert_eq!(source, "test-source");
    }

    #[test]
    fn truncated_persisted_value_uses_defaults() {
        let (kind, added_at, source) = decode_rule_value(&[1, 2, 3]);
        assert_eq!(kind, RuleKind::Exact);
        assert_eq!(added_at, SystemTime::UNIX_EPOCH);
        assert_eq!(source, "");
    }
}
