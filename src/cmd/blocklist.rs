use std::time::SystemTime;

use clap::Args;
use corvid::blocklist::BlockRule;
use corvid_proto::Name;

/// Fetches every configured blocklist source and reports how many rules each
/// one contributed. Since the blocklist lives only in the running server's
/// memory, this is a dry-run/diagnostic command rather than a way to persist
/// anything.
#[derive(Args, Debug)]
pub struct Command;

impl Command {
    pub async fn run(self, config: corvid::config::Config) {
        let rules = load_blocklist_rules(&config.blocklists).await;
        tracing::info!(total = rules.len(), "fetched blocklist rules");
        for (name, count) in summarize(&config, &rules) {
            tracing::info!(source = %name, rules = count, "blocklist source loaded");
        }
    }
}

fn summarize(config: &corvid::config::Config, rules: &[BlockRule]) -> Vec<(String, usize)> {
    config
        .blocklists
        .sources
        .keys()
        .map(|name| {
            let count = rules.iter().filter(|rule| rule.source == *name).count();
            (name.clone(), count)
        })
        .collect()
}

/// Fetches and parses every configured blocklist source, turning each entry
/// into a [`BlockRule`] tagged with the source name it came from.
pub async fn load_blocklist_rules(
    config: &corvid::config::BlocklistsConfig,
) -> Vec<BlockRule> {
    let loader = corvid_blocklist::BlocklistLoader::default();
    let mut rules = Vec::new();
    let now = SystemTime::now();

    for (name, item) in &config.sources {
        match loader.load(&item.url, item.format).await {
            Ok(result) => {
                tracing::debug!(
                    source = %name,
                    entries = result.entries.len(),
                    hash = %result.hash,
                    "loaded blocklist source",
                );
                for entry in result.entries {
                    let Ok(parsed) = Name::parse(&entry) else {
                        tracing::warn!(source = %name, entry, "skipping unparsable blocklist entry");
                        continue;
                    };
                    rules.push(BlockRule::new(parsed, item.kind.into(), name.clone(), now));
                }
            }
            Err(error) => tracing::warn!(source = %name, ?error, "unable to load blocklist source"),
        }
    }

    rules
}
