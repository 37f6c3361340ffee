use std::sync::Arc;

use clap::Args;
use corvid::alias::AliasChaser;
use corvid::blocklist::Blocklist;
use corvid::cache::RecordCache;
use corvid::pipeline::{DnsHandler, Pipeline};
use corvid::zone::ZoneStore;
use corvid::zoneload;
use corvid_proto::SystemClock;
use corvid_resolver::{Resolver, UdpUpstreamClient};
use corvid_server::UdpServer;

use crate::cmd::blocklist::load_blocklist_rules;

/// Starts the DNS server, the core of the machine.
#[derive(Args, Debug)]
pub struct Command;

impl Command {
    pub async fn run(&self, config: corvid::config::Config) {
        tracing::info!("preparing dns server");

        let zone = Arc::new(ZoneStore::new());
        if let Some(dir) = &config.zone.dir {
            match zoneload::load_zone_dir(dir) {
                Ok(zones) => {
                    let count = zones.len();
                    for (apex, records) in zones {
                        zone.put_zone(apex, records);
                    }
                    tracing::info!(zones = count, records = zone.count(), "loaded authoritative zones");
                }
                Err(error) => tracing::warn!(?error, "unable to load zone directory"),
            }
        }

        let blocklist = Arc::new(Blocklist::new());
        let rules = load_blocklist_rules(&config.blocklists).await;
        let rule_count = rules.len();
        blocklist.rebuild_all(rules, 1, std::time::SystemTime::now());
        tracing::info!(rules = rule_count, "blocklist ready");

        let cache = Arc::new(RecordCache::new(config.cache.capacity, Arc::new(SystemClock)));

        let upstream: Option<Arc<dyn Resolver>> = if config.upstream.servers.is_empty() {
            None
        } else {
            Some(Arc::new(UdpUpstreamClient::new(
                config.upstream.servers.clone(),
                config.upstream.mode(),
                config.upstream.timeout(),
            )))
        };

        let pipeline = Pipeline {
            zone,
            blocklist: Some(blocklist),
            cache: Some(cache),
            upstream,
            alias: AliasChaser::new(config.alias.max_depth),
            clock: Arc::new(SystemClock),
        };
        let handler = DnsHandler::new(pipeline);

        let address = config.dns.address();
        UdpServer::new(address, handler)
            .run()
            .await
            .expect("unable to run udp server")
    }
}
