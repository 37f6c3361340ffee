pub mod prelude;
mod udp;

#[cfg(feature = "mock")]
pub mod mock;

pub use prelude::{ForwardMode, Resolver, ResolveError};
pub use udp::UdpUpstreamClient;

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_proto::{Name, Question, RecordType};
    use std::time::Duration;

    #[tokio::test]
    async fn parallel_mode_returns_first_answer() {
        // binds two throwaway sockets that never reply; resolving against
        // them should time out rather than hang.
        let servers = vec!["127.0.0.1:1".parse().unwrap()];
        let client = UdpUpstreamClient::new(servers, ForwardMode::Parallel, Duration::from_millis(50));
        let question = Question::new(1, Name::parse("example.com").unwrap(), RecordType::A);
        let result = client.resolve(&question).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn no_servers_configured_fails_fast() {
        let client = UdpUpstreamClient::new(vec![], ForwardMode::Serial, Duration::from_millis(50));
        let question = Question::new(1, Name::parse("example.com").unwrap(), RecordType::A);
        let err = client.resolve(&question).await.unwrap_err();
        assert_eq!(err, ResolveError::NoServers);
    }
}
