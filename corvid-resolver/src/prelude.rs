use async_trait::async_trait;
use corvid_proto::{CodecError, DnsResponse, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMode {
    /// Send to every configured server at once, take the first answer back.
    Parallel,
    /// Try servers one at a time, in the configured order, until one answers.
    Serial,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no upstream servers configured")]
    NoServers,
    #[error("every configured upstream server timed out or refused the query")]
    AllFailed,
    #[error("upstream response failed to decode: {0}")]
    Codec(#[from] CodecError),
    #[error("sending the query to the upstream server failed")]
    Send,
}

/// A source of answers for a question: an upstream forwarder, or in tests a
/// canned in-memory table.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, question: &Question) -> Result<DnsResponse, ResolveError>;
}
