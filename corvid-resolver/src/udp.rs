use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corvid_proto::{decode_response, encode_query, Clock, DnsResponse, Question, SystemClock};
use rand::Rng;
use tokio::net::UdpSocket;

use crate::prelude::{ForwardMode, Resolver, ResolveError};

/// Forwards queries to a fixed list of upstream servers over UDP, either
/// racing them all or trying them in order.
pub struct UdpUpstreamClient {
    servers: Vec<SocketAddr>,
    mode: ForwardMode,
    attempt_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl UdpUpstreamClient {
    pub fn new(servers: Vec<SocketAddr>, mode: ForwardMode, attempt_timeout: Duration) -> Self {
        Self::with_clock(servers, mode, attempt_timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(
        servers: Vec<SocketAddr>,
        mode: ForwardMode,
        attempt_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        UdpUpstreamClient {
            servers,
            mode,
            attempt_timeout,
            clock,
        }
    }

    #[tracing::instrument(skip(self, question), fields(qname = %question.name, server = %server))]
    async fn query_one(
        &self,
        server: SocketAddr,
        question: &Question,
    ) -> Result<DnsResponse, ResolveError> {
        let bind_addr: SocketAddr = if server.is_ipv6() {
            "[::]:0".parse().unwrap()
        } else {
            "0.0.0.0:0".parse().unwrap()
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|_| ResolveError::Send)?;

        let attempt_id: u16 = rand::thread_rng().gen();
        let outgoing = Question::new(attempt_id, question.name.clone(), question.qtype);
        let bytes = encode_query(&outgoing)?;
        socket
            .send_to(&bytes, server)
            .await
            .map_err(|_| ResolveError::Send)?;

        let deadline = tokio::time::Instant::now() + self.attempt_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(ResolveError::AllFailed);
            }
            let mut buf = [0u8; 512];
            let (n, from) = tokio::time::timeout(remaining, socket.recv_from(&mut buf))
                .await
                .map_err(|_| ResolveError::AllFailed)?
                .map_err(|_| ResolveError::Send)?;

            if from != server {
                continue;
            }

            match decode_response(&buf[..n], attempt_id, self.clock.now()) {
                Ok(response) => return Ok(response),
                Err(corvid_proto::CodecError::IdMismatch) => continue,
                Err(err) => return Err(ResolveError::Codec(err)),
            }
        }
    }

    async fn resolve_parallel(&self, question: &Question) -> Result<DnsResponse, ResolveError> {
        let attempts = self.servers.iter().map(|server| self.query_one(*server, question));
        let mut futures: futures::stream::FuturesUnordered<_> = attempts.collect();
        use futures::StreamExt;

        let mut last_err = ResolveError::AllFailed;
        while let Some(result) = futures.next().await {
            match result {
                Ok(response) => return Ok(response),
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }

    async fn resolve_serial(&self, question: &Question) -> Result<DnsResponse, ResolveError> {
        let mut last_err = ResolveError::AllFailed;
        for server in &self.servers {
            match self.query_one(*server, question).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    tracing::debug!(%server, "upstream attempt failed, trying next");
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }
}

#[async_trait]
impl Resolver for UdpUpstreamClient {
    async fn resolve(&self, question: &Question) -> Result<DnsResponse, ResolveError> {
        if self.servers.is_empty() {
            return Err(ResolveError::NoServers);
        }
        match self.mode {
            ForwardMode::Parallel => self.resolve_parallel(question).await,
            ForwardMode::Serial => self.resolve_serial(question).await,
        }
    }
}
