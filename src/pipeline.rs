use std::net::SocketAddr;
use std::sync::Arc;

use corvid_proto::{decode_query, encode_response, Clock, CodecError, DnsResponse, Question, Rcode};
use corvid_resolver::{Resolver, ResolveError};
use corvid_server::prelude::Message;

use crate::alias::{AliasChaser, ChaseError};
use crate::blocklist::Blocklist;
use crate::cache::{CacheError, RecordCache};
use crate::zone::ZoneStore;

/// Aggregates every failure the pipeline can hit while producing an answer.
/// Logged once at the point it's known and then discarded — it never leaves
/// [`Pipeline::handle_query`], which always returns a well-formed
/// [`DnsResponse`] regardless of what went wrong upstream of it.
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error("alias chase failed fatally: {0}")]
    Chase(ChaseError),
    #[error("no upstream server configured")]
    NoUpstream,
    #[error("upstream resolution failed: {0}")]
    Upstream(#[from] ResolveError),
    #[error("failed to cache upstream answer: {0}")]
    Cache(#[from] CacheError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] CodecError),
}

/// The resolver's decision engine: zone lookup, blocklist, cache, upstream,
/// in that order, short-circuiting at the first hit. A missing (`None`)
/// collaborator is treated as "absent" rather than an error, except a
/// missing upstream, which turns step 4 into an immediate SERVFAIL.
pub struct Pipeline {
    pub zone: Arc<ZoneStore>,
    pub blocklist: Option<Arc<Blocklist>>,
    pub cache: Option<Arc<RecordCache>>,
    pub upstream: Option<Arc<dyn Resolver>>,
    pub alias: AliasChaser,
    pub clock: Arc<dyn Clock>,
}

impl Pipeline {
    #[tracing::instrument(skip(self), fields(qname = %question.name, qtype = ?question.qtype))]
    pub async fn handle_query(&self, question: &Question) -> DnsResponse {
        if let Some(records) = self.zone.find_records(question) {
            return self.answer_from_zone(question, records).await;
        }

        if let Some(blocklist) = &self.blocklist {
            if blocklist.is_blocked(&question.name) {
                tracing::debug!(qname = %question.name, "blocked by blocklist");
                return DnsResponse::new(question.id, Rcode::NxDomain);
            }
        }

        if let Some(cache) = &self.cache {
            let fingerprint = question.fingerprint();
            if let Some(records) = cache.get(&fingerprint).await {
                return DnsResponse::new(question.id, Rcode::NoError).with_answers(records);
            }
        }

        self.resolve_upstream(question).await
    }

    async fn answer_from_zone(
        &self,
        question: &Question,
        records: Vec<corvid_proto::ResourceRecord>,
    ) -> DnsResponse {
        let outcome = self
            .alias
            .chase(records, question, &self.zone, self.upstream.as_deref())
            .await;

        match outcome.fatal {
            Some(error) => {
                let error = HandleError::Chase(error);
                tracing::error!(%error, qname = %question.name, "alias chase failed fatally");
                DnsResponse::new(question.id, Rcode::ServFail)
            }
            None => {
                if let Some(note) = outcome.note {
                    tracing::warn!(?note, qname = %question.name, "alias chase stopped early");
                }
                DnsResponse::new(question.id, Rcode::NoError).with_answers(outcome.chain)
            }
        }
    }

    async fn resolve_upstream(&self, question: &Question) -> DnsResponse {
        let Some(upstream) = &self.upstream else {
            let error = HandleError::NoUpstream;
            tracing::error!(%error, qname = %question.name, "dropping query");
            return DnsResponse::new(question.id, Rcode::ServFail);
        };

        match upstream.resolve(question).await {
            Err(error) => {
                let error = HandleError::from(error);
                tracing::error!(%error, qname = %question.name, "upstream resolution failed");
                DnsResponse::new(question.id, Rcode::ServFail)
            }
            Ok(response) => {
                if let Some(cache) = &self.cache {
                    if let Err(error) = cache.put(response.answers.clone()).await {
                        let error = HandleError::from(error);
                        tracing::error!(%error, qname = %question.name, "failed to cache upstream answer");
                    }
                }
                DnsResponse::new(question.id, Rcode::NoError).with_answers(response.answers)
            }
        }
    }
}

/// Adapts [`Pipeline`] to the UDP transport's `Handler` seam: decodes the
/// datagram, runs the pipeline, encodes the reply. Malformed datagrams and
/// questionless messages are dropped silently rather than answered.
pub struct DnsHandler {
    pipeline: Pipeline,
}

impl DnsHandler {
    pub fn new(pipeline: Pipeline) -> Self {
        DnsHandler { pipeline }
    }
}

#[async_trait::async_trait]
impl corvid_server::Handler for DnsHandler {
    #[tracing::instrument(skip_all, fields(origin = ?message.address))]
    async fn handle(&self, message: Message) -> Option<Message> {
        let question = match decode_query(&message.buffer[..message.size]) {
            Ok(question) => question,
            Err(CodecError::TooShort) | Err(CodecError::QuestionCountInvalid) => {
                tracing::debug!(origin = ?message.address, "dropping message with no usable question");
                return None;
            }
            Err(error) => {
                tracing::warn!(?error, origin = ?message.address, "dropping malformed message");
                return None;
            }
        };

        let response = self.pipeline.handle_query(&question).await;

        match encode_response(&question, &response) {
            Ok(bytes) => Some(to_message(message.address, bytes)),
            Err(error) => {
                let error = HandleError::from(error);
                tracing::warn!(%error, origin = ?message.address, "failed to encode response");
                None
            }
        }
    }
}

fn to_message(address: SocketAddr, bytes: Vec<u8>) -> Message {
    let mut buffer = [0u8; 512];
    let size = bytes.len().min(buffer.len());
    buffer[..size].copy_from_slice(&bytes[..size]);
    Message {
        address,
        buffer,
        size,
    }
}
