use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use corvid_proto::{DnsResponse, Question};

use crate::prelude::{Resolver, ResolveError};

/// A canned upstream used in tests: maps a question fingerprint to either a
/// fixed response or a fixed error.
#[derive(Default)]
pub struct MockResolver {
    answers: Mutex<HashMap<(String, u16), Result<DnsResponse, ResolveError>>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(self, question: &Question, response: DnsResponse) -> Self {
        self.answers.lock().unwrap().insert(
            (question.name.as_str().to_string(), question.qtype.as_num()),
            Ok(response),
        );
        self
    }

    pub fn with_error(self, question: &Question, error: ResolveError) -> Self {
        self.answers.lock().unwrap().insert(
            (question.name.as_str().to_string(), question.qtype.as_num()),
            Err(error),
        );
        self
    }
}

#[async_trait]
impl Resolver for MockResolver {
    async fn resolve(&self, question: &Question) -> Result<DnsResponse, ResolveError> {
        let key = (question.name.as_str().to_string(), question.qtype.as_num());
        self.answers
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or(Err(ResolveError::AllFailed))
    }
}
