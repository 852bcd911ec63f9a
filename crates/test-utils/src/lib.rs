use async_trait::async_trait;
use chrono::Utc;
use kbrefine::errors::{ModelError, ModelErrorKind, SearchError, StoreError};
use kbrefine::providers::ai::{AiProvider, GenerationParams};
use kbrefine::providers::search::SearchProvider;
use kbrefine::providers::store::RecordStore;
use kbrefine::types::{Entry, SearchHit, SourceDomain};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
enum MockReply {
    Text(String),
    Error(ModelErrorKind),
    Delayed(Duration, String),
}

impl MockReply {
    async fn resolve(self) -> Result<String, ModelError> {
        match self {
            MockReply::Text(text) => Ok(text),
            MockReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            MockReply::Error(kind) => Err(match kind {
                ModelErrorKind::Timeout => ModelError::Timeout(Duration::from_secs(0)),
                ModelErrorKind::Quota => ModelError::Quota("mock quota exhausted".to_string()),
                ModelErrorKind::Transport => ModelError::Transport("mock transport failure".to_string()),
                ModelErrorKind::InvalidRequest => {
                    ModelError::InvalidRequest("mock invalid request".to_string())
                }
            }),
        }
    }
}

/// A scripted `AiProvider`.
///
/// Responses are keyed by a substring of the system prompt and matched in the
/// order they were registered. Each key holds a queue; the last reply in a
/// queue repeats once the others are used up.
#[derive(Clone, Debug, Default)]
pub struct MockAiProvider {
    replies: Arc<Mutex<Vec<(String, VecDeque<MockReply>)>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, key: &str, reply: MockReply) {
        let mut replies = self.replies.lock().unwrap();
        match replies.iter_mut().find(|(k, _)| k == key) {
            Some((_, queue)) => queue.push_back(reply),
            None => replies.push((key.to_string(), VecDeque::from([reply]))),
        }
    }

    /// Queues a response for system prompts containing `key`.
    pub fn add_response(&self, key: &str, response: &str) {
        self.push(key, MockReply::Text(response.to_string()));
    }

    /// Queues several responses for `key`, returned in order.
    pub fn add_sequence(&self, key: &str, responses: &[&str]) {
        for response in responses {
            self.add_response(key, response);
        }
    }

    /// Queues a failure of the given kind for `key`.
    pub fn add_error(&self, key: &str, kind: ModelErrorKind) {
        self.push(key, MockReply::Error(kind));
    }

    /// Queues a response that is only returned after `delay`.
    pub fn add_delayed_response(&self, key: &str, delay: Duration, response: &str) {
        self.push(key, MockReply::Delayed(delay, response.to_string()));
    }

    /// All recorded (system_prompt, user_prompt) pairs.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls whose system prompt contains `key`.
    pub fn calls_matching(&self, key: &str) -> Vec<(String, String)> {
        self.get_calls()
            .into_iter()
            .filter(|(system, _)| system.contains(key))
            .collect()
    }

    pub fn call_count(&self, key: &str) -> usize {
        self.calls_matching(key).len()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ModelError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            replies
                .iter_mut()
                .find(|(key, _)| system_prompt.contains(key.as_str()))
                .and_then(|(_, queue)| {
                    if queue.len() > 1 {
                        queue.pop_front()
                    } else {
                        queue.front().cloned()
                    }
                })
        };

        match reply {
            Some(reply) => reply.resolve().await,
            None => Err(ModelError::InvalidRequest(format!(
                "MockAiProvider: No response programmed for system prompt. Got: '{system_prompt}'"
            ))),
        }
    }
}

// --- Mock Search Provider ---

#[derive(Clone, Debug)]
enum SearchRule {
    Hits {
        source: String,
        query_contains: Option<String>,
        hits: Vec<(String, String)>,
    },
    Fail {
        source: String,
    },
    Delay {
        source: String,
        delay: Duration,
    },
}

/// A scripted `SearchProvider` that records every lookup.
///
/// Rules are keyed by source-domain name; unmatched lookups return no hits.
#[derive(Clone, Debug, Default)]
pub struct MockSearchProvider {
    rules: Arc<Mutex<Vec<SearchRule>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(content, url)` hits for every query against `source`.
    pub fn add_hits(&self, source: &str, hits: &[(&str, &str)]) {
        self.add_rule(source, None, hits);
    }

    /// Returns `(content, url)` hits for queries against `source` containing `query_contains`.
    pub fn add_hits_for_query(&self, source: &str, query_contains: &str, hits: &[(&str, &str)]) {
        self.add_rule(source, Some(query_contains), hits);
    }

    fn add_rule(&self, source: &str, query_contains: Option<&str>, hits: &[(&str, &str)]) {
        self.rules.lock().unwrap().push(SearchRule::Hits {
            source: source.to_string(),
            query_contains: query_contains.map(str::to_string),
            hits: hits
                .iter()
                .map(|(c, u)| (c.to_string(), u.to_string()))
                .collect(),
        });
    }

    /// Makes every lookup against `source` fail.
    pub fn fail_source(&self, source: &str) {
        self.rules.lock().unwrap().push(SearchRule::Fail {
            source: source.to_string(),
        });
    }

    /// Makes every lookup against `source` hang for `delay` before returning nothing.
    pub fn delay_source(&self, source: &str, delay: Duration) {
        self.rules.lock().unwrap().push(SearchRule::Delay {
            source: source.to_string(),
            delay,
        });
    }

    /// All recorded (query, source name) pairs.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(
        &self,
        query: &str,
        source_domain: &SourceDomain,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), source_domain.name.clone()));

        let rule = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|rule| match rule {
                SearchRule::Hits {
                    source,
                    query_contains,
                    ..
                } => {
                    *source == source_domain.name
                        && query_contains.as_ref().map_or(true, |q| query.contains(q.as_str()))
                }
                SearchRule::Fail { source } | SearchRule::Delay { source, .. } => {
                    *source == source_domain.name
                }
            })
            .cloned();

        match rule {
            Some(SearchRule::Hits { hits, .. }) => Ok(hits
                .into_iter()
                .map(|(content, url)| SearchHit {
                    content,
                    source_domain: source_domain.name.clone(),
                    url: Some(url),
                    observed_at: Utc::now(),
                })
                .collect()),
            Some(SearchRule::Fail { .. }) => Err(SearchError::Status {
                status: 503,
                body: "mock search outage".to_string(),
            }),
            Some(SearchRule::Delay { delay, .. }) => {
                tokio::time::sleep(delay).await;
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }
}

// --- In-Memory Record Store ---

/// A `RecordStore` holding entries in memory, with optional injected failures.
#[derive(Clone, Debug, Default)]
pub struct MemoryRecordStore {
    entries: Arc<Mutex<Vec<Entry>>>,
    writes: Arc<Mutex<HashMap<String, BTreeMap<String, String>>>>,
    failing_writes: Arc<Mutex<HashSet<String>>>,
}

impl MemoryRecordStore {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
            ..Default::default()
        }
    }

    /// Makes writes for `entry_id` fail with an I/O error.
    pub fn fail_writes_for(&self, entry_id: &str) {
        self.failing_writes
            .lock()
            .unwrap()
            .insert(entry_id.to_string());
    }

    /// The accumulated fields written for `entry_id`.
    pub fn written(&self, entry_id: &str) -> Option<BTreeMap<String, String>> {
        self.writes.lock().unwrap().get(entry_id).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.id.clone())
            .collect())
    }

    async fn read(&self, entry_id: &str) -> Result<Entry, StoreError> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == entry_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(entry_id.to_string()))
    }

    async fn write(
        &self,
        entry_id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        if self.failing_writes.lock().unwrap().contains(entry_id) {
            return Err(StoreError::Io(std::io::Error::other("mock write failure")));
        }
        self.writes
            .lock()
            .unwrap()
            .entry(entry_id.to_string())
            .or_default()
            .extend(fields.clone());
        Ok(())
    }
}
