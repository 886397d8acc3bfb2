//! Topic-attribute lookup boundary.
//!
//! Used for exactly one decision: does a foreign context's topic already
//! exist, or must it be bootstrapped before a cross-context subscription
//! can be wired?

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{CloudError, CloudResult};

/// Topic attribute lookup.
#[async_trait]
pub trait TopicLookup: Send + Sync {
    /// Attributes of the topic with the given ARN.
    /// [`CloudError::TopicNotFound`] when no such topic exists.
    async fn topic_attributes(&self, arn: &str) -> CloudResult<BTreeMap<String, String>>;
}

/// In-memory topic registry for tests.
pub struct InMemoryTopicLookup {
    topics: DashMap<String, BTreeMap<String, String>>,
}

impl InMemoryTopicLookup {
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
        }
    }

    /// Register a topic as existing.
    pub fn register(&self, arn: impl Into<String>) {
        let arn = arn.into();
        let mut attrs = BTreeMap::new();
        attrs.insert("TopicArn".to_string(), arn.clone());
        self.topics.insert(arn, attrs);
    }
}

impl Default for InMemoryTopicLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopicLookup for InMemoryTopicLookup {
    async fn topic_attributes(&self, arn: &str) -> CloudResult<BTreeMap<String, String>> {
        self.topics
            .get(arn)
            .map(|attrs| attrs.clone())
            .ok_or_else(|| CloudError::TopicNotFound(arn.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_topic_is_found() {
        let lookup = InMemoryTopicLookup::new();
        lookup.register("arn:aws:sns:us-east-1:123456789012:acme-staging-orders");
        let attrs = lookup
            .topic_attributes("arn:aws:sns:us-east-1:123456789012:acme-staging-orders")
            .await
            .unwrap();
        assert!(attrs.contains_key("TopicArn"));
    }

    #[tokio::test]
    async fn unknown_topic_is_not_found() {
        let lookup = InMemoryTopicLookup::new();
        let err = lookup
            .topic_attributes("arn:aws:sns:us-east-1:123456789012:absent")
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::TopicNotFound(_)));
    }
}
