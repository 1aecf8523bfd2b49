//! Answer cache keyed by normalized question text. Only genuine final
//! answers are stored; degraded-service and error messages must never be
//! replayed to later askers.

use moka::sync::Cache;
use std::time::Duration;

/// Statistical phrasings likely to repeat across users.
const CACHE_PATTERNS: &[&str] = &[
    "who has the most",
    "how many wins",
    "top dancers",
    "win rate",
    "career statistics",
    "partnership analysis",
    "contest results",
    "judge statistics",
    "what are the rules",
    "division system",
    "advancement criteria",
];

/// Time-sensitive or user-specific phrasings. Checked before the allow list.
const NO_CACHE_PATTERNS: &[&str] = &[
    "current",
    "today",
    "recent",
    "latest",
    "this year",
    "register",
    "feedback",
];

/// Questions longer than this default to cacheable.
const SUBSTANTIAL_QUESTION_LEN: usize = 20;

pub struct AnswerCache {
    inner: Option<Cache<String, String>>,
}

impl AnswerCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Some(
                Cache::builder()
                    .max_capacity(capacity)
                    .time_to_live(ttl)
                    .build(),
            ),
        }
    }

    /// A cache that stores nothing. Lets callers opt out without branching.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Case- and whitespace-insensitive: "Who won in 2005?" and
    /// " who won in 2005? " hit the same entry.
    pub fn key(question: &str) -> String {
        format!("{:x}", md5::compute(question.trim().to_lowercase()))
    }

    pub fn get(&self, question: &str) -> Option<String> {
        self.inner.as_ref()?.get(&Self::key(question))
    }

    /// Store an answer, subject to the cacheability policy.
    pub fn store(&self, question: &str, answer: &str) {
        if let Some(cache) = &self.inner {
            if should_cache(question) {
                cache.insert(Self::key(question), answer.to_string());
            }
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.as_ref().map(|c| c.entry_count()).unwrap_or(0)
    }
}

/// Deny-list first, then the statistical allow-list, then a length default.
pub fn should_cache(question: &str) -> bool {
    let q = question.trim().to_lowercase();
    if NO_CACHE_PATTERNS.iter().any(|p| q.contains(p)) {
        return false;
    }
    if CACHE_PATTERNS.iter().any(|p| q.contains(p)) {
        return true;
    }
    q.len() > SUBSTANTIAL_QUESTION_LEN
}
