//! In-memory TTL cache for query responses.

use std::num::NonZeroUsize;
use std::str::Chars;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use lru::LruCache;
use serde_json::Value;
use tokio::time::Instant;

/// Number of responses a cache holds unless told otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

type Entry = (Instant, Value);

/// Caches successful query responses keyed by document and variables.
///
/// The cache is bounded: once full, the least recently used entry is
/// evicted. Entries expire `ttl` after insertion. Every insert also drops
/// whatever has expired, so a long run of distinct cursors cannot keep
/// stale pages alive.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<LruCache<String, Entry>>,
}

impl ResponseCache {
    /// Creates an empty cache of [`DEFAULT_CACHE_CAPACITY`] entries that
    /// live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CACHE_CAPACITY)
    }

    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cap()
            .get()
    }

    fn key(document: &str, variables: &Value) -> String {
        format!("{document}\u{0}{variables}")
    }

    /// Returns `true` if `body` may be stored for `document`.
    ///
    /// Only query documents are stored, and only when the response carries
    /// no errors.
    #[must_use]
    pub fn is_cacheable(document: &str, body: &Value) -> bool {
        if !is_read_only(document) {
            return false;
        }
        body.get("errors")
            .and_then(Value::as_array)
            .map_or(true, Vec::is_empty)
    }

    /// Looks up a live entry, marking it as recently used.
    pub fn get(&self, document: &str, variables: &Value) -> Option<Value> {
        let key = Self::key(document, variables);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if entries.peek(&key)?.0.elapsed() >= self.ttl {
            entries.pop(&key);
            return None;
        }
        entries.get(&key).map(|(_, body)| body.clone())
    }

    /// Stores `body` if [`is_cacheable`](Self::is_cacheable) allows it.
    pub fn insert(&self, document: &str, variables: &Value, body: &Value) {
        if !Self::is_cacheable(document, body) {
            return;
        }
        let key = Self::key(document, variables);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        self.purge_expired(&mut entries);
        entries.put(key, (Instant::now(), body.clone()));
    }

    fn purge_expired(&self, entries: &mut LruCache<String, Entry>) {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, (stored_at, _))| stored_at.elapsed() >= self.ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            entries.pop(&key);
        }
    }

    /// Number of stored entries.
    ///
    /// Entries that expired since the last insert are still counted.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns `false` if `document` defines a mutation or a subscription.
///
/// Only top-level keywords count. Comments, string literals, and anything
/// nested in braces, parentheses or brackets are skipped, so fragment
/// bodies and field arguments never match.
fn is_read_only(document: &str) -> bool {
    let mut top_level = String::with_capacity(document.len());
    let mut depth = 0_usize;
    let mut chars = document.chars();

    while let Some(c) = chars.next() {
        match c {
            '#' => {
                chars.by_ref().find(|&c| c == '\n' || c == '\r');
                top_level.push(' ');
            }
            '"' => {
                skip_string(&mut chars);
                top_level.push(' ');
            }
            '{' | '(' | '[' => {
                depth += 1;
                top_level.push(' ');
            }
            '}' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                top_level.push(' ');
            }
            c if depth == 0 => top_level.push(c),
            _ => {}
        }
    }

    !top_level
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word == "mutation" || word == "subscription")
}

fn skip_string(chars: &mut Chars<'_>) {
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => return,
            _ => {}
        }
    }
}
