//! Keyed query cache with scope invalidation.
//!
//! # Responsibility
//! - Memoize gateway reads by query key.
//! - Mark keys stale by scope after mutations so the next read refetches.
//! - Drop everything on session change.
//!
//! # Invariants
//! - Every key belongs to exactly one scope.
//! - A stale or missing entry is never served; the next read fetches.
//! - A failed fetch leaves the previous entry untouched.

use crate::api::query::{TaskQuery, TodoQuery};
use crate::api::ApiResult;
use crate::model::common::EntityId;
use crate::model::project::Project;
use crate::model::stats::DashboardStats;
use crate::model::task::Task;
use crate::model::todo::Todo;
use log::debug;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Root of a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Projects,
    Tasks,
    Todos,
    Stats,
}

impl CacheScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Tasks => "tasks",
            Self::Todos => "todos",
            Self::Stats => "stats",
        }
    }
}

impl Display for CacheScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Projects,
    Project(EntityId),
    Tasks(TaskQuery),
    Task(EntityId),
    Todos(TodoQuery),
    Todo(EntityId),
    Stats,
}

impl CacheKey {
    pub fn scope(&self) -> CacheScope {
        match self {
            Self::Projects | Self::Project(_) => CacheScope::Projects,
            Self::Tasks(_) | Self::Task(_) => CacheScope::Tasks,
            Self::Todos(_) | Self::Todo(_) => CacheScope::Todos,
            Self::Stats => CacheScope::Stats,
        }
    }
}

/// Payload stored under a key.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Projects(Vec<Project>),
    Project(Project),
    Tasks(Vec<Task>),
    Task(Task),
    Todos(Vec<Todo>),
    Todo(Todo),
    Stats(DashboardStats),
}

/// Conversion between a read result and its cache slot.
pub trait Cacheable: Clone {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: &CachedValue) -> Option<&Self>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn from_cached(value: &CachedValue) -> Option<&Self> {
                match value {
                    CachedValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Vec<Project>, Projects);
cacheable!(Project, Project);
cacheable!(Vec<Task>, Tasks);
cacheable!(Task, Task);
cacheable!(Vec<Todo>, Todos);
cacheable!(Todo, Todo);
cacheable!(DashboardStats, Stats);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedValue,
    stale: bool,
}

/// In-memory query cache.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh value under `key`, if any.
    pub fn get<T: Cacheable>(&self, key: &CacheKey) -> Option<&T> {
        self.entries
            .get(key)
            .filter(|entry| !entry.stale)
            .and_then(|entry| T::from_cached(&entry.value))
    }

    /// Last known value under `key`, even if stale.
    pub fn peek<T: Cacheable>(&self, key: &CacheKey) -> Option<&T> {
        self.entries
            .get(key)
            .and_then(|entry| T::from_cached(&entry.value))
    }

    pub fn insert<T: Cacheable>(&mut self, key: CacheKey, value: T) {
        self.entries.insert(
            key,
            CacheEntry {
                value: value.into_cached(),
                stale: false,
            },
        );
    }

    /// Serves a fresh entry or runs `fetch` and stores its result.
    ///
    /// # Errors
    /// - Propagates the fetch error; the existing entry is kept as is.
    pub fn get_or_fetch<T: Cacheable>(
        &mut self,
        key: CacheKey,
        fetch: impl FnOnce() -> ApiResult<T>,
    ) -> ApiResult<T> {
        if let Some(value) = self.get::<T>(&key) {
            debug!("event=cache_read module=cache status=hit scope={}", key.scope());
            return Ok(value.clone());
        }
        debug!("event=cache_read module=cache status=miss scope={}", key.scope());
        let value = fetch()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn is_fresh(&self, key: &CacheKey) -> bool {
        self.entries.get(key).is_some_and(|entry| !entry.stale)
    }

    /// Marks every key under `scope` stale; returns how many were marked.
    pub fn invalidate(&mut self, scope: CacheScope) -> usize {
        let mut marked = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.scope() == scope && !entry.stale {
                entry.stale = true;
                marked += 1;
            }
        }
        debug!(
            "event=cache_invalidate module=cache status=ok scope={} marked={}",
            scope, marked
        );
        marked
    }

    /// Marks one key stale; returns whether it was cached.
    pub fn invalidate_key(&mut self, key: &CacheKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        debug!(
            "event=cache_clear module=cache status=ok dropped={}",
            dropped
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
