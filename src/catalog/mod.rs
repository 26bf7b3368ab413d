//! Lecture catalog loading and caching.
//!
//! The catalog is split across two endpoints (major courses and liberal-arts courses).
//! [`LectureCatalog`] fetches both concurrently, merges them, and keeps the result for
//! the lifetime of the process. Callers arriving while a fetch is in flight await that
//! same fetch.

pub mod file;
#[cfg(feature = "remote-catalog")]
pub mod http;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::lecture::Lecture;

pub use file::FileLectureSource;
#[cfg(feature = "remote-catalog")]
pub use http::HttpLectureSource;

/// The merged catalog, shared read-only.
pub type LectureList = Arc<Vec<Arc<Lecture>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogEndpoint {
    Majors,
    LiberalArts,
}

impl CatalogEndpoint {
    pub fn file_name(self) -> &'static str {
        match self {
            CatalogEndpoint::Majors => "schedules-majors.json",
            CatalogEndpoint::LiberalArts => "schedules-liberal-arts.json",
        }
    }
}

impl fmt::Display for CatalogEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogEndpoint::Majors => f.write_str("majors"),
            CatalogEndpoint::LiberalArts => f.write_str("liberal-arts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("{endpoint} catalog request failed with status {status}")]
    Status { endpoint: CatalogEndpoint, status: u16 },
    #[error("{endpoint} catalog request failed: {message}")]
    Transport {
        endpoint: CatalogEndpoint,
        message: String,
    },
    #[error("{endpoint} catalog is not valid lecture data: {message}")]
    Decode {
        endpoint: CatalogEndpoint,
        message: String,
    },
    #[error("{endpoint} catalog could not be read: {message}")]
    Io {
        endpoint: CatalogEndpoint,
        message: String,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// One place lecture records can be fetched from.
pub trait LectureSource: Send + Sync {
    fn fetch(&self, endpoint: CatalogEndpoint) -> BoxFuture<'static, CatalogResult<Vec<Lecture>>>;
}

/// Fixed lecture lists, used for demo data and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLectureSource {
    majors: Arc<Vec<Lecture>>,
    liberal_arts: Arc<Vec<Lecture>>,
}

impl InMemoryLectureSource {
    pub fn new(majors: Vec<Lecture>, liberal_arts: Vec<Lecture>) -> Self {
        Self {
            majors: Arc::new(majors),
            liberal_arts: Arc::new(liberal_arts),
        }
    }
}

impl LectureSource for InMemoryLectureSource {
    fn fetch(&self, endpoint: CatalogEndpoint) -> BoxFuture<'static, CatalogResult<Vec<Lecture>>> {
        let lectures = match endpoint {
            CatalogEndpoint::Majors => Arc::clone(&self.majors),
            CatalogEndpoint::LiberalArts => Arc::clone(&self.liberal_arts),
        };
        async move { Ok::<_, CatalogError>(lectures.as_ref().clone()) }.boxed()
    }
}

type SharedFetch = Shared<BoxFuture<'static, CatalogResult<LectureList>>>;

enum CacheState {
    Uninitialized,
    Loading { attempt: u64, fetch: SharedFetch },
    Ready(LectureList),
    Failed(CatalogError),
}

/// Observable summary of the cache lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CatalogStatus {
    Uninitialized,
    Loading,
    Ready { lectures: usize },
    Failed { error: String },
}

/// Process-scoped, de-duplicating lecture cache.
pub struct LectureCatalog {
    source: Arc<dyn LectureSource>,
    state: Mutex<CacheState>,
    attempts: Mutex<u64>,
}

impl LectureCatalog {
    pub fn new(source: impl LectureSource + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<dyn LectureSource>) -> Self {
        Self {
            source,
            state: Mutex::new(CacheState::Uninitialized),
            attempts: Mutex::new(0),
        }
    }

    pub fn status(&self) -> CatalogStatus {
        match &*self.state.lock() {
            CacheState::Uninitialized => CatalogStatus::Uninitialized,
            CacheState::Loading { .. } => CatalogStatus::Loading,
            CacheState::Ready(lectures) => CatalogStatus::Ready {
                lectures: lectures.len(),
            },
            CacheState::Failed(err) => CatalogStatus::Failed {
                error: err.to_string(),
            },
        }
    }

    /// All lectures, majors first. Fetches on first use; a failed attempt is reported
    /// to every waiter and the next call tries again.
    pub async fn lectures(&self) -> CatalogResult<LectureList> {
        let (attempt, fetch) = {
            let mut state = self.state.lock();
            let in_flight = match &*state {
                CacheState::Ready(lectures) => return Ok(Arc::clone(lectures)),
                CacheState::Loading { attempt, fetch } => Some((*attempt, fetch.clone())),
                CacheState::Uninitialized | CacheState::Failed(_) => None,
            };
            match in_flight {
                Some(pending) => pending,
                None => {
                    let attempt = self.next_attempt();
                    let fetch = self.start_fetch();
                    tracing::debug!(attempt, "starting catalog fetch");
                    *state = CacheState::Loading {
                        attempt,
                        fetch: fetch.clone(),
                    };
                    (attempt, fetch)
                }
            }
        };

        let result = fetch.await;

        let mut state = self.state.lock();
        let current = matches!(&*state, CacheState::Loading { attempt: a, .. } if *a == attempt);
        if current {
            *state = match &result {
                Ok(lectures) => {
                    tracing::info!(lectures = lectures.len(), "lecture catalog loaded");
                    CacheState::Ready(Arc::clone(lectures))
                }
                Err(err) => {
                    tracing::warn!(%err, "lecture catalog fetch failed");
                    CacheState::Failed(err.clone())
                }
            };
        }
        result
    }

    pub async fn find(&self, lecture_id: &str) -> CatalogResult<Option<Arc<Lecture>>> {
        let lectures = self.lectures().await?;
        Ok(lectures.iter().find(|lecture| lecture.id == lecture_id).cloned())
    }

    fn next_attempt(&self) -> u64 {
        let mut attempts = self.attempts.lock();
        *attempts += 1;
        *attempts
    }

    fn start_fetch(&self) -> SharedFetch {
        let majors = self.source.fetch(CatalogEndpoint::Majors);
        let liberal_arts = self.source.fetch(CatalogEndpoint::LiberalArts);
        async move {
            let (majors, liberal_arts) = futures::future::try_join(majors, liberal_arts).await?;
            let merged: Vec<Arc<Lecture>> = majors
                .into_iter()
                .chain(liberal_arts)
                .map(Arc::new)
                .collect();
            Ok::<LectureList, CatalogError>(Arc::new(merged))
        }
        .boxed()
        .shared()
    }
}

impl fmt::Debug for LectureCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LectureCatalog")
            .field("status", &self.status())
            .finish()
    }
}
