//! Runtime configuration read from the environment.
//!
//! | Variable                      | Default        |
//! |-------------------------------|----------------|
//! | `TIMETABLE_HTTP_ADDR`         | `0.0.0.0:3000` |
//! | `TIMETABLE_CATALOG_URL`       | unset          |
//! | `TIMETABLE_CATALOG_DIR`       | unset          |
//! | `TIMETABLE_MAJORS_FILE`       | unset          |
//! | `TIMETABLE_LIBERAL_ARTS_FILE` | unset          |
//! | `RUST_LOG`                    | `info`         |
//!
//! When no catalog location is configured the built-in demo catalog is used.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::catalog::{CatalogEndpoint, FileLectureSource, InMemoryLectureSource, LectureSource};
use crate::seed;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
    #[error("{present} is set but {missing} is not")]
    IncompletePair {
        present: &'static str,
        missing: &'static str,
    },
    #[error("{0} requires the `remote-catalog` feature")]
    FeatureDisabled(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogLocation {
    Demo,
    Files { majors: PathBuf, liberal_arts: PathBuf },
    Remote { base_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub catalog: CatalogLocation,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            catalog: CatalogLocation::Demo,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let raw_addr = get("TIMETABLE_HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = raw_addr.parse::<SocketAddr>().map_err(|_| ConfigError::InvalidValue {
            name: "TIMETABLE_HTTP_ADDR",
            value: raw_addr.clone(),
        })?;

        let catalog = if let Some(base_url) = get("TIMETABLE_CATALOG_URL") {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    name: "TIMETABLE_CATALOG_URL",
                    value: base_url,
                });
            }
            CatalogLocation::Remote { base_url }
        } else if let Some(dir) = get("TIMETABLE_CATALOG_DIR") {
            let dir = PathBuf::from(dir);
            CatalogLocation::Files {
                majors: dir.join(CatalogEndpoint::Majors.file_name()),
                liberal_arts: dir.join(CatalogEndpoint::LiberalArts.file_name()),
            }
        } else {
            match (get("TIMETABLE_MAJORS_FILE"), get("TIMETABLE_LIBERAL_ARTS_FILE")) {
                (Some(majors), Some(liberal_arts)) => CatalogLocation::Files {
                    majors: majors.into(),
                    liberal_arts: liberal_arts.into(),
                },
                (Some(_), None) => {
                    return Err(ConfigError::IncompletePair {
                        present: "TIMETABLE_MAJORS_FILE",
                        missing: "TIMETABLE_LIBERAL_ARTS_FILE",
                    });
                }
                (None, Some(_)) => {
                    return Err(ConfigError::IncompletePair {
                        present: "TIMETABLE_LIBERAL_ARTS_FILE",
                        missing: "TIMETABLE_MAJORS_FILE",
                    });
                }
                (None, None) => CatalogLocation::Demo,
            }
        };

        let log_filter = get("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            http_addr,
            catalog,
            log_filter,
        })
    }

    /// Lecture source for the configured catalog location.
    pub fn lecture_source(&self) -> Result<Arc<dyn LectureSource>, ConfigError> {
        match &self.catalog {
            CatalogLocation::Demo => {
                let (majors, liberal_arts) = seed::demo_catalog();
                Ok(Arc::new(InMemoryLectureSource::new(majors, liberal_arts)))
            }
            CatalogLocation::Files {
                majors,
                liberal_arts,
            } => Ok(Arc::new(FileLectureSource::new(majors.clone(), liberal_arts.clone()))),
            #[cfg(feature = "remote-catalog")]
            CatalogLocation::Remote { base_url } => {
                Ok(Arc::new(crate::catalog::HttpLectureSource::new(base_url.clone())))
            }
            #[cfg(not(feature = "remote-catalog"))]
            CatalogLocation::Remote { .. } => Err(ConfigError::FeatureDisabled("TIMETABLE_CATALOG_URL")),
        }
    }
}
