use futures::future::{BoxFuture, FutureExt};
use std::path::{Path, PathBuf};

use super::{CatalogEndpoint, CatalogError, CatalogResult, LectureSource};
use crate::lecture::Lecture;

/// Reads the two catalog endpoints from JSON files on disk.
#[derive(Debug, Clone)]
pub struct FileLectureSource {
    majors: PathBuf,
    liberal_arts: PathBuf,
}

impl FileLectureSource {
    pub fn new(majors: impl Into<PathBuf>, liberal_arts: impl Into<PathBuf>) -> Self {
        Self {
            majors: majors.into(),
            liberal_arts: liberal_arts.into(),
        }
    }

    /// Both files under `dir`, using the endpoint file names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(CatalogEndpoint::Majors.file_name()),
            dir.join(CatalogEndpoint::LiberalArts.file_name()),
        )
    }

    fn path(&self, endpoint: CatalogEndpoint) -> &Path {
        match endpoint {
            CatalogEndpoint::Majors => &self.majors,
            CatalogEndpoint::LiberalArts => &self.liberal_arts,
        }
    }
}

impl LectureSource for FileLectureSource {
    fn fetch(&self, endpoint: CatalogEndpoint) -> BoxFuture<'static, CatalogResult<Vec<Lecture>>> {
        let path = self.path(endpoint).to_path_buf();
        async move {
            let bytes = tokio::fs::read(&path).await.map_err(|err| CatalogError::Io {
                endpoint,
                message: format!("{}: {err}", path.display()),
            })?;
            decode_lectures(endpoint, &bytes)
        }
        .boxed()
    }
}

pub(crate) fn decode_lectures(endpoint: CatalogEndpoint, bytes: &[u8]) -> CatalogResult<Vec<Lecture>> {
    serde_json::from_slice(bytes).map_err(|err| CatalogError::Decode {
        endpoint,
        message: err.to_string(),
    })
}

/// Write lectures as a catalog JSON array.
pub fn save_lectures_to_json<P: AsRef<Path>>(lectures: &[Lecture], path: P) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, lectures)?;
    Ok(())
}
