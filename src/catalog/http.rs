use futures::future::{BoxFuture, FutureExt};

use super::file::decode_lectures;
use super::{CatalogEndpoint, CatalogError, CatalogResult, LectureSource};
use crate::lecture::Lecture;

/// Fetches `<base_url>/schedules-majors.json` and `<base_url>/schedules-liberal-arts.json`.
#[derive(Debug, Clone)]
pub struct HttpLectureSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLectureSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, endpoint: CatalogEndpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.file_name())
    }
}

impl LectureSource for HttpLectureSource {
    fn fetch(&self, endpoint: CatalogEndpoint) -> BoxFuture<'static, CatalogResult<Vec<Lecture>>> {
        let request = self.client.get(self.url(endpoint));
        async move {
            let transport = |err: reqwest::Error| CatalogError::Transport {
                endpoint,
                message: err.to_string(),
            };
            let response = request.send().await.map_err(transport)?;
            let status = response.status();
            if !status.is_success() {
                return Err(CatalogError::Status {
                    endpoint,
                    status: status.as_u16(),
                });
            }
            let bytes = response.bytes().await.map_err(transport)?;
            decode_lectures(endpoint, &bytes)
        }
        .boxed()
    }
}
