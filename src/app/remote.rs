use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{
    memes::{normalize, CategoriesResponse, Meme, MemePage, MemesResponse, RawMeme},
    search::ByteStream,
};

use super::{backend::*, errors::AppError};

/// HTTP client for the meme search API.
pub struct AppRemote {
    remote_addr: String,
    bearer_token: Option<String>,
    client: reqwest::Client,
}

impl AppRemote {
    pub fn new(
        addr: &str,
        bearer_token: Option<String>,
        connect_timeout: Duration,
    ) -> Result<AppRemote, AppError> {
        let remote_addr = addr.strip_suffix('/').unwrap_or(addr).to_string();
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(AppRemote {
            remote_addr,
            bearer_token: bearer_token.filter(|t| !t.is_empty()),
            client,
        })
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.remote_addr, path);
        log::info!("GET {url}");
        self.with_auth(self.client.get(url))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.remote_addr, path);
        log::info!("POST {url}");
        self.with_auth(self.client.post(url))
    }
}

/// Turn a non-2xx response into an [`AppError`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(AppError::NotFound);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|m| !m.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();

    Err(AppError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn handle_response<T>(response: reqwest::Response) -> Result<T, AppError>
where
    T: DeserializeOwned,
{
    let text = check_status(response).await?.text().await?;

    serde_json::from_str::<T>(&text).map_err(|err| {
        log::error!("{err}. tried to parse: {text:?}");
        err.into()
    })
}

#[async_trait]
impl MemeBackend for AppRemote {
    async fn search_stream(&self, query: &str, top_k: usize) -> Result<ByteStream, AppError> {
        log::debug!("search_stream: {query:?} top_k={top_k}");
        let response = self
            .post("/search/stream")
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&json!({
                "query": query,
                "top_k": top_k,
            }))
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(AppError::from))
            .boxed())
    }

    async fn search(&self, request: &SearchRequest) -> Result<MemePage, AppError> {
        log::debug!("search: {request:?}");
        let resp = self.post("/search").json(request).send().await?;

        Ok(handle_response::<MemesResponse>(resp).await?.into_page())
    }

    async fn list(&self, query: &ListQuery) -> Result<MemePage, AppError> {
        let resp = self.get("/memes").query(query).send().await?;

        Ok(handle_response::<MemesResponse>(resp).await?.into_page())
    }

    async fn categories(&self) -> Result<Vec<String>, AppError> {
        let resp = self.get("/categories").send().await?;

        Ok(handle_response::<CategoriesResponse>(resp).await?.categories)
    }

    async fn meme(&self, id: &str) -> Result<Meme, AppError> {
        let mut url = reqwest::Url::parse(&format!("{}/memes", self.remote_addr))
            .map_err(|err| AppError::Other(err.into()))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Other(anyhow!("{} can't take a path", self.remote_addr)))?
            .push(id);

        log::info!("GET {url}");
        let resp = self.with_auth(self.client.get(url)).send().await?;

        Ok(normalize(&handle_response::<RawMeme>(resp).await?))
    }
}
