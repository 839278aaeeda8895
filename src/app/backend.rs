use async_trait::async_trait;
use serde::Serialize;

use crate::{
    memes::{Meme, MemePage},
    search::ByteStream,
};

use super::errors::AppError;

#[async_trait]
pub trait MemeBackend: Send + Sync {
    /// Open `POST /search/stream` and hand back the raw body.
    ///
    /// Fails before returning if the server answers with a non-2xx status.
    async fn search_stream(&self, query: &str, top_k: usize) -> Result<ByteStream, AppError>;

    async fn search(&self, request: &SearchRequest) -> Result<MemePage, AppError>;

    async fn list(&self, query: &ListQuery) -> Result<MemePage, AppError>;

    async fn categories(&self) -> Result<Vec<String>, AppError>;

    async fn meme(&self, id: &str) -> Result<Meme, AppError>;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListQuery {
    pub limit: usize,
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
