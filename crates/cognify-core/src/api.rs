use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chat::ChatRequest;
use crate::error::{ApiError, ApiResult};
use crate::registry::ContentId;
use crate::state::{Flashcard, QuizQuestion};
use crate::stream::FragmentReader;

#[derive(Serialize)]
struct VideoRequest<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct ContentRequest<'a> {
    content_ids: &'a [ContentId],
}

#[derive(Deserialize)]
struct IngestResponse {
    content_id: ContentId,
}

#[derive(Deserialize)]
struct FlashcardsResponse {
    flashcards: Vec<Flashcard>,
}

#[derive(Deserialize)]
struct QuizResponse {
    questions: Vec<QuizQuestion>,
}

#[derive(Deserialize)]
struct BannerResponse {
    message: String,
}

/// HTTP client for the study backend
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Backend banner from `GET /`, used as a reachability check
    pub async fn ping(&self) -> ApiResult<String> {
        let response = self.client.get(self.url("/")).send().await?;
        let banner: BannerResponse = read_json(response).await?;
        Ok(banner.message)
    }

    pub async fn process_video(&self, url: &str) -> ApiResult<ContentId> {
        info!(%url, "Submitting video for processing");

        let response = self
            .client
            .post(self.url("/process-video"))
            .json(&VideoRequest { url })
            .send()
            .await?;

        let body: IngestResponse = read_json(response).await?;
        info!(content_id = %body.content_id, "Video processed");
        Ok(body.content_id)
    }

    pub async fn process_pdf(&self, path: &Path) -> ApiResult<ContentId> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        info!(file = %file_name, size = bytes.len(), "Uploading PDF for processing");

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/process-pdf"))
            .multipart(form)
            .send()
            .await?;

        let body: IngestResponse = read_json(response).await?;
        info!(content_id = %body.content_id, "PDF processed");
        Ok(body.content_id)
    }

    pub async fn generate_flashcards(&self, content_ids: &[ContentId]) -> ApiResult<Vec<Flashcard>> {
        let response = self
            .client
            .post(self.url("/generate-flashcards"))
            .json(&ContentRequest { content_ids })
            .send()
            .await?;

        let body: FlashcardsResponse = read_json(response).await?;
        debug!(count = body.flashcards.len(), "Flashcards generated");
        Ok(body.flashcards)
    }

    pub async fn generate_quiz(&self, content_ids: &[ContentId]) -> ApiResult<Vec<QuizQuestion>> {
        let response = self
            .client
            .post(self.url("/generate-quiz"))
            .json(&ContentRequest { content_ids })
            .send()
            .await?;

        let body: QuizResponse = read_json(response).await?;
        debug!(count = body.questions.len(), "Quiz generated");
        Ok(body.questions)
    }

    /// Open a streamed chat answer. Fails without reading if the status isn't success.
    pub async fn chat(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> ApiResult<FragmentReader> {
        let response = self
            .client
            .post(self.url("/chat"))
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body = response.bytes_stream().map(|chunk| chunk.map_err(ApiError::from));
        Ok(FragmentReader::new(body, cancel))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status.as_u16(), &text))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
