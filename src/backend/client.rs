//! HTTP client wrapper for the document backend.

use crate::backend::types::{
    Answer, BackendError, Model, QuestionItem, SummarySource, error_message, parse_answer,
    parse_questions, parse_summary,
};
use crate::config::Config;
use crate::document::UploadedFile;
use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde_json::{Value, json};
use std::time::Duration;

/// Operations the orchestrators need from the document backend.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Upload a document for indexing so it can be queried afterwards.
    async fn ingest(&self, file: &UploadedFile) -> Result<(), BackendError>;

    /// Ask a question about the ingested document.
    async fn query(&self, text: &str, model: Option<Model>) -> Result<Answer, BackendError>;

    /// Produce a Markdown summary of a document.
    async fn summarize(
        &self,
        file: &UploadedFile,
        source: SummarySource,
    ) -> Result<String, BackendError>;

    /// Generate study questions straight from a document.
    async fn questions_from_file(
        &self,
        file: &UploadedFile,
    ) -> Result<Vec<QuestionItem>, BackendError>;

    /// Generate study questions from already extracted text.
    async fn questions_from_text(&self, text: &str) -> Result<Vec<QuestionItem>, BackendError>;
}

/// Lightweight HTTP client for the document backend.
pub struct BackendClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
}

impl BackendClient {
    /// Construct a client for `base_url`, optionally bounding every request by `timeout`.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = Client::builder().user_agent("talktodocs/0.1");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        let base_url = normalize_base_url(base_url).map_err(BackendError::InvalidUrl)?;
        tracing::debug!(url = %base_url, timeout = ?timeout, "Initialized backend HTTP client");
        Ok(Self { client, base_url })
    }

    /// Construct a client from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(&config.backend_url, config.request_timeout)
    }

    async fn post_multipart(&self, path: &str, form: Form) -> Result<Value, BackendError> {
        let url = format_endpoint(&self.base_url, path);
        tracing::debug!(%url, "POST multipart");
        let response = self.client.post(url).multipart(form).send().await?;
        read_json(path, response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        let url = format_endpoint(&self.base_url, path);
        tracing::debug!(%url, "POST json");
        let response = self.client.post(url).json(body).send().await?;
        read_json(path, response).await
    }
}

#[async_trait]
impl DocumentBackend for BackendClient {
    async fn ingest(&self, file: &UploadedFile) -> Result<(), BackendError> {
        let form = Form::new().part("file", file_part(file)?);
        let body = self.post_multipart("generate_data_store", form).await?;
        if !body.is_object() {
            return Err(BackendError::Malformed(
                "expected a JSON object from generate_data_store".into(),
            ));
        }
        tracing::info!(file = file.name(), "Document ingested");
        Ok(())
    }

    async fn query(&self, text: &str, model: Option<Model>) -> Result<Answer, BackendError> {
        let mut payload = json!({ "query_text": text });
        if let Some(model) = model
            && let Some(object) = payload.as_object_mut()
        {
            object.insert("model".into(), Value::String(model.query_id().into()));
        }
        let body = self.post_json("query_data", &payload).await?;
        parse_answer(body)
    }

    async fn summarize(
        &self,
        file: &UploadedFile,
        source: SummarySource,
    ) -> Result<String, BackendError> {
        let form = Form::new().part("file", file_part(file)?);
        let (path, form) = match source {
            SummarySource::Uploaded(model) => ("summarize", form.text("model", model.label())),
            SummarySource::Ocr => ("summarize_ocr", form),
        };
        let body = self.post_multipart(path, form).await?;
        parse_summary(body)
    }

    async fn questions_from_file(
        &self,
        file: &UploadedFile,
    ) -> Result<Vec<QuestionItem>, BackendError> {
        let form = Form::new().part("file", file_part(file)?);
        let body = self.post_multipart("generate_questions", form).await?;
        parse_questions(body)
    }

    async fn questions_from_text(&self, text: &str) -> Result<Vec<QuestionItem>, BackendError> {
        let body = self
            .post_json("generate_questions_from_text", &json!({ "text": text }))
            .await?;
        parse_questions(body)
    }
}

fn file_part(file: &UploadedFile) -> Result<Part, BackendError> {
    Ok(Part::bytes(file.bytes().to_vec())
        .file_name(file.name().to_string())
        .mime_str(file.mime_type())?)
}

async fn read_json(path: &str, response: reqwest::Response) -> Result<Value, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let error = BackendError::Status {
            status,
            message: error_message(status, &body),
        };
        tracing::error!(endpoint = path, error = %error, "Backend request failed");
        return Err(error);
    }

    serde_json::from_str(&body).map_err(|error| {
        tracing::error!(endpoint = path, %error, "Backend returned invalid JSON");
        BackendError::Malformed(format!("{path} returned invalid JSON: {error}"))
    })
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ErrorKind;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient {
            client: Client::builder()
                .user_agent("talktodocs-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
        }
    }

    fn sample_file() -> UploadedFile {
        UploadedFile::new("lecture.pdf", "application/pdf", b"%PDF-1.4 sample".to_vec())
    }

    #[tokio::test]
    async fn ingest_posts_multipart_file() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/generate_data_store")
                    .body_contains("name=\"file\"")
                    .body_contains("filename=\"lecture.pdf\"");
                then.status(200).json_body(json!({}));
            })
            .await;

        client_for(&server)
            .ingest(&sample_file())
            .await
            .expect("ingest");
        mock.assert();
    }

    #[tokio::test]
    async fn ingest_surfaces_error_field_on_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/generate_data_store");
                then.status(400)
                    .json_body(json!({ "error": "Unsupported file type" }));
            })
            .await;

        let error = client_for(&server)
            .ingest(&sample_file())
            .await
            .expect_err("status error");
        assert_eq!(error.kind(), ErrorKind::Status);
        assert!(
            matches!(error, BackendError::Status { status, ref message } if status.as_u16() == 400 && message == "Unsupported file type")
        );
    }

    #[tokio::test]
    async fn ingest_rejects_non_json_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/generate_data_store");
                then.status(200).body("<html>ok</html>");
            })
            .await;

        let error = client_for(&server)
            .ingest(&sample_file())
            .await
            .expect_err("malformed");
        assert_eq!(error.kind(), ErrorKind::Malformed);
    }

    #[tokio::test]
    async fn query_sends_lowercase_model_and_normalizes_prompt_shape() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/query_data")
                    .json_body(json!({ "query_text": "What is RAG?", "model": "custom" }));
                then.status(200).json_body(json!({
                    "response": { "generated_prompt": "Retrieval augmented generation.", "sources": [] }
                }));
            })
            .await;

        let answer = client_for(&server)
            .query("What is RAG?", Some(Model::Custom))
            .await
            .expect("answer");
        mock.assert();
        assert_eq!(answer.text, "Retrieval augmented generation.");
    }

    #[tokio::test]
    async fn query_omits_model_when_unset() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/query_data")
                    .json_body(json!({ "query_text": "Hi" }));
                then.status(200).json_body(json!({ "response": "Hello" }));
            })
            .await;

        let answer = client_for(&server).query("Hi", None).await.expect("answer");
        mock.assert();
        assert_eq!(answer.text, "Hello");
    }

    #[tokio::test]
    async fn summarize_routes_by_source() {
        let server = MockServer::start_async().await;
        let uploaded = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/summarize")
                    .body_contains("name=\"model\"")
                    .body_contains("Llama");
                then.status(200).json_body(json!({ "summary": "# Overview" }));
            })
            .await;
        let ocr = server
            .mock_async(|when, then| {
                when.method(POST).path("/summarize_ocr");
                then.status(200).json_body(json!({ "summary": "Handwritten notes" }));
            })
            .await;

        let client = client_for(&server);
        let file = sample_file();
        assert_eq!(
            client
                .summarize(&file, SummarySource::Uploaded(Model::Llama))
                .await
                .expect("summary"),
            "# Overview"
        );
        assert_eq!(
            client
                .summarize(&file, SummarySource::Ocr)
                .await
                .expect("ocr summary"),
            "Handwritten notes"
        );
        uploaded.assert();
        ocr.assert();
    }

    #[tokio::test]
    async fn questions_from_text_posts_json() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/generate_questions_from_text")
                    .json_body(json!({ "text": "S" }));
                then.status(200).json_body(json!({
                    "questions": [{ "question": "Q1", "answer": "A1" }]
                }));
            })
            .await;

        let questions = client_for(&server)
            .questions_from_text("S")
            .await
            .expect("questions");
        mock.assert();
        assert_eq!(questions, vec![QuestionItem::new("Q1", "A1")]);
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let client = BackendClient::new("http://127.0.0.1:9", Some(Duration::from_secs(2)))
            .expect("client");
        let error = client
            .questions_from_file(&sample_file())
            .await
            .expect_err("transport");
        assert_eq!(error.kind(), ErrorKind::Transport);
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let base = normalize_base_url("http://localhost:5000/api/").expect("url");
        assert_eq!(format_endpoint(&base, "/query_data"), "http://localhost:5000/api/query_data");
    }
}
