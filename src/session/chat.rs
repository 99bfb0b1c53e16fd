//! Conversational query client over an ingested document.

use crate::backend::{Answer, BackendError, DocumentBackend, Model};
use crate::document::UploadedFile;
use crate::session::types::{ChatMessage, Reply, SessionError, Stage, StageError, Turn};
use crate::session::upload::UploadOrchestrator;

/// Handle for a user turn that was appended but not yet answered.
///
/// Produced by [`ChatSession::begin`] and consumed by [`ChatSession::finish`].
#[derive(Debug)]
#[must_use = "a pending query must be settled with ChatSession::finish"]
pub struct PendingQuery {
    index: usize,
    text: String,
}

impl PendingQuery {
    /// Trimmed question text to send to the backend.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered transcript of questions and replies.
///
/// At most one turn is pending at any time: [`ChatSession::begin`] refuses a new question until
/// the outstanding one is settled, so replies always pair with the question that caused them.
#[derive(Debug, Default)]
pub struct ChatSession {
    model: Option<Model>,
    turns: Vec<Turn>,
}

impl ChatSession {
    /// Start an empty transcript. `model` is attached to every query when set.
    pub fn new(model: Option<Model>) -> Self {
        Self {
            model,
            turns: Vec::new(),
        }
    }

    /// Backend model attached to queries.
    pub fn model(&self) -> Option<Model> {
        self.model
    }

    /// Append the user's question immediately and mark it pending.
    pub fn begin(&mut self, text: &str) -> Result<PendingQuery, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyQuery);
        }
        if self.is_waiting() {
            return Err(SessionError::QueryInFlight);
        }
        self.turns.push(Turn {
            question: text.to_string(),
            reply: Reply::Pending,
        });
        Ok(PendingQuery {
            index: self.turns.len() - 1,
            text: text.to_string(),
        })
    }

    /// Settle a pending turn with the backend's result.
    pub fn finish(
        &mut self,
        pending: PendingQuery,
        result: Result<Answer, BackendError>,
    ) -> Result<&Turn, SessionError> {
        let turn = self
            .turns
            .get_mut(pending.index)
            .filter(|turn| turn.is_pending() && turn.question == pending.text)
            .ok_or(SessionError::UnknownTurn)?;

        turn.reply = match result {
            Ok(answer) => {
                tracing::debug!(turn = pending.index, sources = answer.sources.len(), "Query answered");
                Reply::Answered(answer)
            }
            Err(error) => {
                tracing::error!(turn = pending.index, error = %error, "Query failed");
                Reply::Failed(StageError::from_backend(Stage::Query, &error))
            }
        };
        Ok(&*turn)
    }

    /// Ask one question: append it, query the backend, and settle the turn.
    ///
    /// A failed query leaves the turn in the transcript as [`Reply::Failed`] and returns the
    /// error.
    pub async fn submit<B>(&mut self, backend: &B, text: &str) -> Result<&Turn, SessionError>
    where
        B: DocumentBackend + ?Sized,
    {
        let pending = self.begin(text)?;
        let result = backend.query(pending.text(), self.model).await;
        let turn = self.finish(pending, result)?;
        match &turn.reply {
            Reply::Failed(error) => Err(error.clone().into()),
            _ => Ok(turn),
        }
    }

    /// Whether a question is waiting for its reply.
    pub fn is_waiting(&self) -> bool {
        self.turns.last().is_some_and(Turn::is_pending)
    }

    /// Every turn in submission order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Transcript flattened into user/assistant messages.
    ///
    /// Failed and pending turns contribute only their user message.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.turns.len() * 2);
        for turn in &self.turns {
            messages.push(ChatMessage::user(turn.question.clone()));
            if let Reply::Answered(answer) = &turn.reply {
                messages.push(ChatMessage::assistant(answer.text.clone()));
            }
        }
        messages
    }
}

/// Upload gate plus transcript: questions are accepted only once the document is ready.
#[derive(Debug, Default)]
pub struct DocumentChat {
    upload: UploadOrchestrator,
    chat: ChatSession,
}

impl DocumentChat {
    /// Create a chat that attaches `model` to each query when set.
    pub fn new(model: Option<Model>) -> Self {
        Self {
            upload: UploadOrchestrator::new(),
            chat: ChatSession::new(model),
        }
    }

    /// Select the document to chat about.
    pub fn select(&mut self, file: UploadedFile) -> bool {
        self.upload.select(file)
    }

    /// Ingest the selected document.
    pub async fn process<B>(&mut self, backend: &B) -> Result<(), SessionError>
    where
        B: DocumentBackend + ?Sized,
    {
        self.upload.process(backend).await
    }

    /// Ask a question about the ready document.
    pub async fn ask<B>(&mut self, backend: &B, text: &str) -> Result<&Turn, SessionError>
    where
        B: DocumentBackend + ?Sized,
    {
        if !self.upload.is_ready() {
            return Err(SessionError::NotReady);
        }
        self.chat.submit(backend, text).await
    }

    /// Upload side of the flow.
    pub fn upload(&self) -> &UploadOrchestrator {
        &self.upload
    }

    /// Transcript side of the flow.
    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ErrorKind;
    use crate::session::testing::{FakeBackend, backend_error};

    #[test]
    fn begin_appends_user_turn_immediately() {
        let mut chat = ChatSession::new(None);
        let pending = chat.begin("  X  ").expect("pending");

        assert_eq!(pending.text(), "X");
        assert_eq!(chat.messages(), vec![ChatMessage::user("X")]);
        assert!(chat.is_waiting());
        let _ = chat.finish(pending, Err(backend_error(ErrorKind::Transport)));
    }

    #[test]
    fn second_question_is_refused_while_one_is_pending() {
        let mut chat = ChatSession::new(None);
        let pending = chat.begin("first").expect("pending");
        assert_eq!(chat.begin("second").unwrap_err(), SessionError::QueryInFlight);

        chat.finish(
            pending,
            Ok(Answer {
                text: "one".into(),
                sources: Vec::new(),
            }),
        )
        .expect("settled");
        assert!(chat.begin("second").is_ok());
    }

    #[test]
    fn blank_question_is_rejected() {
        let mut chat = ChatSession::new(None);
        assert_eq!(chat.begin("   ").unwrap_err(), SessionError::EmptyQuery);
        assert!(chat.turns().is_empty());
    }

    #[tokio::test]
    async fn replies_follow_submission_order() {
        let backend = FakeBackend::default();
        let mut chat = ChatSession::new(Some(Model::Custom));
        chat.submit(&backend, "A").await.expect("first");
        chat.submit(&backend, "B").await.expect("second");

        assert_eq!(
            chat.messages(),
            vec![
                ChatMessage::user("A"),
                ChatMessage::assistant("answer to A"),
                ChatMessage::user("B"),
                ChatMessage::assistant("answer to B"),
            ]
        );
        assert_eq!(
            backend.calls(),
            vec!["query:A@custom".to_string(), "query:B@custom".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_query_keeps_user_turn_with_failure_marker() {
        let backend = FakeBackend::default().fail_query(ErrorKind::Malformed);
        let mut chat = ChatSession::new(None);

        let error = chat.submit(&backend, "X").await.expect_err("failure");
        assert!(matches!(error, SessionError::Stage(ref e) if e.kind == ErrorKind::Malformed));
        assert_eq!(chat.messages(), vec![ChatMessage::user("X")]);
        assert!(matches!(chat.turns()[0].reply, Reply::Failed(ref e) if e.stage == Stage::Query));
        assert!(!chat.is_waiting());
    }

    #[tokio::test]
    async fn document_chat_requires_ready_upload() {
        let backend = FakeBackend::default();
        let mut session = DocumentChat::new(None);
        assert_eq!(
            session.ask(&backend, "X").await.unwrap_err(),
            SessionError::NotReady
        );

        session.select(UploadedFile::new("a.pdf", "application/pdf", vec![1]));
        session.process(&backend).await.expect("ready");
        session.ask(&backend, "X").await.expect("answer");

        assert_eq!(session.chat().messages().len(), 2);
        assert_eq!(
            backend.calls(),
            vec!["ingest:a.pdf".to_string(), "query:X@default".to_string()]
        );
    }

    #[test]
    fn finish_rejects_foreign_pending_query() {
        let mut first = ChatSession::new(None);
        let mut second = ChatSession::new(None);
        let pending = first.begin("X").expect("pending");
        assert_eq!(
            second
                .finish(pending, Err(backend_error(ErrorKind::Transport)))
                .unwrap_err(),
            SessionError::UnknownTurn
        );
    }
}
