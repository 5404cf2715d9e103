use crate::domain::chat::{ChatMessage, ChatRole, ChatTurn, EMPTY_REPLY, ERROR_REPLY};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::clean_llm_response;
use std::sync::Arc;
use tracing::{error, info};

/// Visible transcript plus the history replayed to the model
#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    history: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            transcript: vec![ChatMessage::welcome()],
            history: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_chat_instruction(sample: &str) -> String {
    format!(
        "You are DataInsight AI. You have access to a sample of a dataset.\n\
         Answer questions based on this sample. Be concise.\n\
         Dataset:\n{}",
        sample
    )
}

pub struct ChatUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
}

impl ChatUseCase {
    pub fn new(llm_client: Arc<dyn LLMClient + Send + Sync>) -> Self {
        Self { llm_client }
    }

    /// Answer `question` about the sampled dataset.
    ///
    /// History only grows after a successful reply; a failed call leaves the
    /// error notice in the transcript and returns the error.
    pub async fn ask(
        &self,
        config: &LLMConfig,
        sample: &str,
        session: &mut ChatSession,
        question: &str,
    ) -> Result<ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::ValidationError(
                "Question cannot be empty".to_string(),
            ));
        }

        session
            .transcript
            .push(ChatMessage::new(ChatRole::User, question));

        let system = build_chat_instruction(sample);
        let answer = self
            .llm_client
            .chat(config, &system, &session.history, question)
            .await;

        match answer {
            Ok(raw) => {
                let mut text = clean_llm_response(&raw);
                if text.is_empty() {
                    text = EMPTY_REPLY.to_string();
                }

                session.history.push(ChatTurn::user(question));
                session.history.push(ChatTurn::model(text.clone()));

                let reply = ChatMessage::new(ChatRole::Model, text);
                session.transcript.push(reply.clone());

                info!(turns = session.history.len(), "Chat reply received");
                Ok(reply)
            }
            Err(e) => {
                error!(error = %e, "Chat request failed");
                session
                    .transcript
                    .push(ChatMessage::new(ChatRole::Model, ERROR_REPLY));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::WELCOME_MESSAGE;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeClient {
        replies: Mutex<Vec<Result<String>>>,
        seen_history: Mutex<Vec<usize>>,
        seen_system: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn with_replies(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl LLMClient for FakeClient {
        async fn generate_json(
            &self,
            _config: &LLMConfig,
            _prompt: &str,
            _schema: &Value,
        ) -> Result<String> {
            unreachable!()
        }

        async fn chat(
            &self,
            _config: &LLMConfig,
            system: &str,
            history: &[ChatTurn],
            _message: &str,
        ) -> Result<String> {
            self.seen_history.lock().unwrap().push(history.len());
            self.seen_system.lock().unwrap().push(system.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(String::new()))
        }

        async fn list_models(&self, _config: &LLMConfig) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_new_session_has_welcome_only() {
        let session = ChatSession::new();
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].text, WELCOME_MESSAGE);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_ask_extends_history_on_success() {
        let client = FakeClient::with_replies(vec![
            Ok("<think>hmm</think>Revenue peaked in December.".to_string()),
            Ok("Yes.".to_string()),
        ]);
        let use_case = ChatUseCase::new(client.clone());
        let mut session = ChatSession::new();
        let config = LLMConfig::default();

        let reply = use_case
            .ask(&config, "Month,Revenue\nDec,55000", &mut session, " When was the peak? ")
            .await
            .unwrap();
        assert_eq!(reply.text, "Revenue peaked in December.");
        assert_eq!(reply.role, ChatRole::Model);

        use_case
            .ask(&config, "Month,Revenue\nDec,55000", &mut session, "Sure?")
            .await
            .unwrap();

        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history()[0], ChatTurn::user("When was the peak?"));
        assert_eq!(session.transcript().len(), 5);
        assert_eq!(*client.seen_history.lock().unwrap(), vec![0, 2]);
        assert!(client.seen_system.lock().unwrap()[0].ends_with("Dataset:\nMonth,Revenue\nDec,55000"));
    }

    #[tokio::test]
    async fn test_ask_failure_keeps_history() {
        let client = FakeClient::with_replies(vec![Err(AppError::LLMError(
            "Request failed".to_string(),
        ))]);
        let use_case = ChatUseCase::new(client);
        let mut session = ChatSession::new();

        let result = use_case
            .ask(&LLMConfig::default(), "a\n1", &mut session, "Why?")
            .await;

        assert!(matches!(result, Err(AppError::LLMError(_))));
        assert!(session.history().is_empty());
        let last = session.transcript().last().unwrap();
        assert_eq!(last.text, ERROR_REPLY);
        assert_eq!(last.role, ChatRole::Model);
    }

    #[tokio::test]
    async fn test_ask_empty_reply_placeholder() {
        let use_case = ChatUseCase::new(FakeClient::with_replies(vec![Ok("  ".to_string())]));
        let mut session = ChatSession::new();

        let reply = use_case
            .ask(&LLMConfig::default(), "a\n1", &mut session, "Hello")
            .await
            .unwrap();

        assert_eq!(reply.text, EMPTY_REPLY);
        assert_eq!(session.history()[1].text, EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_question() {
        let client = FakeClient::with_replies(Vec::new());
        let use_case = ChatUseCase::new(client.clone());
        let mut session = ChatSession::new();

        let result = use_case
            .ask(&LLMConfig::default(), "a\n1", &mut session, "   ")
            .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(session.transcript().len(), 1);
        assert!(client.seen_history.lock().unwrap().is_empty());
    }
}
