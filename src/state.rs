use std::sync::Arc;

use crate::config::Config;
use crate::rag::ChatSessions;
use crate::store::CourseStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub courses: Arc<CourseStore>,
    pub chat: Arc<ChatSessions>,
    pub chat_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        let chat = ChatSessions::from_config(http_client, config);
        Self::with_chat_sessions(config, chat)
    }

    /// State with a caller-supplied chat session holder.
    pub fn with_chat_sessions(config: &Config, chat: ChatSessions) -> anyhow::Result<Self> {
        let courses = CourseStore::open_or_create(&config.courses_path())?;
        tracing::info!("Loaded {} courses from {}", courses.count(), config.courses_path().display());

        Ok(Self {
            courses: Arc::new(courses),
            chat: Arc::new(chat),
            chat_semaphore: Arc::new(tokio::sync::Semaphore::new(config.max_concurrent_chats)),
        })
    }
}
