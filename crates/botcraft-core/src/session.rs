//! Session controller
//!
//! [`ChatSession`] owns the conversation and the view state, and it is the only
//! place either changes. Network calls and the simulated deploy callback run as
//! tokio tasks that report back through [`SessionEvent`]s. The owner feeds
//! those events to [`ChatSession::apply`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ai::{ChatBackend, ClientError};
use crate::config::Config;
use crate::state::{Conversation, Message, SessionPhase, Tab, Theme, ViewState};

/// Assistant text appended when a request fails for any reason
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug)]
pub enum SessionEvent {
    /// The outstanding request finished
    Reply {
        generation: u64,
        result: Result<String, ClientError>,
    },
    /// The simulated deploy callback fired
    DeployLink { generation: u64, url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    /// Input was empty after trimming
    Empty,
    /// A request is already in flight
    Busy,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub include_history: bool,
    pub deploy_link_delay: Duration,
    pub deploy_link_base: String,
    pub theme: Theme,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            include_history: config.include_history,
            deploy_link_delay: config.deploy_link_delay(),
            deploy_link_base: config.deploy_link_base.clone(),
            theme: config.theme,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    options: SessionOptions,
    conversation: Conversation,
    view: ViewState,
    phase: SessionPhase,
    // Bumped on every new chat; events tagged with an older value are dropped.
    generation: u64,
    request_task: Option<JoinHandle<()>>,
    deploy_task: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, options: SessionOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let view = ViewState {
            theme: options.theme,
            ..ViewState::default()
        };

        Self {
            backend,
            options,
            conversation: Conversation::new(),
            view,
            phase: SessionPhase::Idle,
            generation: 0,
            request_task: None,
            deploy_task: None,
            events_tx,
            events_rx,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_sending(&self) -> bool {
        self.phase == SessionPhase::Sending
    }

    /// Append the user's message and start a request for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, input: &str) -> SubmitOutcome {
        if input.trim().is_empty() {
            return SubmitOutcome::Empty;
        }
        if self.phase == SessionPhase::Sending {
            tracing::debug!("submission rejected, request already in flight");
            return SubmitOutcome::Busy;
        }

        self.conversation.push(Message::user(input));
        self.phase = SessionPhase::Sending;

        let turns: Vec<Message> = if self.options.include_history {
            self.conversation.messages().to_vec()
        } else {
            vec![Message::user(input)]
        };

        tracing::info!(
            chars = input.chars().count(),
            turns = turns.len(),
            "sending prompt"
        );

        let backend = Arc::clone(&self.backend);
        let tx = self.events_tx.clone();
        let generation = self.generation;
        self.request_task = Some(tokio::spawn(async move {
            let result = backend.send(&turns).await;
            let _ = tx.send(SessionEvent::Reply { generation, result });
        }));

        SubmitOutcome::Sent
    }

    /// Wait for the next event from a background task
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.try_recv().ok()
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Reply { generation, .. } | SessionEvent::DeployLink { generation, .. }
                if generation != self.generation =>
            {
                tracing::debug!(generation, current = self.generation, "dropping stale event");
            }
            SessionEvent::Reply { result, .. } => {
                self.request_task = None;
                self.phase = SessionPhase::Idle;
                match result {
                    Ok(text) => {
                        tracing::info!(chars = text.chars().count(), "received reply");
                        self.conversation.push(Message::assistant(text));
                        self.schedule_deploy_link();
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "request failed");
                        self.conversation.push(Message::assistant(ERROR_REPLY));
                    }
                }
            }
            SessionEvent::DeployLink { url, .. } => {
                self.deploy_task = None;
                tracing::info!(%url, "deploy link ready");
                self.view.last_deploy_link = Some(url);
            }
        }
    }

    fn schedule_deploy_link(&mut self) {
        if let Some(task) = self.deploy_task.take() {
            task.abort();
        }

        let tx = self.events_tx.clone();
        let generation = self.generation;
        let delay = self.options.deploy_link_delay;
        let base = self.options.deploy_link_base.trim_end_matches('/').to_string();

        tracing::debug!(delay_ms = delay.as_millis() as u64, "scheduling deploy link");
        self.deploy_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let url = format!(
                "{}/chatbot-{}",
                base,
                chrono::Utc::now().timestamp_millis()
            );
            let _ = tx.send(SessionEvent::DeployLink { generation, url });
        }));
    }

    /// Start over: empty conversation, no deploy link, conversation tab.
    /// Anything still running for the old conversation is cancelled.
    pub fn new_chat(&mut self) {
        self.cancel_tasks();
        self.generation += 1;
        self.phase = SessionPhase::Idle;
        self.conversation.clear();
        self.view.last_deploy_link = None;
        self.view.active_tab = Tab::Conversation;
        tracing::info!(generation = self.generation, "started new chat");
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.view.active_tab = tab;
    }

    pub fn toggle_sidebar(&mut self) {
        self.view.sidebar_open = !self.view.sidebar_open;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.view.theme = self.view.theme.toggled();
        self.view.theme
    }

    fn cancel_tasks(&mut self) {
        if let Some(task) = self.request_task.take() {
            tracing::debug!("cancelling in-flight request");
            task.abort();
        }
        if let Some(task) = self.deploy_task.take() {
            tracing::debug!("cancelling pending deploy link");
            task.abort();
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.cancel_tasks();
    }
}
