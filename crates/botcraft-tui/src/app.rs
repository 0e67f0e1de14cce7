use std::path::PathBuf;

use botcraft_core::{ChatSession, Config, SessionEvent, SubmitOutcome, Tab};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Sidebar,
}

/// The four entries of the sidebar, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarAction {
    NewChat,
    ToggleTheme,
    Help,
    Activity,
}

impl SidebarAction {
    pub fn all() -> [SidebarAction; 4] {
        [
            SidebarAction::NewChat,
            SidebarAction::ToggleTheme,
            SidebarAction::Help,
            SidebarAction::Activity,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SidebarAction::NewChat => "New chat",
            SidebarAction::ToggleTheme => "Toggle theme",
            SidebarAction::Help => "Help",
            SidebarAction::Activity => "Activity",
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub session: ChatSession,
    pub focus: FocusPane,

    // Prompt input
    pub input: String,
    pub input_cursor: usize, // cursor position in chars, not bytes

    pub sidebar_state: ListState,

    // Chat scrolling
    pub chat_scroll: u16,
    pub follow_tail: bool,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_lines: u16, // wrapped transcript rows, measured on each render
    pub chat_area: Option<Rect>,

    // One-line notice shown in the footer
    pub status: Option<String>,

    pub animation_frame: u8, // 0-2 for ellipsis animation

    model: String,
    // Only the theme is ever written back here
    config_path: Option<PathBuf>,
}

impl App {
    pub fn new(session: ChatSession, model: String, config_path: Option<PathBuf>) -> Self {
        let mut sidebar_state = ListState::default();
        sidebar_state.select(Some(0));

        Self {
            should_quit: false,
            session,
            focus: FocusPane::Input,
            input: String::new(),
            input_cursor: 0,
            sidebar_state,
            chat_scroll: 0,
            follow_tail: true,
            chat_height: 0,
            chat_width: 0,
            chat_lines: 0,
            chat_area: None,
            status: None,
            animation_frame: 0,
            model,
            config_path,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the current input. The input is only cleared once the session accepts it.
    pub fn submit_input(&mut self) {
        match self.session.submit(&self.input) {
            SubmitOutcome::Sent => {
                self.input.clear();
                self.input_cursor = 0;
                self.status = None;
                self.follow_tail = true;
            }
            SubmitOutcome::Busy => {
                self.status = Some("Still waiting for the previous reply".to_string());
            }
            SubmitOutcome::Empty => {}
        }
    }

    pub fn on_session_event(&mut self, event: SessionEvent) {
        self.session.apply(event);
        self.follow_tail = true;
    }

    pub fn new_chat(&mut self) {
        self.session.new_chat();
        self.chat_scroll = 0;
        self.follow_tail = true;
        self.status = None;
    }

    /// Flip the theme and remember it for next time. Command-line overrides stay out of the file.
    pub fn toggle_theme(&mut self) {
        let theme = self.session.toggle_theme();

        if let Some(path) = &self.config_path {
            if let Err(e) = Config::save_theme_to(path, theme) {
                tracing::warn!(error = %e, "could not save theme preference");
            }
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.session.toggle_sidebar();
        self.focus = if self.session.view().sidebar_open {
            FocusPane::Sidebar
        } else {
            FocusPane::Input
        };
    }

    pub fn show_tab(&mut self, tab: Tab) {
        self.session.select_tab(tab);
    }

    pub fn run_sidebar_action(&mut self, action: SidebarAction) {
        match action {
            SidebarAction::NewChat => {
                self.new_chat();
                self.focus = FocusPane::Input;
            }
            SidebarAction::ToggleTheme => self.toggle_theme(),
            SidebarAction::Help => self.show_tab(Tab::Help),
            SidebarAction::Activity => self.show_tab(Tab::Activity),
        }
    }

    pub fn selected_sidebar_action(&self) -> Option<SidebarAction> {
        self.sidebar_state
            .selected()
            .and_then(|i| SidebarAction::all().get(i).copied())
    }

    pub fn sidebar_nav_down(&mut self) {
        let len = SidebarAction::all().len();
        let i = self.sidebar_state.selected().map_or(0, |i| (i + 1) % len);
        self.sidebar_state.select(Some(i));
    }

    pub fn sidebar_nav_up(&mut self) {
        let len = SidebarAction::all().len();
        let i = self
            .sidebar_state
            .selected()
            .map_or(0, |i| if i == 0 { len - 1 } else { i - 1 });
        self.sidebar_state.select(Some(i));
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_tail = self.chat_scroll >= max;
    }

    pub fn max_chat_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }

    /// Keep the newest message visible while following the tail
    pub fn sync_chat_scroll(&mut self) {
        if self.follow_tail {
            self.chat_scroll = self.max_chat_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_chat_scroll());
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use async_trait::async_trait;
    use botcraft_core::{ChatBackend, ChatSession, ClientError, Config, Message, SessionOptions};

    use super::App;

    /// Replies with a fixed text, or fails when constructed with `None`
    pub struct CannedBackend(pub Option<String>);

    #[async_trait]
    impl ChatBackend for CannedBackend {
        async fn send(&self, _turns: &[Message]) -> Result<String, ClientError> {
            self.0
                .clone()
                .ok_or_else(|| ClientError::MalformedResponse("canned failure".to_string()))
        }
    }

    pub fn app_with_reply(reply: Option<&str>) -> App {
        app_with_config(reply, &Config::default(), None)
    }

    /// An app built the way `main` builds it, from an effective config and its file
    pub fn app_with_config(reply: Option<&str>, config: &Config, path: Option<PathBuf>) -> App {
        let backend = Arc::new(CannedBackend(reply.map(str::to_string)));
        let session = ChatSession::new(backend, SessionOptions::from_config(config));
        App::new(session, config.model.clone(), path)
    }
}
