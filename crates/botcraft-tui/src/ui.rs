use botcraft_core::{activity_line, Role, Tab, Theme};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, FocusPane, SidebarAction};

const SIDEBAR_WIDTH: u16 = 26;
const INPUT_PLACEHOLDER: &str = "Enter a prompt to create a new chatbot...";

const HELP_LINES: &[&str] = &[
    "Welcome to the Chatbot Creator AI! Here's how to use it:",
    "",
    "  • Enter a prompt describing the chatbot you want to create.",
    "  • The AI will generate a response and create a new chatbot based on your input.",
    "  • You'll receive a deploy link for your new chatbot.",
    "  • Use the sidebar to start a new chat, toggle the theme, or view your activity.",
    "",
    "Keys:",
    "  Enter        send the prompt",
    "  Ctrl-B / Esc open the sidebar",
    "  Ctrl-N       new chat",
    "  Ctrl-T       toggle theme",
    "  F1 / F2      help / activity",
    "  PgUp / PgDn  scroll the conversation",
    "  Ctrl-C       quit",
];

/// Colors for one theme
struct Palette {
    bg: Color,
    fg: Color,
    panel: Color,
    muted: Color,
    accent: Color,
    user: Color,
    assistant: Color,
    banner_bg: Color,
    banner_fg: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                bg: Color::White,
                fg: Color::Black,
                panel: Color::Gray,
                muted: Color::DarkGray,
                accent: Color::Blue,
                user: Color::Blue,
                assistant: Color::Magenta,
                banner_bg: Color::LightGreen,
                banner_fg: Color::Black,
            },
            Theme::Dark => Palette {
                bg: Color::Black,
                fg: Color::White,
                panel: Color::DarkGray,
                muted: Color::Gray,
                accent: Color::Cyan,
                user: Color::LightBlue,
                assistant: Color::Yellow,
                banner_bg: Color::Green,
                banner_fg: Color::White,
            },
        }
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let palette = Palette::for_theme(app.session.view().theme);
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        area,
    );

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area, &palette);

    let main_area = if app.session.view().sidebar_open {
        let [sidebar_area, main_area] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
                .areas(body_area);
        render_sidebar(app, frame, sidebar_area, &palette);
        main_area
    } else {
        body_area
    };

    let tab = app.session.view().active_tab;
    match tab {
        Tab::Conversation => render_conversation(app, frame, main_area, &palette),
        Tab::Help => {
            app.chat_area = None;
            render_help(frame, main_area, &palette);
        }
        Tab::Activity => {
            app.chat_area = None;
            render_activity(app, frame, main_area, &palette);
        }
    }

    render_footer(app, frame, footer_area, &palette);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let toggle = if app.session.view().sidebar_open { " × " } else { " ≡ " };

    let mut spans = vec![
        Span::styled(toggle, Style::default().fg(palette.accent).bold()),
        Span::styled(" AI Chatbot ", Style::default().fg(palette.fg).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.muted),
        ),
        Span::styled(format!("[{}]", app.model()), Style::default().fg(palette.muted)),
    ];
    if app.session.is_sending() {
        spans.push(Span::styled(
            "  Sending…",
            Style::default().fg(palette.accent).add_modifier(Modifier::ITALIC),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.panel));
    frame.render_widget(header, area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let focused = app.focus == FocusPane::Sidebar;
    let border_color = if focused { palette.accent } else { palette.muted };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chatbot Creator ");

    let items: Vec<ListItem> = SidebarAction::all()
        .iter()
        .map(|action| ListItem::new(format!(" {} ", action.label())))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(palette.accent)
                .fg(palette.bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(if focused { "> " } else { "  " });

    frame.render_stateful_widget(list, area, &mut app.sidebar_state);
}

fn render_conversation(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let banner_height = if app.session.view().last_deploy_link.is_some() { 3 } else { 0 };

    let [chat_area, input_area, banner_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(banner_height),
    ])
    .areas(area);

    // Store inner dimensions for scroll calculations and mouse hit-testing
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted))
        .title(" Conversation ");

    let conversation = app.session.conversation();
    let chat_text = if conversation.is_empty() && !app.session.is_sending() {
        Text::from(Span::styled(
            "Describe the chatbot you want to build to get started.",
            Style::default().fg(palette.muted),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in conversation.iter() {
            let color = match msg.role() {
                Role::User => palette.user,
                Role::Assistant => palette.assistant,
            };
            lines.push(Line::from(Span::styled(
                format!("{}:", msg.role().label()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            // Content is shown verbatim, one row per source line
            for line in msg.content().split('\n') {
                lines.push(Line::raw(line.to_string()));
            }
            lines.push(Line::default());
        }

        if app.session.is_sending() {
            lines.push(Line::from(Span::styled(
                format!("{}:", Role::Assistant.label()),
                Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    // Measure with the same wrapping the widget uses, before the borders are added
    let chat = Paragraph::new(chat_text).wrap(Wrap { trim: false });
    app.chat_lines = chat.line_count(app.chat_width).min(u16::MAX as usize) as u16;
    app.sync_chat_scroll();

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area, palette);

    if let Some(link) = &app.session.view().last_deploy_link {
        let banner = Paragraph::new(Line::from(vec![
            Span::raw("New chatbot created! Deploy link: "),
            Span::styled(link.clone(), Style::default().add_modifier(Modifier::UNDERLINED)),
        ]))
        .style(Style::default().bg(palette.banner_bg).fg(palette.banner_fg))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(banner, banner_area);
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let focused = app.focus == FocusPane::Input;
    let border_color = if focused { palette.accent } else { palette.muted };
    let title = if app.session.is_sending() { " Waiting for reply " } else { " Prompt " };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible, cursor_col) = input_viewport(&app.input, app.input_cursor, inner_width);

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(INPUT_PLACEHOLDER, Style::default().fg(palette.muted)))
    } else {
        Paragraph::new(visible)
    };
    frame.render_widget(input.block(block), area);

    if focused {
        frame.set_cursor_position((area.x + 1 + cursor_col, area.y + 1));
    }
}

/// The tail of `input` that keeps the cursor in view, and the cursor's column within it.
///
/// Columns are terminal cells, so wide glyphs (CJK, most emoji) take two.
fn input_viewport(input: &str, cursor: usize, width: usize) -> (String, u16) {
    let widths: Vec<usize> = input.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    let mut col: usize = widths[..cursor].iter().sum();
    let mut skip = 0;
    // The cursor itself needs a free cell
    while width > 0 && col >= width && skip < cursor {
        col -= widths[skip];
        skip += 1;
    }

    let visible = input.chars().skip(skip).collect();
    (visible, col.min(u16::MAX as usize) as u16)
}

fn render_help(frame: &mut Frame, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted))
        .title(" Help ");

    let lines: Vec<Line> = HELP_LINES.iter().map(|l| Line::raw(*l)).collect();
    let help = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(help, area);
}

fn render_activity(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted))
        .title(" Activity ");

    let mut lines = vec![
        Line::raw("Here's a summary of your recent activity:"),
        Line::default(),
    ];
    lines.extend(
        app.session
            .conversation()
            .iter()
            .map(|msg| Line::raw(format!("  • {}", activity_line(msg)))),
    );

    let activity = Paragraph::new(lines).block(block);
    frame.render_widget(activity, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, hints) = match (app.focus, app.session.view().active_tab) {
        (FocusPane::Sidebar, _) => (
            " MENU ",
            vec![("j/k", "nav"), ("Enter", "select"), ("Esc", "back"), ("q", "quit")],
        ),
        (FocusPane::Input, Tab::Conversation) => (
            " CHAT ",
            vec![
                ("Enter", "send"),
                ("Esc", "menu"),
                ("^N", "new chat"),
                ("^T", "theme"),
                ("F1", "help"),
                ("F2", "activity"),
                ("^C", "quit"),
            ],
        ),
        (FocusPane::Input, _) => (
            " VIEW ",
            vec![("Esc", "back to chat"), ("^B", "menu"), ("^C", "quit")],
        ),
    };

    let mut spans = vec![
        Span::styled(mode_text, Style::default().bg(palette.accent).fg(Color::White)),
        Span::styled(" ", label_style),
    ];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }
    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("  {}", status),
            Style::default().bg(Color::Black).fg(Color::Yellow),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::app_with_reply;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    async fn pump(app: &mut App) {
        let event = app.session.next_event().await.expect("event channel closed");
        app.on_session_event(event);
    }

    #[tokio::test]
    async fn test_empty_conversation_shows_placeholder() {
        let mut app = app_with_reply(None);
        let screen = draw(&mut app, 90, 20);

        assert!(screen.contains("AI Chatbot"));
        assert!(screen.contains(INPUT_PLACEHOLDER));
        assert!(!screen.contains("Deploy link"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcript_and_deploy_banner() {
        let mut app = app_with_reply(Some("Why did the chicken..."));
        app.input = "Tell me a joke".to_string();
        app.submit_input();

        let screen = draw(&mut app, 90, 20);
        assert!(screen.contains("Tell me a joke"));
        assert!(screen.contains("Thinking"));

        pump(&mut app).await;
        pump(&mut app).await;

        let screen = draw(&mut app, 90, 20);
        assert!(screen.contains("You:"));
        assert!(screen.contains("Assistant:"));
        assert!(screen.contains("Why did the chicken..."));
        assert!(screen.contains("New chatbot created! Deploy link: https://example.com/chatbot-"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reply_is_rendered_inline() {
        let mut app = app_with_reply(None);
        app.input = "hello".to_string();
        app.submit_input();
        pump(&mut app).await;

        let screen = draw(&mut app, 90, 20);
        assert!(screen.contains(botcraft_core::ERROR_REPLY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_panel_truncates() {
        let mut app = app_with_reply(Some("ok"));
        app.input = "x".repeat(60);
        app.submit_input();
        pump(&mut app).await;
        app.show_tab(Tab::Activity);

        let screen = draw(&mut app, 100, 20);
        assert!(screen.contains("Here's a summary of your recent activity:"));
        assert!(screen.contains(&format!("You: {}...", "x".repeat(50))));
        assert!(screen.contains("Assistant: ok"));
        assert!(app.chat_area.is_none());
    }

    #[tokio::test]
    async fn test_help_and_sidebar() {
        let mut app = app_with_reply(None);
        app.toggle_sidebar();
        app.show_tab(Tab::Help);

        let screen = draw(&mut app, 120, 24);
        assert!(screen.contains("Chatbot Creator"));
        assert!(screen.contains("New chat"));
        assert!(screen.contains("Toggle theme"));
        assert!(screen.contains("Welcome to the Chatbot Creator AI!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_tail_reaches_end_of_word_wrapped_reply() {
        // One 20-char word per row at this width, more rows than chars / width suggests
        let mut reply = vec!["w".repeat(20); 30].join(" ");
        reply.push_str(" THE-END");
        let mut app = app_with_reply(Some(reply.as_str()));
        app.input = "long one please".to_string();
        app.submit_input();
        pump(&mut app).await;

        let screen = draw(&mut app, 30, 20);
        assert!(screen.contains("THE-END"));
        assert!(app.follow_tail);
        assert!(app.chat_lines > 30);
    }

    #[test]
    fn test_input_viewport_counts_display_cells() {
        assert_eq!(input_viewport("hello", 5, 20), ("hello".to_string(), 5));

        // Each CJK glyph is two cells wide
        assert_eq!(input_viewport("你好", 2, 20), ("你好".to_string(), 4));
        assert_eq!(input_viewport("你好世界", 4, 5), ("世界".to_string(), 4));
        assert_eq!(input_viewport("a😀b", 2, 20), ("a😀b".to_string(), 3));
    }

    #[test]
    fn test_input_viewport_scrolls_ascii_like_before() {
        let input = "abcdefghij";
        assert_eq!(input_viewport(input, 10, 4), ("hij".to_string(), 3));
        assert_eq!(input_viewport(input, 3, 4), (input.to_string(), 3));
        assert_eq!(input_viewport(input, 4, 0), (input.to_string(), 4));
    }

    #[tokio::test]
    async fn test_cursor_lands_after_wide_input() {
        let mut app = app_with_reply(None);
        app.input = "你好".to_string();
        app.input_cursor = 2;

        let backend = TestBackend::new(40, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        // Input box: rows 8..11, text starts one cell in from its border
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!((cursor.x, cursor.y), (1 + 4, 9));
    }

    #[tokio::test]
    async fn test_dark_theme_renders() {
        let mut app = app_with_reply(None);
        app.toggle_theme();
        let backend = TestBackend::new(60, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(59, 5)].bg, Color::Black);
    }
}
