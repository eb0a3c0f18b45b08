use coach_core::{LogEntry, Role};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, Status};

/// Turns `**bold**` runs into bold spans. Unbalanced markers are left as typed.
fn styled_reply_line(text: &str) -> Line<'static> {
    let parts: Vec<&str> = text.split("**").collect();
    if parts.len() % 2 == 0 {
        return Line::from(text.to_string());
    }

    let spans: Vec<Span<'static>> = parts
        .iter()
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            if i % 2 == 1 {
                Span::styled(part.to_string(), Style::default().add_modifier(Modifier::BOLD))
            } else {
                Span::raw(part.to_string())
            }
        })
        .collect();
    Line::from(spans)
}

fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Cyan),
        Role::Assistant => Style::default().fg(Color::Yellow),
        Role::System => Style::default().fg(Color::DarkGray),
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Coach",
        Role::System => "System",
    }
}

fn entry_lines(entry: &LogEntry, lines: &mut Vec<Line<'static>>) {
    let style = role_style(entry.role);
    lines.push(Line::from(Span::styled(
        format!("{} {}:", entry.icon, role_label(entry.role)),
        style.add_modifier(Modifier::BOLD),
    )));

    for line in entry.text.lines() {
        match entry.role {
            Role::Assistant => lines.push(styled_reply_line(line)),
            Role::User => lines.push(Line::from(line.to_string())),
            Role::System => lines.push(Line::from(Span::styled(
                line.to_string(),
                style.add_modifier(Modifier::ITALIC),
            ))),
        }
    }
    lines.push(Line::default());
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let [header_area, log_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(app, frame, header_area);
    render_log(app, frame, log_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" coach ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("{} [{}] ", app.endpoint, app.mode.as_str()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_log(app: &mut App, frame: &mut Frame, area: Rect) {
    let thinking = app.is_thinking();

    let mut lines: Vec<Line<'static>> = Vec::new();
    for entry in &app.log.entries {
        entry_lines(entry, &mut lines);
    }

    if thinking {
        lines.push(Line::from(Span::styled(
            format!("{} {}:", Role::Assistant.icon(), role_label(Role::Assistant)),
            role_style(Role::Assistant).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let log = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });

    // Measure with the same wrapping that draws it, inside the borders
    let inner_width = area.width.saturating_sub(2);
    app.log.height = area.height.saturating_sub(2);
    app.log.content_lines = u16::try_from(log.line_count(inner_width)).unwrap_or(u16::MAX);
    if app.log.follow {
        app.log.scroll_to_bottom();
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Chat ({} messages) ", app.session.transcript().len()));

    frame.render_widget(log.block(block).scroll((app.log.scroll, 0)), area);
}

/// Slice of the input that fits `width` columns with the cursor in view,
/// plus the cursor's column within that slice. Wide characters count double.
fn input_viewport(input: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<char> = input.chars().collect();
    let cursor = cursor.min(chars.len());
    let col = |c: &char| c.width().unwrap_or(0);

    // Leave one column for the cursor itself
    let mut start = 0;
    while start < cursor && chars[start..cursor].iter().map(col).sum::<usize>() >= width {
        start += 1;
    }

    let mut used = 0;
    let visible: String = chars[start..]
        .iter()
        .take_while(|c| {
            used += col(*c);
            used <= width
        })
        .collect();

    let cursor_x = chars[start..cursor].iter().map(col).sum::<usize>();
    (visible, cursor_x as u16)
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.is_thinking() { Color::DarkGray } else { Color::Yellow };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message (Enter to send) ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_viewport(&app.input, app.cursor, inner_width);

    let input = Paragraph::new(visible_text)
        .style(role_style(Role::User))
        .block(block);
    frame.render_widget(input, area);

    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let footer = match &app.status {
        Some(Status::Error(msg)) => Line::from(Span::styled(
            format!(" {}", msg),
            Style::default().fg(Color::Red),
        )),
        Some(Status::Notice(msg)) => Line::from(Span::styled(
            format!(" {}", msg),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            " Enter send | Esc cancel | PgUp/PgDn scroll | Ctrl+C quit",
            Style::default().fg(Color::DarkGray),
        )),
    };

    frame.render_widget(Paragraph::new(footer), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use async_trait::async_trait;
    use coach_core::{ChatTransport, Config, Message, Renderer, TransportError};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    struct Silent;

    #[async_trait]
    impl ChatTransport for Silent {
        async fn send_turn(&self, _messages: &[Message]) -> Result<String, TransportError> {
            std::future::pending().await
        }
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        screen_text(&terminal)
    }

    fn app() -> App {
        let mut config = Config::new();
        config.system_prompt = "Be kind".to_string();
        App::new(&config, "http://localhost/chat", Arc::new(Silent))
    }

    fn complete_turn(app: &mut App, input: &str, reply: &str) {
        app.session.submit(input).unwrap();
        let turn = match app.session.state() {
            coach_core::TurnState::AwaitingReply(id) => id,
            coach_core::TurnState::Idle => panic!("turn should be in flight"),
        };
        app.session.complete(turn, Ok(reply.to_string()));
        app.log.render(&app.session.entries());
    }

    #[test]
    fn test_styled_reply_line_bold_runs() {
        let line = styled_reply_line("a **b** c");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "b");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_styled_reply_line_unbalanced_is_literal() {
        let line = styled_reply_line("5 ** 2");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "5 ** 2");
    }

    #[test]
    fn test_log_shows_entries_in_order() {
        let mut app = app();
        complete_turn(&mut app, "hello there", "general **kenobi**");

        let screen = draw(&mut app);
        let system = screen.find("Be kind").unwrap();
        let user = screen.find("hello there").unwrap();
        let reply = screen.find("general").unwrap();
        assert!(system < user && user < reply);
        assert!(screen.contains("kenobi"));
        assert!(!screen.contains("**"));
    }

    #[tokio::test]
    async fn test_thinking_indicator_while_awaiting() {
        let mut app = app();
        app.input = "hi".to_string();
        app.submit();

        let screen = draw(&mut app);
        assert!(screen.contains("Thinking."));
        app.cancel_reply();

        let screen = draw(&mut app);
        assert!(!screen.contains("Thinking"));
        assert!(screen.contains("cancelled"));
    }

    #[test]
    fn test_newest_wide_reply_is_scrolled_into_view() {
        let mut app = app();
        for i in 0..3 {
            let reply = format!("{}END{}", "あ".repeat(70), i);
            complete_turn(&mut app, "調子どう？", &reply);
        }

        let screen = draw(&mut app);
        assert!(screen.contains("END2"), "latest reply tail not on screen:\n{}", screen);
        assert_eq!(app.log.scroll, app.log.content_lines - app.log.height);
    }

    #[test]
    fn test_scroll_up_keeps_position_across_redraws() {
        let mut app = app();
        for i in 0..3 {
            complete_turn(&mut app, "q", &format!("{}END{}", "あ".repeat(70), i));
        }
        draw(&mut app);
        app.log.scroll_up(5);
        let held = app.log.scroll;

        let screen = draw(&mut app);
        assert_eq!(app.log.scroll, held);
        assert!(!screen.contains("END2"));
    }

    #[test]
    fn test_input_viewport_counts_display_columns() {
        assert_eq!(input_viewport("調子どう", 4, 20), ("調子どう".to_string(), 8));
        assert_eq!(input_viewport("調子どう", 2, 20), ("調子どう".to_string(), 4));
        assert_eq!(input_viewport("abc", 3, 20), ("abc".to_string(), 3));
    }

    #[test]
    fn test_input_viewport_scrolls_wide_text_to_cursor() {
        // 10 wide chars are 20 columns; 7 columns fit
        let input = "あいうえおかきくけこ";
        let (visible, cursor_x) = input_viewport(input, 10, 7);
        assert_eq!(visible, "くけこ");
        assert_eq!(cursor_x, 6);

        let (visible, cursor_x) = input_viewport(input, 0, 7);
        assert_eq!(visible, "あいう");
        assert_eq!(cursor_x, 0);
    }

    #[test]
    fn test_terminal_cursor_follows_wide_input() {
        let mut app = app();
        app.input = "調子どう".to_string();
        app.cursor = 4;

        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        // border column + 4 double-width characters
        let position = terminal.get_cursor_position().unwrap();
        assert_eq!(position.x, 9);
        assert_eq!(position.y, 13);
    }
}
