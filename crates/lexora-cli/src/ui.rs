//! UI rendering with ratatui.
//!
//! Two screens share a header and status bar: the start screen and the
//! conversation screen. A pending source approval is drawn as a modal over
//! the conversation.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};
use ratatui::Frame;

use lexora_core::{ConversationKind, RelevanceLabel};
use lexora_session::{RecoveryAction, SourceApproval, TurnState};

use crate::app::{App, Screen};
use crate::command::HELP;
use crate::view::message_lines;

/// Render the UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header bar
            Constraint::Min(5),    // Screen content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header_bar(frame, app, main_layout[0]);
    match app.screen {
        Screen::Home => render_home(frame, app, main_layout[1]),
        Screen::Conversation => render_conversation(frame, app, main_layout[1]),
    }
    render_status_bar(frame, app, main_layout[2]);

    if app.screen == Screen::Conversation && app.is_approval_open() {
        if let Some(approval) = app.approval() {
            render_approval_dialog(frame, approval, area);
        }
    }
}

/// Truncate a string in the middle with an ellipsis if it exceeds `max_len`
/// characters.
fn truncate_middle(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        return s.to_string();
    }
    if max_len < 5 {
        return s.chars().take(max_len).collect();
    }
    let keep = (max_len - 3) / 2;
    let start: String = s.chars().take(keep).collect();
    let end: String = s.chars().skip(len - keep).collect();
    format!("{start}...{end}")
}

fn width_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Render the header bar with the product name, session and API URL.
fn render_header_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "LEXORA";
    let context = match app.controller() {
        Some(controller) => format!(
            "  {} · {}",
            controller.kind(),
            truncate_middle(controller.session_id().as_str(), 24)
        ),
        None => String::new(),
    };

    let max_url_width = (area.width as usize / 2).saturating_sub(2);
    let display_url = truncate_middle(app.api_url(), max_url_width);

    let used = title.chars().count() + context.chars().count() + display_url.chars().count();
    let padding = (area.width as usize).saturating_sub(used);

    let line = Line::from(vec![
        Span::styled(title, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(context, Style::default().fg(Color::White)),
        Span::raw(" ".repeat(padding)),
        Span::styled(display_url, Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

// =============================================================================
// Start Screen
// =============================================================================

fn mode_span(kind: ConversationKind, selected: ConversationKind) -> Span<'static> {
    let label = format!(" {kind} ");
    if kind == selected {
        Span::styled(
            label,
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(label, Style::default().fg(Color::Gray))
    }
}

fn render_home(frame: &mut Frame, app: &App, area: Rect) {
    let dialog_width = 70.min(area.width.saturating_sub(4));
    let dialog_height = 11.min(area.height);
    let dialog_area = Rect::new(
        area.x + (area.width.saturating_sub(dialog_width)) / 2,
        area.y + (area.height.saturating_sub(dialog_height)) / 2,
        dialog_width,
        dialog_height,
    );

    let block = Block::default()
        .title(" Ask Lexora ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Mode toggle
            Constraint::Length(1), // Mode description
            Constraint::Length(1), // Spacer
            Constraint::Length(3), // Input box
            Constraint::Length(1), // Help text
        ])
        .split(inner);

    let toggle = Paragraph::new(Line::from(vec![
        Span::raw("Mode: "),
        mode_span(ConversationKind::Chat, app.mode),
        Span::raw(" "),
        mode_span(ConversationKind::Research, app.mode),
    ]));
    frame.render_widget(toggle, layout[0]);

    let description = match app.mode {
        ConversationKind::Chat => "Quick answers to legal questions",
        ConversationKind::Research => "Source-backed research and document drafting",
    };
    frame.render_widget(
        Paragraph::new(description).style(Style::default().fg(Color::DarkGray)),
        layout[1],
    );

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(input_block);
    frame.render_widget(input, layout[3]);

    let help = Paragraph::new("Tab: switch mode  Enter: start  Esc: quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, layout[4]);

    if layout[3].height >= 3 {
        frame.set_cursor_position((
            layout[3].x + 1 + width_u16(app.cursor_position),
            layout[3].y + 1,
        ));
    }
}

// =============================================================================
// Conversation Screen
// =============================================================================

/// Horizontal padding for chat content.
const CHAT_PADDING: u16 = 2;

fn render_conversation(frame: &mut Frame, app: &App, area: Rect) {
    let Some(controller) = app.controller() else {
        return;
    };

    let block = Block::default()
        .title(format!(" {} ", controller.kind()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let inner_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Messages
            Constraint::Length(1), // Separator line
            Constraint::Length(1), // Input line
        ])
        .split(inner_area);

    let chat_area_full = inner_layout[0];
    let chat_area = Rect::new(
        chat_area_full.x + CHAT_PADDING,
        chat_area_full.y,
        chat_area_full.width.saturating_sub(CHAT_PADDING * 2 + 1), // +1 for scrollbar
        chat_area_full.height,
    );
    let content_width = chat_area.width as usize;

    let awaiting = controller.state() == TurnState::AwaitingResponse;
    if controller.messages().is_empty() && !awaiting {
        let help = Paragraph::new("Type a question and press Enter to send")
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true });
        frame.render_widget(help, chat_area);
    } else {
        let mut lines: Vec<Line> = controller
            .messages()
            .iter()
            .flat_map(|message| message_lines(message, app.expand_artifacts))
            .collect();

        if awaiting {
            lines.push(Line::from(vec![
                Span::styled(app.spinner_char(), Style::default().fg(Color::Yellow)),
                Span::styled(" thinking...", Style::default().fg(Color::DarkGray)),
            ]));
        }

        render_scrolled(frame, app, Text::from(lines), chat_area, chat_area_full, content_width);
    }

    render_input_line(frame, app, awaiting, inner_layout[1], inner_layout[2]);
}

/// Draw `text` pinned to the bottom, offset by the app's scroll position.
fn render_scrolled(
    frame: &mut Frame,
    app: &App,
    text: Text,
    area: Rect,
    scrollbar_area: Rect,
    content_width: usize,
) {
    let visible_lines = area.height as usize;
    let total_wrapped_lines = calculate_wrapped_line_count(&text, content_width);

    let max_scroll = total_wrapped_lines.saturating_sub(visible_lines);
    let effective_scroll = app.chat_scroll.min(max_scroll);
    // chat_scroll counts up from the bottom; Paragraph scrolls down from the top.
    let scroll_offset = max_scroll.saturating_sub(effective_scroll);

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((width_u16(scroll_offset), 0));
    frame.render_widget(paragraph, area);

    if total_wrapped_lines > visible_lines {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));
        let mut scrollbar_state = ScrollbarState::new(total_wrapped_lines)
            .position(scroll_offset)
            .viewport_content_length(visible_lines);
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }
}

/// Render the input line. It is greyed out while a response is pending.
fn render_input_line(frame: &mut Frame, app: &App, awaiting: bool, separator_area: Rect, input_area: Rect) {
    let separator = Paragraph::new("─".repeat(separator_area.width as usize))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(separator, separator_area);

    let modal = app.is_approval_open();
    let (prompt, prompt_style) = if awaiting || modal {
        ("│ ", Style::default().fg(Color::DarkGray))
    } else {
        ("> ", Style::default().fg(Color::Cyan))
    };

    let input_line = Line::from(vec![
        Span::styled(prompt, prompt_style),
        Span::styled(
            app.input.as_str(),
            Style::default().fg(if awaiting { Color::DarkGray } else { Color::White }),
        ),
    ]);
    frame.render_widget(Paragraph::new(input_line), input_area);

    if !awaiting && !modal {
        frame.set_cursor_position((
            input_area.x + width_u16(prompt.chars().count() + app.cursor_position),
            input_area.y,
        ));
    }
}

/// Render the status bar.
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode_indicator = match app.controller().map(crate::app::Controller::state) {
        Some(TurnState::AwaitingResponse) => {
            Span::styled(" WAITING ", Style::default().fg(Color::Black).bg(Color::Yellow))
        }
        Some(TurnState::AwaitingInterruptResolution) => {
            Span::styled(" PAUSED ", Style::default().fg(Color::Black).bg(Color::Magenta))
        }
        Some(TurnState::Idle) => {
            Span::styled(" READY ", Style::default().fg(Color::Black).bg(Color::Green))
        }
        None => Span::styled(" START ", Style::default().fg(Color::Black).bg(Color::Blue)),
    };

    let status = if let Some(task) = app.busy() {
        Line::from(vec![
            mode_indicator,
            Span::styled(
                format!(" {} {task}...", app.spinner_char()),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("  "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(":cancel"),
        ])
    } else if let Some(ref error) = app.error_message {
        Line::from(vec![
            mode_indicator,
            Span::styled(" ERROR: ", Style::default().fg(Color::Red).bold()),
            Span::styled(error, Style::default().fg(Color::Red)),
        ])
    } else if let Some(ref status) = app.status_message {
        Line::from(vec![
            mode_indicator,
            Span::styled(format!(" {status}"), Style::default().fg(Color::Green)),
        ])
    } else if app.screen == Screen::Home {
        Line::from(vec![
            mode_indicator,
            Span::raw(" "),
            Span::styled("Tab", Style::default().fg(Color::Yellow)),
            Span::raw(":mode "),
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(":start "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(":quit"),
        ])
    } else if app.is_awaiting_response() {
        Line::from(vec![
            mode_indicator,
            Span::raw(" "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(":leave conversation"),
        ])
    } else {
        let mut spans = vec![
            mode_indicator,
            Span::raw(" "),
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(":send "),
            Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
            Span::raw(":scroll "),
            Span::styled("Ctrl+T", Style::default().fg(Color::Yellow)),
            Span::raw(":expand "),
        ];
        if app.approval().is_some() {
            spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(":sources "));
        }
        spans.push(Span::styled(HELP, Style::default().fg(Color::Gray)));
        Line::from(spans)
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

// =============================================================================
// Source Approval
// =============================================================================

fn relevance_color(label: RelevanceLabel) -> Color {
    match label {
        RelevanceLabel::High => Color::Green,
        RelevanceLabel::Medium => Color::Yellow,
        RelevanceLabel::Low => Color::Red,
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

/// Lines of the approval dialog body.
fn approval_lines(approval: &SourceApproval) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if !approval.question().is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Question: ", Style::default().fg(Color::Gray)),
            Span::raw(approval.question().to_string()),
        ]));
        lines.push(Line::from(""));
    }

    if approval.no_relevant_sources() {
        lines.push(Line::from(Span::styled(
            format!(
                "No sufficiently relevant sources found ({} candidates).",
                approval.total_found()
            ),
            Style::default().fg(Color::Yellow),
        )));
        lines.push(Line::from(""));
        for (i, action) in RecoveryAction::ALL.iter().enumerate() {
            let focused = i == approval.focused();
            let marker = if focused { "> " } else { "  " };
            lines.push(Line::from(Span::styled(
                format!("{marker}{}", action.label()),
                focus_style(focused),
            )));
        }
        lines.push(Line::from(""));
        lines.push(help_line(&[("↑↓", "move"), ("Enter", "choose"), ("Esc", "hide")]));
        return lines;
    }

    lines.push(Line::from(Span::styled(
        format!(
            "{} of {} sources selected",
            approval.selected_count(),
            approval.sources().len()
        ),
        Style::default().fg(Color::Gray),
    )));
    lines.push(Line::from(""));

    for (i, source) in approval.sources().iter().enumerate() {
        let focused = i == approval.focused();
        let check = if approval.is_selected(&source.document_id) { "[x] " } else { "[ ] " };
        let label = source.relevance_label();
        lines.push(Line::from(vec![
            Span::styled(check, focus_style(focused).fg(Color::Cyan)),
            Span::styled(source.title.clone(), focus_style(focused)),
            Span::styled(
                format!("  {} {:.0}%", label.as_str(), source.relevance_score * 100.0),
                Style::default().fg(relevance_color(label)),
            ),
        ]));
        if !source.reasoning.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("    {}", source.reasoning),
                Style::default().fg(Color::Gray),
            )));
        }
        if !source.url.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("    {}", source.url),
                Style::default().fg(Color::Blue),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(help_line(&[
        ("↑↓", "move"),
        ("Space", "toggle"),
        ("a", "all"),
        ("n", "none"),
        ("Enter", "approve"),
        ("s", "skip all"),
        ("Esc", "hide"),
    ]));
    lines
}

fn help_line(keys: &[(&'static str, &'static str)]) -> Line<'static> {
    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, action)| {
            [
                Span::styled(*key, Style::default().fg(Color::Yellow)),
                Span::raw(format!(":{action} ")),
            ]
        })
        .collect();
    Line::from(spans)
}

fn render_approval_dialog(frame: &mut Frame, approval: &SourceApproval, area: Rect) {
    let dialog_area = centered_rect(80, 70, area);
    frame.render_widget(Clear, dialog_area);

    let title = if approval.no_relevant_sources() {
        " No Relevant Sources "
    } else {
        " Approve Sources "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let paragraph = Paragraph::new(Text::from(approval_lines(approval)))
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

/// Calculate the number of visual lines after text wrapping.
fn calculate_wrapped_line_count(text: &Text, available_width: usize) -> usize {
    if available_width == 0 {
        return text.lines.len();
    }

    text.lines
        .iter()
        .map(|line| line.width().div_ceil(available_width).max(1))
        .sum()
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
