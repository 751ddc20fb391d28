//! Message to ratatui text conversion.
//!
//! Assistant messages go through the render dispatch: link segments become
//! underlined labels followed by their target, and artifact blocks become
//! cards. Everything else is shown as typed.

use lexora_core::{Message, Role};
use lexora_render::{render_message, Artifact, ArtifactStage, RenderedMessage, Segment};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Convert one message to styled lines, including its speaker header and a
/// trailing blank line.
pub fn message_lines(message: &Message, expand_artifacts: bool) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::default();

    match message.role {
        Role::User => {
            builder.push_span(Span::styled(
                "[You] ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));
            builder.add_text(&message.content, Style::default().fg(Color::White));
        }
        Role::System => {
            builder.add_text(&message.content, Style::default().fg(Color::DarkGray));
        }
        Role::Assistant => {
            builder.push_span(Span::styled(
                "[Lexora]",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ));
            builder.flush_line();
            match render_message(message) {
                RenderedMessage::Plain(text) => builder.add_text(text, Style::default()),
                RenderedMessage::Linked(segments) => builder.add_segments(&segments),
                RenderedMessage::Artifacts { preamble, artifacts } => {
                    if !preamble.is_empty() {
                        builder.add_text(&preamble, Style::default());
                        builder.flush_line();
                    }
                    for artifact in &artifacts {
                        builder.add_artifact(artifact, expand_artifacts);
                    }
                }
            }
        }
    }

    builder.add_blank_line();
    builder.finish()
}

/// Accumulates spans into lines, breaking on embedded newlines.
#[derive(Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    current_spans: Vec<Span<'static>>,
}

impl LineBuilder {
    fn push_span(&mut self, span: Span<'static>) {
        self.current_spans.push(span);
    }

    fn flush_line(&mut self) {
        if !self.current_spans.is_empty() {
            let spans = std::mem::take(&mut self.current_spans);
            self.lines.push(Line::from(spans));
        }
    }

    fn add_blank_line(&mut self) {
        self.flush_line();
        self.lines.push(Line::from(""));
    }

    /// Append text, starting a new line at every `\n`. Blank lines survive.
    fn add_text(&mut self, text: &str, style: Style) {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                if self.current_spans.is_empty() {
                    self.lines.push(Line::from(""));
                } else {
                    self.flush_line();
                }
            }
            if !part.is_empty() {
                self.current_spans.push(Span::styled(part.to_string(), style));
            }
        }
    }

    fn add_segments(&mut self, segments: &[Segment<'_>]) {
        for segment in segments {
            match *segment {
                Segment::Text(text) => self.add_text(text, Style::default()),
                Segment::Link { text, url } => {
                    self.push_span(Span::styled(
                        text.to_string(),
                        Style::default()
                            .fg(Color::Blue)
                            .add_modifier(Modifier::UNDERLINED),
                    ));
                    self.push_span(Span::styled(
                        format!(" <{url}>"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
        }
    }

    fn add_artifact(&mut self, artifact: &Artifact, expanded: bool) {
        self.flush_line();

        let mut header = vec![
            Span::styled("┌ ", Style::default().fg(Color::Magenta)),
            Span::styled(
                artifact.display_title(),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
        ];
        if let Some(label) = artifact.type_label() {
            header.push(Span::styled(format!("  {label}"), Style::default().fg(Color::Gray)));
        }
        if let Some(stage) = &artifact.stage {
            header.push(Span::styled(
                format!("  [{stage}]"),
                Style::default().fg(stage_color(artifact.stage())),
            ));
        }
        self.lines.push(Line::from(header));

        let collapsed = artifact.is_long() && !expanded;
        let body = if collapsed {
            preview(&artifact.content)
        } else {
            artifact.content.clone()
        };
        for line in body.split('\n') {
            self.lines.push(Line::from(vec![
                Span::styled("│ ", Style::default().fg(Color::Magenta)),
                Span::raw(line.to_string()),
            ]));
        }

        let footer = if collapsed {
            "└ Ctrl+T to expand, /export to save"
        } else {
            "└ /export to save"
        };
        self.lines.push(Line::from(Span::styled(
            footer,
            Style::default().fg(Color::DarkGray),
        )));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        self.lines
    }
}

/// First part of a long body, ending in an ellipsis.
fn preview(content: &str) -> String {
    let mut text: String = content
        .chars()
        .take(lexora_render::artifact::COLLAPSE_THRESHOLD)
        .collect();
    text.push('…');
    text
}

fn stage_color(stage: ArtifactStage) -> Color {
    match stage {
        ArtifactStage::Draft => Color::Yellow,
        ArtifactStage::Review => Color::Blue,
        ArtifactStage::Final => Color::Green,
        ArtifactStage::Other => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn user_text_is_plain() {
        let lines = message_lines(&Message::user("see [x](https://x.uz)"), false);
        assert_eq!(text_of(&lines), ["[You] see [x](https://x.uz)", ""]);
    }

    #[test]
    fn links_show_label_and_target() {
        let lines = message_lines(&Message::assistant("See [Code](https://lex.uz/1)."), false);
        assert_eq!(
            text_of(&lines),
            ["[Lexora]", "See Code <https://lex.uz/1>.", ""]
        );
    }

    #[test]
    fn newlines_become_lines() {
        let lines = message_lines(&Message::assistant("one\n\nthree"), false);
        assert_eq!(text_of(&lines), ["[Lexora]", "one", "", "three", ""]);
    }

    #[test]
    fn artifact_card_has_title_and_body() {
        let msg = Message::assistant(
            "Done.<artifact artifact_id=\"d1\" title=\"Memo\" type=\"legal_memo\" stage=\"draft\">Body</artifact>",
        );
        let text = text_of(&message_lines(&msg, false));
        assert_eq!(text[1], "Done.");
        assert_eq!(text[2], "┌ Memo  legal memo  [draft]");
        assert_eq!(text[3], "│ Body");
    }

    #[test]
    fn long_artifact_collapses_until_expanded() {
        let body = "x".repeat(250);
        let msg = Message::assistant(format!("<artifact artifact_id=\"d\">{body}</artifact>"));

        let collapsed = text_of(&message_lines(&msg, false));
        assert_eq!(collapsed[2].chars().count(), "│ ".chars().count() + 201);
        assert!(collapsed[3].contains("Ctrl+T"));

        let expanded = text_of(&message_lines(&msg, true));
        assert_eq!(expanded[2], format!("│ {body}"));
    }
}
