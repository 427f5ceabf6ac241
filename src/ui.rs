pub mod charting;
pub mod heatmap;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};

use crate::mistakes::total_mistakes;
use crate::session::TypingSession;
use crate::timer::format_mm_ss;
use crate::ui::heatmap::{render_heat_map, HeatRow};
use crate::word_state::LetterState;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Everything drawn for one frame.
pub struct PracticeView<'a> {
    pub session: &'a TypingSession,
    /// Latest warning for the user, shown until replaced.
    pub notice: Option<&'a str>,
    /// Heat map rows for the results screen.
    pub heat_rows: &'a [HeatRow],
}

impl<'a> PracticeView<'a> {
    pub fn new(session: &'a TypingSession) -> Self {
        Self {
            session,
            notice: None,
            heat_rows: &[],
        }
    }
}

impl Widget for &PracticeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session;

        if session.is_chapter_completed() {
            render_results(self, area, buf);
        } else if session.is_paused() {
            Paragraph::new(Span::styled(
                "PAUSED - ctrl+p to resume",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(area, buf);
        } else {
            render_typing(self, area, buf);
        }
    }
}

fn status_line(session: &TypingSession) -> String {
    format!(
        "{} ch.{}  {}/{} ({}%)   {}   {} wpm   {}% words   {}% keys",
        session.dictionary(),
        session.chapter(),
        session.current_index() + 1,
        session.words().len(),
        session.progress_percentage(),
        session.session_time_display(),
        session.average_wpm(),
        session.correct_rate(),
        session.letter_accuracy(),
    )
}

fn letter_spans(session: &TypingSession) -> Vec<Span<'static>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let ws = session.word_state();
    let cursor = ws.position();

    ws.display_word()
        .chars()
        .zip(ws.letter_states())
        .enumerate()
        .map(|(idx, (c, state))| {
            let style = match state {
                LetterState::Correct => bold_style.fg(Color::Green),
                LetterState::Wrong => bold_style.fg(Color::Red),
                LetterState::Normal if idx == cursor => bold_style
                    .add_modifier(Modifier::DIM)
                    .add_modifier(Modifier::UNDERLINED),
                LetterState::Normal => bold_style.add_modifier(Modifier::DIM),
            };
            Span::styled(c.to_string(), style)
        })
        .collect()
}

fn render_typing(view: &PracticeView<'_>, area: Rect, buf: &mut Buffer) {
    let session = view.session;
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1), // status
            Constraint::Min(0),
            Constraint::Length(1), // word
            Constraint::Length(1), // phonetic
            Constraint::Length(1), // translation
            Constraint::Length(1), // mistake hint
            Constraint::Min(0),
            Constraint::Length(1), // notice
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(status_line(session), dim_style))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(Line::from(letter_spans(session)))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    if let Some(word) = session.current_word() {
        if let Some(phonetic) = &word.phonetic {
            Paragraph::new(Span::styled(format!("/{phonetic}/"), italic_style))
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }
        if let Some(translation) = &word.translation {
            Paragraph::new(Span::styled(
                translation.clone(),
                Style::default().fg(Color::Cyan),
            ))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
        }
    }

    if session.word_state().has_wrong() {
        if let Some((expected, typed)) = session.last_confusion() {
            Paragraph::new(Span::styled(
                format!("expected {expected}, typed {typed}"),
                Style::default().fg(Color::Red),
            ))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
        }
    }

    if let Some(notice) = view.notice {
        Paragraph::new(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);
    }

    Paragraph::new(Span::styled(
        "(tab) skip / (ctrl+p) pause / (ctrl+r) restart / (esc)ape",
        italic_style,
    ))
    .render(chunks[8], buf);
}

fn render_results(view: &PracticeView<'_>, area: Rect, buf: &mut Buffer) {
    let session = view.session;
    let Some(data) = session.completion().data() else {
        return;
    };
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // wrong words
            Constraint::Length(8), // heat map
            Constraint::Length(1), // notice
            Constraint::Length(1), // legend
        ])
        .split(area);

    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(session.wpm_history(), data.practice_time);
    let tuples: Vec<(f64, f64)> = session.wpm_history().iter().map(|p| (p.t, p.wpm)).collect();
    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([0.0, overall_duration])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_wpm), bold_style),
                ]),
        )
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {} wrong keys   {}   practiced {}x",
            data.wpm,
            data.accuracy,
            total_mistakes(session.key_mistakes()),
            format_mm_ss(data.practice_time),
            session
                .data()
                .chapter_practice_stats
                .get_chapter_practice_count_display(&data.dictionary, data.chapter),
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let wrong_words = if data.wrong_words.is_empty() {
        "no mistyped words".to_string()
    } else {
        let words: Vec<&str> = data.wrong_words.iter().map(|w| w.word.as_str()).collect();
        format!("mistyped: {}", words.join(", "))
    };
    Paragraph::new(Span::styled(
        wrong_words,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[2], buf);

    if !view.heat_rows.is_empty() {
        render_heat_map(view.heat_rows, "Mistakes", chunks[3], buf);
    }

    if let Some(notice) = view.notice {
        Paragraph::new(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }

    Paragraph::new(Span::styled("(ctrl+r) again / (esc)ape", italic_style))
        .render(chunks[5], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PracticeData;
    use crate::ui::heatmap::session_rows;
    use crate::word::Word;
    use chrono::{Duration, TimeZone, Utc};
    use ratatui::{buffer::Buffer, layout::Rect};

    fn started_session(words: Vec<Word>) -> TypingSession {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut session = TypingSession::new("cet4", 1, words, PracticeData::default()).unwrap();
        session.start(t0);
        session
    }

    fn render_to_string(view: &PracticeView<'_>, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        view.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_typing_view_shows_word_and_translation() {
        let session = started_session(vec![Word::new("1", "apple")
            .with_phonetic("ˈæpl")
            .with_translation("fruit")]);
        let rendered = render_to_string(&PracticeView::new(&session), Rect::new(0, 0, 80, 24));

        assert!(rendered.contains("apple"));
        assert!(rendered.contains("fruit"));
        assert!(rendered.contains("1/1 (100%)"));
    }

    #[test]
    fn test_typing_view_shows_mistake_hint() {
        let mut session = started_session(vec![Word::new("1", "apple")]);
        let now = session.session_start_time().unwrap();
        session.handle_key('q', now);

        let rendered = render_to_string(&PracticeView::new(&session), Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("expected a, typed q"));
    }

    #[test]
    fn test_paused_view() {
        let mut session = started_session(vec![Word::new("1", "apple")]);
        let now = session.session_start_time().unwrap();
        session.pause(now);

        let rendered = render_to_string(&PracticeView::new(&session), Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("PAUSED"));
    }

    #[test]
    fn test_results_view() {
        let mut session = started_session(vec![Word::new("1", "ab")]);
        let t0 = session.session_start_time().unwrap();
        session.handle_key('x', t0 + Duration::seconds(1));
        session.handle_key('a', t0 + Duration::seconds(2));
        session.handle_key('b', t0 + Duration::seconds(3));
        session.tick(t0 + Duration::seconds(4));
        assert!(session.is_chapter_completed());

        let rows = session_rows(&session.heat_map());
        let view = PracticeView {
            session: &session,
            notice: Some("sync failed"),
            heat_rows: &rows,
        };
        let rendered = render_to_string(&view, Rect::new(0, 0, 80, 30));

        assert!(rendered.contains("67% acc"));
        assert!(rendered.contains("1 wrong keys"));
        assert!(rendered.contains("mistyped: ab"));
        assert!(rendered.contains("Mistakes"));
        assert!(rendered.contains("sync failed"));
    }

    #[test]
    fn test_small_area_does_not_panic() {
        let session = started_session(vec![Word::new("1", "hello")]);
        let area = Rect::new(0, 0, 20, 5);
        let mut buffer = Buffer::empty(area);

        (&PracticeView::new(&session)).render(area, &mut buffer);

        assert!(*buffer.area() == area);
    }
}
