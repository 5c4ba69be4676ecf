use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use time_humanize::HumanTime;
use unicode_width::UnicodeWidthStr;

use kadence::session::{Mode, Phase};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);

        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);

        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);

        let underlined_dim_bold_style = Style::default()
            .patch(dim_bold_style)
            .add_modifier(Modifier::UNDERLINED);

        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        match self.state {
            AppState::Typing => render_typing(self, area, buf, TypingStyles {
                bold: bold_style,
                green_bold: green_bold_style,
                red_bold: red_bold_style,
                dim_bold: dim_bold_style,
                underlined_dim_bold: underlined_dim_bold_style,
            }),
            AppState::Results => render_results(self, area, buf, bold_style, italic_style),
        }
    }
}

struct TypingStyles {
    bold: Style,
    green_bold: Style,
    red_bold: Style,
    dim_bold: Style,
    underlined_dim_bold: Style,
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer, styles: TypingStyles) {
    if app.session.phase() == Phase::Paused {
        let banner = Paragraph::new(Span::styled(
            "PAUSED - press tab to resume",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

        banner.render(area, buf);
        return;
    }

    let source = &app.session.config.source_text;

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let mut prompt_occupied_lines =
        ((source.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16;

    if source.width() <= max_chars_per_line as usize {
        prompt_occupied_lines = 1;
    }

    let countdown_lines = if app.session.config.mode == Mode::Timed {
        2
    } else {
        0
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(
                    ((area.height as f64 - prompt_occupied_lines as f64) / 2.0) as u16,
                ),
                Constraint::Length(countdown_lines),
                Constraint::Length(prompt_occupied_lines),
                Constraint::Length(2),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let source_chars: Vec<char> = source.chars().collect();
    let typed_chars: Vec<char> = app.buffer.chars().collect();

    let mut spans = typed_chars
        .iter()
        .enumerate()
        .map(|(idx, &c)| {
            let correct = source_chars.get(idx) == Some(&c);
            if correct {
                Span::styled(c.to_string(), styles.green_bold)
            } else {
                // make a mistyped space visible
                let shown = match c {
                    ' ' => "·".to_owned(),
                    other => other.to_string(),
                };
                Span::styled(shown, styles.red_bold)
            }
        })
        .collect::<Vec<Span>>();

    if let Some(&cursor_char) = source_chars.get(typed_chars.len()) {
        spans.push(Span::styled(
            cursor_char.to_string(),
            styles.underlined_dim_bold,
        ));
    }

    let rest_start = (typed_chars.len() + 1).min(source_chars.len());
    let rest: String = source_chars[rest_start..].iter().collect();
    spans.push(Span::styled(rest, styles.dim_bold));

    let widget = Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });

    widget.render(chunks[2], buf);

    if let Some(remaining) = app.session.seconds_remaining(app.now_ms) {
        let countdown = Paragraph::new(Span::styled(
            format!("{:.1}", remaining),
            styles.dim_bold,
        ))
        .alignment(Alignment::Center);

        countdown.render(chunks[1], buf);
    }

    if app.session.phase() == Phase::Active {
        let stats = app.session.current_stats(app.now_ms);
        let live = Paragraph::new(Span::styled(
            format!(
                "{} wpm   {}% acc   {}% con",
                stats.net_wpm, stats.accuracy_percent, stats.consistency_percent
            ),
            styles.bold,
        ))
        .alignment(Alignment::Center);

        live.render(chunks[3], buf);
    }
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer, bold_style: Style, italic_style: Style) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(2), // headline stats
                Constraint::Length(1), // history summary
                Constraint::Length(1), // padding
                Constraint::Min(1),    // recent sessions
                Constraint::Length(1), // legend
            ]
            .as_ref(),
        )
        .split(area);

    let stats = app
        .history
        .entries()
        .first()
        .map(|r| r.stats)
        .unwrap_or_default();

    let headline = Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {} raw   {}% consistency",
            stats.net_wpm, stats.accuracy_percent, stats.raw_wpm, stats.consistency_percent
        ),
        bold_style,
    ))
    .alignment(Alignment::Center);

    headline.render(chunks[0], buf);

    if let (Some((best, worst)), Some(avg)) = (
        app.history.best_and_worst_net_wpm(),
        app.history.average_net_wpm(),
    ) {
        let summary = Paragraph::new(Span::styled(
            format!(
                "last {}: best {} / avg {:.0} / worst {}",
                app.history.len(),
                best,
                avg,
                worst
            ),
            italic_style,
        ))
        .alignment(Alignment::Center);

        summary.render(chunks[1], buf);
    }

    let recent: Vec<Line> = app
        .history
        .entries()
        .iter()
        .take(8)
        .map(|result| {
            let age_secs = (chrono::Local::now() - result.timestamp).num_seconds();
            Line::from(Span::raw(format!(
                "{} wpm · {}% acc · {} · {} chars · {}",
                result.stats.net_wpm,
                result.stats.accuracy_percent,
                result.difficulty.to_string().to_lowercase(),
                result.text_length,
                HumanTime::from(-age_secs),
            )))
            .alignment(Alignment::Center)
        })
        .collect();

    Paragraph::new(recent).render(chunks[3], buf);

    let legend = Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (e)xport / (esc)ape",
        italic_style,
    ))
    .alignment(Alignment::Center);

    legend.render(chunks[4], buf);
}
