use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use scour::query::FilterRule;

use crate::tui::app::{App, DetailOverlay, Focus, NoticeKind, ResultsState, RuleColumn};

const SPINNER_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Draw the UI
pub fn draw(f: &mut Frame, app: &App) {
    let rules_height = (app.rules.len() as u16 + 2).clamp(3, 8);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // search bar
            Constraint::Length(rules_height), // filter rules
            Constraint::Min(3),               // results
            Constraint::Length(1),            // status line
        ])
        .split(f.area());

    render_search(f, app, chunks[0]);
    render_rules(f, app, chunks[1]);
    render_results(f, app, chunks[2]);
    render_status(f, app, chunks[3]);

    if let Some(id) = &app.pending_delete {
        render_confirm(f, id);
    }
    if let Some(overlay) = &app.overlay {
        render_overlay(f, overlay);
    }
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, style))
}

/// Render the free-text search bar
fn render_search(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Search;
    let block = pane_block("Search", focused);
    let inner_area = block.inner(area);

    let input = Paragraph::new(app.input.as_str()).block(block);
    f.render_widget(input, area);

    if focused && app.overlay.is_none() && app.pending_delete.is_none() {
        let cursor_x = app.input[..app.cursor_byte_index()].width() as u16;
        f.set_cursor_position((inner_area.x + cursor_x, inner_area.y));
    }
}

/// Render the filter rule builder
fn render_rules(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Rules;
    let block = pane_block("Filters", focused);

    if app.rules.is_empty() {
        let hint = Paragraph::new(Span::styled(
            "no filter rules - press a to add one",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        f.render_widget(hint, area);
        return;
    }

    let lines: Vec<Line> = app
        .rules
        .rules()
        .iter()
        .enumerate()
        .map(|(i, rule)| rule_line(app, rule, focused && i == app.rule_cursor))
        .collect();

    let rules = Paragraph::new(lines).block(block);
    f.render_widget(rules, area);
}

fn rule_line<'a>(app: &App, rule: &'a FilterRule, selected: bool) -> Line<'a> {
    let cell_style = |column: RuleColumn| {
        if selected && app.rule_column == column {
            if column == RuleColumn::Value && app.editing_value {
                Style::default()
                    .add_modifier(Modifier::REVERSED)
                    .add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().add_modifier(Modifier::REVERSED)
            }
        } else {
            Style::default()
        }
    };

    let field = rule.field();
    let value_span = if rule.value().is_empty() {
        Span::styled(
            format!("<{}>", field.value_type.input_hint()),
            cell_style(RuleColumn::Value).fg(Color::DarkGray),
        )
    } else {
        Span::styled(rule.value(), cell_style(RuleColumn::Value))
    };

    Line::from(vec![
        Span::raw(if selected { "> " } else { "  " }),
        Span::styled(field.label, cell_style(RuleColumn::Field)),
        Span::raw(" "),
        Span::styled(
            rule.operator().label(field.value_type),
            cell_style(RuleColumn::Operator).fg(Color::Yellow),
        ),
        Span::raw(" "),
        value_span,
    ])
}

/// Render the results pane
fn render_results(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Results;

    match &app.results {
        ResultsState::Idle => {
            let message = Paragraph::new(Span::styled(
                "Type a query and press Enter.",
                Style::default().fg(Color::DarkGray),
            ))
            .block(pane_block("Results", focused));
            f.render_widget(message, area);
        }
        ResultsState::Loading { subject } => {
            let line = Line::from(vec![
                Span::styled(
                    format!("{} ", SPINNER_FRAMES[app.spinner_frame]),
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("Searching for \"{subject}\"...")),
            ]);
            let loading = Paragraph::new(line).block(pane_block("Results", focused));
            f.render_widget(loading, area);
        }
        ResultsState::Empty => {
            let message = Paragraph::new("No results found for your query.")
                .block(pane_block("Results", focused));
            f.render_widget(message, area);
        }
        ResultsState::Error(message) => {
            let error = Paragraph::new(Span::styled(
                message.as_str(),
                Style::default().fg(Color::Red),
            ))
            .wrap(Wrap { trim: true })
            .block(pane_block("Results", focused));
            f.render_widget(error, area);
        }
        ResultsState::Results(cards) => {
            let items: Vec<ListItem> = cards
                .iter()
                .map(|card| {
                    ListItem::new(Text::from(vec![
                        Line::from(vec![
                            Span::styled(
                                card.score.as_str(),
                                Style::default().fg(Color::Yellow),
                            ),
                            Span::styled(
                                format!(" | {} | {}", card.kind, card.published),
                                Style::default().fg(Color::DarkGray),
                            ),
                        ]),
                        Line::from(Span::styled(
                            card.title.as_str(),
                            Style::default().add_modifier(Modifier::BOLD),
                        )),
                        Line::from(card.snippet.as_str()),
                        Line::raw(""),
                    ]))
                })
                .collect();

            let title = format!("Results ({})", cards.len());
            let list = List::new(items)
                .block(pane_block(&title, focused))
                .highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)));

            let mut state = ListState::default().with_selected(Some(app.selected));
            f.render_stateful_widget(list, area, &mut state);
        }
    }
}

/// Render the status line: a transient notice, or key help for the pane
fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(notice) = &app.notice {
        let style = match notice.kind {
            NoticeKind::Info => Style::default().fg(Color::Green),
            NoticeKind::Error => Style::default().fg(Color::Red),
        };
        Line::from(Span::styled(notice.text.as_str(), style))
    } else {
        let help = match app.focus {
            Focus::Search => "enter search | tab switch pane | esc quit",
            Focus::Rules => {
                "a add | d remove | c clear | \u{2190}\u{2192} cell | enter change/edit | s search | tab switch pane"
            }
            Focus::Results => {
                "\u{2191}\u{2193} select | enter details | f find similar | d delete | tab switch pane"
            }
        };
        Line::from(Span::styled(help, Style::default().fg(Color::DarkGray)))
    };
    f.render_widget(Paragraph::new(line), area);
}

/// Render the delete confirmation dialog
fn render_confirm(f: &mut Frame, _id: &str) {
    let area = centered_rect(f.area(), 52, 6);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Black))
        .title(Span::styled(
            "Confirm Delete",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));

    let body = Paragraph::new(vec![
        Line::raw("Are you sure you want to delete this post?"),
        Line::raw("This action cannot be undone."),
        Line::raw(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(Color::Red)),
            Span::raw(" delete   "),
            Span::styled("[n]", Style::default().fg(Color::Green)),
            Span::raw(" keep"),
        ]),
    ])
    .block(block)
    .wrap(Wrap { trim: true });

    f.render_widget(body, area);
}

/// Render the record detail overlay
fn render_overlay(f: &mut Frame, overlay: &DetailOverlay) {
    let size = f.area();
    let width = size.width.saturating_sub(8).min(72).max(20);
    let height = (overlay.fields.len() as u16 + 3).min(size.height.saturating_sub(2));
    let area = centered_rect(size, width, height);

    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Black))
        .title(Span::styled(
            overlay.title.as_str(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let mut lines: Vec<Line> = overlay
        .fields
        .iter()
        .map(|field| {
            let value_style = if field.is_url {
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(
                    format!("{}: ", field.label),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(field.value.as_str(), value_style),
            ])
        })
        .collect();
    lines.push(Line::from(Span::styled(
        "esc close",
        Style::default().fg(Color::DarkGray),
    )));

    let body = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(body, area);
}

fn centered_rect(size: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(size.width);
    let height = height.min(size.height);
    let x = (size.width - width) / 2;
    let y = (size.height - height) / 2;
    Rect::new(x, y, width, height)
}
