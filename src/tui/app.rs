use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{debug, error};

use scour::query::{RuleId, RuleSet, SearchRequest};
use scour::results::{self, DetailField, HitCard, ResultCache};
use scour::schema;

use crate::tui::event::{AppEvent, Event, EventHandler};

/// How long a transient notice stays visible, in ticks (30/s)
const NOTICE_TICKS: u16 = 150;

/// Message shown for any failed search; diagnostic detail goes to the log
const SEARCH_FAILED_MESSAGE: &str = "Sorry, something went wrong.";

/// Which pane owns key input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Rules,
    Results,
}

impl Focus {
    fn next(self) -> Focus {
        match self {
            Focus::Search => Focus::Rules,
            Focus::Rules => Focus::Results,
            Focus::Results => Focus::Search,
        }
    }
}

/// Which cell of a rule row is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleColumn {
    Field,
    Operator,
    Value,
}

/// State of the results pane
#[derive(Debug)]
pub enum ResultsState {
    /// Nothing searched yet
    Idle,
    /// A request is in flight
    Loading { subject: String },
    /// At least one hit to show
    Results(Vec<HitCard>),
    /// The backend answered with zero hits
    Empty,
    /// The last search failed
    Error(String),
}

/// Per-result actions, resolved from a key press on the selected card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewDetails,
    FindSimilar,
    Delete,
}

/// Open detail overlay, built entirely from the cache
#[derive(Debug)]
pub struct DetailOverlay {
    pub title: String,
    pub fields: Vec<DetailField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Transient status-line message
#[derive(Debug)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    ticks_left: u16,
}

/// Application state
pub struct App {
    /// Free-text query input
    pub input: String,
    /// Cursor position in the input field, in chars
    pub cursor_position: usize,
    /// Pane owning key input
    pub focus: Focus,
    /// Filter rule builder
    pub rules: RuleSet,
    /// Selected rule row
    pub rule_cursor: usize,
    /// Selected cell within the rule row
    pub rule_column: RuleColumn,
    /// Whether typed characters go into the selected rule's value
    pub editing_value: bool,
    /// Results pane state
    pub results: ResultsState,
    /// Selected result card
    pub selected: usize,
    /// Session record cache
    pub cache: ResultCache,
    /// Detail overlay, when open
    pub overlay: Option<DetailOverlay>,
    /// Record id awaiting delete confirmation
    pub pending_delete: Option<String>,
    /// Transient status-line notice
    pub notice: Option<Notice>,
    /// Sequence number of the most recently issued request
    seq: u64,
    /// Counter for spinner animation frames
    pub spinner_frame: usize,
    /// Flag to indicate if the application should quit
    pub should_quit: bool,
    /// Event handler
    event_handler: EventHandler,
}

impl App {
    /// Create a new application state
    pub fn new() -> Self {
        Self {
            input: String::new(),
            cursor_position: 0,
            focus: Focus::Search,
            rules: RuleSet::new(),
            rule_cursor: 0,
            rule_column: RuleColumn::Field,
            editing_value: false,
            results: ResultsState::Idle,
            selected: 0,
            cache: ResultCache::new(),
            overlay: None,
            pending_delete: None,
            notice: None,
            seq: 0,
            spinner_frame: 0,
            should_quit: false,
            event_handler: EventHandler::new(),
        }
    }

    /// Get the next event
    pub async fn next_event(&mut self) -> Option<Event> {
        let event = self.event_handler.next().await?;
        match &event {
            Event::Terminal(term_event) => self.handle_terminal_event(term_event),
            Event::Tick => self.tick(),
            Event::App(app_event) => self.handle_app_event(app_event),
        }
        Some(event)
    }

    /// Get the event sender
    pub fn event_sender(&self) -> mpsc::UnboundedSender<Event> {
        self.event_handler.sender()
    }

    fn send(&self, event: AppEvent) {
        let _ = self.event_handler.sender().send(Event::App(event));
    }

    /// Handle terminal events
    fn handle_terminal_event(&mut self, event: &crossterm::event::Event) {
        if let crossterm::event::Event::Key(key) = event {
            self.handle_key_event(*key);
        }
    }

    /// Handle application events
    fn handle_app_event(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Search { seq, request } => {
                self.seq = *seq;
                self.selected = 0;
                self.results = ResultsState::Loading {
                    subject: request.subject().to_string(),
                };
            }
            AppEvent::SearchCompleted { seq, hits } => {
                if *seq != self.seq {
                    debug!(seq, latest = self.seq, "Discarding stale search response");
                    return;
                }
                // The cache must be complete before any card it backs exists.
                self.cache.rebuild(hits);
                let cards: Vec<HitCard> = hits.iter().map(results::summarize).collect();
                self.selected = 0;
                self.results = if cards.is_empty() {
                    ResultsState::Empty
                } else {
                    self.focus = Focus::Results;
                    ResultsState::Results(cards)
                };
            }
            AppEvent::SearchFailed { seq, detail } => {
                if *seq != self.seq {
                    debug!(seq, latest = self.seq, "Discarding stale search failure");
                    return;
                }
                error!(%detail, "Search failed");
                self.results = ResultsState::Error(SEARCH_FAILED_MESSAGE.to_string());
            }
            AppEvent::Delete { id } => {
                debug!(%id, "Delete confirmed");
            }
            AppEvent::DeleteCompleted { id, message } => {
                if let ResultsState::Results(cards) = &mut self.results {
                    cards.retain(|card| card.id != *id);
                    if cards.is_empty() {
                        self.results = ResultsState::Empty;
                    } else {
                        self.selected = self.selected.min(cards.len() - 1);
                    }
                }
                self.cache.remove(id);
                self.set_notice(NoticeKind::Info, message.clone());
            }
            AppEvent::DeleteFailed { id, detail } => {
                error!(%id, %detail, "Delete failed");
                self.set_notice(NoticeKind::Error, format!("Error: {detail}"));
            }
            AppEvent::Quit => {
                self.should_quit = true;
            }
        }
    }

    /// Handle key events
    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.send(AppEvent::Quit);
            return;
        }

        // Modal layers first: confirmation, overlay, value editing
        if self.pending_delete.is_some() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.pending_delete = None;
                }
                _ => {}
            }
            return;
        }
        if self.overlay.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
                self.overlay = None;
            }
            return;
        }
        if self.editing_value {
            self.handle_value_edit_key(key);
            return;
        }

        match key.code {
            KeyCode::Esc => self.send(AppEvent::Quit),
            KeyCode::Tab => self.focus = self.focus.next(),
            _ => match self.focus {
                Focus::Search => self.handle_search_key(key),
                Focus::Rules => self.handle_rules_key(key),
                Focus::Results => self.handle_results_key(key),
            },
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_search(),
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            _ => {}
        }
    }

    fn handle_rules_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('a') => {
                self.rules.add_rule();
                self.rule_cursor = self.rules.len() - 1;
                self.rule_column = RuleColumn::Field;
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_rule() {
                    self.rules.remove_rule(id);
                    if !self.rules.is_empty() {
                        self.rule_cursor = self.rule_cursor.min(self.rules.len() - 1);
                    } else {
                        self.rule_cursor = 0;
                    }
                }
            }
            KeyCode::Char('c') => {
                self.rules.clear();
                self.rule_cursor = 0;
                self.rule_column = RuleColumn::Field;
            }
            KeyCode::Up => self.rule_cursor = self.rule_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.rule_cursor + 1 < self.rules.len() {
                    self.rule_cursor += 1;
                }
            }
            KeyCode::Left => {
                self.rule_column = match self.rule_column {
                    RuleColumn::Field | RuleColumn::Operator => RuleColumn::Field,
                    RuleColumn::Value => RuleColumn::Operator,
                }
            }
            KeyCode::Right => {
                self.rule_column = match self.rule_column {
                    RuleColumn::Field => RuleColumn::Operator,
                    RuleColumn::Operator | RuleColumn::Value => RuleColumn::Value,
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => match self.rule_column {
                RuleColumn::Field => self.cycle_field(),
                RuleColumn::Operator => self.cycle_operator(),
                RuleColumn::Value => {
                    if self.selected_rule().is_some() {
                        self.editing_value = true;
                    }
                }
            },
            KeyCode::Char('s') => self.submit_search(),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if let ResultsState::Results(cards) = &self.results {
                    if self.selected + 1 < cards.len() {
                        self.selected += 1;
                    }
                }
            }
            KeyCode::Enter => self.dispatch_action(Action::ViewDetails),
            KeyCode::Char('f') => self.dispatch_action(Action::FindSimilar),
            KeyCode::Char('d') => self.dispatch_action(Action::Delete),
            _ => {}
        }
    }

    fn handle_value_edit_key(&mut self, key: KeyEvent) {
        let Some(id) = self.selected_rule() else {
            self.editing_value = false;
            return;
        };
        let mut value = self.rules.rules()[self.rule_cursor].value().to_string();
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.editing_value = false;
                return;
            }
            KeyCode::Char(c) => value.push(c),
            KeyCode::Backspace => {
                value.pop();
            }
            _ => return,
        }
        self.rules.set_value(id, value);
    }

    /// Build a request from the current input and rules, and issue it
    fn submit_search(&mut self) {
        let filters = self.rules.serialize_non_empty();
        match SearchRequest::from_input(&self.input, filters) {
            Some(request) => self.issue(request),
            None => self.set_notice(
                NoticeKind::Error,
                "Type a query or fill in a filter first.".to_string(),
            ),
        }
    }

    /// Issue a request under a fresh sequence number.
    ///
    /// The number is captured here, at issue time; only the completion
    /// carrying the latest number may touch the cache and view.
    fn issue(&mut self, request: SearchRequest) {
        self.seq += 1;
        self.send(AppEvent::Search {
            seq: self.seq,
            request,
        });
    }

    /// Route an action to the selected result card
    fn dispatch_action(&mut self, action: Action) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match action {
            Action::Delete => self.pending_delete = Some(id),
            Action::FindSimilar => {
                let request = SearchRequest::similar(&id, self.cache.title(&id));
                self.issue(request);
            }
            Action::ViewDetails => match self.cache.record(&id) {
                Ok(record) => {
                    self.overlay = Some(DetailOverlay {
                        title: results::overlay_title(record),
                        fields: results::detail_fields(record),
                    });
                }
                Err(e) => {
                    error!(%id, %e, "Detail lookup missed the cache");
                    self.set_notice(
                        NoticeKind::Error,
                        "Could not find details for this post.".to_string(),
                    );
                }
            },
        }
    }

    fn confirm_delete(&mut self) {
        if let Some(id) = self.pending_delete.take() {
            self.send(AppEvent::Delete { id });
        }
    }

    fn selected_id(&self) -> Option<String> {
        match &self.results {
            ResultsState::Results(cards) => cards.get(self.selected).map(|c| c.id.clone()),
            _ => None,
        }
    }

    fn selected_rule(&self) -> Option<RuleId> {
        self.rules.rules().get(self.rule_cursor).map(|r| r.id())
    }

    fn cycle_field(&mut self) {
        let Some(id) = self.selected_rule() else {
            return;
        };
        let current = self.rules.rules()[self.rule_cursor].field_index();
        self.rules.set_field(id, (current + 1) % schema::FIELDS.len());
    }

    fn cycle_operator(&mut self) {
        let Some(id) = self.selected_rule() else {
            return;
        };
        let rule = &self.rules.rules()[self.rule_cursor];
        let legal = rule.field().value_type.operators();
        let current = legal
            .iter()
            .position(|op| *op == rule.operator())
            .unwrap_or(0);
        let next = legal[(current + 1) % legal.len()];
        let _ = self.rules.set_operator(id, next);
    }

    fn set_notice(&mut self, kind: NoticeKind, text: String) {
        self.notice = Some(Notice {
            kind,
            text,
            ticks_left: NOTICE_TICKS,
        });
    }

    /// Advance animations and expire the notice
    fn tick(&mut self) {
        if matches!(self.results, ResultsState::Loading { .. }) {
            self.spinner_frame = (self.spinner_frame + 1) % 8;
        }
        if let Some(notice) = &mut self.notice {
            notice.ticks_left = notice.ticks_left.saturating_sub(1);
            if notice.ticks_left == 0 {
                self.notice = None;
            }
        }
    }

    /// Byte offset of the input cursor, for rendering
    pub fn cursor_byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    /// Move cursor left in the input field
    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    /// Move cursor right in the input field
    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    /// Insert character at cursor position
    pub fn insert_char(&mut self, c: char) {
        let index = self.cursor_byte_index();
        self.input.insert(index, c);
        self.cursor_position += 1;
    }

    /// Delete character at cursor position
    pub fn delete_char(&mut self) {
        let index = self.cursor_byte_index();
        if index < self.input.len() {
            self.input.remove(index);
        }
    }

    /// Delete character before cursor position (backspace)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = self.cursor_byte_index();
            self.input.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scour::http::Hit;

    fn hit(id: &str, title: &str) -> Hit {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "_score": 1.0,
            "_source": { "link_name": title, "status_message": "body text" },
        }))
        .unwrap()
    }

    fn plain(query: &str) -> SearchRequest {
        SearchRequest::Plain {
            query: query.to_string(),
        }
    }

    fn card_ids(app: &App) -> Vec<String> {
        match &app.results {
            ResultsState::Results(cards) => cards.iter().map(|c| c.id.clone()).collect(),
            other => panic!("expected results, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn latest_request_wins_when_responses_arrive_out_of_order() {
        let mut app = App::new();
        app.handle_app_event(&AppEvent::Search {
            seq: 1,
            request: plain("first"),
        });
        app.handle_app_event(&AppEvent::Search {
            seq: 2,
            request: plain("second"),
        });

        // B resolves first, then A arrives late
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 2,
            hits: vec![hit("b1", "B")],
        });
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 1,
            hits: vec![hit("a1", "A")],
        });

        assert_eq!(card_ids(&app), vec!["b1"]);
        assert!(app.cache.contains("b1"));
        assert!(!app.cache.contains("a1"));
    }

    #[tokio::test]
    async fn stale_failure_does_not_clobber_newer_results() {
        let mut app = App::new();
        app.handle_app_event(&AppEvent::Search {
            seq: 1,
            request: plain("first"),
        });
        app.handle_app_event(&AppEvent::Search {
            seq: 2,
            request: plain("second"),
        });
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 2,
            hits: vec![hit("b1", "B")],
        });
        app.handle_app_event(&AppEvent::SearchFailed {
            seq: 1,
            detail: "timeout".to_string(),
        });

        assert_eq!(card_ids(&app), vec!["b1"]);
    }

    #[tokio::test]
    async fn empty_hit_list_is_a_valid_terminal_state() {
        let mut app = App::new();
        app.handle_app_event(&AppEvent::Search {
            seq: 1,
            request: plain("nothing"),
        });
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 1,
            hits: vec![],
        });

        assert!(matches!(app.results, ResultsState::Empty));
        assert!(app.cache.is_empty());
    }

    #[tokio::test]
    async fn failure_shows_error_state_and_keeps_previous_cache() {
        let mut app = App::new();
        app.handle_app_event(&AppEvent::Search {
            seq: 1,
            request: plain("first"),
        });
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 1,
            hits: vec![hit("a1", "A")],
        });
        app.handle_app_event(&AppEvent::Search {
            seq: 2,
            request: plain("second"),
        });
        app.handle_app_event(&AppEvent::SearchFailed {
            seq: 2,
            detail: "HTTP error: 500".to_string(),
        });

        assert!(matches!(app.results, ResultsState::Error(_)));
        assert!(app.cache.contains("a1"));
    }

    #[tokio::test]
    async fn delete_completion_evicts_card_and_cache_entry() {
        let mut app = App::new();
        app.handle_app_event(&AppEvent::Search {
            seq: 1,
            request: plain("posts"),
        });
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 1,
            hits: vec![hit("a1", "A"), hit("b1", "B")],
        });

        app.handle_app_event(&AppEvent::DeleteCompleted {
            id: "a1".to_string(),
            message: "Post deleted".to_string(),
        });

        assert_eq!(card_ids(&app), vec!["b1"]);
        assert!(!app.cache.contains("a1"));
        assert!(matches!(
            &app.notice,
            Some(Notice {
                kind: NoticeKind::Info,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn deleting_the_last_card_lands_in_empty_state() {
        let mut app = App::new();
        app.handle_app_event(&AppEvent::Search {
            seq: 1,
            request: plain("posts"),
        });
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 1,
            hits: vec![hit("a1", "A")],
        });
        app.handle_app_event(&AppEvent::DeleteCompleted {
            id: "a1".to_string(),
            message: "Post deleted".to_string(),
        });
        assert!(matches!(app.results, ResultsState::Empty));
    }

    #[tokio::test]
    async fn detail_lookup_after_eviction_reports_a_miss() {
        let mut app = App::new();
        app.handle_app_event(&AppEvent::Search {
            seq: 1,
            request: plain("posts"),
        });
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 1,
            hits: vec![hit("a1", "A"), hit("b1", "B")],
        });
        app.handle_app_event(&AppEvent::DeleteCompleted {
            id: "a1".to_string(),
            message: "Post deleted".to_string(),
        });

        // Force a stale card back in to model a view/cache divergence
        if let ResultsState::Results(cards) = &mut app.results {
            let mut ghost = cards[0].clone();
            ghost.id = "a1".to_string();
            cards.insert(0, ghost);
        }
        app.selected = 0;
        app.dispatch_action(Action::ViewDetails);

        assert!(app.overlay.is_none());
        assert!(matches!(
            &app.notice,
            Some(Notice {
                kind: NoticeKind::Error,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn view_details_opens_overlay_from_cache() {
        let mut app = App::new();
        app.handle_app_event(&AppEvent::Search {
            seq: 1,
            request: plain("posts"),
        });
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 1,
            hits: vec![hit("a1", "Post A")],
        });

        app.dispatch_action(Action::ViewDetails);
        let overlay = app.overlay.as_ref().expect("overlay should open");
        assert_eq!(overlay.title, "Post A");
        assert!(overlay.fields.iter().any(|f| f.label == "Status Message"));
    }

    #[tokio::test]
    async fn delete_requires_confirmation_and_decline_is_a_noop() {
        let mut app = App::new();
        app.handle_app_event(&AppEvent::Search {
            seq: 1,
            request: plain("posts"),
        });
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 1,
            hits: vec![hit("a1", "A")],
        });

        app.dispatch_action(Action::Delete);
        assert_eq!(app.pending_delete.as_deref(), Some("a1"));

        app.handle_key_event(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE));
        assert!(app.pending_delete.is_none());
        assert_eq!(card_ids(&app), vec!["a1"]);
        assert!(app.cache.contains("a1"));
    }

    #[tokio::test]
    async fn find_similar_issues_a_request_with_the_cached_title() {
        let mut app = App::new();
        app.handle_app_event(&AppEvent::Search {
            seq: 1,
            request: plain("posts"),
        });
        app.handle_app_event(&AppEvent::SearchCompleted {
            seq: 1,
            hits: vec![hit("a1", "Post A")],
        });

        app.dispatch_action(Action::FindSimilar);
        // the issue went through the event channel; pull it back out,
        // skipping ticks from the event pump
        let event = loop {
            match app.next_event().await.expect("event expected") {
                Event::App(app_event) => break app_event,
                _ => continue,
            }
        };
        match event {
            AppEvent::Search { seq, request } => {
                assert_eq!(seq, 2);
                assert_eq!(
                    request,
                    SearchRequest::Similar {
                        id: "a1".to_string(),
                        subject: "Post A".to_string(),
                    }
                );
            }
            other => panic!("expected search event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn multibyte_input_editing_stays_on_char_boundaries() {
        let mut app = App::new();
        for c in "héllo".chars() {
            app.insert_char(c);
        }
        app.move_cursor_left();
        app.move_cursor_left();
        app.backspace(); // removes the first 'l'
        assert_eq!(app.input, "hélo");
        app.insert_char('é');
        assert_eq!(app.input, "héélo");
    }
}
