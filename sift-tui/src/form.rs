use crate::input::LineInput;
use crate::table::ResultTable;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sift_common::{ExtractionStrategy, SCRAPE_FAILED};
use sift_web::{ScrapeRequest, ScrapeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Url,
    Fields,
}

/// What the event loop should do after a key press.
#[derive(Debug, PartialEq)]
pub enum Action {
    None,
    Submit(ScrapeRequest, ExtractionStrategy),
    Quit,
}

/// Everything the screen shows, independent of the terminal.
#[derive(Debug)]
pub struct FormState {
    pub url: LineInput,
    pub fields: LineInput,
    pub focus: Focus,
    pub strategy: ExtractionStrategy,
    pub table: Option<ResultTable>,
    pub scroll: usize,
    /// Inline validation message.
    pub notice: Option<String>,
    /// Modal failure popup.
    pub alert: Option<String>,
    pub busy: bool,
}

impl FormState {
    pub fn new(strategy: ExtractionStrategy) -> Self {
        Self {
            url: LineInput::default(),
            fields: LineInput::default(),
            focus: Focus::Url,
            strategy,
            table: None,
            scroll: 0,
            notice: None,
            alert: None,
            busy: false,
        }
    }

    fn focused(&mut self) -> &mut LineInput {
        match self.focus {
            Focus::Url => &mut self.url,
            Focus::Fields => &mut self.fields,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if let (KeyCode::Char('c') | KeyCode::Char('q'), KeyModifiers::CONTROL) =
            (key.code, key.modifiers)
        {
            return Action::Quit;
        }

        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.alert = None;
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Url => Focus::Fields,
                    Focus::Fields => Focus::Url,
                };
            }
            KeyCode::F(2) => self.strategy = self.strategy.toggled(),
            KeyCode::Esc => self.focused().clear(),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(5),
            KeyCode::PageDown => self.scroll_by(5),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => self.scroll_by(1),
            KeyCode::Left => self.focused().cursor_left(),
            KeyCode::Right => self.focused().cursor_right(),
            KeyCode::Home => self.focused().cursor_home(),
            KeyCode::End => self.focused().cursor_end(),
            KeyCode::Backspace => self.focused().backspace(),
            KeyCode::Delete => self.focused().delete(),
            KeyCode::Char(ch) => self.focused().insert_char(ch),
            _ => {}
        }
        Action::None
    }

    fn scroll_by(&mut self, n: usize) {
        let max = self
            .table
            .as_ref()
            .map(|t| t.rows.len().saturating_sub(1))
            .unwrap_or(0);
        self.scroll = (self.scroll + n).min(max);
    }

    fn submit(&mut self) -> Action {
        if self.busy {
            tracing::debug!("tui.submit.ignored_busy");
            return Action::None;
        }
        match ScrapeRequest::from_input(self.url.text(), self.fields.text()) {
            Ok(req) => {
                self.notice = None;
                self.busy = true;
                Action::Submit(req, self.strategy)
            }
            Err(err) => {
                tracing::debug!(error = %err, "tui.submit.invalid");
                self.notice = Some(err.to_string());
                Action::None
            }
        }
    }

    /// Store the records, or clear them and raise the alert.
    pub fn apply_result(&mut self, result: ScrapeResult) {
        self.busy = false;
        self.scroll = 0;
        if result.success {
            self.table = Some(ResultTable::from_records(result.records()));
        } else {
            self.table = None;
            self.alert = Some(result.error.unwrap_or_else(|| SCRAPE_FAILED.to_string()));
        }
    }
}
