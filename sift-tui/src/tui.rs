use crate::{
    feeders::spawn_tui_feeders,
    form::{Action, FormState},
    view::{self, ViewSnap},
};
use anyhow::Result;
use crossterm::{
    event::{Event as CtEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use sift_web::{ExtractionStrategy, ScrapeRequest, ScrapeResult, Scraper};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc};

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const MAILBOX: usize = 256;

pub enum TuiMsg {
    InputEvent(CtEvent),
    Tick,
    ScrapeDone(ScrapeResult),
    OpError(String),
    Shutdown,
}

pub struct TuiApp {
    scraper: Scraper,
    me: mpsc::Sender<TuiMsg>,

    // terminal
    term: Terminal<CrosstermBackend<Stdout>>,
    tick_rate: Duration,
    last_tick: Instant,
    restored: bool,

    form: FormState,
    dirty: bool,
    spin_idx: usize,

    shutdown: broadcast::Sender<()>,
}

impl TuiApp {
    pub fn new(
        scraper: Scraper,
        strategy: ExtractionStrategy,
        me: mpsc::Sender<TuiMsg>,
        shutdown: broadcast::Sender<()>,
    ) -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;
        term.clear()?;

        Ok(Self {
            scraper,
            me,
            term,
            tick_rate: Duration::from_millis(80),
            last_tick: Instant::now(),
            restored: false,
            form: FormState::new(strategy),
            dirty: true,
            spin_idx: 0,
            shutdown,
        })
    }

    fn spinner(&self) -> &'static str {
        if self.form.busy {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    fn step_spinner(&mut self) {
        if self.form.busy {
            self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
            self.dirty = true;
        }
    }

    fn draw(&mut self) -> Result<()> {
        let snap = ViewSnap {
            form: &self.form,
            spinner: self.spinner(),
            model: self.scraper.model_name(),
        };
        view::draw(&mut self.term, &snap)
    }

    fn start_scrape(&mut self, req: ScrapeRequest, strategy: ExtractionStrategy) {
        tracing::info!(url = req.url(), strategy = strategy.label(), "tui.scrape.submit");
        let scraper = self.scraper.clone();
        let me = self.me.clone();
        tokio::spawn(async move {
            let result = scraper.scrape(&req, strategy).await;
            let _ = me.send(TuiMsg::ScrapeDone(result)).await;
        });
    }

    fn restore_terminal(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        disable_raw_mode().ok();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = self.term.show_cursor();
    }

    /// Returns `false` once the app should stop.
    pub fn handle(&mut self, msg: TuiMsg) -> Result<bool> {
        match msg {
            TuiMsg::InputEvent(CtEvent::Key(k)) if k.kind == KeyEventKind::Press => {
                match self.form.handle_key(k) {
                    Action::None => {}
                    Action::Submit(req, strategy) => self.start_scrape(req, strategy),
                    Action::Quit => return self.handle(TuiMsg::Shutdown),
                }
                self.dirty = true;
            }
            TuiMsg::InputEvent(CtEvent::Resize(..)) => self.dirty = true,
            TuiMsg::InputEvent(_) => {}
            TuiMsg::ScrapeDone(result) => {
                tracing::info!(
                    success = result.success,
                    records = result.records().len(),
                    "tui.scrape.done"
                );
                self.form.apply_result(result);
                self.dirty = true;
            }
            TuiMsg::OpError(e) => {
                tracing::warn!(error = %e, "tui.op_error");
                self.form.notice = Some(e);
                self.dirty = true;
            }
            TuiMsg::Tick => {
                self.step_spinner();
                if self.dirty || self.last_tick.elapsed() >= self.tick_rate {
                    self.draw()?;
                    self.last_tick = Instant::now();
                    self.dirty = false;
                }
            }
            TuiMsg::Shutdown => {
                self.restore_terminal();
                let _ = self.shutdown.send(());
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        self.restore_terminal();
    }
}

/// Take over the terminal and serve the scrape form until the user quits.
pub async fn run(scraper: Scraper, strategy: ExtractionStrategy) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(MAILBOX);
    let (shutdown, _) = broadcast::channel(1);

    let mut app = TuiApp::new(scraper, strategy, tx.clone(), shutdown.clone())?;
    spawn_tui_feeders(tx, &shutdown);
    tracing::info!(strategy = strategy.label(), "tui.started");

    while let Some(msg) = rx.recv().await {
        if !app.handle(msg)? {
            break;
        }
    }

    tracing::info!("tui.stopped");
    Ok(())
}
