use std::{
    fs, io, thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use kurspad_core::{
    config::AppConfig,
    document::TransactionType,
    editor::{Cleared, Editor},
    export::{self, ExportError, ExportOptions},
    focus::{CalcField, CalcFocus, Focus, ReceiptField, ReceiptFocus, ViewMode},
    format,
    formula::{self, Segment},
    keypad::{Key, Operator, KEYPAD_GRID},
    rates::{RateBook, RateClient, RateEvent},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use serde_json::Value;
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info};

use crate::share::{self, ShareOutcome};

const TICK_RATE: Duration = Duration::from_millis(250);
const MESSAGE_SHORT: Duration = Duration::from_millis(1500);
const MESSAGE_LONG: Duration = Duration::from_millis(3000);
const MAX_DETAIL_LEN: usize = 40;
const KEYPAD_PANEL_WIDTH: u16 = 27;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    success: Color,
    warning: Color,
    danger: Color,
    paper_sell: Color,
    paper_buy: Color,
    ink: Color,
    slate: Color,
    slate_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::Cyan,
            selection_fg: Color::Black,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Rgb(0xfb, 0x71, 0x85),
            paper_sell: Color::Rgb(0xfd, 0xf9, 0xc4),
            paper_buy: Color::Rgb(0xba, 0xe6, 0xfd),
            ink: Color::Rgb(0x1e, 0x29, 0x3b),
            slate: Color::Rgb(0x12, 0x12, 0x12),
            slate_fg: Color::Rgb(0xe2, 0xe8, 0xf0),
        }
    }
}

fn load_theme() -> (Theme, Option<String>) {
    let mut theme = Theme::default();
    let Some(path) = dirs::config_dir().map(|dir| dir.join("kurspad").join("theme.json")) else {
        return (theme, None);
    };
    if !path.exists() {
        return (theme, None);
    }

    let data = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
            return (
                theme,
                Some(format!(
                    "Failed to read {} ({err}); using default palette",
                    path.display()
                )),
            )
        }
    };
    let json: Value = match serde_json::from_str(&data) {
        Ok(value) => value,
        Err(err) => {
            return (
                theme,
                Some(format!(
                    "Failed to parse {} ({err}); using default palette",
                    path.display()
                )),
            )
        }
    };

    let mut applied = 0usize;
    {
        let mut apply = |slot: &mut Color, key: &str| {
            if let Some(color) = color_at_path(&json, &["palette", key]) {
                *slot = color;
                applied += 1;
            }
        };
        apply(&mut theme.primary_fg, "foreground");
        apply(&mut theme.accent, "accent");
        apply(&mut theme.muted, "muted");
        apply(&mut theme.selection_bg, "selection_bg");
        apply(&mut theme.selection_fg, "selection_fg");
        apply(&mut theme.success, "success");
        apply(&mut theme.warning, "warning");
        apply(&mut theme.danger, "danger");
        apply(&mut theme.paper_sell, "paper_sell");
        apply(&mut theme.paper_buy, "paper_buy");
        apply(&mut theme.ink, "ink");
        apply(&mut theme.slate, "slate");
        apply(&mut theme.slate_fg, "slate_fg");
    }

    (
        theme,
        Some(format!(
            "Loaded theme from {} ({applied} colors applied)",
            path.display()
        )),
    )
}

fn color_at_path(value: &Value, path: &[&str]) -> Option<Color> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current.as_str().and_then(parse_hex_color)
}

fn parse_hex_color(input: &str) -> Option<Color> {
    let hex = input.trim().strip_prefix('#').unwrap_or(input.trim());
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

/// On-screen regions that react to a left click, rebuilt on every draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitTarget {
    ReceiptCell { row: usize, field: ReceiptField },
    CalcCell(CalcFocus),
    Keypad(Key),
    Action(ActionButton),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionButton {
    Clear,
    Undo,
    Redo,
    ToggleMode,
    Kind,
    Details,
    Rates,
    Share,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailsField {
    Name,
    Address,
}

/// Modal editing the receipt's customer block. Commits both fields as a
/// single history entry on confirm.
#[derive(Debug, Clone)]
struct DetailsModal {
    name: String,
    address: String,
    field: DetailsField,
    cursor: usize,
}

impl DetailsModal {
    fn new(name: String, address: String) -> Self {
        let cursor = name.len();
        Self {
            name,
            address,
            field: DetailsField::Name,
            cursor,
        }
    }

    fn active(&self) -> &String {
        match self.field {
            DetailsField::Name => &self.name,
            DetailsField::Address => &self.address,
        }
    }

    fn active_mut(&mut self) -> &mut String {
        match self.field {
            DetailsField::Name => &mut self.name,
            DetailsField::Address => &mut self.address,
        }
    }

    fn switch_field(&mut self) {
        self.field = match self.field {
            DetailsField::Name => DetailsField::Address,
            DetailsField::Address => DetailsField::Name,
        };
        self.cursor = self.active().len();
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.active().len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.active().len();
    }

    fn insert(&mut self, ch: char) {
        if self.active().len() >= MAX_DETAIL_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            let cursor = self.cursor;
            self.active_mut().insert(cursor, ch.to_ascii_uppercase());
            self.cursor += 1;
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.active().len() {
            self.cursor -= 1;
            let cursor = self.cursor;
            self.active_mut().remove(cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.active().len() {
            let cursor = self.cursor;
            self.active_mut().remove(cursor);
        }
    }

    fn into_values(self) -> (String, String) {
        (
            self.name.trim().to_string(),
            self.address.trim().to_string(),
        )
    }
}

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    expires_at: Instant,
}

enum AppEvent {
    Input(Event),
    Tick,
    ShareDone(Result<ShareOutcome, ExportError>),
}

/// Top-level state for the kurspad terminal UI.
pub struct KurspadApp {
    config: AppConfig,
    editor: Editor,
    theme: Theme,
    theme_status: Option<String>,
    message: Option<Notice>,
    sharing: bool,
    stashed_focus: Option<Focus>,
    rates: RateBook,
    rates_rx: Option<mpsc::Receiver<RateEvent>>,
    rates_fetching: bool,
    show_rates: bool,
    details: Option<DetailsModal>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    hits: Vec<(Rect, HitTarget)>,
    should_quit: bool,
}

impl KurspadApp {
    pub fn new(config: AppConfig) -> Self {
        let (theme, theme_status) = load_theme();
        let editor = Editor::new(config.company.clone());
        Self {
            config,
            editor,
            theme,
            theme_status,
            message: None,
            sharing: false,
            stashed_focus: None,
            rates: RateBook::new(),
            rates_rx: None,
            rates_fetching: false,
            show_rates: false,
            details: None,
            event_tx: None,
            hits: Vec::new(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        if let Some(note) = self.theme_status.take() {
            self.show_message(note, MESSAGE_LONG);
        }

        let mut rates_rx: Option<mpsc::Receiver<RateEvent>> = None;
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            // A fetch started this iteration hands its receiver to the
            // select loop below.
            if rates_rx.is_none() {
                rates_rx = self.rates_rx.take();
            }
            if let Some(rx) = rates_rx.as_mut() {
                let mut rates_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_rate = rx.recv() => {
                        match maybe_rate {
                            Some(event) => self.handle_rate_event(event),
                            None => rates_closed = true,
                        }
                    }
                }
                if rates_closed {
                    rates_rx = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }

            if self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if self.details.is_some() {
                    if let Event::Key(key) = event {
                        self.handle_details_key(key);
                    }
                } else if let Err(err) = self.handle_input(event) {
                    self.show_message(format!("Error: {err}"), MESSAGE_LONG);
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            Some(AppEvent::ShareDone(result)) => {
                self.finish_share(result);
                true
            }
            None => false,
        }
    }

    fn handle_tick(&mut self) {
        if let Some(notice) = &self.message {
            if Instant::now() >= notice.expires_at {
                self.message = None;
            }
        }
    }

    fn show_message(&mut self, text: impl Into<String>, ttl: Duration) {
        self.message = Some(Notice {
            text: text.into(),
            expires_at: Instant::now() + ttl,
        });
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        if self.sharing {
            // Input is suspended while the capture pipeline runs; only a
            // quit chord is honored.
            if let Event::Key(key) = event {
                if key.modifiers == KeyModifiers::CONTROL
                    && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
                {
                    self.should_quit = true;
                }
            }
            return Ok(());
        }
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('z') => self.undo(),
                KeyCode::Char('r') => self.redo(),
                KeyCode::Char('t') => self.editor.toggle_mode(),
                KeyCode::Char('n') => self.clear_active(),
                KeyCode::Char('b') => self.toggle_kind(),
                KeyCode::Char('d') => self.open_details(),
                KeyCode::Char('s') => self.start_share(),
                KeyCode::Char('g') => self.toggle_rates(),
                _ => {}
            }
            return;
        }
        if self.show_rates {
            // Any plain key dismisses the overlay.
            self.show_rates = false;
            return;
        }
        if let Some(token) = keypad_key_for(&key) {
            self.press(token);
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
            return;
        }
        if self.show_rates {
            self.show_rates = false;
            return;
        }
        let position = Position::new(mouse.column, mouse.row);
        let target = self
            .hits
            .iter()
            .find(|(rect, _)| rect.contains(position))
            .map(|(_, target)| *target);
        match target {
            Some(HitTarget::Keypad(key)) => self.press(key),
            Some(HitTarget::ReceiptCell { row, field }) => {
                self.editor.select_receipt_field(row, field);
            }
            Some(HitTarget::CalcCell(focus)) => self.editor.select_calc_field(focus),
            Some(HitTarget::Action(button)) => self.activate(button),
            None => {}
        }
    }

    fn press(&mut self, token: Key) {
        let outcome = self.editor.handle_key(token);
        debug!(?token, ?outcome, "keypad token");
    }

    fn activate(&mut self, button: ActionButton) {
        match button {
            ActionButton::Clear => self.clear_active(),
            ActionButton::Undo => self.undo(),
            ActionButton::Redo => self.redo(),
            ActionButton::ToggleMode => self.editor.toggle_mode(),
            ActionButton::Kind => self.toggle_kind(),
            ActionButton::Details => self.open_details(),
            ActionButton::Rates => self.toggle_rates(),
            ActionButton::Share => self.start_share(),
        }
    }

    fn undo(&mut self) {
        if !self.editor.undo() {
            debug!("undo unavailable");
        }
    }

    fn redo(&mut self) {
        if !self.editor.redo() {
            debug!("redo unavailable");
        }
    }

    fn clear_active(&mut self) {
        match self.editor.clear() {
            Cleared::Receipt => self.show_message("Receipt Cleared", MESSAGE_SHORT),
            Cleared::Calculator => self.show_message("Calculator Cleared", MESSAGE_SHORT),
        }
    }

    fn toggle_kind(&mut self) {
        if self.editor.toggle_kind() {
            debug!(kind = self.editor.receipt().kind.label(), "kind toggled");
        }
    }

    fn open_details(&mut self) {
        if self.editor.mode() != ViewMode::Receipt {
            return;
        }
        let receipt = self.editor.receipt();
        self.details = Some(DetailsModal::new(
            receipt.customer_name.clone(),
            receipt.customer_address.clone(),
        ));
    }

    fn handle_details_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.details = None;
                return;
            }
            KeyCode::Enter => {
                if let Some(modal) = self.details.take() {
                    let (name, address) = modal.into_values();
                    self.editor.set_customer_details(name, address);
                    self.show_message("Customer details saved", MESSAGE_SHORT);
                }
                return;
            }
            _ => {}
        }
        let Some(modal) = self.details.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => modal.switch_field(),
            KeyCode::Left => modal.move_cursor(-1),
            KeyCode::Right => modal.move_cursor(1),
            KeyCode::Home => modal.move_home(),
            KeyCode::End => modal.move_end(),
            KeyCode::Backspace => modal.backspace(),
            KeyCode::Delete => modal.delete(),
            KeyCode::Char(ch) => modal.insert(ch),
            _ => {}
        }
    }

    fn start_share(&mut self) {
        if self.sharing {
            return;
        }
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let artifact = match self.editor.mode() {
            ViewMode::Receipt => export::render_receipt(
                self.editor.receipt(),
                ExportOptions::receipt(self.editor.receipt().kind),
            ),
            ViewMode::Calculator => {
                export::render_calculator(self.editor.note(), ExportOptions::calculator())
            }
        };
        self.stashed_focus = self.editor.take_focus();
        self.sharing = true;
        info!(stem = %artifact.stem, "share started");
        let request = share::ShareRequest {
            artifact,
            export_dir: self.config.export_dir.clone(),
            share_command: self.config.share_command.clone(),
        };
        spawn(async move {
            let result = share::run(request).await;
            let _ = tx.send(AppEvent::ShareDone(result)).await;
        });
    }

    fn finish_share(&mut self, result: Result<ShareOutcome, ExportError>) {
        self.sharing = false;
        let stashed = self.stashed_focus.take();
        self.editor.restore_focus(stashed);
        match result {
            Ok(outcome) => self.show_message(outcome.message(), MESSAGE_LONG),
            Err(err) => {
                error!(%err, "share failed");
                self.show_message("Process failed.", MESSAGE_LONG);
            }
        }
    }

    fn toggle_rates(&mut self) {
        if self.show_rates {
            self.show_rates = false;
            return;
        }
        self.show_rates = true;
        if self.rates.latest().is_none() && !self.rates_fetching {
            self.begin_rates_fetch();
        }
    }

    fn begin_rates_fetch(&mut self) {
        self.rates_fetching = true;
        let (rate_tx, rate_rx) = mpsc::channel(4);
        let client = RateClient::new(self.config.rates.clone());
        let book = self.rates.clone();
        spawn(async move {
            if let Err(err) = client.run(book, rate_tx).await {
                error!(?err, "rate fetch task error");
            }
        });
        self.rates_rx = Some(rate_rx);
    }

    fn handle_rate_event(&mut self, event: RateEvent) {
        match event {
            RateEvent::Loaded(sheet) => {
                self.rates_fetching = false;
                info!(quotes = sheet.quotes.len(), "rates loaded");
                self.show_message("Rates updated", MESSAGE_SHORT);
            }
            RateEvent::Failed(err) => {
                self.rates_fetching = false;
                error!(?err, "rate fetch failed");
                self.show_message("Failed to fetch rates", MESSAGE_LONG);
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        self.hits.clear();
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, rows[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(KEYPAD_PANEL_WIDTH)])
            .split(rows[1]);
        match self.editor.mode() {
            ViewMode::Receipt => self.render_receipt(frame, body[0]),
            ViewMode::Calculator => self.render_calculator(frame, body[0]),
        }
        self.render_keypad(frame, body[1]);
        self.render_status(frame, rows[2]);

        if self.show_rates {
            self.render_rates_overlay(frame, area);
        }
        if let Some(modal) = self.details.clone() {
            self.render_details_modal(frame, &modal);
        }
        if self.sharing {
            self.render_sharing_overlay(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let title = match self.editor.mode() {
            ViewMode::Receipt => "DIGITAL RECEIPT PRO",
            ViewMode::Calculator => "NOTE CALCULATOR",
        };
        let (status_text, status_color) = if self.sharing {
            ("● PROCESSING", self.theme.warning)
        } else if self.rates_fetching {
            ("● FETCHING RATES", self.theme.warning)
        } else {
            ("● SYSTEM ACTIVE", self.theme.success)
        };
        let line = padded_pair(
            inner.width as usize,
            Span::styled(
                title,
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(status_text, Style::default().fg(status_color)),
        );
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn render_receipt(&mut self, frame: &mut Frame, area: Rect) {
        let theme = self.theme.clone();
        let focus = self.editor.focus();
        let data = self.editor.receipt();

        let paper = match data.kind {
            TransactionType::Sell => theme.paper_sell,
            TransactionType::Buy => theme.paper_buy,
        };
        let base = Style::default().bg(paper).fg(theme.ink);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" RECEIPT ")
            .style(base);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let width = inner.width as usize;
        if width < 20 || inner.height == 0 {
            return;
        }

        let dim = Style::default().add_modifier(Modifier::DIM);
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let selected = Style::default()
            .bg(theme.selection_bg)
            .fg(theme.selection_fg)
            .add_modifier(Modifier::BOLD);
        let (curr_w, amount_w, rate_w, total_w) = receipt_pane_columns(width);
        let x_amount = inner.x + (curr_w + 1) as u16;
        let x_rate = x_amount + (amount_w + 1) as u16;

        let mut hits: Vec<(Rect, HitTarget)> = Vec::new();
        let mut lines: Vec<Line> = Vec::new();

        let kind_box = format!("[ {} ]", data.kind.label());
        lines.push(padded_pair(
            width,
            Span::styled(clip(&data.company.name, width.saturating_sub(10)), bold),
            Span::styled(kind_box.clone(), bold),
        ));
        hits.push((
            Rect::new(
                inner.x + width.saturating_sub(kind_box.chars().count()) as u16,
                inner.y,
                kind_box.chars().count() as u16,
                1,
            ),
            HitTarget::Action(ActionButton::Kind),
        ));
        lines.push(Line::from(Span::styled(
            clip(&data.company.tagline, width),
            dim,
        )));
        lines.push(Line::from(Span::styled(
            clip(&format!("Head Office : {}", data.company.address), width),
            dim,
        )));
        lines.push(Line::from(""));
        lines.push(padded_pair(
            width,
            Span::raw(clip(
                &format!("NAME    : {}", data.customer_name),
                width.saturating_sub(15),
            )),
            Span::styled(format!("Date: {}", data.date), dim),
        ));
        lines.push(Line::from(Span::raw(clip(
            &format!("ADDRESS : {}", data.customer_address),
            width,
        ))));
        hits.push((
            Rect::new(inner.x, inner.y + 4, inner.width, 2),
            HitTarget::Action(ActionButton::Details),
        ));
        lines.push(Line::from(Span::styled("─".repeat(width), dim)));

        let header = format!(
            "{:^curr_w$} {:>amount_w$} {:>rate_w$} {:>total_w$}",
            "CURR", "AMOUNT", "RATE", "TOTAL Rp."
        );
        lines.push(Line::from(Span::styled(header, bold)));

        let table_top = inner.y + 8;
        for (row, item) in data.items.iter().enumerate() {
            let cell_style = |field: ReceiptField| {
                if focus == Some(Focus::Receipt(ReceiptFocus { row, field })) {
                    selected
                } else {
                    Style::default()
                }
            };
            let total = item
                .total()
                .filter(|value| *value > 0.0)
                .map(format::format_total)
                .unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:^curr_w$}", clip(&item.currency, curr_w)),
                    cell_style(ReceiptField::Currency),
                ),
                Span::raw(" "),
                Span::styled(
                    format!(
                        "{:>amount_w$}",
                        clip(&format::format_amount(&item.amount), amount_w)
                    ),
                    cell_style(ReceiptField::Amount),
                ),
                Span::raw(" "),
                Span::styled(
                    format!(
                        "{:>rate_w$}",
                        clip(&format::format_amount(&item.rate), rate_w)
                    ),
                    cell_style(ReceiptField::Rate),
                ),
                Span::raw(" "),
                Span::raw(format!("{:>total_w$}", clip(&total, total_w))),
            ]));

            let y = table_top + row as u16;
            if y < inner.y + inner.height {
                hits.push((
                    Rect::new(inner.x, y, curr_w as u16, 1),
                    HitTarget::ReceiptCell {
                        row,
                        field: ReceiptField::Currency,
                    },
                ));
                hits.push((
                    Rect::new(x_amount, y, amount_w as u16, 1),
                    HitTarget::ReceiptCell {
                        row,
                        field: ReceiptField::Amount,
                    },
                ));
                hits.push((
                    Rect::new(x_rate, y, rate_w as u16, 1),
                    HitTarget::ReceiptCell {
                        row,
                        field: ReceiptField::Rate,
                    },
                ));
            }
        }

        lines.push(Line::from(Span::styled("─".repeat(width), dim)));
        lines.push(padded_pair(
            width,
            Span::styled("GRAND TOTAL", bold),
            Span::styled(
                format!("Rp. {}", format::format_total(data.grand_total())),
                bold,
            ),
        ));

        frame.render_widget(Paragraph::new(lines).style(base), inner);
        self.hits.extend(hits);
    }

    fn render_calculator(&mut self, frame: &mut Frame, area: Rect) {
        let theme = self.theme.clone();
        let focus = self.editor.focus();
        let note = self.editor.note();

        let base = Style::default().bg(theme.slate).fg(theme.slate_fg);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" CALCULATOR ")
            .style(base);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let width = inner.width as usize;
        if width < 24 || inner.height == 0 {
            return;
        }

        let dim = Style::default().add_modifier(Modifier::DIM);
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let selected = Style::default()
            .bg(theme.selection_bg)
            .fg(theme.selection_fg)
            .add_modifier(Modifier::BOLD);
        let label_w = 8usize;
        let result_w = 12usize;
        let formula_w = width.saturating_sub(label_w + result_w + 2);

        let mut hits: Vec<(Rect, HitTarget)> = Vec::new();
        let mut lines: Vec<Line> = Vec::new();

        let title_focused = focus == Some(Focus::Calculator(CalcFocus::Title));
        let title_span = if note.title.is_empty() {
            Span::styled("NOTE TITLE", if title_focused { selected } else { dim })
        } else {
            Span::styled(
                clip(&note.title, width.saturating_sub(6)),
                if title_focused { selected } else { bold },
            )
        };
        lines.push(padded_pair(width, title_span, Span::styled("TOTAL", bold)));
        hits.push((
            Rect::new(inner.x, inner.y, inner.width, 1),
            HitTarget::CalcCell(CalcFocus::Title),
        ));
        lines.push(Line::from(Span::styled("─".repeat(width), dim)));

        let rows_top = inner.y + 2;
        let mut grand = 0.0;
        for (row, item) in note.items.iter().enumerate() {
            let label_focused = focus
                == Some(Focus::Calculator(CalcFocus::Cell {
                    row,
                    field: CalcField::Label,
                }));
            let formula_focused = focus
                == Some(Focus::Calculator(CalcFocus::Cell {
                    row,
                    field: CalcField::Formula,
                }));

            let mut spans = vec![
                Span::styled(
                    format!("{:<label_w$}", clip(&item.label, label_w)),
                    if label_focused {
                        selected
                    } else {
                        Style::default()
                    },
                ),
                Span::raw(" "),
            ];

            let mut used = 0usize;
            if formula_focused {
                let text = format!("{:<formula_w$}", clip(&item.formula, formula_w));
                used = formula_w;
                spans.push(Span::styled(text, selected));
            } else if item.formula.is_empty() {
                spans.push(Span::styled("---", dim));
                used = 3;
            } else {
                for segment in formula::segments(&item.formula) {
                    let text = match &segment {
                        Segment::Operand(operand) => format::format_operand(operand),
                        Segment::Operator(op) => format!(" {op} "),
                    };
                    let count = text.chars().count();
                    if used + count > formula_w {
                        break;
                    }
                    used += count;
                    let style = match segment {
                        Segment::Operand(_) => Style::default().fg(theme.accent),
                        Segment::Operator(_) => Style::default()
                            .fg(theme.warning)
                            .add_modifier(Modifier::BOLD),
                    };
                    spans.push(Span::styled(text, style));
                }
            }
            spans.push(Span::raw(" ".repeat(formula_w.saturating_sub(used) + 1)));

            if item.formula.is_empty() {
                spans.push(Span::raw(format!("{:>result_w$}", "")));
            } else {
                let value = formula::row_value(&item.formula);
                grand += value;
                let (text, style) = if value < 0.0 {
                    (
                        format!("- {}", format::format_integer(value.abs())),
                        Style::default().fg(theme.danger),
                    )
                } else {
                    (format::format_integer(value), Style::default())
                };
                spans.push(Span::styled(
                    format!("{:>result_w$}", clip(&text, result_w)),
                    style,
                ));
            }
            lines.push(Line::from(spans));

            let y = rows_top + row as u16;
            if y < inner.y + inner.height {
                hits.push((
                    Rect::new(inner.x, y, label_w as u16, 1),
                    HitTarget::CalcCell(CalcFocus::Cell {
                        row,
                        field: CalcField::Label,
                    }),
                ));
                hits.push((
                    Rect::new(
                        inner.x + (label_w + 1) as u16,
                        y,
                        inner.width.saturating_sub((label_w + 1) as u16),
                        1,
                    ),
                    HitTarget::CalcCell(CalcFocus::Cell {
                        row,
                        field: CalcField::Formula,
                    }),
                ));
            }
        }

        lines.push(Line::from(Span::styled("─".repeat(width), dim)));
        let grand_span = if grand < 0.0 {
            Span::styled(
                format!("- {}", format::format_integer(grand.abs())),
                Style::default()
                    .fg(theme.danger)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(
                format::format_integer(grand),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        };
        lines.push(padded_pair(
            width,
            Span::styled("GRAND TOTAL", bold),
            grand_span,
        ));

        frame.render_widget(Paragraph::new(lines).style(base), inner);
        self.hits.extend(hits);
    }

    fn render_keypad(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Keypad");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3); 8])
            .split(inner);

        for (r, grid_row) in KEYPAD_GRID.iter().enumerate() {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 5); 5])
                .split(rows[r]);
            for (c, key) in grid_row.iter().enumerate() {
                let style = match key {
                    Key::Backspace | Key::Enter => Style::default().fg(self.theme.accent),
                    Key::Op(_) => Style::default().fg(self.theme.warning),
                    _ => Style::default().fg(self.theme.primary_fg),
                };
                self.render_button(frame, cols[c], key.label(), style, HitTarget::Keypad(*key));
            }
        }

        let mode_label = match self.editor.mode() {
            ViewMode::Receipt => "CALC",
            ViewMode::Calculator => "RECEIPT",
        };
        let dim = Style::default().fg(self.theme.muted);
        let plain = Style::default().fg(self.theme.primary_fg);
        let actions: [[(&str, Style, ActionButton); 2]; 4] = [
            [
                (
                    "CLEAR",
                    Style::default().fg(self.theme.danger),
                    ActionButton::Clear,
                ),
                (
                    mode_label,
                    Style::default().fg(self.theme.warning),
                    ActionButton::ToggleMode,
                ),
            ],
            [
                (
                    "UNDO",
                    if self.editor.can_undo() { plain } else { dim },
                    ActionButton::Undo,
                ),
                (
                    "REDO",
                    if self.editor.can_redo() { plain } else { dim },
                    ActionButton::Redo,
                ),
            ],
            [
                ("SELL/BUY", plain, ActionButton::Kind),
                ("CLIENT", plain, ActionButton::Details),
            ],
            [
                ("RATES", plain, ActionButton::Rates),
                (
                    "SHARE",
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                    ActionButton::Share,
                ),
            ],
        ];
        for (r, pair) in actions.iter().enumerate() {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 2); 2])
                .split(rows[4 + r]);
            for (c, (label, style, button)) in pair.iter().enumerate() {
                self.render_button(frame, cols[c], label, *style, HitTarget::Action(*button));
            }
        }
    }

    fn render_button(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        label: &str,
        style: Style,
        target: HitTarget,
    ) {
        let button = Paragraph::new(label)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .style(style);
        frame.render_widget(button, area);
        self.hits.push((area, target));
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = match &self.message {
            Some(notice) => Line::from(Span::styled(
                notice.text.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            None => Line::from(format!(
                "{} · {}",
                self.editor.mode().label(),
                self.focus_text()
            )),
        };
        let hints = Line::from(Span::styled(
            "Tab move  Enter advance  ^T mode  ^Z undo  ^R redo  ^N clear  ^B sell/buy  \
             ^D client  ^S share  ^G rates  ^Q quit",
            Style::default().fg(self.theme.muted),
        ));
        let paragraph = Paragraph::new(vec![primary, hints])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn focus_text(&self) -> String {
        match self.editor.focus() {
            Some(Focus::Receipt(focus)) => {
                let field = match focus.field {
                    ReceiptField::Currency => "currency",
                    ReceiptField::Amount => "amount",
                    ReceiptField::Rate => "rate",
                };
                format!("row {} · {field}", focus.row + 1)
            }
            Some(Focus::Calculator(CalcFocus::Title)) => "title".to_string(),
            Some(Focus::Calculator(CalcFocus::Cell { row, field })) => {
                let field = match field {
                    CalcField::Label => "label",
                    CalcField::Formula => "formula",
                };
                format!("row {} · {field}", row + 1)
            }
            None => "suspended".to_string(),
        }
    }

    fn render_rates_overlay(&self, frame: &mut Frame, area: Rect) {
        let rect = centered_rect(46, 18, area);
        frame.render_widget(Clear, rect);

        let mut lines: Vec<Line> = Vec::new();
        if self.rates_fetching {
            lines.push(Line::from("Fetching latest rates…"));
        } else if let Some(sheet) = self.rates.latest() {
            for quote in &sheet.quotes {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{:<5}", quote.currency),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("{:>14}", format::format_integer(quote.rate))),
                ]));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!(
                    "fetched {}",
                    sheet.fetched_at.with_timezone(&Local).format("%H:%M")
                ),
                Style::default().fg(self.theme.muted),
            )));
            for source in sheet.sources.iter().take(3) {
                let label = source
                    .title
                    .clone()
                    .or_else(|| source.uri.clone())
                    .unwrap_or_default();
                if !label.is_empty() {
                    lines.push(Line::from(Span::styled(
                        clip(&label, rect.width.saturating_sub(4) as usize),
                        Style::default().fg(self.theme.muted),
                    )));
                }
            }
        } else {
            lines.push(Line::from("No rates loaded yet."));
            lines.push(Line::from("Press Ctrl+G to fetch."));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Esc closes",
            Style::default().fg(self.theme.muted),
        )));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Exchange Rates (IDR)"),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, rect);
    }

    fn render_details_modal(&self, frame: &mut Frame, modal: &DetailsModal) {
        let frame_area = frame.size();
        let width = 60.min(frame_area.width.saturating_sub(4)).max(30);
        let height = 8.min(frame_area.height.saturating_sub(2)).max(6);
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let marker = |field: DetailsField| {
            if modal.field == field {
                Span::styled("▶ ", Style::default().fg(self.theme.accent))
            } else {
                Span::raw("  ")
            }
        };
        let name_line = Line::from(vec![
            marker(DetailsField::Name),
            Span::raw(format!("NAME    : {}", modal.name)),
        ]);
        let address_line = Line::from(vec![
            marker(DetailsField::Address),
            Span::raw(format!("ADDRESS : {}", modal.address)),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" save  "),
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" field  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]);

        let paragraph = Paragraph::new(vec![
            Line::from("Customer block printed on the receipt"),
            name_line,
            address_line,
            Line::from(""),
            helper,
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Customer Details"),
        )
        .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);

        let row_offset = match modal.field {
            DetailsField::Name => 2,
            DetailsField::Address => 3,
        };
        let cursor_x =
            (area.x + 13 + modal.cursor as u16).min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(cursor_x, area.y + row_offset);
    }

    fn render_sharing_overlay(&self, frame: &mut Frame, area: Rect) {
        let rect = centered_rect(30, 5, area);
        frame.render_widget(Clear, rect);
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                "PROCESSING",
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Capturing card…",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Share"));
        frame.render_widget(paragraph, rect);
    }
}

fn receipt_pane_columns(width: usize) -> (usize, usize, usize, usize) {
    let width = width.max(28);
    let pool = width - 5 - 3;
    let amount = pool * 3 / 10;
    (5, amount, amount, pool - amount - amount)
}

fn keypad_key_for(key: &KeyEvent) -> Option<Key> {
    if !(key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT) {
        return None;
    }
    match key.code {
        KeyCode::Char(ch) => match ch {
            '0'..='9' => Some(Key::Digit(ch as u8 - b'0')),
            '.' => Some(Key::Decimal),
            '+' | '-' | '*' | '/' => Operator::from_char(ch).map(Key::Op),
            ')' => Some(Key::DoubleZero),
            ch if ch.is_ascii_alphabetic() || ch == ' ' => Some(Key::Char(ch)),
            _ => None,
        },
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Tab | KeyCode::Right => Some(Key::Next),
        KeyCode::BackTab | KeyCode::Left => Some(Key::Prev),
        _ => None,
    }
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        text.chars().take(width).collect()
    }
}

fn padded_pair<'a>(width: usize, left: Span<'a>, right: Span<'a>) -> Line<'a> {
    let used = left.content.chars().count() + right.content.chars().count();
    let pad = width.saturating_sub(used);
    Line::from(vec![left, Span::raw(" ".repeat(pad)), right])
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
