use std::{
    io::{self, BufRead, IsTerminal},
    time::Duration,
};

use colored::Colorize;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{
    sync::{mpsc, oneshot},
    task::AbortHandle,
};

use crate::{
    error::AuthError,
    input::widget::{
        InputHost, InputWidget, WidgetButton, WidgetContent, WidgetEvent, WidgetKind, WidgetView,
    },
    warning,
};

const BACK_COMMAND: &str = "<";
const CANCEL_COMMAND: &str = ":q";

/// One line wanted by a widget. `masked` lines are read with echo off.
struct LineRequest {
    masked: bool,
    reply: oneshot::Sender<Option<String>>,
}

/// Presents prompts on the terminal and reads answers line by line from stdin.
pub struct TerminalHost {
    requests: mpsc::UnboundedSender<LineRequest>,
}

impl TerminalHost {
    /// Fails when stdin is not interactive.
    pub fn new() -> Result<Self, AuthError> {
        if !io::stdin().is_terminal() {
            return Err(AuthError::Ui("stdin is not a terminal".to_string()));
        }

        // blocking stdin reads stay on a plain thread, off the runtime's blocking pool
        let (requests, receiver) = mpsc::unbounded_channel();
        std::thread::spawn(move || serve_line_requests(receiver));

        Ok(Self { requests })
    }
}

/// Answers line requests in order until the host is gone or stdin closes.
///
/// A line read for a widget that went away meanwhile is handed to the next
/// request instead of being lost.
fn serve_line_requests(mut requests: mpsc::UnboundedReceiver<LineRequest>) {
    let mut carried: Option<String> = None;

    while let Some(request) = requests.blocking_recv() {
        if request.reply.is_closed() {
            continue;
        }

        let line = match carried.take() {
            Some(line) => Some(line),
            None => {
                let read = if request.masked {
                    read_masked_line()
                } else {
                    read_plain_line()
                };
                match read {
                    Ok(line) => line,
                    Err(e) => {
                        warning!("Cannot read from terminal: {}", e);
                        None
                    }
                }
            }
        };

        let closed = line.is_none();
        if let Err(Some(line)) = request.reply.send(line) {
            carried = Some(line);
        }
        if closed {
            break;
        }
    }
}

fn read_plain_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Reads a line without echoing it, so pasted secrets stay out of scrollback.
fn read_masked_line() -> io::Result<Option<String>> {
    terminal::enable_raw_mode()?;
    let line = read_keys();
    terminal::disable_raw_mode()?;
    println!();
    line
}

fn read_keys() -> io::Result<Option<String>> {
    let mut line = String::new();
    loop {
        match event::read()? {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Enter => return Ok(Some(line)),
                // raw mode swallows SIGINT
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(Some(CANCEL_COMMAND.to_string()));
                }
                KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
                    if line.is_empty() {
                        return Ok(None);
                    }
                }
                KeyCode::Esc => return Ok(Some(CANCEL_COMMAND.to_string())),
                KeyCode::Backspace => {
                    line.pop();
                }
                KeyCode::Char(c) => line.push(c),
                _ => {}
            },
            Event::Paste(text) => line.push_str(&text),
            _ => {}
        }
    }
}

impl InputHost for TerminalHost {
    fn create_widget(&self, kind: WidgetKind) -> Result<Box<dyn InputWidget>, AuthError> {
        Ok(Box::new(TerminalWidget {
            kind,
            requests: self.requests.clone(),
            view: None,
            sender: None,
            reader: None,
            spinner: None,
            shown: false,
            enabled: true,
        }))
    }
}

struct TerminalWidget {
    kind: WidgetKind,
    requests: mpsc::UnboundedSender<LineRequest>,
    view: Option<WidgetView>,
    sender: Option<mpsc::UnboundedSender<WidgetEvent>>,
    reader: Option<AbortHandle>,
    spinner: Option<ProgressBar>,
    shown: bool,
    enabled: bool,
}

impl TerminalWidget {
    fn render(&self) {
        let Some(view) = &self.view else {
            return;
        };

        let position = if view.total_steps > 1 {
            format!(" ({}/{})", view.step, view.total_steps)
        } else {
            String::new()
        };
        println!("\n{}{}", view.title.bold(), position.dimmed());

        match &view.content {
            WidgetContent::QuickPick { items, active } => {
                for (index, item) in items.iter().enumerate() {
                    let marker = if Some(index) == *active { ">" } else { " " };
                    println!(" {} {} {}", marker, format!("{}.", index + 1).blue(), item);
                }
            }
            WidgetContent::InputBox {
                prompt, password, ..
            } => {
                if !prompt.is_empty() {
                    println!("{}", prompt);
                }
                if *password {
                    println!("{}", "(input is hidden)".dimmed());
                }
            }
        }

        if let Some(placeholder) = &view.placeholder {
            println!("{}", placeholder.dimmed());
        }

        let mut hints = Vec::new();
        for button in &view.buttons {
            match button {
                WidgetButton::Back => hints.push(format!("'{}' back", BACK_COMMAND)),
                WidgetButton::Custom(button) => {
                    hints.push(format!("'!{}' {}", button.id, button.tooltip))
                }
            }
        }
        hints.push(format!("'{}' cancel", CANCEL_COMMAND));
        println!("{}", hints.join(", ").dimmed());
    }

    fn start_reader(&mut self) {
        let (Some(sender), Some(view)) = (self.sender.clone(), self.view.clone()) else {
            return;
        };
        let requests = self.requests.clone();
        let kind = self.kind;
        let masked = is_masked(&view);

        let reader = tokio::spawn(async move {
            loop {
                let (reply, answer) = oneshot::channel();
                if requests.send(LineRequest { masked, reply }).is_err() {
                    let _ = sender.send(WidgetEvent::Hide);
                    return;
                }
                let events = match answer.await {
                    Ok(Some(line)) => translate_line(kind, &view, line.trim()),
                    _ => vec![WidgetEvent::Hide],
                };
                for event in events {
                    if sender.send(event).is_err() {
                        return;
                    }
                }
            }
        });
        self.reader = Some(reader.abort_handle());
    }

    fn stop_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

fn is_masked(view: &WidgetView) -> bool {
    matches!(view.content, WidgetContent::InputBox { password: true, .. })
}

fn translate_line(kind: WidgetKind, view: &WidgetView, line: &str) -> Vec<WidgetEvent> {
    if line == CANCEL_COMMAND {
        return vec![WidgetEvent::Hide];
    }
    if line == BACK_COMMAND && view.buttons.contains(&WidgetButton::Back) {
        return vec![WidgetEvent::Back];
    }
    if let Some(id) = line.strip_prefix('!') {
        let known = view
            .buttons
            .iter()
            .any(|button| matches!(button, WidgetButton::Custom(b) if b.id == id));
        if known {
            return vec![WidgetEvent::Button(id.to_string())];
        }
    }

    match (kind, &view.content) {
        (WidgetKind::QuickPick, WidgetContent::QuickPick { items, active }) => {
            let picked = match line.parse::<usize>() {
                Ok(number) if (1..=items.len()).contains(&number) => Some(number - 1),
                Err(_) if line.is_empty() => *active,
                _ => None,
            };
            match picked {
                Some(index) => vec![WidgetEvent::Select(index)],
                None => {
                    warning!("Pick a number between 1 and {}", items.len());
                    Vec::new()
                }
            }
        }
        _ => vec![
            WidgetEvent::ValueChanged(line.to_string()),
            WidgetEvent::Accept,
        ],
    }
}

impl InputWidget for TerminalWidget {
    fn update(&mut self, view: &WidgetView) {
        self.view = Some(view.clone());
    }

    fn set_validation_message(&mut self, message: Option<&str>) {
        if let (true, Some(message)) = (self.shown, message) {
            warning!("{}", message);
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.stop_reader();
        } else if self.shown {
            self.start_reader();
        }
    }

    fn set_busy(&mut self, busy: bool) {
        match (busy, self.spinner.take()) {
            (true, None) => {
                let spinner = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
                    spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
                }
                spinner.set_message("Working...");
                spinner.enable_steady_tick(Duration::from_millis(100));
                self.spinner = Some(spinner);
            }
            (true, Some(spinner)) => self.spinner = Some(spinner),
            (false, Some(spinner)) => spinner.finish_and_clear(),
            (false, None) => {}
        }
    }

    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<WidgetEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.sender = Some(sender);
        if self.shown && self.enabled {
            self.stop_reader();
            self.start_reader();
        }
        receiver
    }

    fn show(&mut self) {
        self.render();
        self.shown = true;
        if self.enabled {
            self.start_reader();
        }
    }

    fn dispose(&mut self) {
        self.stop_reader();
        self.set_busy(false);
        self.sender = None;
        self.shown = false;
    }
}

impl Drop for TerminalWidget {
    fn drop(&mut self) {
        self.dispose();
    }
}
