//! Lexora CLI - terminal client for legal chat and research.
//!
//! This is the entry point for the `lexora` binary.

mod app;
mod command;
mod ui;
mod view;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use lexora_client::config::API_URL_ENV;
use lexora_client::{ClientConfig, SessionClient};
use lexora_core::{ConversationKind, SessionId};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use app::{App, AppEvent, Screen};

/// Conversation mode on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Question and answer consultation.
    Chat,
    /// Source-backed research.
    Research,
}

impl From<Mode> for ConversationKind {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Chat => Self::Chat,
            Mode::Research => Self::Research,
        }
    }
}

/// Lexora CLI - terminal client for legal chat and research.
#[derive(Parser, Debug)]
#[command(name = "lexora")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the versioned API.
    #[arg(long, env = API_URL_ENV, default_value = ClientConfig::DEFAULT_BASE_URL)]
    api_url: String,

    /// Conversation mode.
    #[arg(long, value_enum, default_value = "chat")]
    mode: Mode,

    /// Reopen an existing session instead of starting a new one.
    #[arg(long, value_name = "SESSION_ID")]
    resume: Option<SessionId>,

    /// Directory artifacts are exported to.
    #[arg(long, env = "LEXORA_EXPORT_DIR", default_value = ".")]
    export_dir: PathBuf,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // The terminal owns stdout, so logs go to stderr.
    if args.debug {
        tracing_subscriber::fmt()
            .with_env_filter("lexora_cli=debug,lexora_session=debug,lexora_client=debug,lexora_render=debug,warn")
            .with_writer(std::io::stderr)
            .init();
    }

    let client = SessionClient::from_config(&ClientConfig::new(args.api_url));
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    let mut app = App::new(client, args.mode.into(), args.export_dir, event_tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if let Some(session_id) = args.resume {
        app.resume(args.mode.into(), session_id);
    }

    let result = run_event_loop(&mut terminal, &mut app, event_rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

/// Main event loop. Background results trigger an immediate redraw.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> anyhow::Result<()> {
    loop {
        app.tick_animation();
        terminal.draw(|f| ui::render(f, app))?;

        let tick_rate = if app.is_blocked() {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(100)
        };

        tokio::select! {
            () = tokio::time::sleep(tick_rate) => {
                while event::poll(Duration::from_millis(0)).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        handle_input(app, evt);
                    }
                }
            }

            Some(event) = event_rx.recv() => {
                if app.handle_event(event) {
                    terminal.draw(|f| ui::render(f, app))?;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle input events.
fn handle_input(app: &mut App, event: Event) {
    match event {
        Event::Key(key) => {
            if key.kind != KeyEventKind::Press {
                return;
            }
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                app.should_quit = true;
                return;
            }
            match app.screen {
                Screen::Home => handle_home(app, key),
                Screen::Conversation if app.is_approval_open() => handle_approval(app, key.code),
                Screen::Conversation => handle_conversation(app, key),
            }
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => app.scroll_chat_up(3),
            MouseEventKind::ScrollDown => app.scroll_chat_down(3),
            _ => {}
        },
        _ => {}
    }
}

/// Handle keys on the start screen.
fn handle_home(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc if app.busy().is_some() => app.cancel_pending(),
        KeyCode::Esc => app.should_quit = true,
        _ if app.busy().is_some() => {}
        KeyCode::Tab | KeyCode::BackTab => app.toggle_mode(),
        KeyCode::Enter => app.start_conversation(),
        _ => handle_editing(app, key),
    }
}

/// Handle keys on the conversation screen.
fn handle_conversation(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::PageUp => app.scroll_chat_up(10),
        KeyCode::PageDown => app.scroll_chat_down(10),
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.expand_artifacts = !app.expand_artifacts;
        }
        // Leaving while a call is outstanding drops its result.
        KeyCode::Esc if app.is_blocked() => app.go_home(),
        KeyCode::Esc => app.clear_error(),
        _ if app.is_blocked() => {}
        KeyCode::Tab => app.approval_hidden = false,
        KeyCode::Enter => app.submit(),
        _ => handle_editing(app, key),
    }
}

/// Handle keys while the source approval overlay is open.
fn handle_approval(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => app.approval_focus_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.approval_focus_next(),
        KeyCode::Char(' ') => app.approval_toggle(),
        KeyCode::Char('a') => app.approval_select_all(),
        KeyCode::Char('n') => app.approval_select_none(),
        KeyCode::Char('s') => app.approval_skip(),
        KeyCode::Enter => app.approval_confirm(),
        KeyCode::Esc => app.approval_hidden = true,
        _ => {}
    }
}

/// Line editing shared by both screens.
fn handle_editing(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('a') if ctrl => app.move_cursor_start(),
        KeyCode::Char('e') if ctrl => app.move_cursor_end(),
        KeyCode::Char('u') if ctrl => app.clear_input(),
        KeyCode::Char('w') if ctrl => app.delete_word(),
        KeyCode::Char(c) if !ctrl => app.insert_char(c),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Delete => app.delete_char_forward(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Home => app.move_cursor_start(),
        KeyCode::End => app.move_cursor_end(),
        _ => {}
    }
}
