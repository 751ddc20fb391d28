//! Application state.
//!
//! The app owns at most one conversation controller at a time. Every backend
//! call runs on a background task so the UI keeps drawing and reading keys
//! while it is outstanding; results come back through a channel tagged with
//! the epoch that issued them. Opening, leaving, or cancelling bumps the
//! epoch, so late results are dropped.

use std::future::Future;
use std::io;
use std::path::PathBuf;

use arboard::Clipboard;
use lexora_client::{ClientError, ConversationResponse, HealthResponse, SessionClient};
use lexora_core::{ConversationKind, InterruptKind, Message, SessionId};
use lexora_render::{render_message, Artifact, RenderedMessage};
use lexora_session::{
    ChatController, ResearchController, SourceApproval, TurnRequest, TurnState,
};
use tokio::sync::mpsc;

use crate::command::{Command, HELP};

/// Which screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Mode toggle and initial question.
    #[default]
    Home,
    /// Message list, input line and approval overlay.
    Conversation,
}

/// The active conversation.
#[derive(Debug)]
pub enum Controller {
    /// Question and answer.
    Chat(ChatController),
    /// Research with interrupts.
    Research(ResearchController),
}

impl Controller {
    fn new(kind: ConversationKind, session_id: SessionId) -> Self {
        match kind {
            ConversationKind::Chat => Self::Chat(ChatController::new(session_id)),
            ConversationKind::Research => Self::Research(ResearchController::new(session_id)),
        }
    }

    fn resume(kind: ConversationKind, session_id: SessionId, history: Vec<Message>) -> Self {
        match kind {
            ConversationKind::Chat => Self::Chat(ChatController::resume(session_id, history)),
            ConversationKind::Research => {
                Self::Research(ResearchController::resume(session_id, history))
            }
        }
    }

    /// Service this conversation talks to.
    pub const fn kind(&self) -> ConversationKind {
        match self {
            Self::Chat(_) => ConversationKind::Chat,
            Self::Research(_) => ConversationKind::Research,
        }
    }

    /// Session token.
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Chat(c) => c.session_id(),
            Self::Research(r) => r.session_id(),
        }
    }

    /// History, oldest first.
    pub fn messages(&self) -> &[Message] {
        match self {
            Self::Chat(c) => c.messages(),
            Self::Research(r) => r.messages(),
        }
    }

    /// Current turn state.
    pub fn state(&self) -> TurnState {
        match self {
            Self::Chat(c) => c.state(),
            Self::Research(r) => r.state(),
        }
    }

    /// The research controller, if this is a research conversation.
    pub const fn research(&self) -> Option<&ResearchController> {
        match self {
            Self::Research(r) => Some(r),
            Self::Chat(_) => None,
        }
    }

    fn research_mut(&mut self) -> Option<&mut ResearchController> {
        match self {
            Self::Research(r) => Some(r),
            Self::Chat(_) => None,
        }
    }

    fn begin_turn(&mut self, input: &str) -> Option<TurnRequest> {
        match self {
            Self::Chat(c) => c.begin_turn(input),
            Self::Research(r) => r.begin_turn(input),
        }
    }

    fn finish_turn(&mut self, result: Result<ConversationResponse, ClientError>) -> bool {
        match self {
            Self::Chat(c) => c.finish_turn(result),
            Self::Research(r) => r.finish_turn(result),
        }
    }
}

/// What a background task produced.
#[derive(Debug)]
pub enum Outcome {
    /// A conversation turn finished.
    Turn(Result<ConversationResponse, ClientError>),
    /// A session was created for the question typed on the start screen.
    SessionCreated {
        kind: ConversationKind,
        question: String,
        result: Result<SessionId, ClientError>,
    },
    /// Stored history was fetched, either to resume or to reload.
    HistoryLoaded {
        kind: ConversationKind,
        session_id: SessionId,
        reload: bool,
        result: Result<Vec<Message>, ClientError>,
    },
    /// Stored history was cleared.
    HistoryCleared {
        kind: ConversationKind,
        session_id: SessionId,
        result: Result<(), ClientError>,
    },
    /// A health check finished.
    Health {
        kind: ConversationKind,
        result: Result<HealthResponse, ClientError>,
    },
}

/// Result of a background task, tagged with the epoch that issued it.
#[derive(Debug)]
pub struct AppEvent {
    /// Epoch at the time the task was spawned.
    pub epoch: u64,
    /// What the task produced.
    pub outcome: Outcome,
}

/// Application state.
pub struct App {
    client: SessionClient,
    event_tx: mpsc::Sender<AppEvent>,
    export_dir: PathBuf,
    clipboard: Option<Clipboard>,
    /// Mode selected on the start screen.
    pub mode: ConversationKind,
    /// Current screen.
    pub screen: Screen,
    controller: Option<Controller>,
    epoch: u64,
    busy: Option<String>,
    /// Current input buffer.
    pub input: String,
    /// Cursor position in input, in characters.
    pub cursor_position: usize,
    /// Lines scrolled up from the bottom of the message list.
    pub chat_scroll: usize,
    /// Status message to display.
    pub status_message: Option<String>,
    /// Error message to display.
    pub error_message: Option<String>,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Animation frame counter for the busy indicator.
    pub animation_frame: usize,
    /// Show long artifacts in full.
    pub expand_artifacts: bool,
    /// Whether the user dismissed the approval overlay.
    pub approval_hidden: bool,
}

impl App {
    /// Create a new application.
    pub fn new(
        client: SessionClient,
        mode: ConversationKind,
        export_dir: PathBuf,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            client,
            event_tx,
            export_dir,
            clipboard: None,
            mode,
            screen: Screen::Home,
            controller: None,
            epoch: 0,
            busy: None,
            input: String::new(),
            cursor_position: 0,
            chat_scroll: 0,
            status_message: None,
            error_message: None,
            should_quit: false,
            animation_frame: 0,
            expand_artifacts: false,
            approval_hidden: false,
        }
    }

    /// Tick the animation frame (call on each render).
    pub fn tick_animation(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }

    /// Get current spinner character for the busy indicator.
    pub fn spinner_char(&self) -> &'static str {
        const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER[self.animation_frame % SPINNER.len()]
    }

    /// API base URL for display.
    pub fn api_url(&self) -> &str {
        self.client.base_url()
    }

    /// Set the status message (also clears any error).
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.error_message = None;
    }

    /// Set the error message.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    /// Clear the error message.
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    // =========================================================================
    // Conversation State
    // =========================================================================

    /// The active conversation, if any.
    pub fn controller(&self) -> Option<&Controller> {
        self.controller.as_ref()
    }

    /// Whether a request is outstanding.
    pub fn is_awaiting_response(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(|c| c.state() == TurnState::AwaitingResponse)
    }

    /// Label of the session, history or health call in progress.
    pub fn busy(&self) -> Option<&str> {
        self.busy.as_deref()
    }

    /// Whether keys other than navigation should be ignored.
    pub fn is_blocked(&self) -> bool {
        self.busy.is_some() || self.is_awaiting_response()
    }

    /// Pending source approval prompt.
    pub fn approval(&self) -> Option<&SourceApproval> {
        self.controller.as_ref()?.research()?.approval()
    }

    fn approval_mut(&mut self) -> Option<&mut SourceApproval> {
        self.controller.as_mut()?.research_mut()?.approval_mut()
    }

    /// Whether the approval overlay should be drawn and receive keys.
    pub fn is_approval_open(&self) -> bool {
        !self.approval_hidden && self.approval().is_some()
    }

    fn open(&mut self, controller: Controller) {
        self.epoch += 1;
        tracing::debug!(
            epoch = self.epoch,
            kind = ?controller.kind(),
            session_id = %controller.session_id(),
            "Opening conversation"
        );
        self.controller = Some(controller);
        self.busy = None;
        self.screen = Screen::Conversation;
        self.chat_scroll = 0;
        self.approval_hidden = false;
    }

    /// Drop the conversation and return to the start screen.
    pub fn go_home(&mut self) {
        self.epoch += 1;
        self.busy = None;
        if let Some(controller) = self.controller.take() {
            self.mode = controller.kind();
        }
        self.screen = Screen::Home;
        self.clear_input();
        self.set_status("Conversation closed");
    }

    /// Abandon the call in progress on the start screen.
    pub fn cancel_pending(&mut self) {
        if self.busy.take().is_some() {
            self.epoch += 1;
            self.set_status("Cancelled");
        }
    }

    /// Toggle the start screen mode.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggle();
    }

    // =========================================================================
    // Chat Scrolling
    // =========================================================================

    /// Scroll chat up (view older messages).
    pub fn scroll_chat_up(&mut self, amount: usize) {
        self.chat_scroll = self.chat_scroll.saturating_add(amount);
    }

    /// Scroll chat down (view newer messages).
    pub fn scroll_chat_down(&mut self, amount: usize) {
        self.chat_scroll = self.chat_scroll.saturating_sub(amount);
    }

    // =========================================================================
    // Input Handling
    // =========================================================================

    fn byte_index(&self, position: usize) -> usize {
        self.input
            .char_indices()
            .nth(position)
            .map_or(self.input.len(), |(i, _)| i)
    }

    fn input_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, c: char) {
        let index = self.byte_index(self.cursor_position);
        self.input.insert(index, c);
        self.cursor_position += 1;
    }

    /// Delete the character before the cursor.
    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = self.byte_index(self.cursor_position);
            self.input.remove(index);
        }
    }

    /// Delete the character at the cursor.
    pub fn delete_char_forward(&mut self) {
        if self.cursor_position < self.input_len() {
            let index = self.byte_index(self.cursor_position);
            self.input.remove(index);
        }
    }

    /// Delete the word before the cursor.
    pub fn delete_word(&mut self) {
        while self.cursor_position > 0 {
            self.delete_char();
            let prev = self
                .cursor_position
                .checked_sub(1)
                .and_then(|p| self.input.chars().nth(p));
            if prev == Some(' ') {
                break;
            }
        }
    }

    /// Move cursor left.
    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    /// Move cursor right.
    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input_len() {
            self.cursor_position += 1;
        }
    }

    /// Move cursor to the start.
    pub fn move_cursor_start(&mut self) {
        self.cursor_position = 0;
    }

    /// Move cursor to the end.
    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.input_len();
    }

    /// Clear the input.
    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Take the current input (clears it).
    pub fn take_input(&mut self) -> String {
        self.cursor_position = 0;
        std::mem::take(&mut self.input)
    }

    // =========================================================================
    // API Operations
    // =========================================================================

    /// Create a session in the selected mode and send the typed question.
    pub fn start_conversation(&mut self) {
        if self.busy.is_some() {
            return;
        }
        if self.input.trim().is_empty() {
            self.set_error("Type a question first");
            return;
        }

        let kind = self.mode;
        let question = self.take_input();
        let client = self.client.clone();
        self.begin_task(format!("Starting {kind} session"));
        self.spawn(async move {
            let result = client.create_session(kind).await;
            Outcome::SessionCreated {
                kind,
                question,
                result,
            }
        });
    }

    /// Open an existing session from its stored history.
    pub fn resume(&mut self, kind: ConversationKind, session_id: SessionId) {
        self.mode = kind;
        self.load_history(kind, session_id, false);
    }

    /// Handle Enter on the conversation screen.
    pub fn submit(&mut self) {
        if self.is_blocked() {
            return;
        }
        let input = self.take_input();
        match Command::parse(&input) {
            Some(command) => self.run_command(command),
            None => self.send_text(&input),
        }
    }

    fn send_text(&mut self, text: &str) {
        let request = self.controller.as_mut().and_then(|c| c.begin_turn(text));
        if let Some(request) = request {
            self.chat_scroll = 0;
            self.clear_error();
            self.status_message = None;
            self.dispatch(request);
        }
    }

    fn begin_task(&mut self, label: String) {
        tracing::debug!(epoch = self.epoch, task = %label, "Starting background task");
        self.busy = Some(label);
        self.status_message = None;
        self.clear_error();
    }

    /// Run `task` in the background and report its outcome with the current
    /// epoch.
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let outcome = task.await;
            if tx.send(AppEvent { epoch, outcome }).await.is_err() {
                tracing::debug!(epoch, "Task finished after shutdown");
            }
        });
    }

    fn dispatch(&self, request: TurnRequest) {
        let client = self.client.clone();
        self.spawn(async move { Outcome::Turn(request.dispatch(&client).await) });
    }

    /// Apply a finished background task. Returns `true` if the UI changed.
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        if event.epoch != self.epoch {
            tracing::debug!(
                epoch = event.epoch,
                current = self.epoch,
                "Discarding result for a closed conversation"
            );
            return false;
        }

        match event.outcome {
            Outcome::Turn(result) => return self.finish_turn(result),
            Outcome::SessionCreated {
                kind,
                question,
                result,
            } => self.session_created(kind, question, result),
            Outcome::HistoryLoaded {
                kind,
                session_id,
                reload,
                result,
            } => self.history_loaded(kind, session_id, reload, result),
            Outcome::HistoryCleared {
                kind,
                session_id,
                result,
            } => self.history_cleared(kind, session_id, result),
            Outcome::Health { kind, result } => self.health_checked(kind, result),
        }
        true
    }

    fn finish_turn(&mut self, result: Result<ConversationResponse, ClientError>) -> bool {
        let Some(controller) = self.controller.as_mut() else {
            return false;
        };
        let failed = result.is_err();
        if !controller.finish_turn(result) {
            return false;
        }

        let pending = controller
            .research()
            .and_then(ResearchController::interrupt)
            .map(|interrupt| interrupt.kind);

        self.chat_scroll = 0;
        self.approval_hidden = false;
        match pending {
            Some(InterruptKind::SourceApproval) => {
                self.set_status("Choose which sources the research may use");
            }
            Some(InterruptKind::ArtifactReview) => {
                self.set_status("Review the draft and reply with your feedback");
            }
            None if failed => self.set_error("Request failed"),
            None => self.status_message = None,
        }
        true
    }

    fn session_created(
        &mut self,
        kind: ConversationKind,
        question: String,
        result: Result<SessionId, ClientError>,
    ) {
        self.busy = None;
        match result {
            Ok(session_id) => {
                self.open(Controller::new(kind, session_id));
                self.send_text(&question);
            }
            Err(e) => {
                // Give the question back so it can be retried.
                self.input = question;
                self.move_cursor_end();
                self.set_error(format!("Failed to create session: {e}"));
            }
        }
    }

    fn run_command(&mut self, command: Command) {
        match command {
            Command::Back => self.go_home(),
            Command::Quit => self.should_quit = true,
            Command::Clear => self.clear_history(),
            Command::History => self.reload_history(),
            Command::Export => match self.export_artifacts() {
                Ok(paths) if paths.is_empty() => self.set_status("No artifacts to export"),
                Ok(paths) => self.set_status(format!(
                    "Exported {} artifact(s) to {}",
                    paths.len(),
                    self.export_dir.display()
                )),
                Err(e) => self.set_error(format!("Export failed: {e}")),
            },
            Command::Copy => self.copy_latest_artifact(),
            Command::Health => self.check_health(),
            Command::Unknown(name) => self.set_error(format!("Unknown command /{name} ({HELP})")),
        }
    }

    fn current_session(&self) -> Option<(ConversationKind, SessionId)> {
        self.controller
            .as_ref()
            .map(|c| (c.kind(), c.session_id().clone()))
    }

    fn clear_history(&mut self) {
        let Some((kind, session_id)) = self.current_session() else {
            return;
        };
        let client = self.client.clone();
        self.begin_task("Clearing history".to_string());
        self.spawn(async move {
            let result = client.clear_history(kind, &session_id).await;
            Outcome::HistoryCleared {
                kind,
                session_id,
                result,
            }
        });
    }

    fn history_cleared(
        &mut self,
        kind: ConversationKind,
        session_id: SessionId,
        result: Result<(), ClientError>,
    ) {
        self.busy = None;
        match result {
            Ok(()) => {
                self.open(Controller::new(kind, session_id));
                self.set_status("History cleared");
            }
            Err(e) => self.set_error(format!("Failed to clear history: {e}")),
        }
    }

    fn reload_history(&mut self) {
        if let Some((kind, session_id)) = self.current_session() {
            self.load_history(kind, session_id, true);
        }
    }

    fn load_history(&mut self, kind: ConversationKind, session_id: SessionId, reload: bool) {
        let client = self.client.clone();
        self.begin_task(format!("Loading session {session_id}"));
        self.spawn(async move {
            let result = client.get_history(kind, &session_id).await;
            Outcome::HistoryLoaded {
                kind,
                session_id,
                reload,
                result,
            }
        });
    }

    fn history_loaded(
        &mut self,
        kind: ConversationKind,
        session_id: SessionId,
        reload: bool,
        result: Result<Vec<Message>, ClientError>,
    ) {
        self.busy = None;
        match result {
            Ok(history) => {
                let count = history.len();
                self.open(Controller::resume(kind, session_id, history));
                if reload {
                    self.set_status(format!("Loaded {count} messages from the server"));
                } else {
                    self.set_status(format!("Resumed session with {count} messages"));
                }
            }
            Err(e) if reload => self.set_error(format!("Failed to load history: {e}")),
            Err(e) => self.set_error(format!("Failed to load session {session_id}: {e}")),
        }
    }

    fn check_health(&mut self) {
        let Some((kind, _)) = self.current_session() else {
            return;
        };
        let client = self.client.clone();
        self.begin_task(format!("Checking {} health", kind.service_path()));
        self.spawn(async move {
            let result = client.health(kind).await;
            Outcome::Health { kind, result }
        });
    }

    fn health_checked(&mut self, kind: ConversationKind, result: Result<HealthResponse, ClientError>) {
        self.busy = None;
        match result {
            Ok(health) => {
                let service = health.service.as_deref().unwrap_or(kind.service_path());
                self.set_status(format!("{service} service: {}", health.status));
                if !health.is_healthy() {
                    self.set_error(format!("{service} service reports {}", health.status));
                }
            }
            Err(e) => self.set_error(format!("Health check failed: {e}")),
        }
    }

    /// Every artifact in the conversation, in message order.
    pub fn artifacts(&self) -> Vec<Artifact> {
        let Some(controller) = &self.controller else {
            return Vec::new();
        };
        controller
            .messages()
            .iter()
            .filter_map(|message| match render_message(message) {
                RenderedMessage::Artifacts { artifacts, .. } => Some(artifacts),
                RenderedMessage::Plain(_) | RenderedMessage::Linked(_) => None,
            })
            .flatten()
            .collect()
    }

    /// The most recent artifact in the conversation.
    pub fn latest_artifact(&self) -> Option<Artifact> {
        self.artifacts().pop()
    }

    fn copy_latest_artifact(&mut self) {
        let Some(artifact) = self.latest_artifact() else {
            self.set_status("No artifacts to copy");
            return;
        };
        match self.copy_to_clipboard(&artifact.content) {
            Ok(()) => self.set_status(format!("Copied {} to the clipboard", artifact.display_title())),
            Err(e) => self.set_error(e),
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String> {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => tracing::warn!(error = %e, "Failed to initialize clipboard support"),
            }
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return Err("Clipboard not available".to_string());
        };
        clipboard
            .set_text(text.to_string())
            .map_err(|e| format!("Failed to set clipboard text: {e}"))
    }

    fn export_artifacts(&self) -> io::Result<Vec<PathBuf>> {
        let artifacts = self.artifacts();
        if !artifacts.is_empty() {
            std::fs::create_dir_all(&self.export_dir)?;
        }
        artifacts
            .iter()
            .map(|artifact| artifact.export(&self.export_dir))
            .collect()
    }

    // =========================================================================
    // Source Approval
    // =========================================================================

    /// Move the approval focus down.
    pub fn approval_focus_next(&mut self) {
        if let Some(approval) = self.approval_mut() {
            approval.focus_next();
        }
    }

    /// Move the approval focus up.
    pub fn approval_focus_prev(&mut self) {
        if let Some(approval) = self.approval_mut() {
            approval.focus_prev();
        }
    }

    /// Toggle the focused source.
    pub fn approval_toggle(&mut self) {
        if let Some(approval) = self.approval_mut() {
            approval.toggle_focused();
        }
    }

    /// Select every source.
    pub fn approval_select_all(&mut self) {
        if let Some(approval) = self.approval_mut() {
            approval.select_all();
        }
    }

    /// Clear the selection.
    pub fn approval_select_none(&mut self) {
        if let Some(approval) = self.approval_mut() {
            approval.select_none();
        }
    }

    /// Approve the selection, or run the focused recovery action.
    pub fn approval_confirm(&mut self) {
        let recovery = self.approval().and_then(SourceApproval::focused_recovery);
        let request = self
            .controller
            .as_mut()
            .and_then(Controller::research_mut)
            .and_then(|research| match recovery {
                Some(action) => research.recover(action),
                None => research.submit_approval(),
            });
        if let Some(request) = request {
            self.status_message = None;
            self.dispatch(request);
        }
    }

    /// Reject every source.
    pub fn approval_skip(&mut self) {
        let request = self
            .controller
            .as_mut()
            .and_then(Controller::research_mut)
            .and_then(ResearchController::skip_sources);
        if let Some(request) = request {
            self.status_message = None;
            self.dispatch(request);
        }
    }
}
