use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::formatter::{accumulate_scenarios, ConversationLine, ScenarioSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Loading,
}

/// Which pane the UI should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    ScenarioList,
    Conversation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    /// English text a bot reply was translated from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn user(text: String) -> Self {
        Self {
            sender: Sender::User,
            text,
            original: None,
            timestamp: Utc::now(),
        }
    }

    fn bot(text: String, original: Option<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text,
            original,
            timestamp: Utc::now(),
        }
    }
}

/// Everything one UI session displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatState {
    pub session_id: String,
    pub scenarios: ScenarioSet,
    /// Cleared on the first failed load; only `Refresh` turns it back on.
    pub has_more: bool,
    pub selected_scenario: Option<String>,
    pub scenario_details: Vec<ConversationLine>,
    pub messages: Vec<ChatMessage>,
    pub status: Status,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoadStarted,
    ScenariosLoaded(String),
    ScenariosFailed(String),
    ScenarioOpened {
        scenario: String,
        lines: Vec<ConversationLine>,
    },
    ScenarioFailed(String),
    Back,
    Refresh,
    MessageSent(String),
    ReplyReceived {
        english: String,
        translated: String,
    },
    ReplyFailed(String),
    /// The operation that set `Loading` was abandoned before completing.
    Cancelled(String),
}

impl ChatState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            scenarios: ScenarioSet::new(),
            has_more: true,
            selected_scenario: None,
            scenario_details: Vec::new(),
            messages: Vec::new(),
            status: Status::Idle,
            last_error: None,
        }
    }

    pub fn view(&self) -> View {
        if self.selected_scenario.is_some() {
            View::Conversation
        } else {
            View::ScenarioList
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }
}

/// Apply one action. Pure: the input is untouched and nothing else is read.
pub fn reduce(state: &ChatState, action: Action) -> ChatState {
    let mut next = state.clone();
    match action {
        Action::LoadStarted => {
            next.status = Status::Loading;
        }
        Action::ScenariosLoaded(raw_text) => {
            next.scenarios = accumulate_scenarios(&raw_text, &state.scenarios);
            next.status = Status::Idle;
            next.last_error = None;
        }
        Action::ScenariosFailed(reason) => {
            next.has_more = false;
            next.status = Status::Idle;
            next.last_error = Some(reason);
        }
        Action::ScenarioOpened { scenario, lines } => {
            next.selected_scenario = Some(scenario);
            next.scenario_details = lines;
            next.status = Status::Idle;
            next.last_error = None;
        }
        Action::ScenarioFailed(reason) => {
            next.status = Status::Idle;
            next.last_error = Some(reason);
        }
        Action::Back => {
            next.selected_scenario = None;
        }
        Action::Refresh => {
            next.scenarios.clear();
            next.selected_scenario = None;
            next.scenario_details.clear();
            next.has_more = true;
            next.last_error = None;
        }
        Action::MessageSent(text) => {
            next.messages.push(ChatMessage::user(text));
            next.status = Status::Loading;
        }
        Action::ReplyReceived { english, translated } => {
            next.messages.push(ChatMessage::bot(translated, Some(english)));
            next.status = Status::Idle;
            next.last_error = None;
        }
        Action::ReplyFailed(reason) => {
            next.messages
                .push(ChatMessage::bot(format!("Error retrieving response: {}", reason), None));
            next.status = Status::Idle;
            next.last_error = Some(reason);
        }
        Action::Cancelled(reason) => {
            next.status = Status::Idle;
            next.last_error = Some(reason);
        }
    }
    next
}
