use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{reduce, Action, ChatState};
use crate::config::PromptConfig;
use crate::error::{AppError, AppResult};
use crate::formatter::format_conversation;
use crate::generation::GenerationProvider;
use crate::translate::Translator;

const CANCELLED: &str = "Request cancelled before completion";

struct SessionEntry {
    state: ChatState,
    last_active: Instant,
}

impl SessionEntry {
    fn apply(&mut self, action: Action) -> ChatState {
        self.state = reduce(&self.state, action);
        self.last_active = Instant::now();
        self.state.clone()
    }
}

/// Runs UI actions against the relays and keeps per-session state.
///
/// Each operation marks the session as loading, awaits the relays without
/// holding any map guard, then applies a single completion action. A session
/// that is already loading rejects further operations. If the caller drops an
/// operation half way, the session is put back to idle.
pub struct SessionController {
    sessions: DashMap<String, SessionEntry>,
    generator: Arc<dyn GenerationProvider>,
    translator: Arc<dyn Translator>,
    prompts: PromptConfig,
    target_lang: String,
}

/// Held while a session is loading. Dropping it unfinished applies `Action::Cancelled`.
struct InFlight<'a> {
    controller: &'a SessionController,
    session_id: &'a str,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, action: Action) -> AppResult<ChatState> {
        self.finished = true;
        self.controller.dispatch(self.session_id, action)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("Operation on session {} dropped while loading", self.session_id);
        // The session may already be gone; nothing to reset then.
        let _ = self
            .controller
            .dispatch(self.session_id, Action::Cancelled(CANCELLED.to_string()));
    }
}

impl SessionController {
    pub fn new(
        generator: Arc<dyn GenerationProvider>,
        translator: Arc<dyn Translator>,
        prompts: PromptConfig,
        target_lang: String,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            generator,
            translator,
            prompts,
            target_lang,
        }
    }

    pub fn create(&self) -> ChatState {
        let session_id = Uuid::new_v4().to_string();
        let state = ChatState::new(session_id.clone());
        self.sessions.insert(
            session_id.clone(),
            SessionEntry {
                state: state.clone(),
                last_active: Instant::now(),
            },
        );
        info!("Created session {}", session_id);
        state
    }

    /// Current state. Reading a session counts as activity.
    pub fn get(&self, session_id: &str) -> AppResult<ChatState> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;
        entry.last_active = Instant::now();
        Ok(entry.state.clone())
    }

    pub fn remove(&self, session_id: &str) -> AppResult<()> {
        match self.sessions.remove(session_id) {
            Some(_) => {
                info!("Removed session {}", session_id);
                Ok(())
            }
            None => Err(AppError::SessionNotFound(session_id.to_string())),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop idle sessions untouched for at least `max_idle`. Loading sessions are kept.
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.state.is_loading() || entry.last_active.elapsed() < max_idle);
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            info!("Purged {} idle sessions", purged);
        }
        purged
    }

    /// Periodically purge sessions idle for longer than `max_idle`.
    pub fn spawn_idle_sweeper(self: Arc<Self>, max_idle: Duration) -> JoinHandle<()> {
        let period = (max_idle / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                self.purge_idle(max_idle);
            }
        })
    }

    /// Fetch another batch of scenario titles.
    pub async fn load_more(&self, session_id: &str) -> AppResult<ChatState> {
        let op = self.start(session_id, &[Action::LoadStarted], |state| {
            if state.has_more {
                Ok(())
            } else {
                Err(AppError::NoMoreScenarios)
            }
        })?;
        self.run_scenario_load(op).await
    }

    /// Clear the list and load a fresh first batch.
    pub async fn refresh(&self, session_id: &str) -> AppResult<ChatState> {
        let op = self.start(session_id, &[Action::Refresh, Action::LoadStarted], |_| Ok(()))?;
        self.run_scenario_load(op).await
    }

    /// Open a scenario: generate its conversation and pair every line with a translation.
    pub async fn select(&self, session_id: &str, scenario: &str) -> AppResult<ChatState> {
        let scenario = scenario.trim();
        if scenario.is_empty() {
            return Err(AppError::InvalidRequest("scenario is required".to_string()));
        }
        let op = self.start(session_id, &[Action::LoadStarted], |_| Ok(()))?;

        let prompt = self.prompts.scenario_detail_for(scenario);
        let action = match self.generator.generate(&prompt).await {
            Ok(text) => {
                let lines = format_conversation(&text, self.translator.as_ref(), &self.target_lang).await;
                debug!("Scenario {:?} produced {} lines", scenario, lines.len());
                Action::ScenarioOpened {
                    scenario: scenario.to_string(),
                    lines,
                }
            }
            Err(e) => {
                warn!("Error fetching scenario details: {}", e);
                Action::ScenarioFailed(e.to_string())
            }
        };
        op.finish(action)
    }

    pub fn back(&self, session_id: &str) -> AppResult<ChatState> {
        self.apply_if_idle(session_id, &[Action::Back], |_| Ok(()))
    }

    /// Send a chat message; the reply is translated as a whole. Blank input is ignored.
    pub async fn send(&self, session_id: &str, text: &str) -> AppResult<ChatState> {
        let text = text.trim();
        if text.is_empty() {
            return self.get(session_id);
        }
        let op = self.start(session_id, &[Action::MessageSent(text.to_string())], |_| Ok(()))?;

        let prompt = self.prompts.chat_reply_for(text);
        let action = match self.generator.generate(&prompt).await {
            Ok(english) => match self.translator.translate(&english, &self.target_lang).await {
                Ok(translated) => Action::ReplyReceived { english, translated },
                Err(e) => Action::ReplyFailed(e.to_string()),
            },
            Err(e) => Action::ReplyFailed(e.to_string()),
        };
        if let Action::ReplyFailed(reason) = &action {
            warn!("Error in send for session {}: {}", session_id, reason);
        }
        op.finish(action)
    }

    async fn run_scenario_load(&self, op: InFlight<'_>) -> AppResult<ChatState> {
        let session_id = op.session_id;
        let action = match self.generator.generate(&self.prompts.scenario_list).await {
            Ok(text) => Action::ScenariosLoaded(text),
            Err(e) => {
                warn!("Error fetching scenarios, disabling further loads: {}", e);
                Action::ScenariosFailed(e.to_string())
            }
        };
        let state = op.finish(action)?;
        debug!("Session {} now has {} scenarios", session_id, state.scenarios.len());
        Ok(state)
    }

    /// Apply the starting actions and hand back a guard for the rest of the operation.
    fn start<'a, F>(
        &'a self,
        session_id: &'a str,
        actions: &[Action],
        precondition: F,
    ) -> AppResult<InFlight<'a>>
    where
        F: FnOnce(&ChatState) -> AppResult<()>,
    {
        self.apply_if_idle(session_id, actions, precondition)?;
        Ok(InFlight {
            controller: self,
            session_id,
            finished: false,
        })
    }

    /// Check-and-apply under the entry lock so two operations cannot both start.
    fn apply_if_idle<F>(
        &self,
        session_id: &str,
        actions: &[Action],
        precondition: F,
    ) -> AppResult<ChatState>
    where
        F: FnOnce(&ChatState) -> AppResult<()>,
    {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;
        if entry.state.is_loading() {
            return Err(AppError::SessionBusy);
        }
        precondition(&entry.state)?;
        let mut next = entry.state.clone();
        for action in actions.iter().cloned() {
            next = entry.apply(action);
        }
        Ok(next)
    }

    fn dispatch(&self, session_id: &str, action: Action) -> AppResult<ChatState> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;
        Ok(entry.apply(action))
    }
}
