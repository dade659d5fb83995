//! Append-only event sink for executed actions and board events.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pieces::PlayerId;

/// Something worth telling the outside world about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    /// Board-level narration: seasons, crises, promotions, game end.
    Game { message: String },
    /// An action taken by a player.
    Player { player: PlayerId, message: String },
    Debug { message: String },
}

impl GameEvent {
    pub fn game(message: impl Into<String>) -> Self {
        Self::Game {
            message: message.into(),
        }
    }

    pub fn player(player: PlayerId, message: impl Into<String>) -> Self {
        Self::Player {
            player,
            message: message.into(),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::Debug {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Game { message } | Self::Player { message, .. } | Self::Debug { message } => {
                message
            }
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Game { message } => write!(f, "{message}"),
            Self::Player { player, message } => write!(f, "{player} {message}"),
            Self::Debug { message } => write!(f, "[debug] {message}"),
        }
    }
}

/// Fire-and-forget destination for game events.
pub trait EventSink {
    fn record(&mut self, event: GameEvent);
}

/// In-memory event log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether any recorded message contains `needle`.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.events.iter().any(|e| e.message().contains(needle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }
}

impl EventSink for EventLog {
    fn record(&mut self, event: GameEvent) {
        log::trace!("{event}");
        self.events.push(event);
    }
}

/// Sink that drops everything. Handy for bulk tournament runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: GameEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_appends_in_order() {
        let mut log = EventLog::new();
        log.record(GameEvent::game("Summer begins"));
        log.record(GameEvent::player(PlayerId(2), "went on campaign"));
        assert_eq!(log.len(), 2);
        assert!(log.mentions("campaign"));
        assert_eq!(log.events()[1].to_string(), "P2 went on campaign");
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let json = serde_json::to_string(&GameEvent::debug("x")).unwrap();
        assert_eq!(json, r#"{"kind":"debug","message":"x"}"#);
    }
}
