//! The shared queue document and its transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};

const SCHEMA_VERSION: u32 = 1;

/// One of the two parallel ticket-calling tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    Male,
    Female,
}

impl std::str::FromStr for Lane {
    type Err = ServerError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "male" => Ok(Lane::Male),
            "female" => Ok(Lane::Female),
            _ => Err(ServerError::MissingFields),
        }
    }
}

/// A called ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub number: String,
    pub gender: Lane,
    pub called_by: String,
    pub called_at: DateTime<Utc>,
}

/// Free-text broadcast field with an active flag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Banner {
    pub text: String,
    pub active: bool,
    pub set_by: Option<String>,
    pub set_at: Option<DateTime<Utc>>,
}

impl Banner {
    pub fn set(&mut self, text: String, by: &str, at: DateTime<Utc>) {
        self.text = text;
        self.active = true;
        self.set_by = Some(by.to_owned());
        self.set_at = Some(at);
    }

    pub fn clear(&mut self, by: &str, at: DateTime<Utc>) {
        self.text.clear();
        self.active = false;
        self.set_by = Some(by.to_owned());
        self.set_at = Some(at);
    }
}

/// Admin-set image shown at the center of the display screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterImage {
    pub data_url: String,
    pub set_by: String,
    pub set_at: DateTime<Utc>,
}

/// The whole display state. A single shared document.
///
/// Schema is additive only: unknown fields are ignored on load and missing
/// fields take their defaults, so older snapshots keep deserializing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueueState {
    pub version: u32,
    pub current: Option<Ticket>,
    /// Previous calls, most recent first, both lanes combined.
    pub history: Vec<Ticket>,
    pub note: Banner,
    pub ticker: Banner,
    pub display_message: Banner,
    pub center_image: Option<CenterImage>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            current: None,
            history: Vec::new(),
            note: Banner::default(),
            ticker: Banner::default(),
            display_message: Banner::default(),
            center_image: None,
        }
    }
}

impl QueueState {
    /// Call the next ticket: the displaced `current` moves to the front of
    /// history, which is truncated to `limit`.
    pub fn call_next(&mut self, ticket: Ticket, limit: usize) {
        if let Some(previous) = self.current.take() {
            self.history.insert(0, previous);
            self.history.truncate(limit);
        }
        self.current = Some(ticket);
    }

    /// Recall the most recent previous ticket, regardless of lane.
    ///
    /// The displaced `current` goes back onto the front of history, so a
    /// single call-then-recall restores the prior state exactly.
    pub fn call_previous(&mut self) -> Result<Ticket> {
        if self.history.is_empty() {
            return Err(ServerError::NoPrevious);
        }

        let recalled = self.history.remove(0);
        if let Some(displaced) = self.current.take() {
            self.history.insert(0, displaced);
        }
        self.current = Some(recalled.clone());
        Ok(recalled)
    }

    /// Clear `current` and history. Broadcast fields are untouched.
    pub fn reset_queue(&mut self) {
        self.current = None;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(number: &str, lane: Lane) -> Ticket {
        Ticket {
            number: number.to_owned(),
            gender: lane,
            called_by: "staff".to_owned(),
            called_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_call_has_no_history() {
        let mut state = QueueState::default();
        state.call_next(ticket("1", Lane::Male), 15);

        assert_eq!(state.current.as_ref().unwrap().number, "1");
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_call_pushes_previous_current() {
        let mut state = QueueState::default();
        state.call_next(ticket("42", Lane::Male), 15);
        state.call_next(ticket("43", Lane::Female), 15);

        assert_eq!(state.current.as_ref().unwrap().number, "43");
        assert_eq!(state.history[0].number, "42");
    }

    #[test]
    fn test_history_bound() {
        let mut state = QueueState::default();
        for i in 0..40 {
            state.call_next(ticket(&i.to_string(), Lane::Male), 15);
        }

        assert_eq!(state.history.len(), 15);
        // the immediately preceding current leads the history.
        assert_eq!(state.current.as_ref().unwrap().number, "39");
        assert_eq!(state.history[0].number, "38");
        // oldest entries were evicted first.
        assert_eq!(state.history.last().unwrap().number, "24");
    }

    #[test]
    fn test_recall_round_trip() {
        let mut state = QueueState::default();
        state.call_next(ticket("42", Lane::Male), 15);
        state.call_next(ticket("43", Lane::Female), 15);

        let recalled = state.call_previous().unwrap();
        assert_eq!(recalled.number, "42");
        assert_eq!(state.current.as_ref().unwrap().number, "42");
        // the displaced ticket is not lost.
        assert_eq!(state.history[0].number, "43");
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_recall_ignores_lane() {
        let mut state = QueueState::default();
        state.call_next(ticket("f1", Lane::Female), 15);
        state.call_next(ticket("m1", Lane::Male), 15);
        state.call_next(ticket("m2", Lane::Male), 15);

        // combined history: recall returns the most recent entry, a male
        // ticket, even though a female one is older.
        let recalled = state.call_previous().unwrap();
        assert_eq!(recalled.number, "m1");
    }

    #[test]
    fn test_recall_empty_history() {
        let mut state = QueueState::default();
        assert!(matches!(
            state.call_previous(),
            Err(ServerError::NoPrevious)
        ));
        assert!(state.current.is_none());

        state.call_next(ticket("1", Lane::Male), 15);
        // one call, nothing before it.
        assert!(matches!(
            state.call_previous(),
            Err(ServerError::NoPrevious)
        ));
        // current is left unchanged.
        assert_eq!(state.current.as_ref().unwrap().number, "1");
    }

    #[test]
    fn test_reset_keeps_broadcast_fields() {
        let mut state = QueueState::default();
        state.call_next(ticket("7", Lane::Female), 15);
        state.ticker.set("welcome".to_owned(), "admin", Utc::now());

        state.reset_queue();
        assert!(state.current.is_none());
        assert!(state.history.is_empty());
        assert_eq!(state.ticker.text, "welcome");
        assert!(state.ticker.active);
    }

    #[test]
    fn test_snapshot_ignores_unknown_fields() {
        // an older or newer snapshot with extra/missing fields still loads.
        let raw = r#"{"current":null,"history":[],"men":[],"women":[],"ticker":{"text":"hi","active":true}}"#;
        let state: QueueState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.version, 1);
        assert_eq!(state.ticker.text, "hi");
        assert_eq!(state.note, Banner::default());
    }
}
