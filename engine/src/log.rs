use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::combatant::CombatantId;
use crate::encounter::Outcome;
use crate::life::Vitals;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub seq: usize,
    pub round: u32,
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Outbound notifications, in the order they happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EncounterEvent {
    Line { text: String },
    CombatantUpdated { id: CombatantId, vitals: Vitals },
    TurnAdvanced { active: CombatantId, round: u32 },
    EncounterResolved { outcome: Outcome },
}

/// Append-only narrative log plus a queue of pending outbound events.
///
/// Entries are never rewritten or removed; draining only empties the queue.
#[derive(Debug, Clone, Default)]
pub struct EncounterLog {
    entries: Vec<LogEntry>,
    outbox: VecDeque<EncounterEvent>,
}

impl EncounterLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, round: u32, text: impl Into<String>) {
        let text = text.into();
        self.outbox.push_back(EncounterEvent::Line { text: text.clone() });
        self.entries.push(LogEntry {
            seq: self.entries.len(),
            round,
            text,
        });
    }

    pub(crate) fn emit(&mut self, event: EncounterEvent) {
        self.outbox.push_back(event);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries appended at or after `seq`.
    pub fn since(&self, seq: usize) -> &[LogEntry] {
        &self.entries[seq.min(self.entries.len())..]
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn drain_events(&mut self) -> Vec<EncounterEvent> {
        self.outbox.drain(..).collect()
    }
}
