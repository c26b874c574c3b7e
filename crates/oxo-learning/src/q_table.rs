use std::collections::HashMap;

use oxo_engine::{BoardKey, Position};
use serde::{Deserialize, Serialize};

/// Sparse table of action values keyed by `(state, action)`.
///
/// Pairs never written read as `0.0`. Serialized as a list of [`QEntry`] records
/// sorted by state and action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<QEntry>", into = "Vec<QEntry>")]
pub struct QTable {
    values: HashMap<(BoardKey, Position), f64>,
}

/// Serialized form of a single [`QTable`] value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QEntry {
    pub state: BoardKey,
    pub action: Position,
    pub value: f64,
}

impl QTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value, or `0.0` for a pair never written.
    #[must_use]
    pub fn get(&self, state: BoardKey, action: Position) -> f64 {
        self.values.get(&(state, action)).copied().unwrap_or(0.0)
    }

    /// Highest value among `actions` in `state`, `0.0` when `actions` is empty.
    #[must_use]
    pub fn max_value(&self, state: BoardKey, actions: &[Position]) -> f64 {
        actions
            .iter()
            .map(|action| self.get(state, *action))
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    pub(crate) fn set(&mut self, state: BoardKey, action: Position, value: f64) {
        self.values.insert((state, action), value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct states with at least one stored value.
    #[must_use]
    pub fn state_count(&self) -> usize {
        let mut states: Vec<_> = self.values.keys().map(|(state, _)| *state).collect();
        states.sort_unstable();
        states.dedup();
        states.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = QEntry> + '_ {
        self.values.iter().map(|(&(state, action), &value)| QEntry {
            state,
            action,
            value,
        })
    }
}

impl From<Vec<QEntry>> for QTable {
    fn from(entries: Vec<QEntry>) -> Self {
        Self {
            values: entries
                .into_iter()
                .map(|entry| ((entry.state, entry.action), entry.value))
                .collect(),
        }
    }
}

impl From<QTable> for Vec<QEntry> {
    fn from(table: QTable) -> Self {
        let mut entries: Vec<_> = table.iter().collect();
        entries.sort_by_key(|entry| (entry.state, entry.action));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> BoardKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_missing_entries_read_as_zero() {
        let table = QTable::new();
        assert!(table.get(BoardKey::EMPTY, Position::CENTER).abs() < f64::EPSILON);
        assert!(table.max_value(BoardKey::EMPTY, &[]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_max_value() {
        let mut table = QTable::new();
        table.set(BoardKey::EMPTY, Position::CENTER, -0.5);
        table.set(BoardKey::EMPTY, Position::CORNERS[0], -0.25);
        let actions = [Position::CENTER, Position::CORNERS[0]];
        assert!((table.max_value(BoardKey::EMPTY, &actions) + 0.25).abs() < 1e-12);
        // unseen actions count as zero
        let actions = [Position::CENTER, Position::CORNERS[1]];
        assert!(table.max_value(BoardKey::EMPTY, &actions).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serialized_as_sorted_records() {
        let mut table = QTable::new();
        table.set(key("X........"), Position::CENTER, 0.5);
        table.set(BoardKey::EMPTY, Position::CORNERS[0], 1.0);
        assert_eq!(table.state_count(), 2);

        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(
            json,
            r#"[{"state":".........","action":0,"value":1.0},{"state":"X........","action":4,"value":0.5}]"#
        );
        let back: QTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
