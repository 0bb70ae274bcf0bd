use dashmap::DashMap;

/// The process-wide mapping from a live cursor id to the command name that opened it.
///
/// Shared across every session via `Arc<CursorTable>` rather than living in per-session state:
/// a cursor id is handed back to whichever client issued the opening command, but the proxy
/// does not assume that a later `getMore` for it arrives on the same connection.
#[derive(Default)]
pub struct CursorTable {
    origins: DashMap<i64, String>,
}

impl CursorTable {
    /// An empty table, as constructed once at daemon startup.
    pub fn new() -> Self {
        Self::default()
    }

    /// The command name that opened `cursor_id`, if the table still has an entry for it.
    pub fn lookup(&self, cursor_id: i64) -> Option<String> {
        self.origins.get(&cursor_id).map(|entry| entry.value().clone())
    }

    /// Records that `cursor_id` was opened by `command_name`, overwriting any prior entry.
    pub fn insert(&self, cursor_id: i64, command_name: String) {
        self.origins.insert(cursor_id, command_name);
    }

    /// Removes the entry for `cursor_id`, e.g. once a `getMore` response reports it exhausted.
    pub fn remove(&self, cursor_id: i64) {
        self.origins.remove(&cursor_id);
    }

    /// The number of live cursors currently tracked. Used by tests to assert the table's
    /// bound after an exhausting `getMore`.
    pub fn len(&self) -> usize {
        self.origins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_lookup_round_trips() {
        let table = CursorTable::new();
        table.insert(42, "find".to_string());
        assert_eq!(table.lookup(42), Some("find".to_string()));
    }

    #[test]
    fn remove_clears_the_entry() {
        let table = CursorTable::new();
        table.insert(42, "find".to_string());
        table.remove(42);
        assert_eq!(table.lookup(42), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn lookup_of_unknown_id_is_none() {
        let table = CursorTable::new();
        assert_eq!(table.lookup(999), None);
    }

    #[test]
    fn insert_overwrites_a_prior_entry() {
        let table = CursorTable::new();
        table.insert(42, "find".to_string());
        table.insert(42, "aggregate".to_string());
        assert_eq!(table.lookup(42), Some("aggregate".to_string()));
    }
}
