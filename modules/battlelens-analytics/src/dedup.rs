use std::collections::HashSet;

use battlelens_common::Row;

/// One unique battle: the first row seen for its (prompt, differences) key.
#[derive(Debug, Clone, Copy)]
pub struct Conversation<'a> {
    pub row: &'a Row,
}

impl<'a> Conversation<'a> {
    pub fn key(&self) -> String {
        conversation_key(self.row)
    }
}

pub fn conversation_key(row: &Row) -> String {
    format!("{}|||{}", row.prompt, row.differences)
}

/// Collapse rows describing the same battle, keeping first-seen order.
///
/// Empty prompts or differences still form a key; they are not special.
pub fn dedupe_conversations<'a, I>(rows: I) -> Vec<Conversation<'a>>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut seen: HashSet<String> = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(conversation_key(row)))
        .map(|row| Conversation { row })
        .collect()
}
