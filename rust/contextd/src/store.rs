//! Read side of the context store.
//!
//! [`ContextStore`] is the query surface the resolver depends on. The SQLite
//! implementation also owns the connection used by the editing service and
//! the roster, which borrow it for writes.

use crate::db;
use crate::error::Result;
use crate::model::{ContextEntry, Membership, ScopeLevel};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;

/// Keyed, read-only access to context entries and memberships.
///
/// Absent owners yield empty/`None` results, never errors.
pub trait ContextStore {
    /// Institution entries ascending by priority, ties in creation order.
    fn institution_entries(
        &self,
        institution_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<ContextEntry>>;

    fn group_entry(&self, group_id: &str) -> Result<Option<ContextEntry>>;

    fn individual_entry(&self, individual_id: &str) -> Result<Option<ContextEntry>>;

    fn membership(&self, individual_id: &str) -> Result<Option<Membership>>;
}

pub(crate) const ENTRY_COLUMNS: &str = "id, scope_level, scope_owner_id, category, title, content, priority, active, created_at, updated_at";

pub(crate) fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ContextEntry> {
    let level: String = row.get(1)?;
    let scope_level = ScopeLevel::parse(&level).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown scope level: {level}").into(),
        )
    })?;
    let active: i64 = row.get(7)?;
    Ok(ContextEntry {
        id: row.get(0)?,
        scope_level,
        scope_owner_id: row.get(2)?,
        category: row.get(3)?,
        title: row.get(4)?,
        content: row.get(5)?,
        priority: row.get(6)?,
        active: active != 0,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// SQLite-backed store over one workspace database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(db::open_db(workspace)?))
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(db::open_in_memory()?))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Any entry by id, regardless of scope or state.
    pub fn entry(&self, entry_id: &str) -> Result<Option<ContextEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM context_entries WHERE id = ?");
        Ok(self
            .conn
            .query_row(&sql, [entry_id], entry_from_row)
            .optional()?)
    }

    pub(crate) fn single_entry(
        &self,
        level: ScopeLevel,
        owner_id: &str,
    ) -> Result<Option<ContextEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM context_entries
             WHERE scope_level = ? AND scope_owner_id = ?"
        );
        Ok(self
            .conn
            .query_row(&sql, (level.as_str(), owner_id), entry_from_row)
            .optional()?)
    }

    pub(crate) fn exists(&self, table: &str, id: &str) -> Result<bool> {
        let sql = format!("SELECT 1 FROM {table} WHERE id = ?");
        let found: Option<i64> = self.conn.query_row(&sql, [id], |r| r.get(0)).optional()?;
        Ok(found.is_some())
    }
}

impl ContextStore for SqliteStore {
    fn institution_entries(
        &self,
        institution_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<ContextEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM context_entries
             WHERE scope_level = 'institution'
               AND scope_owner_id = ?
               AND (? OR active = 1)
             ORDER BY priority, seq"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map((institution_id, include_inactive), entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn group_entry(&self, group_id: &str) -> Result<Option<ContextEntry>> {
        self.single_entry(ScopeLevel::Group, group_id)
    }

    fn individual_entry(&self, individual_id: &str) -> Result<Option<ContextEntry>> {
        self.single_entry(ScopeLevel::Individual, individual_id)
    }

    fn membership(&self, individual_id: &str) -> Result<Option<Membership>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, institution_id, group_id FROM individuals WHERE id = ?",
                [individual_id],
                |r| {
                    Ok(Membership {
                        individual_id: r.get(0)?,
                        institution_id: r.get(1)?,
                        group_id: r.get(2)?,
                    })
                },
            )
            .optional()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{ContextEditor, NewInstitutionEntry};
    use crate::roster::Roster;

    #[test]
    fn absent_owners_are_empty_not_errors() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.institution_entries("nope", true).unwrap().is_empty());
        assert_eq!(store.group_entry("nope").unwrap(), None);
        assert_eq!(store.individual_entry("nope").unwrap(), None);
        assert_eq!(store.membership("nope").unwrap(), None);
        assert_eq!(store.entry("nope").unwrap(), None);
    }

    #[test]
    fn institution_entries_filter_inactive_unless_requested() {
        let store = SqliteStore::in_memory().unwrap();
        let school = Roster::new(&store).create_institution("North").unwrap();
        let editor = ContextEditor::new(&store);
        let a = editor
            .create_institution_entry(&school.id, NewInstitutionEntry::new("Hours", "8am-5pm", 2))
            .unwrap();
        let b = editor
            .create_institution_entry(&school.id, NewInstitutionEntry::new("Policy", "uniforms", 1))
            .unwrap();
        editor.toggle_institution_entry(&a.id, false).unwrap();

        let active = store.institution_entries(&school.id, false).unwrap();
        assert_eq!(active.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), [b.id.as_str()]);

        let all = store.institution_entries(&school.id, true).unwrap();
        assert_eq!(
            all.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            [b.id.as_str(), a.id.as_str()]
        );
    }

    #[test]
    fn equal_priorities_come_back_in_creation_order() {
        let store = SqliteStore::in_memory().unwrap();
        let school = Roster::new(&store).create_institution("North").unwrap();
        let editor = ContextEditor::new(&store);
        let mut created = Vec::new();
        for (title, priority) in [("Late", 2), ("First", 1), ("Second", 1), ("Third", 1)] {
            let e = editor
                .create_institution_entry(&school.id, NewInstitutionEntry::new(title, "x", priority))
                .unwrap();
            created.push(e);
        }
        // Later edits must not reorder ties.
        editor
            .update_institution_entry(
                &created[1].id,
                &crate::model::EntryPatch {
                    content: Some("edited".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let titles: Vec<_> = store
            .institution_entries(&school.id, false)
            .unwrap()
            .into_iter()
            .map(|e| e.title.unwrap_or_default())
            .collect();
        assert_eq!(titles, ["First", "Second", "Third", "Late"]);
    }
}
