//! Validated mutations of context entries.
//!
//! Institution entries have full create/update/delete/toggle. Group and
//! individual entries exist from the moment their owner is created and are
//! only ever overwritten; clearing the content is how they are "removed".

use crate::db::now_rfc3339;
use crate::error::{ContextError, Result};
use crate::model::{ContextEntry, EntryPatch, ScopeLevel};
use crate::store::SqliteStore;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

pub const MIN_PRIORITY: i64 = 1;

/// Fields for a new institution entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstitutionEntry {
    #[serde(default)]
    pub category: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_priority() -> i64 {
    MIN_PRIORITY
}

fn default_active() -> bool {
    true
}

impl NewInstitutionEntry {
    pub fn new(title: impl Into<String>, content: impl Into<String>, priority: i64) -> Self {
        Self {
            category: None,
            title: title.into(),
            content: content.into(),
            priority,
            active: true,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

fn require_text(field: &str, value: &str) -> Result<String> {
    let t = value.trim();
    if t.is_empty() {
        return Err(ContextError::validation(format!("{field} must not be empty")));
    }
    Ok(t.to_string())
}

fn check_priority(priority: i64) -> Result<()> {
    if priority < MIN_PRIORITY {
        return Err(ContextError::validation(format!(
            "priority must be >= {MIN_PRIORITY}, got {priority}"
        )));
    }
    Ok(())
}

fn normalize_category(category: Option<&str>, level: ScopeLevel) -> String {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(level.default_category())
        .to_string()
}

/// Inserts a raw entry row and returns its id. Callers validate first.
#[allow(clippy::too_many_arguments)]
pub(crate) fn insert_entry(
    conn: &Connection,
    level: ScopeLevel,
    owner_id: &str,
    category: &str,
    title: Option<&str>,
    content: &str,
    priority: i64,
    active: bool,
) -> Result<String> {
    let seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM context_entries",
        [],
        |r| r.get(0),
    )?;
    let id = Uuid::new_v4().to_string();
    let now = now_rfc3339();
    conn.execute(
        "INSERT INTO context_entries(
           id, scope_level, scope_owner_id, category, title, content,
           priority, active, seq, created_at, updated_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            id,
            level.as_str(),
            owner_id,
            category,
            title,
            content,
            priority,
            active,
            seq,
            now,
            now
        ],
    )?;
    Ok(id)
}

/// Editing service over a borrowed store.
pub struct ContextEditor<'a> {
    store: &'a SqliteStore,
}

impl<'a> ContextEditor<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    fn institution_entry(&self, entry_id: &str) -> Result<ContextEntry> {
        self.store
            .entry(entry_id)?
            .filter(|e| e.scope_level == ScopeLevel::Institution)
            .ok_or_else(|| ContextError::not_found(format!("institution entry {entry_id}")))
    }

    fn reload(&self, entry_id: &str) -> Result<ContextEntry> {
        self.store
            .entry(entry_id)?
            .ok_or_else(|| ContextError::not_found(format!("context entry {entry_id}")))
    }

    pub fn create_institution_entry(
        &self,
        institution_id: &str,
        new: NewInstitutionEntry,
    ) -> Result<ContextEntry> {
        let title = require_text("title", &new.title)?;
        let content = require_text("content", &new.content)?;
        check_priority(new.priority)?;
        if !self.store.exists("institutions", institution_id)? {
            return Err(ContextError::validation(format!(
                "unknown institution {institution_id}"
            )));
        }
        let category = normalize_category(new.category.as_deref(), ScopeLevel::Institution);

        let id = insert_entry(
            self.store.conn(),
            ScopeLevel::Institution,
            institution_id,
            &category,
            Some(title.as_str()),
            &content,
            new.priority,
            new.active,
        )?;
        tracing::info!(entry_id = %id, institution_id, priority = new.priority, "institution entry created");
        self.reload(&id)
    }

    pub fn update_institution_entry(
        &self,
        entry_id: &str,
        patch: &EntryPatch,
    ) -> Result<ContextEntry> {
        let mut entry = self.institution_entry(entry_id)?;
        if patch.is_empty() {
            return Ok(entry);
        }

        if let Some(title) = &patch.title {
            entry.title = Some(require_text("title", title)?);
        }
        if let Some(content) = &patch.content {
            entry.content = require_text("content", content)?;
        }
        if let Some(priority) = patch.priority {
            check_priority(priority)?;
            entry.priority = priority;
        }
        if let Some(category) = &patch.category {
            entry.category = normalize_category(Some(category.as_str()), ScopeLevel::Institution);
        }
        if let Some(active) = patch.active {
            entry.active = active;
        }

        let changed = self.store.conn().execute(
            "UPDATE context_entries
             SET category = ?, title = ?, content = ?, priority = ?, active = ?, updated_at = ?
             WHERE id = ? AND scope_level = 'institution'",
            rusqlite::params![
                entry.category,
                entry.title,
                entry.content,
                entry.priority,
                entry.active,
                now_rfc3339(),
                entry_id
            ],
        )?;
        if changed == 0 {
            return Err(ContextError::not_found(format!("institution entry {entry_id}")));
        }
        tracing::info!(entry_id, "institution entry updated");
        self.reload(entry_id)
    }

    /// Permanent. A repeated delete reports `NotFound`.
    pub fn delete_institution_entry(&self, entry_id: &str) -> Result<()> {
        let changed = self.store.conn().execute(
            "DELETE FROM context_entries WHERE id = ? AND scope_level = 'institution'",
            [entry_id],
        )?;
        if changed == 0 {
            return Err(ContextError::not_found(format!("institution entry {entry_id}")));
        }
        tracing::info!(entry_id, "institution entry deleted");
        Ok(())
    }

    pub fn toggle_institution_entry(&self, entry_id: &str, active: bool) -> Result<ContextEntry> {
        let changed = self.store.conn().execute(
            "UPDATE context_entries SET active = ?, updated_at = ?
             WHERE id = ? AND scope_level = 'institution'",
            rusqlite::params![active, now_rfc3339(), entry_id],
        )?;
        if changed == 0 {
            return Err(ContextError::not_found(format!("institution entry {entry_id}")));
        }
        tracing::info!(entry_id, active, "institution entry toggled");
        self.reload(entry_id)
    }

    /// Upserts the group's single note. Empty content is allowed.
    pub fn set_group_entry(&self, group_id: &str, content: &str) -> Result<ContextEntry> {
        self.set_single(ScopeLevel::Group, "member_groups", group_id, content)
    }

    /// Upserts the individual's single note. Empty content is allowed.
    pub fn set_individual_entry(&self, individual_id: &str, content: &str) -> Result<ContextEntry> {
        self.set_single(ScopeLevel::Individual, "individuals", individual_id, content)
    }

    fn set_single(
        &self,
        level: ScopeLevel,
        owner_table: &str,
        owner_id: &str,
        content: &str,
    ) -> Result<ContextEntry> {
        if !self.store.exists(owner_table, owner_id)? {
            return Err(ContextError::validation(format!(
                "unknown {} {owner_id}",
                level.as_str()
            )));
        }

        let tx = self.store.conn().unchecked_transaction()?;
        let existing = self.store.single_entry(level, owner_id)?;
        let id = match existing {
            Some(e) => {
                tx.execute(
                    "UPDATE context_entries SET content = ?, updated_at = ? WHERE id = ?",
                    (content, now_rfc3339(), &e.id),
                )?;
                e.id
            }
            None => insert_entry(
                &tx,
                level,
                owner_id,
                level.default_category(),
                None,
                content,
                MIN_PRIORITY,
                true,
            )?,
        };
        tx.commit()?;
        tracing::info!(
            entry_id = %id,
            scope = level.as_str(),
            owner_id,
            empty = content.trim().is_empty(),
            "scoped note set"
        );
        self.reload(&id)
    }
}
