//! Institutions, groups and individuals: the membership hierarchy the
//! resolver walks. Creating a group or individual also creates its empty
//! context note.

use crate::db::now_rfc3339;
use crate::editing::{insert_entry, MIN_PRIORITY};
use crate::error::{ContextError, Result};
use crate::model::{Group, Individual, Institution, ScopeLevel};
use crate::store::SqliteStore;
use rusqlite::OptionalExtension;
use serde::Serialize;
use uuid::Uuid;

/// A group plus the pieces the admin screens show next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: Group,
    pub context: String,
    pub member_count: i64,
}

/// An individual whose special note is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualContext {
    pub individual_id: String,
    pub name: String,
    pub group_id: Option<String>,
    pub group_name: Option<String>,
    pub content: String,
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn require_name(name: &str) -> Result<String> {
    let t = name.trim();
    if t.is_empty() {
        return Err(ContextError::validation("name must not be empty"));
    }
    Ok(t.to_string())
}

pub struct Roster<'a> {
    store: &'a SqliteStore,
}

impl<'a> Roster<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    pub fn create_institution(&self, name: &str) -> Result<Institution> {
        let name = require_name(name)?;
        let inst = Institution {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: now_rfc3339(),
        };
        self.store.conn().execute(
            "INSERT INTO institutions(id, name, created_at) VALUES(?, ?, ?)",
            (&inst.id, &inst.name, &inst.created_at),
        )?;
        tracing::info!(institution_id = %inst.id, "institution created");
        Ok(inst)
    }

    pub fn list_institutions(&self) -> Result<Vec<Institution>> {
        let mut stmt = self
            .store
            .conn()
            .prepare("SELECT id, name, created_at FROM institutions ORDER BY name, id")?;
        let rows = stmt
            .query_map([], |r| {
                Ok(Institution {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    created_at: r.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn require_institution(&self, institution_id: &str) -> Result<()> {
        if !self.store.exists("institutions", institution_id)? {
            return Err(ContextError::validation(format!(
                "unknown institution {institution_id}"
            )));
        }
        Ok(())
    }

    pub fn group(&self, group_id: &str) -> Result<Option<Group>> {
        Ok(self
            .store
            .conn()
            .query_row(
                "SELECT id, institution_id, name, grade, created_at FROM member_groups WHERE id = ?",
                [group_id],
                |r| {
                    Ok(Group {
                        id: r.get(0)?,
                        institution_id: r.get(1)?,
                        name: r.get(2)?,
                        grade: r.get(3)?,
                        created_at: r.get(4)?,
                    })
                },
            )
            .optional()?)
    }

    /// A group id an individual of `institution_id` may join.
    fn check_group_for(&self, institution_id: &str, group_id: &str) -> Result<()> {
        match self.group(group_id)? {
            None => Err(ContextError::validation(format!("unknown group {group_id}"))),
            Some(g) if g.institution_id != institution_id => Err(ContextError::validation(
                format!("group {group_id} belongs to another institution"),
            )),
            Some(_) => Ok(()),
        }
    }

    pub fn create_group(
        &self,
        institution_id: &str,
        name: &str,
        grade: Option<&str>,
    ) -> Result<Group> {
        let name = require_name(name)?;
        self.require_institution(institution_id)?;
        let group = Group {
            id: Uuid::new_v4().to_string(),
            institution_id: institution_id.to_string(),
            name,
            grade: non_empty(grade),
            created_at: now_rfc3339(),
        };

        let tx = self.store.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO member_groups(id, institution_id, name, grade, created_at)
             VALUES(?, ?, ?, ?, ?)",
            (
                &group.id,
                &group.institution_id,
                &group.name,
                group.grade.as_deref(),
                &group.created_at,
            ),
        )?;
        insert_entry(
            &tx,
            ScopeLevel::Group,
            &group.id,
            ScopeLevel::Group.default_category(),
            None,
            "",
            MIN_PRIORITY,
            true,
        )?;
        tx.commit()?;
        tracing::info!(group_id = %group.id, institution_id, "group created");
        Ok(group)
    }

    pub fn individual(&self, individual_id: &str) -> Result<Option<Individual>> {
        Ok(self
            .store
            .conn()
            .query_row(
                "SELECT id, institution_id, group_id, name, contact_handle, created_at
                 FROM individuals WHERE id = ?",
                [individual_id],
                individual_from_row,
            )
            .optional()?)
    }

    pub fn create_individual(
        &self,
        institution_id: &str,
        group_id: Option<&str>,
        name: &str,
        contact_handle: Option<&str>,
    ) -> Result<Individual> {
        let name = require_name(name)?;
        self.require_institution(institution_id)?;
        let group_id = non_empty(group_id);
        if let Some(gid) = &group_id {
            self.check_group_for(institution_id, gid)?;
        }
        let contact_handle = non_empty(contact_handle);
        if let Some(handle) = &contact_handle {
            if self.find_by_contact_handle(handle)?.is_some() {
                return Err(ContextError::validation(format!(
                    "contact handle {handle} is already in use"
                )));
            }
        }

        let individual = Individual {
            id: Uuid::new_v4().to_string(),
            institution_id: institution_id.to_string(),
            group_id,
            name,
            contact_handle,
            created_at: now_rfc3339(),
        };

        let tx = self.store.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO individuals(id, institution_id, group_id, name, contact_handle, created_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &individual.id,
                &individual.institution_id,
                individual.group_id.as_deref(),
                &individual.name,
                individual.contact_handle.as_deref(),
                &individual.created_at,
            ),
        )?;
        insert_entry(
            &tx,
            ScopeLevel::Individual,
            &individual.id,
            ScopeLevel::Individual.default_category(),
            None,
            "",
            MIN_PRIORITY,
            true,
        )?;
        tx.commit()?;
        tracing::info!(individual_id = %individual.id, institution_id, "individual created");
        Ok(individual)
    }

    /// Moves an individual into `group_id`, or out of any group with `None`.
    pub fn assign_group(&self, individual_id: &str, group_id: Option<&str>) -> Result<Individual> {
        let Some(mut individual) = self.individual(individual_id)? else {
            return Err(ContextError::not_found(format!("individual {individual_id}")));
        };
        let group_id = non_empty(group_id);
        if let Some(gid) = &group_id {
            self.check_group_for(&individual.institution_id, gid)?;
        }
        self.store.conn().execute(
            "UPDATE individuals SET group_id = ? WHERE id = ?",
            (group_id.as_deref(), individual_id),
        )?;
        individual.group_id = group_id;
        tracing::info!(individual_id, group_id = ?individual.group_id, "group assignment changed");
        Ok(individual)
    }

    /// Permanent. Members become group-less; the group's note goes with it.
    pub fn delete_group(&self, group_id: &str) -> Result<()> {
        if !self.store.exists("member_groups", group_id)? {
            return Err(ContextError::not_found(format!("group {group_id}")));
        }
        let tx = self.store.conn().unchecked_transaction()?;
        tx.execute(
            "UPDATE individuals SET group_id = NULL WHERE group_id = ?",
            [group_id],
        )?;
        tx.execute(
            "DELETE FROM context_entries WHERE scope_level = 'group' AND scope_owner_id = ?",
            [group_id],
        )?;
        tx.execute("DELETE FROM member_groups WHERE id = ?", [group_id])?;
        tx.commit()?;
        tracing::info!(group_id, "group deleted");
        Ok(())
    }

    pub fn delete_individual(&self, individual_id: &str) -> Result<()> {
        if !self.store.exists("individuals", individual_id)? {
            return Err(ContextError::not_found(format!("individual {individual_id}")));
        }
        let tx = self.store.conn().unchecked_transaction()?;
        tx.execute(
            "DELETE FROM context_entries WHERE scope_level = 'individual' AND scope_owner_id = ?",
            [individual_id],
        )?;
        tx.execute("DELETE FROM individuals WHERE id = ?", [individual_id])?;
        tx.commit()?;
        tracing::info!(individual_id, "individual deleted");
        Ok(())
    }

    /// Groups of an institution with their note and member count, by name.
    pub fn list_groups(&self, institution_id: &str) -> Result<Vec<GroupSummary>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT
               g.id,
               g.institution_id,
               g.name,
               g.grade,
               g.created_at,
               COALESCE(
                 (SELECT ce.content FROM context_entries ce
                  WHERE ce.scope_level = 'group' AND ce.scope_owner_id = g.id),
                 ''
               ) AS context,
               (SELECT COUNT(*) FROM individuals i WHERE i.group_id = g.id) AS member_count
             FROM member_groups g
             WHERE g.institution_id = ?
             ORDER BY g.name, g.id",
        )?;
        let rows = stmt
            .query_map([institution_id], |r| {
                Ok(GroupSummary {
                    group: Group {
                        id: r.get(0)?,
                        institution_id: r.get(1)?,
                        name: r.get(2)?,
                        grade: r.get(3)?,
                        created_at: r.get(4)?,
                    },
                    context: r.get(5)?,
                    member_count: r.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_individuals(
        &self,
        institution_id: &str,
        group_id: Option<&str>,
    ) -> Result<Vec<Individual>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT id, institution_id, group_id, name, contact_handle, created_at
             FROM individuals
             WHERE institution_id = ?1 AND (?2 IS NULL OR group_id = ?2)
             ORDER BY name, id",
        )?;
        let rows = stmt
            .query_map((institution_id, group_id), individual_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Individuals whose note has text, optionally narrowed to one group.
    pub fn list_individual_contexts(
        &self,
        institution_id: &str,
        group_id: Option<&str>,
    ) -> Result<Vec<IndividualContext>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT i.id, i.name, i.group_id, g.name, ce.content
             FROM individuals i
             JOIN context_entries ce
               ON ce.scope_level = 'individual' AND ce.scope_owner_id = i.id
             LEFT JOIN member_groups g ON g.id = i.group_id
             WHERE i.institution_id = ?1
               AND (?2 IS NULL OR i.group_id = ?2)
               AND TRIM(ce.content) <> ''
             ORDER BY i.name, i.id",
        )?;
        let rows = stmt
            .query_map((institution_id, group_id), |r| {
                Ok(IndividualContext {
                    individual_id: r.get(0)?,
                    name: r.get(1)?,
                    group_id: r.get(2)?,
                    group_name: r.get(3)?,
                    content: r.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn find_by_contact_handle(&self, handle: &str) -> Result<Option<String>> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Ok(None);
        }
        Ok(self
            .store
            .conn()
            .query_row(
                "SELECT id FROM individuals WHERE contact_handle = ?",
                [handle],
                |r| r.get(0),
            )
            .optional()?)
    }
}

fn individual_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Individual> {
    Ok(Individual {
        id: r.get(0)?,
        institution_id: r.get(1)?,
        group_id: r.get(2)?,
        name: r.get(3)?,
        contact_handle: r.get(4)?,
        created_at: r.get(5)?,
    })
}
