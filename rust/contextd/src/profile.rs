//! Agent personalities and the profile handed to the consumer adapter.
//!
//! The active personality and response language are persisted as one JSON
//! setting and turned into an explicit [`AgentProfile`] value on load.

use crate::db::{self, now_rfc3339};
use crate::error::{ContextError, Result};
use crate::store::SqliteStore;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PROFILE_SETTINGS_KEY: &str = "agent.profile";
pub const DEFAULT_LANGUAGE: &str = "pt-PT";

/// Everything the agent needs besides the resolved context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    /// Personality prompt; `None` means the agent's built-in default.
    pub personality: Option<String>,
    pub language: String,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            personality: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Persisted preference, as stored under [`PROFILE_SETTINGS_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSettings {
    pub active_personality_id: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    pub id: String,
    pub name: String,
    pub prompt: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalityPatch {
    pub name: Option<String>,
    pub prompt: Option<String>,
    pub active: Option<bool>,
}

const PERSONALITY_COLUMNS: &str = "id, name, prompt, active, created_at, updated_at";

fn personality_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Personality> {
    let active: i64 = r.get(3)?;
    Ok(Personality {
        id: r.get(0)?,
        name: r.get(1)?,
        prompt: r.get(2)?,
        active: active != 0,
        created_at: r.get(4)?,
        updated_at: r.get(5)?,
    })
}

fn required(field: &str, value: &str) -> Result<String> {
    let t = value.trim();
    if t.is_empty() {
        return Err(ContextError::validation(format!("{field} must not be empty")));
    }
    Ok(t.to_string())
}

pub struct Personalities<'a> {
    store: &'a SqliteStore,
}

impl<'a> Personalities<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    pub fn get(&self, id: &str) -> Result<Option<Personality>> {
        let sql = format!("SELECT {PERSONALITY_COLUMNS} FROM personalities WHERE id = ?");
        Ok(self
            .store
            .conn()
            .query_row(&sql, [id], personality_from_row)
            .optional()?)
    }

    pub fn list(&self, include_inactive: bool) -> Result<Vec<Personality>> {
        let sql = format!(
            "SELECT {PERSONALITY_COLUMNS} FROM personalities
             WHERE (? OR active = 1)
             ORDER BY name, id"
        );
        let mut stmt = self.store.conn().prepare(&sql)?;
        let rows = stmt
            .query_map([include_inactive], personality_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn create(&self, name: &str, prompt: &str) -> Result<Personality> {
        let name = required("name", name)?;
        let prompt = required("prompt", prompt)?;
        let now = now_rfc3339();
        let p = Personality {
            id: Uuid::new_v4().to_string(),
            name,
            prompt,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        };
        self.store.conn().execute(
            "INSERT INTO personalities(id, name, prompt, active, created_at, updated_at)
             VALUES(?, ?, ?, 1, ?, ?)",
            (&p.id, &p.name, &p.prompt, &p.created_at, &p.updated_at),
        )?;
        tracing::info!(personality_id = %p.id, "personality created");
        Ok(p)
    }

    pub fn update(&self, id: &str, patch: &PersonalityPatch) -> Result<Personality> {
        let Some(mut p) = self.get(id)? else {
            return Err(ContextError::not_found(format!("personality {id}")));
        };
        if let Some(name) = &patch.name {
            p.name = required("name", name)?;
        }
        if let Some(prompt) = &patch.prompt {
            p.prompt = required("prompt", prompt)?;
        }
        if let Some(active) = patch.active {
            p.active = active;
        }
        p.updated_at = now_rfc3339();
        self.store.conn().execute(
            "UPDATE personalities SET name = ?, prompt = ?, active = ?, updated_at = ? WHERE id = ?",
            rusqlite::params![p.name, p.prompt, p.active, p.updated_at, id],
        )?;
        tracing::info!(personality_id = id, "personality updated");
        Ok(p)
    }

    /// Soft delete; an active profile pointing at it falls back to the default.
    pub fn deactivate(&self, id: &str) -> Result<Personality> {
        self.update(
            id,
            &PersonalityPatch {
                active: Some(false),
                ..Default::default()
            },
        )
    }

    pub fn settings(&self) -> Result<ProfileSettings> {
        match db::settings_get_json(self.store.conn(), PROFILE_SETTINGS_KEY)? {
            Some(v) => Ok(serde_json::from_value(v)?),
            None => Ok(ProfileSettings::default()),
        }
    }

    pub fn save_settings(&self, settings: &ProfileSettings) -> Result<ProfileSettings> {
        let mut settings = settings.clone();
        settings.active_personality_id = settings
            .active_personality_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        settings.language = settings
            .language
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if let Some(id) = &settings.active_personality_id {
            if self.get(id)?.is_none() {
                return Err(ContextError::validation(format!("unknown personality {id}")));
            }
        }
        db::settings_set_json(
            self.store.conn(),
            PROFILE_SETTINGS_KEY,
            &serde_json::to_value(&settings)?,
        )?;
        tracing::info!(
            personality = ?settings.active_personality_id,
            language = ?settings.language,
            "agent profile saved"
        );
        Ok(settings)
    }

    /// Builds the profile from stored settings.
    pub fn load_profile(&self) -> Result<AgentProfile> {
        let settings = self.settings()?;
        let mut profile = AgentProfile::default();
        if let Some(language) = settings.language {
            profile.language = language;
        }
        if let Some(id) = settings.active_personality_id {
            match self.get(&id)? {
                Some(p) if p.active => profile.personality = Some(p.prompt),
                Some(_) => {
                    tracing::warn!(personality_id = %id, "active personality is disabled; using default")
                }
                None => {
                    tracing::warn!(personality_id = %id, "active personality is missing; using default")
                }
            }
        }
        Ok(profile)
    }
}
