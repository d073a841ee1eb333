//! Core records: context entries and the organizational roster they hang off.

use serde::{Deserialize, Serialize};

/// Organizational level a context entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    /// Whole school; many entries per owner, ordered by priority.
    Institution,
    /// One class; a single general note.
    Group,
    /// One student; a single special-needs note.
    Individual,
}

impl ScopeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Institution => "institution",
            Self::Group => "group",
            Self::Individual => "individual",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "institution" => Some(Self::Institution),
            "group" => Some(Self::Group),
            "individual" => Some(Self::Individual),
            _ => None,
        }
    }

    /// Category assigned to entries created implicitly with their owner.
    pub fn default_category(&self) -> &'static str {
        match self {
            Self::Institution | Self::Group => "general",
            Self::Individual => "special-needs",
        }
    }
}

/// A unit of context text attached to one owner at one scope level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEntry {
    pub id: String,
    pub scope_level: ScopeLevel,
    pub scope_owner_id: String,
    pub category: String,
    /// Present on institution entries only.
    pub title: Option<String>,
    pub content: String,
    /// Lower value wins; only meaningful at institution level.
    pub priority: i64,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ContextEntry {
    /// True when the entry adds text to a resolution.
    pub fn contributes(&self) -> bool {
        self.active && !self.content.trim().is_empty()
    }

    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(self.category.as_str())
    }
}

/// Partial update for an institution entry. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryPatch {
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub priority: Option<i64>,
    pub active: Option<bool>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub institution_id: String,
    pub name: String,
    pub grade: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Individual {
    pub id: String,
    pub institution_id: String,
    pub group_id: Option<String>,
    pub name: String,
    pub contact_handle: Option<String>,
    pub created_at: String,
}

/// Where an individual sits in the hierarchy at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub individual_id: String,
    pub institution_id: String,
    pub group_id: Option<String>,
}
