//! Hierarchical context resolution.
//!
//! For one individual, collects every contributing entry across the scope
//! levels and concatenates them in fixed precedence order:
//!
//! 1. the individual's own note
//! 2. the group note
//! 3. institution entries, ascending priority, ties in creation order
//! 4. optional supplementary material from a [`SupplementProvider`]
//!
//! Resolution is a pure function of the store's current state. Missing
//! scopes contribute nothing; they are never errors.

use crate::error::Result;
use crate::model::{ContextEntry, Membership, ScopeLevel};
use crate::store::ContextStore;
use serde::Serialize;

/// Separator placed between contributions in the resolved text.
pub const SECTION_SEPARATOR: &str = "\n\n";

/// Layer a contribution came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextLayer {
    Individual,
    Group,
    Institution,
    Content,
}

impl From<ScopeLevel> for ContextLayer {
    fn from(level: ScopeLevel) -> Self {
        match level {
            ScopeLevel::Individual => Self::Individual,
            ScopeLevel::Group => Self::Group,
            ScopeLevel::Institution => Self::Institution,
        }
    }
}

/// One piece of the resolved text, kept for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub scope_level: ContextLayer,
    pub label: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedContext {
    pub text: String,
    pub breakdown: Vec<Contribution>,
}

impl ResolvedContext {
    pub fn is_empty(&self) -> bool {
        self.breakdown.is_empty()
    }

    pub fn layer(&self, layer: ContextLayer) -> impl Iterator<Item = &Contribution> {
        self.breakdown.iter().filter(move |c| c.scope_level == layer)
    }

    fn push_entry(&mut self, entry: &ContextEntry) {
        if !entry.contributes() {
            return;
        }
        self.push(
            entry.scope_level.into(),
            entry.label().to_string(),
            entry.content.trim(),
        );
    }

    fn push(&mut self, layer: ContextLayer, label: String, content: &str) {
        if !self.text.is_empty() {
            self.text.push_str(SECTION_SEPARATOR);
        }
        self.text.push_str(content);
        self.breakdown.push(Contribution {
            scope_level: layer,
            label,
            content: content.to_string(),
        });
    }
}

/// Extra material appended after institution entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supplement {
    pub label: String,
    pub content: String,
}

impl Supplement {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
        }
    }
}

/// Injection point for content-level material (lesson content, documents).
///
/// Only called when the consuming agent asks for it.
pub trait SupplementProvider {
    fn supplements(&self, membership: &Membership) -> Result<Vec<Supplement>>;
}

impl<F> SupplementProvider for F
where
    F: Fn(&Membership) -> Result<Vec<Supplement>>,
{
    fn supplements(&self, membership: &Membership) -> Result<Vec<Supplement>> {
        self(membership)
    }
}

pub fn resolve<S: ContextStore + ?Sized>(
    store: &S,
    individual_id: &str,
    supplements: Option<&dyn SupplementProvider>,
) -> Result<ResolvedContext> {
    let mut out = ResolvedContext::default();
    let Some(membership) = store.membership(individual_id)? else {
        tracing::debug!(individual_id, "no membership; empty resolution");
        return Ok(out);
    };

    if let Some(entry) = store.individual_entry(individual_id)? {
        out.push_entry(&entry);
    }

    if let Some(group_id) = membership.group_id.as_deref() {
        if let Some(entry) = store.group_entry(group_id)? {
            out.push_entry(&entry);
        }
    }

    let mut institution = store.institution_entries(&membership.institution_id, false)?;
    // Stable: equal priorities keep the store's creation order.
    institution.sort_by_key(|e| e.priority);
    for entry in &institution {
        out.push_entry(entry);
    }

    if let Some(provider) = supplements {
        for s in provider.supplements(&membership)? {
            let content = s.content.trim();
            if content.is_empty() {
                continue;
            }
            out.push(ContextLayer::Content, s.label, content);
        }
    }

    tracing::debug!(
        individual_id,
        contributions = out.breakdown.len(),
        institution_entries = institution.len(),
        "context resolved"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Plain in-memory store for exercising the algorithm without SQLite.
    #[derive(Default)]
    struct MapStore {
        members: HashMap<String, Membership>,
        entries: Vec<ContextEntry>,
    }

    impl MapStore {
        fn member(&mut self, id: &str, inst: &str, group: Option<&str>) {
            self.members.insert(
                id.into(),
                Membership {
                    individual_id: id.into(),
                    institution_id: inst.into(),
                    group_id: group.map(str::to_string),
                },
            );
        }

        fn add(&mut self, level: ScopeLevel, owner: &str, content: &str, priority: i64) -> usize {
            self.entries.push(ContextEntry {
                id: format!("e{}", self.entries.len()),
                scope_level: level,
                scope_owner_id: owner.into(),
                category: level.default_category().into(),
                title: (level == ScopeLevel::Institution).then(|| format!("t{priority}")),
                content: content.into(),
                priority,
                active: true,
                created_at: String::new(),
                updated_at: String::new(),
            });
            self.entries.len() - 1
        }
    }

    impl ContextStore for MapStore {
        fn institution_entries(&self, id: &str, all: bool) -> Result<Vec<ContextEntry>> {
            // Deliberately unsorted so the resolver's own ordering is tested.
            Ok(self
                .entries
                .iter()
                .filter(|e| e.scope_level == ScopeLevel::Institution && e.scope_owner_id == id)
                .filter(|e| all || e.active)
                .cloned()
                .collect())
        }
        fn group_entry(&self, id: &str) -> Result<Option<ContextEntry>> {
            Ok(self
                .entries
                .iter()
                .find(|e| e.scope_level == ScopeLevel::Group && e.scope_owner_id == id)
                .cloned())
        }
        fn individual_entry(&self, id: &str) -> Result<Option<ContextEntry>> {
            Ok(self
                .entries
                .iter()
                .find(|e| e.scope_level == ScopeLevel::Individual && e.scope_owner_id == id)
                .cloned())
        }
        fn membership(&self, id: &str) -> Result<Option<Membership>> {
            Ok(self.members.get(id).cloned())
        }
    }

    #[test]
    fn unknown_individual_resolves_empty() {
        let store = MapStore::default();
        let r = resolve(&store, "ghost", None).unwrap();
        assert!(r.is_empty());
        assert_eq!(r.text, "");
    }

    #[test]
    fn precedence_is_individual_group_institution() {
        let mut store = MapStore::default();
        store.member("x", "i", Some("g"));
        store.add(ScopeLevel::Institution, "i", "no homework Fridays", 2);
        store.add(ScopeLevel::Institution, "i", "8am-5pm", 1);
        store.add(ScopeLevel::Group, "g", "Science fair next week", 1);
        store.add(ScopeLevel::Individual, "x", "needs extra time", 1);

        let r = resolve(&store, "x", None).unwrap();
        let contents: Vec<_> = r.breakdown.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(
            contents,
            [
                "needs extra time",
                "Science fair next week",
                "8am-5pm",
                "no homework Fridays"
            ]
        );
        assert_eq!(r.text, contents.join(SECTION_SEPARATOR));
        let layers: Vec<_> = r.breakdown.iter().map(|c| c.scope_level).collect();
        assert_eq!(
            layers,
            [
                ContextLayer::Individual,
                ContextLayer::Group,
                ContextLayer::Institution,
                ContextLayer::Institution
            ]
        );
    }

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let mut store = MapStore::default();
        store.member("x", "i", None);
        store.add(ScopeLevel::Institution, "i", "b", 2);
        store.add(ScopeLevel::Institution, "i", "first", 1);
        store.add(ScopeLevel::Institution, "i", "second", 1);
        let r = resolve(&store, "x", None).unwrap();
        assert_eq!(r.text, "first\n\nsecond\n\nb");
    }

    #[test]
    fn empty_and_inactive_entries_are_skipped() {
        let mut store = MapStore::default();
        store.member("x", "i", Some("g"));
        store.add(ScopeLevel::Individual, "x", "   ", 1);
        store.add(ScopeLevel::Group, "g", "", 1);
        let idx = store.add(ScopeLevel::Institution, "i", "hidden", 1);
        store.entries[idx].active = false;
        store.add(ScopeLevel::Institution, "i", "shown", 2);

        let r = resolve(&store, "x", None).unwrap();
        assert_eq!(r.text, "shown");
        assert_eq!(r.layer(ContextLayer::Individual).count(), 0);
    }

    #[test]
    fn supplements_come_last_and_skip_blank() {
        let mut store = MapStore::default();
        store.member("x", "i", None);
        store.add(ScopeLevel::Institution, "i", "8am-5pm", 1);
        let provider = |m: &Membership| -> Result<Vec<Supplement>> {
            assert_eq!(m.institution_id, "i");
            Ok(vec![
                Supplement::new("Fractions", "Lesson 3: adding fractions"),
                Supplement::new("Blank", "  "),
            ])
        };
        let r = resolve(&store, "x", Some(&provider as &dyn SupplementProvider)).unwrap();
        assert_eq!(r.text, "8am-5pm\n\nLesson 3: adding fractions");
        let last = r.breakdown.last().unwrap();
        assert_eq!(last.scope_level, ContextLayer::Content);
        assert_eq!(last.label, "Fractions");
    }

    #[test]
    fn provider_is_not_called_for_unknown_individual() {
        let store = MapStore::default();
        let provider = |_: &Membership| -> Result<Vec<Supplement>> {
            panic!("provider must not run without a membership")
        };
        assert!(resolve(&store, "ghost", Some(&provider as &dyn SupplementProvider)).unwrap().is_empty());
    }

    #[test]
    fn breakdown_serializes_snake_case_layers() {
        let mut r = ResolvedContext::default();
        r.push(ContextLayer::Group, "general".into(), "x");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["breakdown"][0]["scopeLevel"], "group");
        assert_eq!(v["text"], "x");
    }
}
