//! Read-only facade for the consuming agent.

use crate::error::Result;
use crate::profile::AgentProfile;
use crate::prompt::PromptAssembler;
use crate::resolver::{self, ResolvedContext, SupplementProvider};
use crate::store::ContextStore;

/// Binds a store to an agent profile. Never mutates anything.
pub struct ContextAdapter<'a, S: ContextStore + ?Sized> {
    store: &'a S,
    profile: AgentProfile,
}

impl<'a, S: ContextStore + ?Sized> ContextAdapter<'a, S> {
    pub fn new(store: &'a S, profile: AgentProfile) -> Self {
        Self { store, profile }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn resolve_context_for(&self, individual_id: &str) -> Result<ResolvedContext> {
        resolver::resolve(self.store, individual_id, None)
    }

    pub fn resolve_context_with(
        &self,
        individual_id: &str,
        supplements: &dyn SupplementProvider,
    ) -> Result<ResolvedContext> {
        resolver::resolve(self.store, individual_id, Some(supplements))
    }

    /// Resolution plus the system prompt built from it and the profile.
    pub fn agent_context_for(&self, individual_id: &str) -> Result<AgentContext> {
        let resolved = self.resolve_context_for(individual_id)?;
        let prompt = PromptAssembler::assemble(&self.profile, &resolved);
        Ok(AgentContext { resolved, prompt })
    }
}

/// What the agent receives for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentContext {
    pub resolved: ResolvedContext,
    pub prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{ContextEditor, NewInstitutionEntry};
    use crate::model::Membership;
    use crate::resolver::Supplement;
    use crate::roster::Roster;
    use crate::store::SqliteStore;

    #[test]
    fn adapter_resolves_and_builds_prompt() {
        let store = SqliteStore::in_memory().unwrap();
        let roster = Roster::new(&store);
        let inst = roster.create_institution("Escola Norte").unwrap();
        let g = roster.create_group(&inst.id, "5A", None).unwrap();
        let x = roster
            .create_individual(&inst.id, Some(g.id.as_str()), "Ana", None)
            .unwrap();
        let editor = ContextEditor::new(&store);
        editor
            .create_institution_entry(&inst.id, NewInstitutionEntry::new("Hours", "8am-5pm", 1))
            .unwrap();
        editor.set_individual_entry(&x.id, "needs extra time").unwrap();

        let adapter = ContextAdapter::new(&store, AgentProfile::default());
        let r = adapter.resolve_context_for(&x.id).unwrap();
        assert_eq!(r.text, "needs extra time\n\n8am-5pm");

        assert_eq!(adapter.profile().language, "pt-PT");
        let ctx = adapter.agent_context_for(&x.id).unwrap();
        assert_eq!(ctx.resolved, r);
        assert!(ctx.prompt.contains("- **Hours**: 8am-5pm"));
        assert!(ctx.prompt.ends_with("Respond in pt-PT."));

        let provider = |_: &Membership| -> Result<Vec<Supplement>> {
            Ok(vec![Supplement::new("Lesson", "fractions")])
        };
        let with = adapter.resolve_context_with(&x.id, &provider).unwrap();
        assert!(with.text.ends_with("\n\nfractions"));
    }

    #[test]
    fn unknown_individual_gives_empty_prompt() {
        let store = SqliteStore::in_memory().unwrap();
        let adapter = ContextAdapter::new(&store, AgentProfile::default());
        assert_eq!(adapter.agent_context_for("ghost").unwrap(), AgentContext::default());
    }
}
