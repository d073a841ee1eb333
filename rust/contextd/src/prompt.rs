//! System prompt assembly from a profile and a resolved context.
//!
//! Section order follows the precedence chain
//! personality → individual → group → institution → content.

use crate::profile::AgentProfile;
use crate::resolver::{ContextLayer, ResolvedContext};

pub struct PromptAssembler;

impl PromptAssembler {
    /// Renders the headed prompt. Layers with nothing to say are left out;
    /// no personality and an empty resolution give an empty string.
    pub fn assemble(profile: &AgentProfile, resolved: &ResolvedContext) -> String {
        let mut sections: Vec<String> = Vec::new();

        if let Some(personality) = profile
            .personality
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            sections.push(format!("# PERSONALITY\n\n{personality}"));
        }

        for (layer, heading) in [
            (ContextLayer::Individual, "# INDIVIDUAL CONTEXT (read first)"),
            (ContextLayer::Group, "# GROUP CONTEXT"),
            (ContextLayer::Institution, "# INSTITUTION CONTEXT"),
            (ContextLayer::Content, "# SUPPLEMENTARY MATERIAL"),
        ] {
            let items: Vec<String> = resolved
                .layer(layer)
                .map(|c| match layer {
                    ContextLayer::Institution | ContextLayer::Content => {
                        format!("- **{}**: {}", c.label, c.content)
                    }
                    ContextLayer::Individual | ContextLayer::Group => c.content.clone(),
                })
                .collect();
            if items.is_empty() {
                continue;
            }
            sections.push(format!("{heading}\n\n{}", items.join("\n")));
        }

        if sections.is_empty() {
            return String::new();
        }
        sections.push(format!("Respond in {}.", profile.language));
        sections.join("\n\n")
    }

    /// Rough token estimate, four characters per token.
    pub fn estimate_tokens(prompt: &str) -> usize {
        prompt.chars().count().div_ceil(4)
    }
}
