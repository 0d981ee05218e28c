// ---------------------------------------------------------------------------
// Explainer groups – substring-based membership, first match wins
// ---------------------------------------------------------------------------

/// A coarse bucket of explainer identifiers sharing one color family.
///
/// Membership is a case-insensitive substring match of `needle` against the
/// record's `llm_explainer`. The match is fragile on purpose: it is how the
/// dataset has always been bucketed, and the registry order below makes the
/// "first match wins" rule explicit instead of iteration-order dependent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplainerGroup {
    /// Display name, also the key used in `FilterState::visible_groups`.
    pub name: &'static str,
    /// Lowercase substring that identifies members.
    needle: &'static str,
    /// Base hue (degrees) of the group's sequential color ramp.
    pub hue_deg: f32,
}

/// The fixed registry. Order is match priority: a hypothetical
/// "gpt-llama-hybrid" belongs to Llama because Llama is checked first.
pub static EXPLAINER_GROUPS: [ExplainerGroup; 4] = [
    ExplainerGroup {
        name: "Llama",
        needle: "llama",
        hue_deg: 30.0,
    },
    ExplainerGroup {
        name: "Gemini-flash",
        needle: "gemini",
        hue_deg: 210.0,
    },
    ExplainerGroup {
        name: "GPT-4o-mini",
        needle: "gpt",
        hue_deg: 120.0,
    },
    ExplainerGroup {
        name: "Qwen",
        needle: "qwen",
        hue_deg: 280.0,
    },
];

impl ExplainerGroup {
    /// Whether an explainer identifier belongs to this group.
    pub fn matches(&self, llm_explainer: &str) -> bool {
        llm_explainer.to_lowercase().contains(self.needle)
    }
}

/// First group (in registry order) the explainer belongs to, if any.
pub fn match_group(llm_explainer: &str) -> Option<&'static ExplainerGroup> {
    let lower = llm_explainer.to_lowercase();
    EXPLAINER_GROUPS.iter().find(|g| lower.contains(g.needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive_substring() {
        let group = match_group("google/gemini-flash-1.5").unwrap();
        assert_eq!(group.name, "Gemini-flash");

        let group = match_group("OpenAI/GPT-4O-MINI").unwrap();
        assert_eq!(group.name, "GPT-4o-mini");

        let group = match_group("meta-llama/llama-3.1-8b-instruct").unwrap();
        assert_eq!(group.name, "Llama");
    }

    #[test]
    fn unknown_explainer_matches_no_group() {
        assert!(match_group("unknown/foo").is_none());
        assert!(match_group("").is_none());
    }

    #[test]
    fn ambiguous_name_takes_first_registry_entry() {
        // Contains both "gpt" and "llama"; Llama is earlier in the registry.
        let group = match_group("experimental/gpt-llama-hybrid").unwrap();
        assert_eq!(group.name, "Llama");
    }

    #[test]
    fn registry_names_contain_their_own_needle() {
        // The side panel colors group labels through the same match rule,
        // so every display name must land in its own group.
        for group in &EXPLAINER_GROUPS {
            assert!(group.matches(group.name), "{} misses itself", group.name);
        }
    }
}
