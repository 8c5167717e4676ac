//! Persona Catalog Module
//!
//! Curated advisor personas: role framing, expertise, tone, named frameworks
//! and per-question-type response templates. Read-only after construction;
//! "not found" is a normal case, not a failure - plenty of advisors have no
//! curated persona and run through the generic prompt path.

pub mod catalog;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable persona record keyed by advisor id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaDescriptor {
    pub id: String,
    pub domain: String,
    /// Role title, e.g. "Regulatory Affairs Director"
    pub role: String,
    pub background: String,
    pub expertise: Vec<String>,
    /// Voice descriptor, e.g. "measured and precise"
    pub tone: String,
    /// Named frameworks this persona reasons with, in citation order
    pub frameworks: Vec<String>,
    /// Question-type tag -> response template (voice anchor). Every
    /// descriptor must carry a non-empty "general" entry.
    pub templates: HashMap<String, String>,
}

impl PersonaDescriptor {
    /// Template for a question type, falling back to the universal
    /// `general` entry.
    pub fn template_for(&self, question_type: &str) -> Option<&str> {
        self.templates
            .get(question_type)
            .or_else(|| self.templates.get("general"))
            .map(|s| s.as_str())
    }

    /// All required fields present and non-empty, including the `general`
    /// template invariant.
    pub fn is_complete(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.role.trim().is_empty()
            && !self.background.trim().is_empty()
            && !self.expertise.is_empty()
            && !self.tone.trim().is_empty()
            && self
                .templates
                .get("general")
                .map(|t| !t.trim().is_empty())
                .unwrap_or(false)
    }
}

/// Static lookup over the curated persona table. Built once by the
/// composition root and shared by reference.
pub struct PersonaCatalog {
    by_id: HashMap<String, PersonaDescriptor>,
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonaCatalog {
    /// Catalog with the built-in curated personas.
    pub fn new() -> Self {
        let mut by_id = HashMap::new();
        for descriptor in catalog::builtin_personas() {
            by_id.insert(descriptor.id.clone(), descriptor);
        }
        Self { by_id }
    }

    /// Empty catalog, mainly for tests exercising the not-found path.
    pub fn empty() -> Self {
        Self {
            by_id: HashMap::new(),
        }
    }

    /// Register or replace a descriptor. Builder-style, used at composition
    /// time only; the catalog is read-only afterwards.
    pub fn with_descriptor(mut self, descriptor: PersonaDescriptor) -> Self {
        self.by_id.insert(descriptor.id.clone(), descriptor);
        self
    }

    pub fn get(&self, advisor_id: &str) -> Option<&PersonaDescriptor> {
        self.by_id.get(advisor_id)
    }

    /// Personas for one topic board, in stable (id-sorted) order.
    pub fn list_by_domain(&self, domain: &str) -> Vec<&PersonaDescriptor> {
        let mut matched: Vec<&PersonaDescriptor> = self
            .by_id
            .values()
            .filter(|p| p.domain == domain)
            .collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        matched
    }

    pub fn validate(&self, advisor_id: &str) -> bool {
        self.get(advisor_id).map(|p| p.is_complete()).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_complete() {
        let catalog = PersonaCatalog::new();
        assert!(!catalog.is_empty());
        for descriptor in catalog::builtin_personas() {
            assert!(
                catalog.validate(&descriptor.id),
                "incomplete persona: {}",
                descriptor.id
            );
        }
    }

    #[test]
    fn test_every_persona_has_general_template() {
        for descriptor in catalog::builtin_personas() {
            let general = descriptor.templates.get("general");
            assert!(general.is_some(), "{} missing general", descriptor.id);
            assert!(!general.unwrap().trim().is_empty());
        }
    }

    #[test]
    fn test_template_fallback_to_general() {
        let catalog = PersonaCatalog::new();
        let persona = catalog.get("clin-regulatory").unwrap();
        // No persona carries a template for every tag; unknown tags must
        // resolve to the general entry.
        let t = persona.template_for("no-such-type").unwrap();
        assert_eq!(t, persona.templates.get("general").unwrap());
    }

    #[test]
    fn test_not_found_is_none() {
        let catalog = PersonaCatalog::new();
        assert!(catalog.get("ghost-advisor").is_none());
        assert!(!catalog.validate("ghost-advisor"));
    }

    #[test]
    fn test_list_by_domain_sorted() {
        let catalog = PersonaCatalog::new();
        let clinical = catalog.list_by_domain("cliniboard");
        assert!(clinical.len() >= 2);
        for pair in clinical.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }
}
