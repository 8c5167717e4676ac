//! Static Response Generation
//!
//! Deterministic, persona-flavored answers produced without any model
//! call - the offline mode and the main fallback path. Three tiers, each
//! guaranteed to yield non-empty text: domain-specific trigger paragraphs,
//! then a persona-styled paragraph, then a generic paragraph keyed only on
//! the advisor's role.

use crate::analyzer::{QuestionAnalysis, QuestionAnalyzer};
use crate::persona::PersonaDescriptor;
use crate::response::{
    AdvisorProfile, AdvisorResponse, PersonaSnapshot, ResponseMetadata, ResponseSource,
};
use std::time::Instant;

/// A hand-authored paragraph selected when all of `all_of` appear in the
/// question for the given domain. Checked in table order.
struct DomainTrigger {
    domain: &'static str,
    all_of: &'static [&'static str],
    paragraph: &'static str,
}

/// Authored topic paragraphs. `{role}` is replaced with the advisor's role
/// title at generation time.
const DOMAIN_TRIGGERS: &[DomainTrigger] = &[
    DomainTrigger {
        domain: "wellness",
        all_of: &["diabetic", "millet"],
        paragraph: "Speaking as {role}: millets are a genuinely good fit for diabetic meal \
                    planning. Their glycemic index sits well below polished rice and refined \
                    wheat, and the fiber slows glucose absorption further. Start by replacing \
                    one rice-based meal a day with foxtail or barnyard millet, pair it with a \
                    protein and a vegetable, and track post-prandial readings for two weeks \
                    before expanding. The substitution matters more than the variety; \
                    consistency matters more than either.",
    },
    DomainTrigger {
        domain: "wellness",
        all_of: &["sleep"],
        paragraph: "Speaking as {role}: before supplements or wearables, fix the schedule. A \
                    consistent wake time anchors the circadian rhythm more reliably than any \
                    intervention, and caffeine after midday undoes most of it. Hold a fixed \
                    wake time for three weeks, keep the bedroom dark and cool, and only then \
                    evaluate whether anything pharmacological is worth discussing.",
    },
    DomainTrigger {
        domain: "cliniboard",
        all_of: &["clinical", "trial"],
        paragraph: "Speaking as {role}: design the trial backward from the FDA review. Lock \
                    the primary endpoint and its statistical analysis plan before anything \
                    else, because regulatory reviewers read those two sections first and most \
                    deficiency letters originate there. Pre-specify the estimand, power the \
                    study for the conservative effect size, and book a pre-submission meeting \
                    with the agency early - alignment on endpoints before first patient in is \
                    the cheapest risk reduction available in clinical development.",
    },
    DomainTrigger {
        domain: "cliniboard",
        all_of: &["submission"],
        paragraph: "Speaking as {role}: treat the regulatory submission as a product with its \
                    own timeline, not paperwork at the end. Map every module to an owner now, \
                    run a mock FDA review against the draft, and keep a deficiency log of \
                    everything a reviewer could reasonably question. Teams that rehearse the \
                    review cycle shorten it; teams that discover gaps during the actual clock \
                    do not.",
    },
    DomainTrigger {
        domain: "eduboard",
        all_of: &["curriculum"],
        paragraph: "Speaking as {role}: start from what students should be able to do, not \
                    from content to cover. Write the evidence of mastery first - the task a \
                    student performs to show understanding - then design backward to lessons \
                    and materials. Pilot with one cohort, collect teacher friction points \
                    within the first two weeks, and budget a revision window before any wider \
                    rollout.",
    },
    DomainTrigger {
        domain: "prodboard",
        all_of: &["roadmap"],
        paragraph: "Speaking as {role}: a roadmap is a list of bets, not promises. Force-rank \
                    by expected learning per unit of effort, cut the bottom third outright, \
                    and attach a falsifiable success metric to everything that remains. The \
                    discipline of killing items is what makes the rest of the roadmap \
                    credible to both the team and the board.",
    },
];

/// Deterministic generator. Safe to share; holds only the analyzer.
pub struct StaticResponseGenerator {
    analyzer: QuestionAnalyzer,
}

impl Default for StaticResponseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticResponseGenerator {
    pub fn new() -> Self {
        Self {
            analyzer: QuestionAnalyzer::new(),
        }
    }

    /// Produce a static answer. Deterministic given the same inputs, aside
    /// from the timestamp and processing-time measurement. Never empty and
    /// always longer than 50 characters, even for advisors absent from the
    /// catalog.
    pub fn generate(
        &self,
        profile: &AdvisorProfile,
        persona: Option<&PersonaDescriptor>,
        question: &str,
        domain: &str,
        analysis: Option<&QuestionAnalysis>,
    ) -> AdvisorResponse {
        let started = Instant::now();

        let owned_analysis;
        let analysis = match analysis {
            Some(a) => a,
            None => {
                owned_analysis = self.analyzer.analyze(question, Some(domain));
                &owned_analysis
            }
        };

        let role = Self::role_of(profile, persona);

        let mut content = Self::domain_triggered(question, domain, &role)
            .or_else(|| persona.map(|p| Self::persona_styled(p, question, analysis)))
            .unwrap_or_else(|| Self::generic(&role, profile, analysis));

        // Floor guard: the tiers above always satisfy this, but the
        // never-short invariant is load-bearing for callers.
        if content.trim().len() <= 50 {
            content.push_str(
                " Happy to go deeper on any part of this once you share more context about \
                 your situation and constraints.",
            );
        }

        let frameworks = persona.map(|p| p.frameworks.clone()).unwrap_or_default();

        AdvisorResponse {
            id: uuid::Uuid::new_v4().to_string(),
            advisor_id: profile.id.clone(),
            content,
            created_at: chrono::Utc::now(),
            persona: snapshot(profile, persona),
            metadata: ResponseMetadata {
                source: ResponseSource::Static,
                processing_ms: started.elapsed().as_millis() as u64,
                confidence: (analysis.confidence * 0.8).clamp(0.3, 0.75),
                attempts: 0,
                frameworks,
                model: None,
                error: None,
            },
        }
    }

    fn role_of(profile: &AdvisorProfile, persona: Option<&PersonaDescriptor>) -> String {
        let role = persona
            .map(|p| p.role.as_str())
            .filter(|r| !r.trim().is_empty())
            .or(Some(profile.role.as_str()))
            .filter(|r| !r.trim().is_empty())
            .unwrap_or("Professional Advisor");
        role.to_string()
    }

    /// Tier 1: topic-specific paragraph when the question hits a trigger.
    fn domain_triggered(question: &str, domain: &str, role: &str) -> Option<String> {
        let q = question.to_lowercase();
        DOMAIN_TRIGGERS
            .iter()
            .filter(|t| t.domain == domain)
            .find(|t| t.all_of.iter().all(|kw| q.contains(kw)))
            .map(|t| t.paragraph.replace("{role}", role))
    }

    /// Tier 2: paragraph assembled from the persona's own style fields.
    fn persona_styled(
        persona: &PersonaDescriptor,
        question: &str,
        analysis: &QuestionAnalysis,
    ) -> String {
        let anchor = persona
            .template_for(analysis.question_type.as_str())
            .unwrap_or("Give concrete, experience-backed advice.");

        let expertise = if persona.expertise.is_empty() {
            "my advisory experience".to_string()
        } else {
            persona.expertise.join(", ").to_lowercase()
        };

        let frameworks = if persona.frameworks.is_empty() {
            String::new()
        } else {
            format!(
                " I would frame this through {} before committing to a direction.",
                persona.frameworks.join(" and ")
            )
        };

        let topic = if question.trim().is_empty() {
            "your question".to_string()
        } else if !analysis.keywords.is_empty() {
            format!("your question about {}", analysis.keywords.join(", "))
        } else {
            "your question".to_string()
        };

        format!(
            "As {role}, here is how I would approach {topic}. {anchor} Drawing on {expertise}, \
             the priority is to separate what you can verify quickly from what needs deeper \
             investment, and to commit to the smallest next step that produces real evidence.\
             {frameworks}",
            role = persona.role,
        )
    }

    /// Tier 3: fully generic paragraph keyed only on the advisor's role.
    fn generic(role: &str, profile: &AdvisorProfile, analysis: &QuestionAnalysis) -> String {
        let specialties = if profile.specialties.is_empty() {
            String::new()
        } else {
            format!(
                " My background in {} shapes that recommendation.",
                profile.specialties.join(", ").to_lowercase()
            )
        };

        let angle = match analysis.question_type {
            crate::analyzer::QuestionType::Ideation => {
                "generate several candidate directions cheaply before committing to any of them"
            }
            crate::analyzer::QuestionType::Strategy => {
                "clarify the goal, the constraint that binds, and the trade-off you are actually making"
            }
            crate::analyzer::QuestionType::Technical => {
                "pin down the requirements precisely, then choose the simplest approach that meets them"
            }
            crate::analyzer::QuestionType::Regulatory => {
                "identify the governing regulatory requirements first, since they bound every other choice"
            }
            crate::analyzer::QuestionType::General => {
                "break the problem into the decision that matters most right now and the ones that can wait"
            }
        };

        format!(
            "Speaking as {role}: the most useful first move here is to {angle}. From there, \
             set a short feedback loop - decide, act small, measure, and revisit - rather than \
             trying to resolve everything in one pass.{specialties}"
        )
    }
}

fn snapshot(profile: &AdvisorProfile, persona: Option<&PersonaDescriptor>) -> PersonaSnapshot {
    match persona {
        Some(p) => PersonaSnapshot {
            name: profile.name.clone(),
            expertise: p.expertise.clone(),
            tone: p.tone.clone(),
        },
        None => PersonaSnapshot {
            name: profile.name.clone(),
            expertise: profile.specialties.clone(),
            tone: "professional".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaCatalog;

    fn generator() -> StaticResponseGenerator {
        StaticResponseGenerator::new()
    }

    #[test]
    fn test_unknown_advisor_still_gets_long_content() {
        let profile = AdvisorProfile::new("ghost", "Alex", "Growth Advisor", "prodboard");
        let response = generator().generate(&profile, None, "what now?", "prodboard", None);
        assert!(response.content.trim().len() > 50);
        assert_eq!(response.metadata.source, ResponseSource::Static);
    }

    #[test]
    fn test_diabetic_millet_trigger() {
        let profile = AdvisorProfile::new("well-nutrition", "Priya", "Clinical Nutritionist", "wellness");
        let catalog = PersonaCatalog::new();
        let response = generator().generate(
            &profile,
            catalog.get("well-nutrition"),
            "Is millet good for a diabetic diet?",
            "wellness",
            None,
        );
        assert!(response.content.contains("millet"));
        assert!(response.content.contains("glycemic"));
        assert!(response.content.contains("Clinical Nutritionist"));
    }

    #[test]
    fn test_clinical_trial_trigger_mentions_fda() {
        let profile = AdvisorProfile::new(
            "clin-regulatory",
            "Maria",
            "Regulatory Affairs Director",
            "cliniboard",
        );
        let response = generator().generate(
            &profile,
            None,
            "How do we design a Phase III clinical trial?",
            "cliniboard",
            None,
        );
        assert!(response.content.contains("FDA") || response.content.contains("regulatory"));
        assert!(response.content.len() > 100);
    }

    #[test]
    fn test_persona_styled_tier_cites_frameworks() {
        let catalog = PersonaCatalog::new();
        let profile = AdvisorProfile::new("prod-strategy", "Sam", "Product Strategy Advisor", "prodboard");
        // No prodboard trigger word in the question, so tier 2 applies
        let response = generator().generate(
            &profile,
            catalog.get("prod-strategy"),
            "How should we think about pricing?",
            "prodboard",
            None,
        );
        assert!(response.content.contains("Jobs to be Done"));
        assert!(!response.metadata.frameworks.is_empty());
    }

    #[test]
    fn test_deterministic_content() {
        let profile = AdvisorProfile::new("ghost", "Alex", "Advisor", "general");
        let a = generator().generate(&profile, None, "help me plan", "general", None);
        let b = generator().generate(&profile, None, "help me plan", "general", None);
        assert_eq!(a.content, b.content);
    }

    #[test]
    fn test_empty_question_and_role_still_safe() {
        let profile = AdvisorProfile::new("x", "", "", "");
        let response = generator().generate(&profile, None, "", "", None);
        assert!(response.content.contains("Professional Advisor"));
        assert!(response.content.trim().len() > 50);
    }
}
