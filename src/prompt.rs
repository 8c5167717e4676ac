//! Prompt Assembly Module
//!
//! Turns a persona (or a bare advisor profile), the question and its
//! analysis into one model prompt. Deterministic for fixed inputs and
//! tolerant of missing fields - neutral defaults, never a panic.

use crate::analyzer::QuestionAnalysis;
use crate::persona::PersonaDescriptor;
use crate::response::AdvisorProfile;

/// Cross-board coordination: when several topic boards answer the same
/// question at once, each advisor is told which lanes are not theirs.
#[derive(Debug, Clone, Default)]
pub struct CoordinationPolicy {
    /// All domains participating in this request, including the advisor's own.
    pub active_domains: Vec<String>,
}

impl CoordinationPolicy {
    pub fn new<S: Into<String>>(domains: Vec<S>) -> Self {
        Self {
            active_domains: domains.into_iter().map(Into::into).collect(),
        }
    }

    fn complementary(&self, own_domain: &str) -> Vec<&str> {
        self.active_domains
            .iter()
            .map(|d| d.as_str())
            .filter(|d| *d != own_domain && !d.is_empty())
            .collect()
    }
}

/// Human-readable board name for lane-restriction text.
fn domain_label(domain: &str) -> &str {
    match domain {
        "wellness" => "Wellness & Nutrition",
        "cliniboard" => "Clinical Research & Regulatory",
        "eduboard" => "Education & Learning Design",
        "prodboard" => "Product & Engineering",
        _ => "General Advisory",
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the full model prompt. With a curated persona the prompt
    /// carries its voice anchor and frameworks; without one it falls back
    /// to a generic professional-advisor framing built only from the
    /// caller-supplied profile - credentials are never invented.
    pub fn build(
        persona: Option<&PersonaDescriptor>,
        profile: &AdvisorProfile,
        question: &str,
        analysis: &QuestionAnalysis,
        policy: Option<&CoordinationPolicy>,
    ) -> String {
        let question = or_default(question, "(no question was provided)");

        let mut prompt = match persona {
            Some(p) => Self::persona_header(p, analysis),
            None => Self::generic_header(profile),
        };

        let domain = match persona {
            Some(p) => p.domain.as_str(),
            None => profile.domain.as_str(),
        };

        if let Some(policy) = policy {
            let others = policy.complementary(domain);
            if !others.is_empty() {
                prompt.push_str("\n## Board Coordination\n");
                prompt.push_str(&format!(
                    "You are answering as part of the {} board alongside other boards. \
                     Stay strictly in your lane:\n",
                    domain_label(domain)
                ));
                for other in &others {
                    prompt.push_str(&format!(
                        "- Questions of {} belong to the {} board; explicitly defer rather \
                         than answering them yourself.\n",
                        domain_label(other),
                        domain_label(other)
                    ));
                }
                prompt.push_str(
                    "If part of the question is outside your lane, say so and point to the \
                     right board instead of overreaching.\n",
                );
            }
        }

        prompt.push_str(&format!(
            "\n## Question\n{}\n\n## Response Rules\n\
             - Answer in your own professional voice; no meta commentary.\n\
             - Be specific and actionable; avoid generic filler.\n\
             - Classified intent: {} (confidence {:.2}). Shape the answer accordingly.\n",
            question,
            analysis.question_type.as_str(),
            analysis.confidence
        ));

        prompt
    }

    fn persona_header(persona: &PersonaDescriptor, analysis: &QuestionAnalysis) -> String {
        let role = or_default(&persona.role, "Professional Advisor");
        let background = or_default(&persona.background, "An experienced domain advisor.");
        let tone = or_default(&persona.tone, "professional and direct");

        let expertise = if persona.expertise.is_empty() {
            "- General advisory experience".to_string()
        } else {
            persona
                .expertise
                .iter()
                .map(|e| format!("- {}", e))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let frameworks = if persona.frameworks.is_empty() {
            String::new()
        } else {
            format!(
                "\n## Frameworks You Reason With\n{}\n",
                persona
                    .frameworks
                    .iter()
                    .map(|f| format!("- {}", f))
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        };

        // The per-type template is a voice anchor, not content to recite.
        let anchor = persona
            .template_for(analysis.question_type.as_str())
            .unwrap_or("Give concrete, experience-backed advice.");

        format!(
            "You are {role}, a member of an expert advisory board.\n\n\
             ## Role Context\n{background}\n\n\
             ## Expertise\n{expertise}\n\n\
             ## Response Style\nYour tone is {tone}.\n{frameworks}\n\
             ## Voice Anchor\n{anchor}\n"
        )
    }

    fn generic_header(profile: &AdvisorProfile) -> String {
        let name = or_default(&profile.name, "the advisor");
        let role = or_default(&profile.role, "Professional Advisor");

        let mut header = format!(
            "You are {name}, answering as {role} on an expert advisory board. \
             Speak only from the experience described below; do not invent \
             credentials or affiliations.\n"
        );

        if !profile.background.trim().is_empty() {
            header.push_str(&format!("\n## Role Context\n{}\n", profile.background));
        }
        if !profile.specialties.is_empty() {
            header.push_str(&format!(
                "\n## Specialties\n{}\n",
                profile
                    .specialties
                    .iter()
                    .map(|s| format!("- {}", s))
                    .collect::<Vec<_>>()
                    .join("\n")
            ));
        }

        header.push_str(
            "\n## Response Style\nYour tone is professional, direct and grounded in \
             practical experience.\n",
        );
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::QuestionAnalyzer;
    use crate::persona::PersonaCatalog;

    fn profile() -> AdvisorProfile {
        AdvisorProfile::new("clin-regulatory", "Maria", "Regulatory Affairs Director", "cliniboard")
    }

    #[test]
    fn test_deterministic() {
        let catalog = PersonaCatalog::new();
        let analyzer = QuestionAnalyzer::new();
        let analysis = analyzer.analyze("How do we plan the FDA submission?", None);
        let persona = catalog.get("clin-regulatory");
        let a = PromptBuilder::build(persona, &profile(), "How do we plan the FDA submission?", &analysis, None);
        let b = PromptBuilder::build(persona, &profile(), "How do we plan the FDA submission?", &analysis, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_persona_prompt_carries_anchor_and_frameworks() {
        let catalog = PersonaCatalog::new();
        let analyzer = QuestionAnalyzer::new();
        let analysis = analyzer.analyze("What does the FDA require for approval?", None);
        let prompt = PromptBuilder::build(
            catalog.get("clin-regulatory"),
            &profile(),
            "What does the FDA require for approval?",
            &analysis,
            None,
        );
        assert!(prompt.contains("Regulatory Affairs Director"));
        assert!(prompt.contains("ICH E6"));
        assert!(prompt.contains("## Voice Anchor"));
        assert!(prompt.contains("What does the FDA require for approval?"));
    }

    #[test]
    fn test_generic_prompt_when_persona_absent() {
        let analyzer = QuestionAnalyzer::new();
        let analysis = analyzer.analyze("Any advice?", None);
        let mut p = profile();
        p.background = "Ten years in market access.".to_string();
        let prompt = PromptBuilder::build(None, &p, "Any advice?", &analysis, None);
        assert!(prompt.contains("Maria"));
        assert!(prompt.contains("Ten years in market access."));
        assert!(prompt.contains("do not invent"));
    }

    #[test]
    fn test_lane_rules_injected_for_multi_board() {
        let analyzer = QuestionAnalyzer::new();
        let analysis = analyzer.analyze("How should we advise diabetic students?", None);
        let policy = CoordinationPolicy::new(vec!["cliniboard", "wellness", "eduboard"]);
        let prompt = PromptBuilder::build(None, &profile(), "How should we advise diabetic students?", &analysis, Some(&policy));
        assert!(prompt.contains("Stay strictly in your lane"));
        assert!(prompt.contains("Wellness & Nutrition"));
        assert!(prompt.contains("Education & Learning Design"));
        // Own board never appears as a lane to defer to
        assert!(!prompt.contains("belong to the Clinical Research & Regulatory board"));
    }

    #[test]
    fn test_empty_inputs_use_neutral_defaults() {
        let analyzer = QuestionAnalyzer::new();
        let analysis = analyzer.analyze("", None);
        let empty = AdvisorProfile::new("x", "", "", "");
        let prompt = PromptBuilder::build(None, &empty, "", &analysis, None);
        assert!(prompt.contains("Professional Advisor"));
        assert!(prompt.contains("(no question was provided)"));
    }

    #[test]
    fn test_single_board_policy_adds_no_lane_rules() {
        let analyzer = QuestionAnalyzer::new();
        let analysis = analyzer.analyze("q", None);
        let policy = CoordinationPolicy::new(vec!["cliniboard"]);
        let prompt = PromptBuilder::build(None, &profile(), "q", &analysis, Some(&policy));
        assert!(!prompt.contains("Board Coordination"));
    }
}
