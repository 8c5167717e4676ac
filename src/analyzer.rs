//! Question Analysis Module
//!
//! Classifies a free-text question into a type, domain, keyword set and
//! confidence using ordered keyword-family tables. Pure, deterministic and
//! infallible: any input (including empty) produces a usable analysis.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Supported question intent classifications. The table order in
/// [`QuestionAnalyzer::new`] is the tie-break preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// "What could we build?" - open-ended idea generation
    Ideation,
    /// "Should we / how should we position?" - planning and direction
    Strategy,
    /// "How does it work / how do we implement?" - execution detail
    Technical,
    /// Compliance and submission questions (clinical/regulatory extension)
    Regulatory,
    /// Anything that matches no family
    General,
}

impl QuestionType {
    /// Key used to select a persona response template.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Ideation => "ideation",
            QuestionType::Strategy => "strategy",
            QuestionType::Technical => "technical",
            QuestionType::Regulatory => "regulatory",
            QuestionType::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

/// Ephemeral per-question classification result. Confidence is always in
/// (0, 0.95]; a zero would break downstream weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    pub question_type: QuestionType,
    pub domain: String,
    pub keywords: Vec<String>,
    pub confidence: f32,
    pub complexity: Complexity,
    pub urgent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

impl QuestionAnalysis {
    /// Safe default used when a question carries no signal at all.
    pub fn fallback(domain_hint: Option<&str>) -> Self {
        Self {
            question_type: QuestionType::General,
            domain: domain_hint.unwrap_or("general").to_string(),
            keywords: Vec::new(),
            confidence: 0.5,
            complexity: Complexity::Low,
            urgent: false,
            sentiment: None,
        }
    }
}

struct TypeFamily {
    label: QuestionType,
    weight: f32,
    matcher: Regex,
}

struct DomainFamily {
    label: &'static str,
    matcher: Regex,
}

/// The classifier. Compile once, share freely: `analyze` takes `&self` and
/// touches no mutable state.
pub struct QuestionAnalyzer {
    type_families: Vec<TypeFamily>,
    domain_families: Vec<DomainFamily>,
    urgency: Regex,
    positive: Regex,
    negative: Regex,
}

fn family(words: &[&str]) -> Regex {
    // Word-boundary alternation over the keyword list. The keyword tables
    // are static and lowercase, so compilation cannot fail at runtime.
    let pattern = format!(r"\b({})\b", words.join("|"));
    Regex::new(&pattern).unwrap()
}

impl Default for QuestionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionAnalyzer {
    pub fn new() -> Self {
        // Type families in tie-break preference order:
        // ideation > strategy > technical > regulatory > general.
        let type_families = vec![
            TypeFamily {
                label: QuestionType::Ideation,
                weight: 1.2,
                matcher: family(&[
                    "brainstorm",
                    "idea",
                    "ideas",
                    "imagine",
                    "invent",
                    "creative",
                    "concept",
                    "concepts",
                    "innovative",
                    "what if",
                    "could we",
                    "new product",
                    "opportunit(?:y|ies)",
                ]),
            },
            TypeFamily {
                label: QuestionType::Strategy,
                weight: 1.0,
                matcher: family(&[
                    "strategy",
                    "strategic",
                    "roadmap",
                    "prioritize",
                    "positioning",
                    "market",
                    "growth",
                    "plan",
                    "planning",
                    "should we",
                    "trade-?offs?",
                    "long-?term",
                    "scale",
                    "scaling",
                ]),
            },
            TypeFamily {
                label: QuestionType::Technical,
                weight: 1.0,
                matcher: family(&[
                    "implement",
                    "implementation",
                    "architecture",
                    "design",
                    "build",
                    "integrate",
                    "integration",
                    "stack",
                    "protocol",
                    "dosage",
                    "mechanism",
                    "methodology",
                    "how does",
                    "how do we",
                ]),
            },
            TypeFamily {
                label: QuestionType::Regulatory,
                weight: 1.3,
                matcher: family(&[
                    "fda",
                    "ema",
                    "regulatory",
                    "regulation",
                    "compliance",
                    "compliant",
                    "submission",
                    "approval",
                    "phase i{1,3}",
                    "clinical trial",
                    "ind",
                    "nda",
                    "audit",
                ]),
            },
        ];

        // Domain families in the fixed disambiguation priority order for
        // unscoped questions: wellness terms are checked before clinical,
        // clinical before education, education before product. A question
        // mentioning both "diabetic" and "product" routes to wellness. This
        // ordering is routing-visible behavior; do not reorder.
        let domain_families = vec![
            DomainFamily {
                label: "wellness",
                matcher: family(&[
                    "nutrition",
                    "nutritional",
                    "diet",
                    "dietary",
                    "diabetic",
                    "diabetes",
                    "millet",
                    "wellness",
                    "fitness",
                    "sleep",
                    "stress",
                    "glycemic",
                    "holistic",
                ]),
            },
            DomainFamily {
                label: "cliniboard",
                matcher: family(&[
                    "clinical",
                    "trial",
                    "fda",
                    "ema",
                    "patient",
                    "endpoint",
                    "protocol",
                    "regulatory",
                    "pharmacovigilance",
                    "biostatistics",
                    "enrollment",
                ]),
            },
            DomainFamily {
                label: "eduboard",
                matcher: family(&[
                    "education",
                    "curriculum",
                    "student",
                    "students",
                    "learning",
                    "classroom",
                    "teacher",
                    "pedagogy",
                    "course",
                    "assessment",
                ]),
            },
            DomainFamily {
                label: "prodboard",
                matcher: family(&[
                    "product",
                    "feature",
                    "roadmap",
                    "user",
                    "users",
                    "retention",
                    "onboarding",
                    "launch",
                    "mvp",
                    "backlog",
                    "metrics",
                ]),
            },
        ];

        Self {
            type_families,
            domain_families,
            urgency: family(&["urgent", "urgently", "asap", "immediately", "deadline", "today"]),
            positive: family(&["excited", "great", "love", "opportunity", "improve", "best"]),
            negative: family(&["worried", "concern", "concerned", "risk", "failing", "problem", "stuck"]),
        }
    }

    /// Classify a question. Never fails: empty or signal-free input yields
    /// the safe default (`general`, confidence 0.5).
    pub fn analyze(&self, question: &str, domain_hint: Option<&str>) -> QuestionAnalysis {
        let q = question.trim().to_lowercase();
        if q.is_empty() {
            return QuestionAnalysis::fallback(domain_hint);
        }

        let word_count = q.split_whitespace().count().max(1);

        // Highest weighted match count wins; on equal score the earlier
        // family in the table wins, keeping classification deterministic.
        let mut best_type = QuestionType::General;
        let mut best_score = 0.0f32;
        let mut total_matches = 0usize;
        let mut keywords: Vec<String> = Vec::new();

        for fam in &self.type_families {
            let hits: Vec<&str> = fam.matcher.find_iter(&q).map(|m| m.as_str()).collect();
            if hits.is_empty() {
                continue;
            }
            total_matches += hits.len();
            for hit in &hits {
                if !keywords.iter().any(|k| k == hit) {
                    keywords.push(hit.to_string());
                }
            }
            let score = hits.len() as f32 * fam.weight;
            if score > best_score {
                best_score = score;
                best_type = fam.label;
            }
        }

        let domain = match domain_hint {
            Some(hint) if !hint.trim().is_empty() => hint.to_string(),
            _ => self.classify_domain(&q),
        };

        // Also surface domain vocabulary in the ranked keyword list.
        for fam in &self.domain_families {
            for m in fam.matcher.find_iter(&q) {
                let hit = m.as_str();
                if !keywords.iter().any(|k| k == hit) {
                    keywords.push(hit.to_string());
                }
            }
        }

        let confidence = if total_matches == 0 {
            0.5
        } else {
            let density = total_matches as f32 / word_count as f32;
            (0.4 + 0.08 * total_matches as f32 + 0.3 * density).clamp(0.05, 0.95)
        };

        let complexity = if word_count < 8 {
            Complexity::Low
        } else if word_count < 25 {
            Complexity::Medium
        } else {
            Complexity::High
        };

        let sentiment = if self.negative.is_match(&q) {
            Some(Sentiment::Negative)
        } else if self.positive.is_match(&q) {
            Some(Sentiment::Positive)
        } else {
            None
        };

        QuestionAnalysis {
            question_type: best_type,
            domain,
            keywords,
            confidence,
            complexity,
            urgent: self.urgency.is_match(&q),
            sentiment,
        }
    }

    /// First domain family (in priority order) with any match wins.
    fn classify_domain(&self, q: &str) -> String {
        for fam in &self.domain_families {
            if fam.matcher.is_match(q) {
                return fam.label.to_string();
            }
        }
        "general".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let analyzer = QuestionAnalyzer::new();
        let q = "Should we prioritize the roadmap or brainstorm new ideas?";
        let a = analyzer.analyze(q, None);
        let b = analyzer.analyze(q, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_question_is_safe() {
        let analyzer = QuestionAnalyzer::new();
        let a = analyzer.analyze("", None);
        assert_eq!(a.question_type, QuestionType::General);
        assert!(a.confidence > 0.0);
        assert!(a.keywords.is_empty());
    }

    #[test]
    fn test_confidence_bounds() {
        let analyzer = QuestionAnalyzer::new();
        let questions = [
            "hi",
            "How do we design a Phase III clinical trial?",
            "brainstorm ideas strategy roadmap implement architecture fda compliance",
            "What is the best diet plan for a diabetic patient eating millet every day?",
        ];
        for q in questions {
            let a = analyzer.analyze(q, None);
            assert!(a.confidence > 0.0 && a.confidence <= 0.95, "q={q} conf={}", a.confidence);
        }
    }

    #[test]
    fn test_ideation_wins_ties() {
        let analyzer = QuestionAnalyzer::new();
        // One ideation hit vs one strategy hit: ideation's higher weight and
        // earlier table position both point the same way.
        let a = analyzer.analyze("Let's brainstorm the plan", None);
        assert_eq!(a.question_type, QuestionType::Ideation);
    }

    #[test]
    fn test_regulatory_classification() {
        let analyzer = QuestionAnalyzer::new();
        let a = analyzer.analyze("What does the FDA require for our submission?", None);
        assert_eq!(a.question_type, QuestionType::Regulatory);
    }

    #[test]
    fn test_domain_priority_wellness_beats_product() {
        let analyzer = QuestionAnalyzer::new();
        let a = analyzer.analyze("Is our product safe for a diabetic user?", None);
        assert_eq!(a.domain, "wellness");
    }

    #[test]
    fn test_domain_priority_clinical_beats_education() {
        let analyzer = QuestionAnalyzer::new();
        let a = analyzer.analyze("How do we teach students about clinical trial design?", None);
        assert_eq!(a.domain, "cliniboard");
    }

    #[test]
    fn test_domain_hint_overrides_classification() {
        let analyzer = QuestionAnalyzer::new();
        let a = analyzer.analyze("Is our product safe for a diabetic user?", Some("prodboard"));
        assert_eq!(a.domain, "prodboard");
    }

    #[test]
    fn test_urgency_and_sentiment() {
        let analyzer = QuestionAnalyzer::new();
        let a = analyzer.analyze("We are worried and need an answer urgently", None);
        assert!(a.urgent);
        assert_eq!(a.sentiment, Some(Sentiment::Negative));
    }

    #[test]
    fn test_keywords_collected() {
        let analyzer = QuestionAnalyzer::new();
        let a = analyzer.analyze("How do we design the clinical trial protocol?", None);
        assert!(!a.keywords.is_empty());
        assert!(a.keywords.iter().any(|k| k == "design" || k == "clinical trial"));
    }
}
