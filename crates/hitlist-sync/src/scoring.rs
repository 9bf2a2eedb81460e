//! Seniority, location and fit gates.

use std::path::Path;

use anyhow::Context;
use regex::{escape, RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NO_RELEVANT_CONTENT: &str = "no_relevant_content";
pub const TARGET_TITLE: &str = "target_title";
pub const LEAD_PENALTY: &str = "lead_penalty";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid {list} pattern: {source}")]
    Pattern {
        list: &'static str,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub tag: String,
    pub weight: u32,
    pub keywords: Vec<String>,
}

/// Keyword taxonomy and thresholds. `seniority_patterns` and `lead_patterns` are regexes,
/// every other list holds plain phrases matched separator-tolerantly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub seniority_patterns: Vec<String>,
    pub entry_level_overrides: Vec<String>,
    pub disallowed_regions: Vec<String>,
    pub allowed_regions: Vec<String>,
    pub target_titles: Vec<String>,
    pub target_title_weight: u32,
    pub categories: Vec<KeywordCategory>,
    pub relevance_tokens: Vec<String>,
    pub lead_patterns: Vec<String>,
    pub lead_penalty: u32,
    pub negative_hints: Vec<String>,
    pub negative_hint_penalty: u32,
    pub negative_hint_cap: u32,
    pub admission_threshold: u32,
    pub max_matched_keywords: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            seniority_patterns: strings(&[
                r"\b(senior|sr)\b",
                r"\b(staff|principal|director)\b",
                r"\b(vp|svp|vice\s+president|head\s+of|chief)\b",
                r"\bengineering\s+manager\b",
                r"\bmanager,?\s+(of\s+)?(machine\s+learning|ml|ai|engineering)\b",
                r"\bpeople\s+manager\b",
            ]),
            entry_level_overrides: strings(&[
                "intern",
                "internship",
                "new grad",
                "new graduate",
                "entry level",
                "junior",
                "associate",
            ]),
            disallowed_regions: strings(&[
                "canada", "uk", "united kingdom", "london", "europe", "india", "singapore",
                "australia", "bangalore", "toronto", "berlin", "paris", "tokyo", "remote eu",
            ]),
            allowed_regions: strings(&[
                "united states", "u.s.", "usa", "massachusetts", "boston", "cambridge",
                "new york", "nyc", "california", "san francisco", "seattle", "austin",
                "remote (us", "remote us", "us only", "us remote",
            ]),
            target_titles: strings(&[
                "ai engineer",
                "machine learning engineer",
                "ml engineer",
                "llm engineer",
                "generative ai",
                "genai",
                "applied scientist",
                "research scientist",
                "machine learning scientist",
                "data scientist",
                "computer vision",
                "nlp engineer",
                "mlops engineer",
            ]),
            target_title_weight: 30,
            categories: vec![
                KeywordCategory {
                    tag: "llm_genai".into(),
                    weight: 25,
                    keywords: strings(&[
                        "llm", "generative ai", "rag", "retrieval augmented", "agent", "agentic",
                        "langchain", "bedrock", "faiss", "pinecone", "chroma", "vector database",
                        "embedding", "prompt engineering",
                    ]),
                },
                KeywordCategory {
                    tag: "cv_multimodal".into(),
                    weight: 20,
                    keywords: strings(&[
                        "computer vision", "vision", "multimodal", "clip", "openclip", "grad-cam",
                        "resnet", "efficientnet", "semantic search", "image classification",
                        "object detection", "segmentation",
                    ]),
                },
                KeywordCategory {
                    tag: "mlops_infra".into(),
                    weight: 15,
                    keywords: strings(&[
                        "aws", "ecs", "eks", "docker", "kubernetes", "fastapi", "onnx",
                        "quantization", "ci/cd", "github actions", "mlops", "ml infrastructure",
                        "terraform", "cloudformation",
                    ]),
                },
            ],
            relevance_tokens: strings(&["machine learning", "ml", "ai", "llm"]),
            lead_patterns: strings(&[r"\blead\s"]),
            lead_penalty: 15,
            negative_hints: strings(&[
                "phd required", "10+ years", "12+ years", "15+ years", "principal engineer",
                "staff engineer", "director",
            ]),
            negative_hint_penalty: 10,
            negative_hint_cap: 30,
            admission_threshold: 35,
            max_matched_keywords: 5,
        }
    }
}

impl ScoringRules {
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

/// Regex for a keyword phrase: words joined by runs of whitespace, `-`, `_` or `/`,
/// word-bounded wherever the phrase starts or ends on an alphanumeric character.
pub fn phrase_pattern(phrase: &str) -> String {
    let is_separator = |c: char| c.is_whitespace() || matches!(c, '-' | '_' | '/');
    let words: Vec<&str> = phrase
        .split(is_separator)
        .filter(|word| !word.is_empty())
        .collect();
    let body = words
        .iter()
        .map(|word| escape(word))
        .collect::<Vec<_>>()
        .join(r"[\s\-_/]+");
    let starts_alnum = words
        .first()
        .and_then(|w| w.chars().next())
        .is_some_and(|c| c.is_alphanumeric());
    let ends_alnum = words
        .last()
        .and_then(|w| w.chars().last())
        .is_some_and(|c| c.is_alphanumeric());
    format!(
        "{}{}{}",
        if starts_alnum { r"\b" } else { "" },
        body,
        if ends_alnum { r"\b" } else { "" }
    )
}

fn compile_set<I, S>(list: &'static str, patterns: I) -> Result<RegexSet, RuleError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .build()
        .map_err(|source| RuleError::Pattern { list, source })
}

fn compile_phrases(list: &'static str, phrases: &[String]) -> Result<RegexSet, RuleError> {
    compile_set(list, phrases.iter().map(|p| phrase_pattern(p)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    Senior,
    OutsideUs,
    NoRelevantContent,
    LowFit { score: u32 },
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Senior => "senior",
            RejectReason::OutsideUs => "outside_us",
            RejectReason::NoRelevantContent => NO_RELEVANT_CONTENT,
            RejectReason::LowFit { .. } => "low_fit",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FitAssessment {
    pub score: u32,
    pub reasons: Vec<String>,
    pub matched_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FilterVerdict {
    Admitted(FitAssessment),
    Rejected(RejectReason),
}

impl FilterVerdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, FilterVerdict::Admitted(_))
    }
}

#[derive(Debug)]
struct CompiledCategory {
    tag: String,
    weight: u32,
    keywords: Vec<String>,
    set: RegexSet,
}

/// Compiled form of [`ScoringRules`]. Immutable once built.
#[derive(Debug)]
pub struct FilterEngine {
    rules: ScoringRules,
    seniority: RegexSet,
    entry_level: RegexSet,
    disallowed: RegexSet,
    allowed: RegexSet,
    target_titles: RegexSet,
    categories: Vec<CompiledCategory>,
    relevance: RegexSet,
    lead: RegexSet,
    negative_hints: RegexSet,
}

impl FilterEngine {
    pub fn new(rules: ScoringRules) -> Result<Self, RuleError> {
        let categories = rules
            .categories
            .iter()
            .map(|category| {
                Ok(CompiledCategory {
                    tag: category.tag.clone(),
                    weight: category.weight,
                    keywords: category.keywords.clone(),
                    set: compile_phrases("category keyword", &category.keywords)?,
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;
        Ok(Self {
            seniority: compile_set("seniority", &rules.seniority_patterns)?,
            entry_level: compile_phrases("entry-level override", &rules.entry_level_overrides)?,
            disallowed: compile_phrases("disallowed region", &rules.disallowed_regions)?,
            allowed: compile_phrases("allowed region", &rules.allowed_regions)?,
            target_titles: compile_phrases("target title", &rules.target_titles)?,
            categories,
            relevance: compile_phrases("relevance token", &rules.relevance_tokens)?,
            lead: compile_set("lead", &rules.lead_patterns)?,
            negative_hints: compile_phrases("negative hint", &rules.negative_hints)?,
            rules,
        })
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// An entry-level phrase in the title always overrides a seniority match.
    pub fn is_senior(&self, title: &str) -> bool {
        !self.entry_level.is_match(title) && self.seniority.is_match(title)
    }

    /// Relaxed: only a non-US indicator without any US indicator rejects.
    pub fn is_us_eligible(&self, title: &str, description: &str) -> bool {
        let text = format!("{title} {description}");
        !(self.disallowed.is_match(&text) && !self.allowed.is_match(&text))
    }

    pub fn assess_fit(&self, title: &str, description: &str) -> FitAssessment {
        let text = format!("{title} {description}");
        let mut score: i64 = 0;
        let mut reasons = Vec::new();

        if self.target_titles.is_match(title) {
            score += i64::from(self.rules.target_title_weight);
            reasons.push(TARGET_TITLE.to_string());
        } else if !self.relevance.is_match(&text) {
            return FitAssessment {
                score: 0,
                reasons: vec![NO_RELEVANT_CONTENT.to_string()],
                matched_keywords: Vec::new(),
            };
        }

        let mut matched_keywords = Vec::new();
        for category in &self.categories {
            let hits: Vec<usize> = category.set.matches(&text).into_iter().collect();
            if hits.is_empty() {
                continue;
            }
            score += i64::from(category.weight);
            if !reasons.contains(&category.tag) {
                reasons.push(category.tag.clone());
            }
            matched_keywords.extend(hits.into_iter().map(|i| category.keywords[i].clone()));
        }

        let negative = self.negative_hints.matches(&text).iter().count() as u32;
        if negative > 0 {
            let penalty = negative
                .saturating_mul(self.rules.negative_hint_penalty)
                .min(self.rules.negative_hint_cap);
            score -= i64::from(penalty);
            reasons.push(format!("negative_hints_{negative}"));
        }

        if self.lead.is_match(title) {
            score -= i64::from(self.rules.lead_penalty);
            reasons.push(LEAD_PENALTY.to_string());
        }

        matched_keywords.dedup();
        matched_keywords.truncate(self.rules.max_matched_keywords);
        FitAssessment {
            score: u32::try_from(score.max(0)).unwrap_or(u32::MAX),
            reasons,
            matched_keywords,
        }
    }

    /// Run the gates in order, stopping at the first rejection.
    pub fn evaluate(&self, title: &str, description: &str) -> FilterVerdict {
        if self.is_senior(title) {
            return FilterVerdict::Rejected(RejectReason::Senior);
        }
        if !self.is_us_eligible(title, description) {
            return FilterVerdict::Rejected(RejectReason::OutsideUs);
        }
        let fit = self.assess_fit(title, description);
        if fit.reasons.iter().any(|r| r == NO_RELEVANT_CONTENT) {
            return FilterVerdict::Rejected(RejectReason::NoRelevantContent);
        }
        if fit.score < self.rules.admission_threshold {
            return FilterVerdict::Rejected(RejectReason::LowFit { score: fit.score });
        }
        FilterVerdict::Admitted(fit)
    }
}
