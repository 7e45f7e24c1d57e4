//! Optional AI explanation hook (§9). The numeric percentage and severity
//! always come from §4.7; this trait only ever supplies a natural-language
//! gloss on numbers the detector already computed, never adjusts them.

use async_trait::async_trait;

use crate::domain::{CandidateMatch, Severity};

#[async_trait]
pub trait NarrativeExplainer: Send + Sync + std::fmt::Debug {
    async fn explain(&self, percentage: f64, severity: Severity, matches: &[CandidateMatch]) -> String;
}

/// Deterministic rule-based explanation (§4.7): no external model is
/// required for this field.
#[derive(Debug, Default, Clone)]
pub struct RuleBasedExplainer;

#[async_trait]
impl NarrativeExplainer for RuleBasedExplainer {
    async fn explain(&self, percentage: f64, severity: Severity, matches: &[CandidateMatch]) -> String {
        rule_based_explanation(percentage, severity, matches.len())
    }
}

pub fn rule_based_explanation(percentage: f64, severity: Severity, match_count: usize) -> String {
    match severity {
        Severity::Safe => "No significant overlap with known sources was found.".to_string(),
        Severity::Low => format!(
            "Minor overlap detected ({percentage:.1}%) across {match_count} qualifying match(es); likely coincidental phrasing."
        ),
        Severity::Medium => format!(
            "Moderate overlap detected ({percentage:.1}%) across {match_count} qualifying match(es); review recommended."
        ),
        Severity::High => format!(
            "Substantial overlap detected ({percentage:.1}%) across {match_count} qualifying match(es); likely paraphrased copying."
        ),
        Severity::Critical => format!(
            "Near-identical content detected ({percentage:.1}%) across {match_count} qualifying match(es); likely direct copying."
        ),
    }
}

/// Stub LLM-backed explainer, gated behind `include_ai_analysis` (§6). The
/// numeric verdict is computed before this is ever called and is passed in
/// read-only; this can only replace the explanation string.
#[derive(Debug)]
pub struct LlmExplainer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmExplainer {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl NarrativeExplainer for LlmExplainer {
    async fn explain(&self, percentage: f64, severity: Severity, matches: &[CandidateMatch]) -> String {
        let fallback = rule_based_explanation(percentage, severity, matches.len());
        let prompt = format!(
            "Explain in one sentence why a submission scored {percentage:.1}% plagiarism \
             ({severity:?}) against {} source match(es). Do not change the score.",
            matches.len()
        );

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let mut request = self.client.post(format!("{}/chat/completions", self.base_url)).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| {
                    v["choices"][0]["message"]["content"]
                        .as_str()
                        .map(str::to_string)
                })
                .unwrap_or(fallback),
            _ => fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_severity_has_no_qualifying_matches_language() {
        let text = rule_based_explanation(0.0, Severity::Safe, 0);
        assert!(text.contains("No significant overlap"));
    }

    #[test]
    fn critical_severity_mentions_direct_copying() {
        let text = rule_based_explanation(97.0, Severity::Critical, 3);
        assert!(text.contains("direct copying"));
    }
}
