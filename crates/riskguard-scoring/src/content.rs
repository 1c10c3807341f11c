//! Content Analyzer (C5) — spec.md §4.5.
//!
//! No direct teacher analogue; grounded on the teacher's validation-rule
//! style in `chronx_dag::validation` (a chain of independent checks, each
//! contributing a bounded penalty, folded into one score).

use riskguard_core::{RiskError, SimulationType, Transaction};
use serde_json::{json, Map, Value};

use crate::similarity::similarity_ratio;

const DENYLISTED_TLDS: &[&str] = &[".xyz", ".tk", ".ml", ".ga", ".cf", ".gq"];
const SUSPICIOUS_KEYWORDS: &[&str] = &["secure", "verify", "login", "bank", "authenticate"];
const ALLOWLISTED_DOMAINS: &[&str] = &[
    "paypal.com",
    "venmo.com",
    "zelle.com",
    "cashapp.com",
    "stripe.com",
    "chase.com",
];

pub struct ContentResult {
    pub score: f64,
    pub details: Value,
}

fn domain_of(url: &str) -> String {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let host = without_scheme.split('/').next().unwrap_or(without_scheme);
    host.split(':').next().unwrap_or(host).to_lowercase()
}

fn subdomain_depth(domain: &str) -> usize {
    domain.split('.').count().saturating_sub(2)
}

// Matches the bare keyword with optional hyphens on either side, mirroring
// the original's `r'-?secure-?'`/`r'-?verify-?'`/`r'-?authenticate-?'` —
// hyphens are decoration, not a requirement, so "securebank.xyz" must also
// trip this as much as "bank-secure-pay.xyz" does.
fn has_suspicious_pattern(domain: &str) -> bool {
    let bracket_pattern =
        domain.contains("secure") || domain.contains("verify") || domain.contains("authenticate");
    let long_digit_run = domain
        .as_bytes()
        .windows(5)
        .any(|w| w.iter().all(u8::is_ascii_digit));
    let long_alnum_run = domain
        .chars()
        .collect::<Vec<_>>()
        .windows(25)
        .any(|w| w.iter().all(|c| c.is_ascii_alphanumeric()));
    bracket_pattern || long_digit_run || long_alnum_run
}

/// spec.md §4.5 URL analysis.
///
/// Errors with `RiskError::Analysis` when `payment_url` carries no parseable
/// host at all (e.g. an empty string after stripping scheme/path) — the
/// Rust equivalent of `content_analyzer.py`'s `except Exception` around its
/// `urlparse` call, which in Python can raise on malformed input.
fn analyze_url(payment_url: &str) -> Result<(f64, Value), RiskError> {
    let mut score = 0.0f64;
    let mut hits = Vec::new();

    let is_https = payment_url.starts_with("https://");
    if !is_https {
        score += 0.3;
        hits.push("non_https");
    }

    let domain = domain_of(payment_url);
    if domain.is_empty() {
        return Err(RiskError::Analysis(format!("no parseable host in payment_url {payment_url:?}")));
    }
    let stripped = domain.strip_prefix("www.").unwrap_or(&domain).to_string();

    if DENYLISTED_TLDS.iter().any(|tld| domain.ends_with(tld)) {
        score += 0.3;
        hits.push("denylisted_tld");
    }

    if has_suspicious_pattern(&domain) {
        score += 0.2;
        hits.push("suspicious_pattern");
    }

    if SUSPICIOUS_KEYWORDS.iter().any(|kw| domain.contains(kw)) {
        score += 0.1;
        hits.push("suspicious_keyword");
    }

    let mut best_similarity = 0.0f64;
    for allowlisted in ALLOWLISTED_DOMAINS {
        let ratio = similarity_ratio(&stripped, allowlisted);
        if ratio > best_similarity {
            best_similarity = ratio;
        }
        if ratio > 0.7 && stripped != *allowlisted {
            score += 0.4;
            hits.push("lookalike_domain");
            break;
        }
    }

    let depth = subdomain_depth(&domain);
    if depth > 2 {
        score += 0.1 * (depth - 2) as f64;
        hits.push("deep_subdomain");
    }

    Ok((
        score.clamp(0.0, 1.0),
        json!({
            "domain": domain,
            "is_https": is_https,
            "subdomain_depth": depth,
            "best_allowlist_similarity": best_similarity,
            "flags": hits,
        }),
    ))
}

/// spec.md §4.5 QR analysis.
fn analyze_qr(tx: &Transaction, qr: &Map<String, Value>) -> (f64, Value) {
    if let Some(confidence) = qr.get("tampering_confidence").and_then(Value::as_f64) {
        let original = qr.get("original_receiver").and_then(Value::as_str);
        let tampered = qr.get("tampered_receiver").and_then(Value::as_str);
        return (
            confidence.clamp(0.0, 1.0),
            json!({
                "source": "declared_confidence",
                "original_receiver": original,
                "tampered_receiver": tampered,
            }),
        );
    }

    let declared_receiver = qr
        .get("payload")
        .and_then(|p| p.get("receiver_id"))
        .and_then(Value::as_str);
    if let Some(declared) = declared_receiver {
        if declared != tx.receiver_id.as_str() {
            return (
                0.9,
                json!({
                    "source": "receiver_mismatch",
                    "declared_receiver": declared,
                    "actual_receiver": tx.receiver_id.as_str(),
                }),
            );
        }
    }

    let checksum = qr.get("checksum").and_then(Value::as_str);
    let calculated = qr.get("calculated_checksum").and_then(Value::as_str);
    if let (Some(c), Some(calc)) = (checksum, calculated) {
        if c != calc {
            return (0.8, json!({ "source": "checksum_mismatch" }));
        }
    }

    (0.0, json!({ "source": "no_anomaly" }))
}

/// spec.md §4.5: combined analysis with simulation overrides.
pub fn analyze_content(tx: &Transaction) -> ContentResult {
    if tx.is_simulated {
        match tx.simulation_type {
            Some(SimulationType::PhishingUrl) => {
                return ContentResult {
                    score: 0.85,
                    details: json!({ "source": "simulation_override", "simulation_type": "phishing_url" }),
                };
            }
            Some(SimulationType::QrCodeTampering) => {
                return ContentResult {
                    score: 0.92,
                    details: json!({ "source": "simulation_override", "simulation_type": "qr_code_tampering" }),
                };
            }
            _ => {}
        }
    }

    let mut url_score = 0.0;
    let mut url_details = json!(null);
    if let Some(url) = tx.payment_url() {
        match analyze_url(url) {
            Ok((score, details)) => {
                url_score = score;
                url_details = details;
            }
            // spec.md §7 AnalysisError/C5: a URL analysis fault degrades to a
            // conservative sub-score rather than failing the whole job,
            // matching content_analyzer.py's `except Exception: risk_score =
            // 0.5; risk_details['error'] = str(e)`.
            Err(e) => {
                tracing::warn!(error = %e, "URL content analysis failed, degrading to conservative score");
                url_score = 0.5;
                url_details = json!({ "error": e.to_string() });
            }
        }
    }

    let mut qr_score = 0.0;
    let mut qr_details = json!(null);
    if let Some(qr) = tx.qr_code_payload() {
        let (score, details) = analyze_qr(tx, qr);
        qr_score = score;
        qr_details = details;
    }

    let score = url_score.max(qr_score);

    ContentResult {
        score,
        details: json!({
            "url_score": url_score,
            "url_details": url_details,
            "qr_score": qr_score,
            "qr_details": qr_details,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_allowlisted_domain_scores_low() {
        let (score, _) = analyze_url("https://paypal.com/payment").unwrap();
        assert!(score < 0.2, "expected low score, got {score}");
    }

    #[test]
    fn non_https_denylisted_tld_scores_high() {
        let (score, _) = analyze_url("http://verify-login.sketchy.xyz/payment").unwrap();
        assert!(score > 0.6, "expected high score, got {score}");
    }

    #[test]
    fn lookalike_domain_is_flagged() {
        let (score, details) = analyze_url("https://paypa1.com/payment").unwrap();
        assert!(score >= 0.4, "expected lookalike penalty, got {score}");
        assert_eq!(details["flags"].as_array().unwrap().len() >= 1, true);
    }

    #[test]
    fn bare_keyword_without_hyphens_is_flagged() {
        let (score, details) = analyze_url("https://securebank.xyz/payment").unwrap();
        assert_eq!(details["flags"].as_array().unwrap().iter().any(|f| f == "suspicious_pattern"), true);
        assert!(score > 0.0);
    }

    #[test]
    fn empty_host_degrades_with_analysis_error() {
        let err = analyze_url("://").unwrap_err();
        assert!(matches!(err, RiskError::Analysis(_)));
    }
}
