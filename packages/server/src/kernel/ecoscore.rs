//! Deterministic eco-scoring.
//!
//! The judge model is asked for a single `Ecoscore:` line but its output
//! is untrusted free text. Scoring reconciles three signals: the parsed
//! score, a coarse impact label, and keyword material hints with fixed
//! floors and caps. The hints run last and can override a contradicting
//! model score for well-known material categories.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    /// Number in [1, 5] right after the literal word "ecoscore".
    static ref NEAR_ECOSCORE: Regex = Regex::new(r"ecoscore\D*([1-5](?:\.\d+)?)").unwrap();
    /// Any standalone number in [1, 5].
    static ref ANY_SCORE: Regex = Regex::new(r"\b([1-5](?:\.\d+)?)\b").unwrap();
}

/// Coarse classification of negative environmental impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImpactLabel {
    Low,
    Medium,
    High,
}

/// Material category inferred from product name/link keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialHint {
    PaperStraw,
    Metal,
    Bamboo,
    Glass,
    Silicone,
    Pla,
    Plastic,
}

/// Judge verdict for one product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JudgeResult {
    pub impact: ImpactLabel,
    pub ecoscore: f64,
}

/// Infer a material hint from the product name and link.
///
/// Tests run in fixed priority order and the first match wins. "pla" must
/// appear as its own token so that "plastic" does not shadow the plastic
/// category.
pub fn infer_material_hint(product_name: &str, product_link: &str) -> Option<MaterialHint> {
    let text = format!("{} {}", product_name, product_link).to_lowercase();
    if text.contains("paper") && text.contains("straw") {
        return Some(MaterialHint::PaperStraw);
    }
    if text.contains("stainless") || text.contains("metal") {
        return Some(MaterialHint::Metal);
    }
    if text.contains("bamboo") {
        return Some(MaterialHint::Bamboo);
    }
    if text.contains("glass") {
        return Some(MaterialHint::Glass);
    }
    if text.contains("silicone") {
        return Some(MaterialHint::Silicone);
    }
    if has_token(&text, "pla") || text.contains("bioplastic") {
        return Some(MaterialHint::Pla);
    }
    if text.contains("plastic") {
        return Some(MaterialHint::Plastic);
    }
    None
}

fn has_token(text: &str, token: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|t| t == token)
}

/// Parse an impact label from judge output.
///
/// Substring priority is low, then high, then medium; failing that, an
/// exact-token scan. Empty or unmatchable text defaults to `Medium`.
pub fn parse_impact_label(text: &str) -> ImpactLabel {
    if text.is_empty() {
        return ImpactLabel::Medium;
    }
    let lowered = text.to_lowercase();
    if lowered.contains("low") {
        return ImpactLabel::Low;
    }
    if lowered.contains("high") {
        return ImpactLabel::High;
    }
    if lowered.contains("medium") {
        return ImpactLabel::Medium;
    }
    for token in lowered.split(|c: char| !c.is_alphabetic()) {
        match token {
            "low" => return ImpactLabel::Low,
            "high" => return ImpactLabel::High,
            "medium" => return ImpactLabel::Medium,
            _ => {}
        }
    }
    ImpactLabel::Medium
}

/// Find an ecoscore in [1.0, 5.0] in judge output.
///
/// Numbers adjacent to the literal word "ecoscore" win over a plain scan
/// of the whole text. `None` when no in-range number appears.
pub fn parse_ecoscore(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    if let Some(cap) = NEAR_ECOSCORE.captures(&lowered) {
        if let Ok(val) = cap[1].parse::<f64>() {
            if (1.0..=5.0).contains(&val) {
                return Some(val);
            }
        }
    }
    for cap in ANY_SCORE.captures_iter(&lowered) {
        if let Ok(val) = cap[1].parse::<f64>() {
            if (1.0..=5.0).contains(&val) {
                return Some(val);
            }
        }
    }
    None
}

/// Baseline score for a label, used only when the judge text carries no
/// parsable score.
pub fn ecoscore_from_impact(impact: ImpactLabel) -> f64 {
    match impact {
        ImpactLabel::Low => 4.2,
        ImpactLabel::Medium => 2.8,
        ImpactLabel::High => 1.3,
    }
}

/// Apply material floors and caps, clamp into [1.0, 5.0] and round to
/// two decimal places.
pub fn apply_material_heuristics(score: f64, hint: Option<MaterialHint>) -> f64 {
    let adjusted = match hint {
        Some(MaterialHint::PaperStraw) => score.max(4.2),
        Some(MaterialHint::Metal) => score.max(3.8),
        Some(MaterialHint::Bamboo) => score.max(4.4),
        Some(MaterialHint::Glass) => score.max(3.8),
        Some(MaterialHint::Silicone) => score.max(3.2),
        Some(MaterialHint::Pla) => score.max(2.4).min(3.0),
        Some(MaterialHint::Plastic) => score.min(1.9),
        None => score,
    };
    (adjusted.clamp(1.0, 5.0) * 100.0).round() / 100.0
}

/// Derive the judge verdict from model output plus material heuristics.
///
/// The hint can override a contradicting model verdict: paper straws are
/// always `Low` impact and plastic lifts a `Medium` label to `High`,
/// with the matching floors/caps applied to the score afterwards.
pub fn evaluate_judge_text(text: &str, product_name: &str, product_link: &str) -> JudgeResult {
    let mut impact = parse_impact_label(text);
    let hint = infer_material_hint(product_name, product_link);
    match hint {
        Some(MaterialHint::PaperStraw) => impact = ImpactLabel::Low,
        Some(MaterialHint::Plastic) if impact == ImpactLabel::Medium => impact = ImpactLabel::High,
        _ => {}
    }
    let base = parse_ecoscore(text).unwrap_or_else(|| ecoscore_from_impact(impact));
    let ecoscore = apply_material_heuristics(base, hint);
    JudgeResult { impact, ecoscore }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_hint_priority() {
        assert_eq!(
            infer_material_hint("paper straws 100 pack", ""),
            Some(MaterialHint::PaperStraw)
        );
        assert_eq!(
            infer_material_hint("stainless steel bottle", ""),
            Some(MaterialHint::Metal)
        );
        // paper+straw outranks metal even when both appear
        assert_eq!(
            infer_material_hint("paper straw with metal case", ""),
            Some(MaterialHint::PaperStraw)
        );
        assert_eq!(
            infer_material_hint("", "https://shop.example.com/bamboo-cutlery"),
            Some(MaterialHint::Bamboo)
        );
        assert_eq!(infer_material_hint("PLA cups", ""), Some(MaterialHint::Pla));
        assert_eq!(
            infer_material_hint("bioplastic film", ""),
            Some(MaterialHint::Pla)
        );
        // "plastic" must not be shadowed by its "pla" prefix
        assert_eq!(
            infer_material_hint("plastic disposable straws", ""),
            Some(MaterialHint::Plastic)
        );
        assert_eq!(infer_material_hint("wool socks", ""), None);
    }

    #[test]
    fn test_parse_impact_label_priority() {
        assert_eq!(parse_impact_label(""), ImpactLabel::Medium);
        assert_eq!(parse_impact_label("Impact: Low"), ImpactLabel::Low);
        // "low" wins even when "medium" also appears
        assert_eq!(
            parse_impact_label("somewhere between low and medium"),
            ImpactLabel::Low
        );
        assert_eq!(parse_impact_label("HIGH impact product"), ImpactLabel::High);
        assert_eq!(parse_impact_label("nothing relevant"), ImpactLabel::Medium);
    }

    #[test]
    fn test_parse_ecoscore_prefers_labelled_number() {
        assert_eq!(parse_ecoscore("Ecoscore: 4.8"), Some(4.8));
        assert_eq!(parse_ecoscore("I rate 2 but Ecoscore: 3.5 overall"), Some(3.5));
        assert_eq!(parse_ecoscore("the score is 2.2 out of 5"), Some(2.2));
        assert_eq!(parse_ecoscore("no numbers here"), None);
        assert_eq!(parse_ecoscore(""), None);
    }

    #[test]
    fn test_heuristics_stay_in_range_and_round() {
        assert_eq!(apply_material_heuristics(7.3, None), 5.0);
        assert_eq!(apply_material_heuristics(-2.0, None), 1.0);
        assert_eq!(apply_material_heuristics(3.14159, None), 3.14);
        assert_eq!(
            apply_material_heuristics(9.0, Some(MaterialHint::Plastic)),
            1.9
        );
    }

    #[test]
    fn test_paper_straw_floor_overrides_model_score() {
        assert_eq!(
            apply_material_heuristics(2.0, Some(MaterialHint::PaperStraw)),
            4.2
        );
    }

    #[test]
    fn test_plastic_cap() {
        assert_eq!(
            apply_material_heuristics(3.5, Some(MaterialHint::Plastic)),
            1.9
        );
    }

    #[test]
    fn test_pla_clamps_into_band() {
        assert_eq!(apply_material_heuristics(1.5, Some(MaterialHint::Pla)), 2.4);
        assert_eq!(apply_material_heuristics(4.5, Some(MaterialHint::Pla)), 3.0);
        assert_eq!(apply_material_heuristics(2.7, Some(MaterialHint::Pla)), 2.7);
    }

    #[test]
    fn test_judge_plastic_straws_scores_poorly() {
        // Scenario: judge text gives no label, plastic hint turns Medium
        // into High and caps the score below the alternatives threshold.
        let verdict = evaluate_judge_text("Ecoscore: 2.5", "plastic disposable straws", "");
        assert_eq!(verdict.impact, ImpactLabel::High);
        assert!(verdict.ecoscore <= 1.9);
    }

    #[test]
    fn test_judge_bamboo_floors_to_good_score() {
        let verdict = evaluate_judge_text("Ecoscore: 2.5", "bamboo cutlery set", "");
        assert_eq!(verdict.impact, ImpactLabel::Medium);
        assert_eq!(verdict.ecoscore, 4.4);
    }

    #[test]
    fn test_judge_paper_straws_are_low_impact() {
        let verdict = evaluate_judge_text(
            "Ecoscore: 2.0",
            "YAOSHENG Paper Drinking Straws 100 Pack",
            "https://www.amazon.ca/YAOSHENG-drinking/dp/B09Y866VFC",
        );
        assert_eq!(verdict.impact, ImpactLabel::Low);
        assert_eq!(verdict.ecoscore, 4.2);
    }

    #[test]
    fn test_judge_without_hint_keeps_model_score() {
        let verdict = evaluate_judge_text("Ecoscore: 4.8", "wool dryer balls", "");
        assert_eq!(verdict.impact, ImpactLabel::Medium);
        assert_eq!(verdict.ecoscore, 4.8);
    }

    #[test]
    fn test_judge_without_score_falls_back_to_label_mapping() {
        let verdict = evaluate_judge_text("impact seems high", "unknown widget", "");
        assert_eq!(verdict.impact, ImpactLabel::High);
        assert_eq!(verdict.ecoscore, 1.3);
    }
}
