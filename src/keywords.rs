//! Two-tier keyword gate.
//!
//! Extracted article text is matched case-insensitively against the primary
//! keyword list first; any hit accepts the article at first priority, even
//! when secondary terms are also present. Only when no primary keyword
//! matches is the secondary list consulted. No hit in either tier rejects
//! the article outright: no record is created.

use crate::models::MatchTier;

/// Match article text against the two keyword tiers.
///
/// The match is a case-insensitive substring test. Matched keywords are
/// returned in configured order with their configured casing (so the stored
/// `keyword` column reads the way the operator wrote the config).
///
/// # Arguments
///
/// * `text` - The extracted article text
/// * `first` - Primary keyword tier
/// * `second` - Secondary keyword tier
///
/// # Returns
///
/// `Some((matched_keywords, tier))` on a hit, `None` when no keyword from
/// either tier occurs in the text.
pub fn match_keywords(
    text: &str,
    first: &[String],
    second: &[String],
) -> Option<(Vec<String>, MatchTier)> {
    let text_lower = text.to_lowercase();

    let hits = |tier: &[String]| -> Vec<String> {
        tier.iter()
            .filter(|kw| text_lower.contains(&kw.to_lowercase()))
            .cloned()
            .collect()
    };

    let first_hits = hits(first);
    if !first_hits.is_empty() {
        return Some((first_hits, MatchTier::First));
    }
    let second_hits = hits(second);
    if !second_hits.is_empty() {
        return Some((second_hits, MatchTier::Second));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_tier() -> Vec<String> {
        vec![
            "indoor air quality".to_string(),
            "AIoT air monitoring".to_string(),
        ]
    }

    fn second_tier() -> Vec<String> {
        vec!["IoT".to_string(), "HVAC".to_string(), "ESG".to_string()]
    }

    #[test]
    fn test_primary_hit_any_casing() {
        for text in [
            "Improving indoor air quality in schools",
            "Improving INDOOR AIR QUALITY in schools",
            "Improving Indoor Air Quality in schools",
        ] {
            let (matched, tier) =
                match_keywords(text, &first_tier(), &second_tier()).unwrap();
            assert_eq!(matched, vec!["indoor air quality"]);
            assert_eq!(tier, MatchTier::First);
        }
    }

    #[test]
    fn test_primary_wins_over_secondary() {
        // secondary terms are present, but a primary hit decides the tier
        let text = "ESG funds back HVAC retrofits that improve indoor air quality";
        let (matched, tier) = match_keywords(text, &first_tier(), &second_tier()).unwrap();
        assert_eq!(tier, MatchTier::First);
        assert_eq!(matched, vec!["indoor air quality"]);
    }

    #[test]
    fn test_secondary_tier_when_no_primary() {
        let text = "New hvac standards cut esg reporting costs";
        let (matched, tier) = match_keywords(text, &first_tier(), &second_tier()).unwrap();
        assert_eq!(tier, MatchTier::Second);
        // configured casing and order, not the text's casing
        assert_eq!(matched, vec!["HVAC", "ESG"]);
    }

    #[test]
    fn test_no_match_returns_none() {
        let text = "Quarterly earnings beat expectations on strong retail sales";
        assert!(match_keywords(text, &first_tier(), &second_tier()).is_none());
    }

    #[test]
    fn test_empty_text_returns_none() {
        assert!(match_keywords("", &first_tier(), &second_tier()).is_none());
    }

    #[test]
    fn test_multiple_primary_hits_keep_configured_order() {
        let text = "AIoT air monitoring boosts indoor air quality scores";
        let (matched, tier) = match_keywords(text, &first_tier(), &second_tier()).unwrap();
        assert_eq!(tier, MatchTier::First);
        assert_eq!(matched, vec!["indoor air quality", "AIoT air monitoring"]);
    }
}
