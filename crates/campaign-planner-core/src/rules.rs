//! Advisory sanity rules for resolved share mixes.
//!
//! Rules never block plan generation and never change the allocation; they
//! only attach human-readable warnings.

use crate::types::{ShareMix, StrategyKey};

/// Video share boundary between reach-oriented and engagement-oriented mixes.
pub const VIDEO_SHARE_PIVOT: f64 = 0.35;

struct SanityRule {
    strategy: StrategyKey,
    violated: fn(&ShareMix) -> bool,
    message: &'static str,
}

fn video_above_pivot(shares: &ShareMix) -> bool {
    shares.video > VIDEO_SHARE_PIVOT
}

fn video_below_pivot(shares: &ShareMix) -> bool {
    shares.video < VIDEO_SHARE_PIVOT
}

// Evaluated in declaration order.
const RULES: [SanityRule; 2] = [
    SanityRule {
        strategy: StrategyKey::MaxReach,
        violated: video_above_pivot,
        message: "Max reach strategy should keep video share at or below 0.35 to prioritize reach.",
    },
    SanityRule {
        strategy: StrategyKey::MaxEngagement,
        violated: video_below_pivot,
        message:
            "Max engagement strategy should keep video share at or above 0.35 to sustain engagement.",
    },
];

/// Warnings raised by every rule that fires for `strategy` and `shares`.
pub fn sanity_warnings(strategy: StrategyKey, shares: &ShareMix) -> Vec<String> {
    RULES
        .iter()
        .filter(|rule| rule.strategy == strategy && (rule.violated)(shares))
        .map(|rule| rule.message.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChannelMap;

    fn mix(video: f64, display: f64, social: f64) -> ShareMix {
        ChannelMap {
            video,
            display,
            social,
        }
    }

    #[test]
    fn warns_when_max_reach_over_allocates_video() {
        let warnings = sanity_warnings(StrategyKey::MaxReach, &mix(0.4, 0.3, 0.3));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("at or below 0.35"));
    }

    #[test]
    fn warns_when_max_engagement_under_allocates_video() {
        let warnings = sanity_warnings(StrategyKey::MaxEngagement, &mix(0.3, 0.35, 0.35));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("at or above 0.35"));
    }

    #[test]
    fn pivot_value_is_compliant_for_both_rules() {
        let at_pivot = mix(0.35, 0.35, 0.3);
        assert!(sanity_warnings(StrategyKey::MaxReach, &at_pivot).is_empty());
        assert!(sanity_warnings(StrategyKey::MaxEngagement, &at_pivot).is_empty());
    }

    #[test]
    fn other_strategies_never_warn() {
        for shares in [mix(0.3, 0.3, 0.4), mix(0.9, 0.05, 0.05), mix(0.0, 0.5, 0.5)] {
            assert!(sanity_warnings(StrategyKey::Balanced, &shares).is_empty());
            assert!(sanity_warnings(StrategyKey::Custom, &shares).is_empty());
        }
    }
}
