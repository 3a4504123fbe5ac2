//! Severity — keyword-weighted Low/Medium/High/Critical rating.
//!
//! Each cue group adds its weight once when any of its keywords is present;
//! the total maps onto four levels. Engagement (reactions, shares) can add
//! to the score when the collaborator supplies it.

use std::fmt;

use serde::Serialize;

struct SeverityCue {
    label: &'static str,
    weight: u32,
    keywords: &'static [&'static str],
}

static SEVERITY_CUES: &[SeverityCue] = &[
    SeverityCue {
        label: "intensity",
        weight: 3,
        keywords: &[
            "nghiêm trọng", "đặc biệt nguy hiểm", "thảm khốc",
            "critical", "severe", "catastroph",
        ],
    },
    SeverityCue {
        label: "casualties",
        weight: 3,
        keywords: &[
            "tử vong", "thiệt mạng", "người chết", "thương vong",
            "casualt", "death", "fatalit",
        ],
    },
    SeverityCue {
        label: "damage",
        weight: 1,
        keywords: &["thiệt hại", "hư hỏng", "damage"],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => Severity::Low,
            1..=2 => Severity::Medium,
            3..=4 => Severity::High,
            _ => Severity::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sum of the weights of every cue group present in `text`.
pub fn severity_score(text: &str) -> u32 {
    let h = text.to_lowercase();
    SEVERITY_CUES
        .iter()
        .filter(|cue| cue.keywords.iter().any(|k| h.contains(k)))
        .map(|cue| cue.weight)
        .sum()
}

/// Labels of the cue groups present in `text`, in table order.
pub fn severity_cues(text: &str) -> Vec<&'static str> {
    let h = text.to_lowercase();
    SEVERITY_CUES
        .iter()
        .filter(|cue| cue.keywords.iter().any(|k| h.contains(k)))
        .map(|cue| cue.label)
        .collect()
}

/// Extra points for widely shared posts.
pub fn engagement_score(engagement: u64) -> u32 {
    match engagement {
        0..=100 => 0,
        101..=1_000 => 1,
        1_001..=10_000 => 2,
        _ => 3,
    }
}

pub fn severity_from_text(text: &str) -> Severity {
    Severity::from_score(severity_score(text))
}

pub fn severity_with_engagement(text: &str, engagement: u64) -> Severity {
    Severity::from_score(severity_score(text) + engagement_score(engagement))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_without_cues() {
        assert_eq!(severity_from_text("Trời nắng đẹp"), Severity::Low);
        assert_eq!(severity_from_text(""), Severity::Low);
    }

    #[test]
    fn test_damage_is_medium() {
        assert_eq!(severity_from_text("Thiệt hại về hoa màu"), Severity::Medium);
        assert_eq!(severity_cues("Thiệt hại về hoa màu"), vec!["damage"]);
    }

    #[test]
    fn test_casualties_are_high() {
        assert_eq!(severity_from_text("3 người tử vong do lũ"), Severity::High);
        assert_eq!(severity_from_text("Severe flooding"), Severity::High);
    }

    #[test]
    fn test_combined_cues_are_critical() {
        let text = "Tình hình nghiêm trọng, 12 người thiệt mạng, thiệt hại lớn";
        assert_eq!(severity_score(text), 7);
        assert_eq!(severity_from_text(text), Severity::Critical);
        assert_eq!(severity_cues(text), vec!["intensity", "casualties", "damage"]);
    }

    #[test]
    fn test_group_counts_once() {
        // two casualty keywords still add the group's weight once
        assert_eq!(severity_score("tử vong và thương vong"), 3);
    }

    #[test]
    fn test_engagement_raises_level() {
        assert_eq!(engagement_score(50), 0);
        assert_eq!(engagement_score(500), 1);
        assert_eq!(engagement_score(5_000), 2);
        assert_eq!(engagement_score(50_000), 3);
        assert_eq!(severity_with_engagement("Thiệt hại nhỏ", 50_000), Severity::High);
        assert_eq!(severity_with_engagement("Trời nắng", 100), Severity::Low);
    }

    #[test]
    fn test_ordering_and_display() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::Critical.to_string(), "Critical");
    }
}
