//! Core types for ToxGuard

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Score at or above which a probability counts as a positive label.
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Number of auxiliary toxicity subtypes scored by the subtype head.
pub const NUM_SUBTYPES: usize = 6;

/// Apply the decision threshold to a probability or annotator score.
pub fn binarize(score: f32) -> bool {
    score >= DECISION_THRESHOLD
}

/// Auxiliary toxicity category, scored independently of overall toxicity.
///
/// The declaration order is the column order of the subtype head and of
/// every CSV that carries subtype scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtypeLabel {
    SevereToxicity,
    Obscene,
    IdentityAttack,
    Insult,
    Threat,
    SexualExplicit,
}

impl SubtypeLabel {
    /// All subtypes in head order
    pub const ALL: [SubtypeLabel; NUM_SUBTYPES] = [
        SubtypeLabel::SevereToxicity,
        SubtypeLabel::Obscene,
        SubtypeLabel::IdentityAttack,
        SubtypeLabel::Insult,
        SubtypeLabel::Threat,
        SubtypeLabel::SexualExplicit,
    ];

    /// Column name used in datasets and result tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevereToxicity => "severe_toxicity",
            Self::Obscene => "obscene",
            Self::IdentityAttack => "identity_attack",
            Self::Insult => "insult",
            Self::Threat => "threat",
            Self::SexualExplicit => "sexual_explicit",
        }
    }

    /// Human-readable name for rendered pages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SevereToxicity => "Severe Toxicity",
            Self::Obscene => "Obscene",
            Self::IdentityAttack => "Identity Attack",
            Self::Insult => "Insult",
            Self::Threat => "Threat",
            Self::SexualExplicit => "Sexual Explicit",
        }
    }

    /// Position of this subtype in the head output
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|label| label == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for SubtypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubtypeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| format!("unknown subtype label: {}", s))
    }
}

/// Binary appropriateness label derived from the toxicity probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToxicityLabel {
    Appropriate,
    Inappropriate,
}

impl ToxicityLabel {
    /// Label a toxicity probability using the decision threshold
    pub fn from_score(score: f32) -> Self {
        if binarize(score) {
            Self::Inappropriate
        } else {
            Self::Appropriate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Appropriate => "Appropriate",
            Self::Inappropriate => "Inappropriate",
        }
    }
}

impl fmt::Display for ToxicityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model output for a single comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Probability that the comment is toxic (0.0-1.0)
    pub toxicity: f32,

    /// Subtype probabilities in [`SubtypeLabel::ALL`] order (0.0-1.0 each)
    pub subtypes: [f32; NUM_SUBTYPES],
}

impl Prediction {
    /// Create a new prediction
    pub fn new(toxicity: f32, subtypes: [f32; NUM_SUBTYPES]) -> Self {
        Self { toxicity, subtypes }
    }

    /// Categorical label for the toxicity probability
    pub fn label(&self) -> ToxicityLabel {
        ToxicityLabel::from_score(self.toxicity)
    }

    /// Probability for one subtype
    pub fn subtype(&self, label: SubtypeLabel) -> f32 {
        self.subtypes[label.index()]
    }

    /// Subtypes whose probability crosses the decision threshold
    pub fn triggered_subtypes(&self) -> Vec<SubtypeLabel> {
        SubtypeLabel::ALL
            .iter()
            .copied()
            .filter(|label| binarize(self.subtype(*label)))
            .collect()
    }

    /// Subtype scores paired with their labels
    pub fn subtype_scores(&self) -> impl Iterator<Item = (SubtypeLabel, f32)> + '_ {
        SubtypeLabel::ALL
            .iter()
            .copied()
            .zip(self.subtypes.iter().copied())
    }
}

/// Labeled comment as found in the source dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub comment_text: String,

    /// Fraction of annotators who rated the comment toxic
    pub target: f32,

    /// Annotator subtype scores in [`SubtypeLabel::ALL`] order
    pub subtypes: [f32; NUM_SUBTYPES],
}

impl Sample {
    /// Binary toxicity target
    pub fn is_toxic(&self) -> bool {
        binarize(self.target)
    }

    /// Binary subtype targets in head order
    pub fn subtype_targets(&self) -> [bool; NUM_SUBTYPES] {
        self.subtypes.map(binarize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_subtype_order_and_names() {
        let names: Vec<&str> = SubtypeLabel::ALL.iter().map(|l| l.as_str()).collect();
        assert_eq!(
            names,
            [
                "severe_toxicity",
                "obscene",
                "identity_attack",
                "insult",
                "threat",
                "sexual_explicit"
            ]
        );
        assert_eq!(SubtypeLabel::Threat.index(), 4);
        assert_eq!("insult".parse::<SubtypeLabel>().unwrap(), SubtypeLabel::Insult);
        assert!("rude".parse::<SubtypeLabel>().is_err());
    }

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(ToxicityLabel::from_score(0.5), ToxicityLabel::Inappropriate);
        assert_eq!(ToxicityLabel::from_score(0.4999), ToxicityLabel::Appropriate);
        assert_eq!(ToxicityLabel::from_score(0.0).as_str(), "Appropriate");
    }

    #[test]
    fn test_triggered_subtypes() {
        let prediction = Prediction::new(0.9, [0.1, 0.2, 0.3, 0.7, 0.8, 0.5]);
        assert_eq!(prediction.label(), ToxicityLabel::Inappropriate);
        assert_eq!(
            prediction.triggered_subtypes(),
            vec![
                SubtypeLabel::Insult,
                SubtypeLabel::Threat,
                SubtypeLabel::SexualExplicit
            ]
        );
    }

    #[test]
    fn test_sample_binarization() {
        let sample = Sample {
            comment_text: "I will hurt you".to_string(),
            target: 0.9,
            subtypes: [0.0, 0.0, 0.0, 0.2, 0.8, 0.0],
        };
        assert!(sample.is_toxic());
        assert_eq!(
            sample.subtype_targets(),
            [false, false, false, false, true, false]
        );
    }

    proptest! {
        #[test]
        fn threshold_is_idempotent(score in 0.0f32..=1.0) {
            let label = ToxicityLabel::from_score(score);
            let stored = Prediction::new(score, [score; NUM_SUBTYPES]);
            prop_assert_eq!(stored.label(), label);
            prop_assert_eq!(ToxicityLabel::from_score(stored.toxicity), label);
            prop_assert_eq!(stored.triggered_subtypes().is_empty(), !binarize(score));
        }
    }
}
