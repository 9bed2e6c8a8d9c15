use std::fmt;
use std::str::FromStr;

use rand::Rng;

/// The closed set of emotions the game plays with. Matches the labels the
/// emotion net is trained on; there is no way to extend it at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Anger,
    Fear,
    Neutral,
    Sad,
    Disgust,
    Happy,
    Surprise,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Neutral,
        Emotion::Sad,
        Emotion::Disgust,
        Emotion::Happy,
        Emotion::Surprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Neutral => "neutral",
            Emotion::Sad => "sad",
            Emotion::Disgust => "disgust",
            Emotion::Happy => "happy",
            Emotion::Surprise => "surprise",
        }
    }

    /// Uniform draw with replacement, one per round.
    pub fn random<R: Rng>(rng: &mut R) -> Emotion {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = crate::GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|emotion| emotion.as_str() == s)
            .copied()
            .ok_or_else(|| crate::GameError::UnknownEmotion(s.to_owned()))
    }
}
