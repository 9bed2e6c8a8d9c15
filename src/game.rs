use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::camera::FrameSource;
use crate::classifier::{Detection, EmotionClassifier};
use crate::emotion::Emotion;
use crate::{annotate_frame, frame_filename, now_local, percentage, save_frame, GameError};

pub const MIN_ROUNDS: i64 = 1;
pub const MAX_ROUNDS: i64 = 20;

pub struct GameConfig {
    pub rounds: u32,
    /// How long the player gets to pose, before and after each capture.
    pub pose_delay: Duration,
    pub output_dir: PathBuf,
}

/// Prompts until an integer in [1, 20] is read. A line that does not parse as
/// an integer is an error for the whole invocation; an out-of-range integer
/// just re-prompts, with no bound on retries.
pub fn read_round_count(input: &mut impl BufRead) -> anyhow::Result<u32> {
    print!("Enter number of play rounds you want to play: ");
    io::stdout().flush()?;
    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(GameError::NoRoundCount.into());
        }
        let rounds: i64 = line
            .trim()
            .parse()
            .map_err(GameError::InvalidRoundCount)?;
        if (MIN_ROUNDS..=MAX_ROUNDS).contains(&rounds) {
            return Ok(rounds as u32);
        }
        print!("Your input is invalid. Enter number of play rounds you want to play: ");
        io::stdout().flush()?;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub rounds: u32,
    pub correct: u32,
}

impl GameSummary {
    pub fn percentage(&self) -> f64 {
        percentage(self.rounds, self.correct)
    }

    pub fn passed(&self) -> bool {
        f64::from(self.correct) > f64::from(self.rounds) / 2.0
    }

    pub fn verdict(&self) -> &'static str {
        if self.passed() {
            "Great, you know how to express emotions!"
        } else {
            "Well, it seems to me that poker is your game!"
        }
    }
}

pub struct Game<S, C> {
    config: GameConfig,
    source: S,
    classifier: C,
    rng: StdRng,
    remaining: u32,
    correct: u32,
}

impl<S: FrameSource, C: EmotionClassifier> Game<S, C> {
    pub fn new(config: GameConfig, source: S, classifier: C) -> Self {
        let remaining = config.rounds;
        Self {
            config,
            source,
            classifier,
            rng: StdRng::from_entropy(),
            remaining,
            correct: 0,
        }
    }

    pub fn play(&mut self) -> anyhow::Result<GameSummary> {
        while self.remaining > 0 {
            let target = Emotion::random(&mut self.rng);
            println!("Show {target}");
            thread::sleep(self.config.pose_delay);
            if self.play_round(target)? {
                self.correct += 1;
            }
            self.remaining -= 1;
            thread::sleep(self.config.pose_delay);
        }
        Ok(GameSummary {
            rounds: self.config.rounds,
            correct: self.correct,
        })
    }

    /// One capture-classify-persist sequence. Returns whether the detected
    /// dominant emotion matched the target.
    fn play_round(&mut self, target: Emotion) -> anyhow::Result<bool> {
        let mut frame = self.source.grab()?;
        let detection = self.classifier.classify(&frame)?;

        let label = match &detection {
            Detection::Face { emotion, .. } => emotion.as_str(),
            Detection::NoFace => "no face",
        };
        annotate_frame(&mut frame, label)?;
        let path = self.config.output_dir.join(frame_filename(now_local()));
        save_frame(&path, &frame)?;

        match detection {
            Detection::Face {
                emotion,
                confidence,
            } => {
                info!(wanted = %target, detected = %emotion, confidence, saved = %path.display(), "round scored");
                Ok(emotion == target)
            }
            Detection::NoFace => {
                warn!(wanted = %target, saved = %path.display(), "no face in frame, round is a miss");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};
    use opencv::prelude::*;
    use std::io::Cursor;

    struct StillFrames;

    impl FrameSource for StillFrames {
        fn grab(&mut self) -> anyhow::Result<Mat> {
            Ok(Mat::new_rows_cols_with_default(
                120,
                160,
                CV_8UC3,
                Scalar::all(40.0),
            )?)
        }
    }

    struct Scripted {
        detection: Detection,
        calls: u32,
    }

    impl Scripted {
        fn always(detection: Detection) -> Self {
            Self {
                detection,
                calls: 0,
            }
        }
    }

    impl EmotionClassifier for Scripted {
        fn classify(&mut self, _frame: &Mat) -> anyhow::Result<Detection> {
            self.calls += 1;
            Ok(self.detection.clone())
        }
    }

    fn test_game(rounds: u32, detection: Detection) -> (Game<StillFrames, Scripted>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = GameConfig {
            rounds,
            pose_delay: Duration::ZERO,
            output_dir: dir.path().to_path_buf(),
        };
        (
            Game::new(config, StillFrames, Scripted::always(detection)),
            dir,
        )
    }

    #[test]
    fn loop_runs_exactly_the_requested_rounds() {
        let (mut game, _dir) = test_game(4, Detection::NoFace);
        let summary = game.play().unwrap();
        assert_eq!(summary.rounds, 4);
        assert_eq!(summary.correct, 0);
        assert_eq!(game.classifier.calls, 4);
        assert_eq!(game.remaining, 0);
    }

    #[test]
    fn correct_count_never_exceeds_rounds() {
        let (mut game, _dir) = test_game(
            5,
            Detection::Face {
                emotion: Emotion::Happy,
                confidence: 0.8,
            },
        );
        let summary = game.play().unwrap();
        assert_eq!(summary.rounds, 5);
        assert!(summary.correct <= summary.rounds);
    }

    #[test]
    fn matching_round_is_scored_correct() {
        let (mut game, _dir) = test_game(
            1,
            Detection::Face {
                emotion: Emotion::Happy,
                confidence: 0.9,
            },
        );
        assert!(game.play_round(Emotion::Happy).unwrap());
        assert!(!game.play_round(Emotion::Sad).unwrap());
    }

    #[test]
    fn no_face_round_is_a_miss() {
        let (mut game, _dir) = test_game(1, Detection::NoFace);
        assert!(!game.play_round(Emotion::Neutral).unwrap());
    }

    #[test]
    fn each_round_persists_one_annotated_frame() {
        let (mut game, dir) = test_game(
            1,
            Detection::Face {
                emotion: Emotion::Surprise,
                confidence: 0.7,
            },
        );
        game.play_round(Emotion::Surprise).unwrap();
        let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(saved.len(), 1);
        let path = saved[0].as_ref().unwrap().path();
        assert_eq!(path.extension().unwrap(), "jpg");
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn all_misses_give_zero_percent_and_the_teasing_verdict() {
        let (mut game, _dir) = test_game(4, Detection::NoFace);
        let summary = game.play().unwrap();
        assert_eq!(summary.percentage(), 0.0);
        assert!(!summary.passed());
        assert!(summary.verdict().contains("poker"));
    }

    #[test]
    fn perfect_single_round_gives_full_marks() {
        let summary = GameSummary {
            rounds: 1,
            correct: 1,
        };
        assert_eq!(summary.percentage(), 100.0);
        assert!(summary.passed());
        assert!(summary.verdict().contains("Great"));
    }

    #[test]
    fn two_of_three_beats_the_half_way_bar() {
        let summary = GameSummary {
            rounds: 3,
            correct: 2,
        };
        assert!((summary.percentage() - 66.666_666).abs() < 1e-3);
        assert!(summary.passed());
    }

    #[test]
    fn exactly_half_is_not_a_pass() {
        let summary = GameSummary {
            rounds: 4,
            correct: 2,
        };
        assert!(!summary.passed());
    }

    #[test]
    fn round_count_accepts_in_range_integers() {
        let mut input = Cursor::new("5\n");
        assert_eq!(read_round_count(&mut input).unwrap(), 5);
    }

    #[test]
    fn round_count_reprompts_on_out_of_range() {
        let mut input = Cursor::new("25\n-3\n0\n20\n");
        assert_eq!(read_round_count(&mut input).unwrap(), 20);
    }

    #[test]
    fn round_count_rejects_non_integers() {
        let mut input = Cursor::new("abc\n");
        assert!(read_round_count(&mut input).is_err());
    }

    #[test]
    fn round_count_errors_on_end_of_input() {
        let mut input = Cursor::new("");
        assert!(read_round_count(&mut input).is_err());
    }
}
