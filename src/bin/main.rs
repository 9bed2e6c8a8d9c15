use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use emotion_game::camera::Camera;
use emotion_game::classifier::DnnClassifier;
use emotion_game::game::{read_round_count, Game, GameConfig};

#[derive(Parser, Debug)]
#[command(name = "emotion-game", about = "Webcam emotion mimicry game")]
struct Args {
    /// Camera device index.
    #[arg(long, default_value_t = 0)]
    camera_index: i32,

    /// Seconds the player gets to pose, before and after each capture.
    #[arg(long, default_value_t = 3)]
    pose_delay_secs: u64,

    /// Directory the annotated frames are written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Path to the ONNX emotion classification model.
    #[arg(long, default_value = "models/emotion-fer.onnx")]
    emotion_model: PathBuf,

    /// Haar cascade for face detection. Resolved from the OpenCV data
    /// directory when not set.
    #[arg(long)]
    face_cascade: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt().init();

    let classifier = DnnClassifier::new(&args.emotion_model, args.face_cascade.as_deref())?;
    let camera = Camera::open(args.camera_index)?;

    let rounds = read_round_count(&mut io::stdin().lock())?;
    let config = GameConfig {
        rounds,
        pose_delay: Duration::from_secs(args.pose_delay_secs),
        output_dir: args.output_dir,
    };

    let mut game = Game::new(config, camera, classifier);
    let summary = game.play()?;

    println!("{}", summary.verdict());
    println!(
        "Your total right answers are: {} and it is {:.2}%",
        summary.correct,
        summary.percentage()
    );
    Ok(())
}
