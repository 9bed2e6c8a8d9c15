use std::path::{Path, PathBuf};

use opencv::core::Scalar;
use opencv::prelude::*;
use opencv::{core, imgcodecs, imgproc};
use thiserror::Error;
use time::OffsetDateTime;

pub mod camera;
pub mod classifier;
pub mod emotion;
pub mod game;

/// Percentage of correct rounds. Caller guarantees `total > 0`.
pub fn percentage(total: u32, correct: u32) -> f64 {
    f64::from(correct) / f64::from(total) * 100.0
}

/// Draws `text` onto the frame in place, top-left corner, opaque white.
pub fn annotate_frame(frame: &mut Mat, text: &str) -> anyhow::Result<()> {
    imgproc::put_text(
        frame,
        text,
        core::Point { x: 10, y: 30 },
        imgproc::FONT_HERSHEY_SIMPLEX,
        1.0,
        Scalar::new(255.0, 255.0, 255.0, 0.0),
        2,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}

/// Writes the frame to `path`, silently overwriting an existing file.
pub fn save_frame(path: &Path, frame: &Mat) -> anyhow::Result<()> {
    let params: core::Vector<i32> = Default::default();
    if !imgcodecs::imwrite(path.to_string_lossy().as_ref(), frame, &params)? {
        return Err(GameError::FrameWrite(path.to_path_buf()).into());
    }
    Ok(())
}

/// Local wall-clock time, falling back to UTC when the local offset cannot
/// be determined.
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `DD-MM-YYYY-HH-MM-SS.jpg`. Second resolution only, so two frames saved
/// within the same second overwrite each other.
pub fn frame_filename(time: OffsetDateTime) -> String {
    format!(
        "{:0>2}-{:0>2}-{}-{:0>2}-{:0>2}-{:0>2}.jpg",
        time.day(),
        time.month() as u8,
        time.year(),
        time.hour(),
        time.minute(),
        time.second()
    )
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("unable to open camera {0}")]
    CameraUnavailable(i32),
    #[error("camera returned an empty frame")]
    EmptyFrame,
    #[error("no round count supplied")]
    NoRoundCount,
    #[error("invalid round count: {0}")]
    InvalidRoundCount(std::num::ParseIntError),
    #[error("unknown emotion label {0:?}")]
    UnknownEmotion(String),
    #[error("emotion net produced {0} scores, expected 7")]
    MalformedClassifierOutput(usize),
    #[error("failed to write frame to {0}")]
    FrameWrite(PathBuf),
}
