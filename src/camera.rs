use opencv::prelude::*;
use opencv::videoio;

use crate::GameError;

/// Anything that can produce one frame on demand. The game loop only ever
/// sees this seam, so tests can feed it synthetic frames.
pub trait FrameSource {
    fn grab(&mut self) -> anyhow::Result<Mat>;
}

/// Exclusively owned webcam handle. The underlying `VideoCapture` releases
/// the device when dropped, so the camera is freed on every exit path.
pub struct Camera {
    capture: videoio::VideoCapture,
}

impl Camera {
    pub fn open(index: i32) -> anyhow::Result<Self> {
        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)?;
        if !videoio::VideoCapture::is_opened(&capture)? {
            return Err(GameError::CameraUnavailable(index).into());
        }
        Ok(Self { capture })
    }
}

impl FrameSource for Camera {
    fn grab(&mut self) -> anyhow::Result<Mat> {
        let mut frame = Mat::default();
        self.capture.read(&mut frame)?;
        if frame.size()?.width == 0 {
            return Err(GameError::EmptyFrame.into());
        }
        Ok(frame)
    }
}
