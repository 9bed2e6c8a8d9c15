use std::path::Path;

use opencv::prelude::*;
use opencv::types::VectorOfRect;
use opencv::{core, dnn, imgproc, objdetect, types};

use crate::emotion::Emotion;
use crate::GameError;

/// Per-frame classifier outcome. A classifier-internal failure is an `Err`
/// from `classify`, not a variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Face { emotion: Emotion, confidence: f32 },
    NoFace,
}

pub trait EmotionClassifier {
    fn classify(&mut self, frame: &Mat) -> anyhow::Result<Detection>;
}

// FER output order of the emotion net.
const CLASS_ORDER: [Emotion; 7] = [
    Emotion::Anger,
    Emotion::Disgust,
    Emotion::Fear,
    Emotion::Happy,
    Emotion::Sad,
    Emotion::Surprise,
    Emotion::Neutral,
];

const NET_INPUT_SIZE: i32 = 64;

pub struct FaceDetector {
    classifier: objdetect::CascadeClassifier,
}

impl FaceDetector {
    pub fn new(cascade: Option<&Path>) -> anyhow::Result<Self> {
        let xml = match cascade {
            Some(path) => path.to_string_lossy().into_owned(),
            None => core::find_file_def("haarcascades/haarcascade_frontalface_alt.xml")?,
        };
        let classifier = objdetect::CascadeClassifier::new(&xml)?;
        Ok(Self { classifier })
    }

    pub fn detect(&mut self, image: &Mat) -> anyhow::Result<VectorOfRect> {
        let mut faces = types::VectorOfRect::new();

        self.classifier.detect_multi_scale(
            &image,
            &mut faces,
            1.1,
            2,
            objdetect::CASCADE_SCALE_IMAGE,
            core::Size {
                width: 30,
                height: 30,
            },
            core::Size {
                width: 0,
                height: 0,
            },
        )?;
        Ok(faces)
    }
}

pub fn find_largest_face(faces: &VectorOfRect) -> Option<core::Rect> {
    faces
        .into_iter()
        .max_by(|a, b| (a.height * a.width).cmp(&(b.height * b.width)))
}

/// Haar cascade face detection followed by an ONNX emotion net on the
/// largest face. The net takes a 64x64 grayscale crop and produces one raw
/// score per class in `CLASS_ORDER`.
pub struct DnnClassifier {
    faces: FaceDetector,
    net: dnn::Net,
}

impl DnnClassifier {
    pub fn new(model: &Path, cascade: Option<&Path>) -> anyhow::Result<Self> {
        let faces = FaceDetector::new(cascade)?;
        let net = dnn::read_net_from_onnx(model.to_string_lossy().as_ref())?;
        Ok(Self { faces, net })
    }

    fn score_face(&mut self, gray: &Mat, face: core::Rect) -> anyhow::Result<(Emotion, f32)> {
        let crop = Mat::roi(gray, face)?;
        let mut resized = Mat::default();
        imgproc::resize(
            &crop,
            &mut resized,
            core::Size {
                width: NET_INPUT_SIZE,
                height: NET_INPUT_SIZE,
            },
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let blob = dnn::blob_from_image(
            &resized,
            1.0 / 255.0,
            core::Size {
                width: NET_INPUT_SIZE,
                height: NET_INPUT_SIZE,
            },
            core::Scalar::default(),
            false,
            false,
            core::CV_32F,
        )?;
        self.net.set_input(&blob, "", 1.0, core::Scalar::default())?;
        let output = self.net.forward_single_def()?;

        let mut scores = Vec::with_capacity(CLASS_ORDER.len());
        for col in 0..output.cols() {
            scores.push(*output.at_2d::<f32>(0, col)?);
        }
        if scores.len() != CLASS_ORDER.len() {
            return Err(GameError::MalformedClassifierOutput(scores.len()).into());
        }
        Ok(dominant(&scores))
    }
}

impl EmotionClassifier for DnnClassifier {
    fn classify(&mut self, frame: &Mat) -> anyhow::Result<Detection> {
        let gray = grayscale(frame)?;
        let faces = self.faces.detect(&gray)?;
        let Some(face) = find_largest_face(&faces) else {
            return Ok(Detection::NoFace);
        };
        let (emotion, confidence) = self.score_face(&gray, face)?;
        Ok(Detection::Face {
            emotion,
            confidence,
        })
    }
}

/// Softmax over the raw scores, then the argmax label with its probability.
fn dominant(scores: &[f32]) -> (Emotion, f32) {
    let max = scores.iter().copied().fold(f32::MIN, f32::max);
    let exps: Vec<f32> = scores.iter().map(|score| (score - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    let (index, _) = exps
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .unwrap_or((0, &0.0));
    (CLASS_ORDER[index], exps[index] / sum)
}

pub fn grayscale(image: &Mat) -> anyhow::Result<Mat> {
    let mut gray: Mat = Mat::default();
    imgproc::cvt_color_def(&image, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}
