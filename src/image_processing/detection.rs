//! Subject localization: ranked candidate selection over the raw output of
//! the detection model.
//!
//! The model itself lives behind [`SubjectDetector`]: an ONNX session when
//! the `ai` feature is enabled, otherwise a stub that reports no candidates
//! so every crop falls back to the geometric default.

use crate::utils::warn_println;

/// Label table of the detection model, indexed by class id
pub const LABELS: [&str; 21] = [
    "background",
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

/// Bounds-checked label lookup. Out-of-range indices (including negative
/// ones the model occasionally emits) resolve to None.
pub fn label_for(class_index: i64) -> Option<&'static str> {
    usize::try_from(class_index)
        .ok()
        .and_then(|idx| LABELS.get(idx))
        .copied()
}

/// Axis-aligned box, (x0,y0) top-left and (x1,y1) bottom-right
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

/// One raw candidate from the model: class index and box in fractional
/// image coordinates
#[derive(Debug, Clone, Copy)]
pub struct RawDetection {
    pub class_index: i64,
    pub confidence: f32,
    pub bbox: BBox,
}

/// A resolved candidate in source-image pixel coordinates
#[derive(Debug, Clone)]
pub struct Detection {
    pub label: &'static str,
    pub confidence: f32,
    pub bbox: BBox,
}

/// Pick the best candidate for `target_class` above `threshold`; when the
/// target class never scores, fall back to the best candidate among all
/// other classes. Ties keep the first-seen candidate. Returns None when
/// nothing clears the threshold.
pub fn select_subject(
    candidates: &[RawDetection],
    image_size: (u32, u32),
    target_class: &str,
    threshold: f32,
) -> Option<Detection> {
    let (width, height) = image_size;
    let mut best_target: Option<Detection> = None;
    let mut best_other: Option<Detection> = None;

    for candidate in candidates {
        if candidate.confidence <= threshold {
            continue;
        }

        let label = match label_for(candidate.class_index) {
            Some(label) => label,
            None => {
                warn_println(&format!(
                    "Ignoring detection with unknown class index {}",
                    candidate.class_index
                ));
                continue;
            }
        };

        let detection = Detection {
            label,
            confidence: candidate.confidence,
            bbox: BBox::new(
                candidate.bbox.x0 * width as f32,
                candidate.bbox.y0 * height as f32,
                candidate.bbox.x1 * width as f32,
                candidate.bbox.y1 * height as f32,
            ),
        };

        let slot = if label == target_class {
            &mut best_target
        } else {
            &mut best_other
        };
        // Strictly greater keeps the first-seen candidate on ties
        if slot
            .as_ref()
            .map_or(true, |best| detection.confidence > best.confidence)
        {
            *slot = Some(detection);
        }
    }

    best_target.or(best_other)
}

#[cfg(feature = "ai")]
mod onnx {
    use super::{BBox, RawDetection};
    use anyhow::{Context, Result};
    use image::RgbImage;
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Value;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    const INPUT_EDGE: u32 = 300;

    /// ONNX-backed subject detector (SSD-style single-shot model)
    pub struct SubjectDetector {
        session: Arc<Mutex<Session>>,
    }

    impl SubjectDetector {
        /// Load the detection model from disk
        pub fn load(model_path: &Path, verbose: bool) -> Result<Self> {
            let _ = ort::init();

            if verbose {
                println!("Loading detection model: {}", model_path.display());
            }

            let session = Session::builder()
                .context("Failed to create session builder")?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .context("Failed to set optimization level")?
                .with_intra_threads(4)
                .context("Failed to configure session threads")?
                .commit_from_file(model_path)
                .with_context(|| {
                    format!("Failed to load detection model: {}", model_path.display())
                })?;

            Ok(Self {
                session: Arc::new(Mutex::new(session)),
            })
        }

        /// Run inference on one image and return the raw candidate list,
        /// boxes in fractional image coordinates
        pub fn detect(&self, img: &RgbImage) -> Result<Vec<RawDetection>> {
            let resized = image::imageops::resize(
                img,
                INPUT_EDGE,
                INPUT_EDGE,
                image::imageops::FilterType::CatmullRom,
            );
            let tensor_data = prepare_tensor(&resized);

            let input_shape = vec![1usize, 3, INPUT_EDGE as usize, INPUT_EDGE as usize];
            let input_value = Value::from_array((input_shape, tensor_data))?;

            let mut session = self.session.lock().expect("detector session poisoned");
            let outputs = session.run(ort::inputs!["data" => input_value])?;

            let (shape, data) = outputs["detection_out"].try_extract_tensor::<f32>()?;
            let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
            Ok(parse_detections(data, &shape))
        }
    }

    /// Normalize to the SSD input distribution: (x - 127.5) / 127.5, NCHW
    fn prepare_tensor(img: &RgbImage) -> Vec<f32> {
        let edge = INPUT_EDGE;
        let mut tensor_data = Vec::with_capacity((3 * edge * edge) as usize);
        for c in 0..3 {
            for y in 0..edge {
                for x in 0..edge {
                    let pixel = img.get_pixel(x, y);
                    tensor_data.push((pixel[c as usize] as f32 - 127.5) * 0.007843);
                }
            }
        }
        tensor_data
    }

    /// Parse the [1, 1, N, 7] detection output: each row is
    /// (image_id, class_index, confidence, x0, y0, x1, y1)
    fn parse_detections(data: &[f32], shape: &[usize]) -> Vec<RawDetection> {
        let rows = match shape {
            [1, 1, rows, 7] => *rows,
            _ => return Vec::new(),
        };

        (0..rows)
            .filter_map(|row| {
                let base = row * 7;
                let fields = data.get(base..base + 7)?;
                Some(RawDetection {
                    class_index: fields[1] as i64,
                    confidence: fields[2],
                    bbox: BBox::new(fields[3], fields[4], fields[5], fields[6]),
                })
            })
            .collect()
    }
}

#[cfg(feature = "ai")]
pub use onnx::SubjectDetector;

#[cfg(not(feature = "ai"))]
mod stub {
    use super::RawDetection;
    use anyhow::Result;
    use image::RgbImage;
    use std::path::Path;

    /// Stub detector for builds without the ai feature: never finds a
    /// subject, so every crop falls back to the geometric default
    pub struct SubjectDetector;

    impl SubjectDetector {
        pub fn load(_model_path: &Path, _verbose: bool) -> Result<Self> {
            Ok(Self)
        }

        pub fn detect(&self, _img: &RgbImage) -> Result<Vec<RawDetection>> {
            Ok(Vec::new())
        }
    }
}

#[cfg(not(feature = "ai"))]
pub use stub::SubjectDetector;
