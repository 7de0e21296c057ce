//! Computer vision and model-serving patterns.
//!
//! Most groups need the `image` crate and are skipped without it. Batch
//! processing works on plain float buffers and always runs.

#[cfg(feature = "imaging")]
pub mod imaging;

use crate::capabilities::{DETECTION_MODEL, IMAGE_LIBRARY, ModelFile};
use anyhow::Context;
use perfpair_core::{Bencher, Capabilities, GroupDef, Suite};
use rand::Rng;
use std::fs;
use std::path::Path;

#[cfg(feature = "imaging")]
use imaging::{frame_processing, image_resizing, memory_efficiency, preprocessing_pipeline};

/// Side of the square network input
pub const TARGET_SIDE: u32 = 640;
/// Images in one batch
pub const BATCH_IMAGES: usize = 32;
/// Color channels per pixel
pub const CHANNELS: usize = 3;
/// Pixels of the grayscale frame handed to the detector
pub const DETECT_FRAME_LEN: usize = (TARGET_SIDE * TARGET_SIDE) as usize;

const SUMMARY: &str = "\
1. MODEL LOADING
   ✓ Load model once at initialization
   ✗ Don't reload model for each inference

2. IMAGE PREPROCESSING
   ✓ Use an optimized resize from an image library
   ✓ Use nearest-neighbor filtering for speed when quality isn't critical
   ✗ Avoid manual resizing with per-pixel loops

3. BATCH PROCESSING
   ✓ Process multiple images together when possible
   ✓ Keep the batch in one contiguous buffer
   ✗ Avoid allocating per image in production loops

4. REAL-TIME VIDEO
   ✓ Skip frames (process every Nth frame)
   ✓ Use smaller models (YOLOv8n vs YOLOv8x)
   ✓ Reduce input resolution when possible
   ✗ Don't process every frame if not necessary

5. MEMORY MANAGEMENT
   ✓ Process images on-the-fly, one at a time
   ✓ Drop large buffers as soon as they are done
   ✗ Avoid loading all images into memory

6. GPU ACCELERATION
   ✓ Use GPU when available (CUDA)
   ✓ Keep data on GPU between operations
   ✗ Don't transfer data between CPU/GPU unnecessarily

7. MODEL OPTIMIZATION
   ✓ Use quantization (FP16 or INT8)
   ✓ Use TensorRT for NVIDIA GPUs
   ✓ Use ONNX Runtime for cross-platform optimization
   ✗ Don't use FP32 models in production if speed matters";

/// The computer vision suite
pub fn suite() -> Suite {
    Suite {
        id: "vision",
        title: "Computer Vision & AI Performance Examples",
        groups: vec![
            GroupDef {
                id: "image_resizing",
                title: "1. Image Resizing (1920x1080 -> 640x640)",
                requires: &[IMAGE_LIBRARY],
                run: image_resizing,
            },
            GroupDef {
                id: "model_loading",
                title: "2. Model Loading Patterns",
                requires: &[DETECTION_MODEL],
                run: model_loading,
            },
            GroupDef {
                id: "batch_processing",
                title: "3. Batch Processing (32 images, 640x640)",
                requires: &[],
                run: batch_processing,
            },
            GroupDef {
                id: "frame_processing",
                title: "4. Video Frame Processing (300 frames)",
                requires: &[IMAGE_LIBRARY],
                run: frame_processing,
            },
            GroupDef {
                id: "memory_efficiency",
                title: "5. Memory-Efficient Processing (200 images)",
                requires: &[IMAGE_LIBRARY],
                run: memory_efficiency,
            },
            GroupDef {
                id: "preprocessing_pipeline",
                title: "6. Preprocessing Pipeline (20 images)",
                requires: &[IMAGE_LIBRARY],
                run: preprocessing_pipeline,
            },
        ],
        summary_title: "Computer Vision & AI Optimization Best Practices",
        summary: SUMMARY,
    }
}

// Image groups are gated on IMAGE_LIBRARY, which cannot be acquired
// without the feature, so the runner never reaches these.
#[cfg(not(feature = "imaging"))]
fn compiled_out(_: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    anyhow::bail!("{IMAGE_LIBRARY} is not compiled into this build")
}

#[cfg(not(feature = "imaging"))]
use self::{
    compiled_out as image_resizing, compiled_out as frame_processing,
    compiled_out as memory_efficiency, compiled_out as preprocessing_pipeline,
};

/// Uniform floats in `[0, 255)`, shaped like raw pixel values.
pub fn random_pixels(len: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.r#gen::<f32>() * 255.0).collect()
}

fn mean(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}

// -- model loading ----------------------------------------------------------

/// A toy detector: its "weights" set a brightness threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    threshold: f32,
    parameters: usize,
}

impl Detector {
    /// Read weights from disk and build the detector
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let weights = fs::read(path)
            .with_context(|| format!("failed to load model weights from {}", path.display()))?;
        Ok(Self::from_weights(&weights))
    }

    /// Build the detector from weight bytes already in memory
    pub fn from_weights(weights: &[u8]) -> Self {
        let sum: u64 = weights.iter().map(|&w| u64::from(w)).sum();
        let mean = sum as f32 / weights.len().max(1) as f32;
        Self {
            threshold: mean,
            parameters: weights.len(),
        }
    }

    /// Number of weight bytes the detector was built from
    pub fn parameters(&self) -> usize {
        self.parameters
    }

    /// Count of pixels brighter than the threshold
    pub fn detect(&self, frame: &[f32]) -> usize {
        frame.iter().filter(|&&p| p > self.threshold).count()
    }
}

/// Loads the model on every call.
pub fn inefficient_detect(path: &Path, frame: &[f32]) -> anyhow::Result<usize> {
    Ok(Detector::load(path)?.detect(frame))
}

fn model_loading(b: &mut Bencher<'_>, caps: &Capabilities) -> anyhow::Result<()> {
    let model = caps
        .handle::<ModelFile>(DETECTION_MODEL)
        .with_context(|| format!("{DETECTION_MODEL} is available but has no model handle"))?;
    tracing::debug!(path = %model.path.display(), bytes = model.len, "using detection model");

    let frame = random_pixels(DETECT_FRAME_LEN);

    b.note("First call loads model:");
    b.try_time("inefficient_detect (loads every time)", || {
        inefficient_detect(&model.path, &frame)
    })?;

    b.note("\nEfficient pattern:");
    let detector = b.try_time("Detector::load (one-time)", || Detector::load(&model.path))?;
    b.time("detector.detect (reuses model)", || detector.detect(&frame));
    b.time("detector.detect (reuses model)", || detector.detect(&frame));
    Ok(())
}

// -- batch processing -------------------------------------------------------

/// Normalizes each image into a fresh buffer, then takes its mean.
pub fn process_sequential(images: &[Vec<f32>]) -> Vec<f64> {
    images
        .iter()
        .map(|img| {
            let processed: Vec<f32> = img.iter().map(|p| p / 255.0).collect();
            mean(&processed)
        })
        .collect()
}

/// Copies the images into one contiguous batch and reduces each slice.
///
/// All images must have the same length.
pub fn process_batch(images: &[Vec<f32>]) -> Vec<f64> {
    let Some(len) = images.first().map(Vec::len).filter(|&len| len > 0) else {
        return vec![0.0; images.len()];
    };
    let batch = images.concat();
    batch
        .chunks_exact(len)
        .map(|img| mean(img) / 255.0)
        .collect()
}

fn batch_processing(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    let image_len = DETECT_FRAME_LEN * CHANNELS;
    let images: Vec<Vec<f32>> = (0..BATCH_IMAGES)
        .map(|_| random_pixels(image_len))
        .collect();

    b.time_fn(process_sequential, images.as_slice());
    b.time_fn(process_batch, images.as_slice());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::DetectionModel;
    use perfpair_core::{Capability, Event, MemoryReporter, Runner};
    use std::io::Write;

    #[test]
    fn test_batch_and_sequential_means_agree() {
        let images: Vec<Vec<f32>> = (0..4).map(|_| random_pixels(300)).collect();

        let seq = process_sequential(&images);
        let batch = process_batch(&images);

        assert_eq!(seq.len(), 4);
        for (a, b) in seq.iter().zip(&batch) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
            assert!((0.0..1.0).contains(a));
        }
    }

    #[test]
    fn test_batch_of_empty_images_is_zeroed() {
        assert_eq!(process_batch(&[vec![], vec![]]), vec![0.0, 0.0]);
        assert!(process_batch(&[]).is_empty());
    }

    #[test]
    fn test_detector_threshold_follows_weights() {
        let detector = Detector::from_weights(&[100, 100]);
        assert_eq!(detector.parameters(), 2);
        assert_eq!(detector.detect(&[50.0, 100.0, 150.0, 200.0]), 2);
    }

    #[test]
    fn test_model_loading_group_times_both_patterns() {
        let mut weights = tempfile::NamedTempFile::new().unwrap();
        weights.write_all(&[128u8; 256]).unwrap();

        let reporter = MemoryReporter::new();
        let probes: Vec<Box<dyn Capability>> = vec![Box::new(DetectionModel::new(weights.path()))];
        let caps = Capabilities::probe(&probes, &[], &reporter);
        let suite = suite().retain_groups(|g| g.id == "model_loading");

        Runner::new(&reporter, &caps).run_suite(&suite).unwrap();

        let names: Vec<_> = reporter
            .measurements()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "inefficient_detect (loads every time)",
                "Detector::load (one-time)",
                "detector.detect (reuses model)",
                "detector.detect (reuses model)",
            ]
        );
        let notes: Vec<_> = reporter
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Note { .. }))
            .collect();
        assert_eq!(notes.len(), 2);
    }

    #[test]
    fn test_model_loading_without_handle_is_an_error() {
        let reporter = MemoryReporter::new();
        let caps = Capabilities::from_flags([(DETECTION_MODEL, true)]);
        let suite = suite().retain_groups(|g| g.id == "model_loading");

        let err = Runner::new(&reporter, &caps).run_suite(&suite).unwrap_err();

        assert!(err.to_string().contains("no model handle"));
    }

    #[test]
    fn test_image_groups_skip_without_library() {
        let reporter = MemoryReporter::new();
        let caps = Capabilities::from_flags([(IMAGE_LIBRARY, false), (DETECTION_MODEL, false)]);
        let suite = suite().retain_groups(|g| g.id != "batch_processing");

        let summary = Runner::new(&reporter, &caps).run_suite(&suite).unwrap();

        assert_eq!(summary.groups_run, 0);
        assert_eq!(
            reporter.skipped(),
            vec![
                "image_resizing",
                "model_loading",
                "frame_processing",
                "memory_efficiency",
                "preprocessing_pipeline",
            ]
        );
        assert!(reporter.lines().iter().any(|l| {
            l.contains("Skipping image resizing (1920x1080 -> 640x640) (image-library not available)")
        }));
    }
}
