//! Optional capabilities used by the vision suite.

use perfpair_core::{Capability, CapabilityError};
use std::any::Any;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Image decoding and resampling (the `image` crate)
pub const IMAGE_LIBRARY: &str = "image-library";

/// Detection model weights on disk
pub const DETECTION_MODEL: &str = "detection-model-library";

/// Where the detection model is looked for when nothing is configured
pub const DEFAULT_MODEL_PATH: &str = "models/yolov8n.onnx";

/// Probes for every capability, in probe order.
pub fn probes(model_path: impl Into<PathBuf>) -> Vec<Box<dyn Capability>> {
    vec![
        Box::new(ImageLibrary),
        Box::new(DetectionModel::new(model_path)),
    ]
}

/// The `image` crate, present when built with the `imaging` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageLibrary;

impl Capability for ImageLibrary {
    fn name(&self) -> &'static str {
        IMAGE_LIBRARY
    }

    fn install_hint(&self) -> String {
        "Rebuild with: cargo build --features imaging".to_string()
    }

    #[cfg(feature = "imaging")]
    fn acquire(&self) -> Result<Box<dyn Any>, CapabilityError> {
        use image::{ImageFormat, RgbImage};
        use std::io::Cursor;

        // Round-trip one pixel so a broken codec shows up here, not mid-run.
        let probe = RgbImage::from_pixel(1, 1, image::Rgb([255, 0, 0]));
        let mut buf = Cursor::new(Vec::new());
        probe
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| CapabilityError::Invalid(e.to_string()))?;
        image::load_from_memory_with_format(buf.get_ref(), ImageFormat::Png)
            .map_err(|e| CapabilityError::Invalid(e.to_string()))?;

        Ok(Box::new(ImageFormat::Png))
    }

    #[cfg(not(feature = "imaging"))]
    fn acquire(&self) -> Result<Box<dyn Any>, CapabilityError> {
        Err(CapabilityError::NotCompiled)
    }
}

/// Handle kept for an acquired detection model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    /// Weights file
    pub path: PathBuf,
    /// Size in bytes at probe time
    pub len: u64,
}

/// A detection model weights file at a configurable path.
#[derive(Debug, Clone)]
pub struct DetectionModel {
    path: PathBuf,
}

impl DetectionModel {
    /// Model expected at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Where the weights are looked for
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Capability for DetectionModel {
    fn name(&self) -> &'static str {
        DETECTION_MODEL
    }

    fn install_hint(&self) -> String {
        format!(
            "Place model weights at {} or set [capabilities] model_path in perfpair.toml",
            self.path.display()
        )
    }

    fn acquire(&self) -> Result<Box<dyn Any>, CapabilityError> {
        let io_err = |source| CapabilityError::Io {
            path: self.path.clone(),
            source,
        };

        let file = File::open(&self.path).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();
        if len == 0 {
            return Err(CapabilityError::Invalid(format!(
                "{} is empty",
                self.path.display()
            )));
        }

        Ok(Box::new(ModelFile {
            path: self.path.clone(),
            len,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfpair_core::{Capabilities, MemoryReporter};
    use std::io::Write;

    #[test]
    fn test_model_file_is_acquired_with_handle() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 64]).unwrap();

        let handle = DetectionModel::new(file.path()).acquire().unwrap();
        let model = handle.downcast_ref::<ModelFile>().unwrap();

        assert_eq!(model.path, file.path());
        assert_eq!(model.len, 64);
    }

    #[test]
    fn test_missing_model_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DetectionModel::new(dir.path().join("absent.onnx"))
            .acquire()
            .unwrap_err();

        assert!(matches!(err, CapabilityError::Io { .. }));
    }

    #[test]
    fn test_empty_model_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = DetectionModel::new(file.path()).acquire().unwrap_err();

        assert!(matches!(err, CapabilityError::Invalid(_)));
    }

    #[test]
    fn test_probes_report_missing_model_with_path_hint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yolo.onnx");
        let reporter = MemoryReporter::new();

        let caps = Capabilities::probe(&probes(&path), &[], &reporter);

        assert!(!caps.is_available(DETECTION_MODEL));
        assert_eq!(caps.is_available(IMAGE_LIBRARY), cfg!(feature = "imaging"));
        let lines = reporter.lines();
        let note = lines
            .iter()
            .find(|l| l.contains(DETECTION_MODEL))
            .unwrap();
        assert!(note.contains(&path.display().to_string()));
        assert!(note.contains("model_path"));
    }

    #[cfg(feature = "imaging")]
    #[test]
    fn test_image_library_round_trips_png() {
        let handle = ImageLibrary.acquire().unwrap();
        assert_eq!(
            handle.downcast_ref::<image::ImageFormat>(),
            Some(&image::ImageFormat::Png)
        );
    }

    #[cfg(not(feature = "imaging"))]
    #[test]
    fn test_image_library_is_compiled_out() {
        assert!(matches!(
            ImageLibrary.acquire(),
            Err(CapabilityError::NotCompiled)
        ));
    }
}
