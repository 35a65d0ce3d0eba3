//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the resizer needs:
//! identify and resize. A resize call covers the whole open → keep aspect
//! ratio → scale → save sequence, so the caller never holds a decoded image
//! or an open file between steps.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::ResizeParams;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image or a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `WxH` (e.g. `150x150`). Both sides must be positive integers.
impl FromStr for Dimensions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid width '{w}'"))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid height '{h}'"))?;
        if width == 0 || height == 0 {
            return Err(format!("dimensions must be positive, got '{s}'"));
        }
        Ok(Self { width, height })
    }
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can serve the rayon pool in
/// [`warm`](crate::warm).
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode `params.source`, scale it and encode it to `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records operations without decoding anything.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    ///
    /// With `write_output` set, `resize` writes a placeholder file at the
    /// output path so filesystem post-checks pass.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        pub write_output: bool,
        pub fail_resize: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            output: String,
            width: u32,
            height: u32,
            keep_aspect_ratio: bool,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// A backend whose resizes leave a file behind.
        pub fn writing() -> Self {
            Self {
                write_output: true,
                ..Self::default()
            }
        }

        /// A backend whose resizes fail the way a corrupt image would.
        pub fn failing() -> Self {
            Self {
                fail_resize: true,
                ..Self::default()
            }
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                keep_aspect_ratio: params.keep_aspect_ratio,
                quality: params.quality.value(),
            });
            if self.fail_resize {
                return Err(BackendError::ProcessingFailed(format!(
                    "Failed to decode {}",
                    params.source.display()
                )));
            }
            if self.write_output {
                std::fs::write(&params.output, b"resized")?;
            }
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions::new(800, 600)]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result, Dimensions::new(800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::new();

        backend
            .resize(&ResizeParams {
                source: "/source.jpg".into(),
                output: "/output.jpg".into(),
                width: 150,
                height: 150,
                keep_aspect_ratio: true,
                quality: Quality::new(80),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 150,
                height: 150,
                keep_aspect_ratio: true,
                quality: 80,
                ..
            }
        ));
    }

    #[test]
    fn dimensions_parse_and_display() {
        let dims: Dimensions = "300x200".parse().unwrap();
        assert_eq!(dims, Dimensions::new(300, 200));
        assert_eq!(dims.to_string(), "300x200");
        assert_eq!("64X48".parse::<Dimensions>().unwrap(), Dimensions::new(64, 48));
    }

    #[test]
    fn dimensions_parse_rejects_malformed() {
        assert!("300".parse::<Dimensions>().is_err());
        assert!("axb".parse::<Dimensions>().is_err());
        assert!("0x150".parse::<Dimensions>().is_err());
        assert!("150x0".parse::<Dimensions>().is_err());
        assert!("-1x5".parse::<Dimensions>().is_err());
    }
}
