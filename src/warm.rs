//! Batch pre-generation of cached variants.
//!
//! Walks the media root, and for every supported image and every requested
//! size runs the same [`resize`](crate::resizer::ImageResizer::resize) a
//! storefront request would. The cache subdirectory itself is skipped so
//! resized variants are never resized again.
//!
//! ## Parallel Processing
//!
//! Jobs run on the global [rayon](https://docs.rs/rayon) pool. Each job is an
//! independent resize call; two jobs creating the same cache directory at
//! once is harmless because directory creation is create-if-absent and the
//! resizer re-checks the directory afterwards.
//!
//! Progress is reported through an optional channel of [`WarmEvent`]s so the
//! CLI can print while the pool works.
//!
//! ## Filename collisions
//!
//! A variant keeps only its source's filename, so `a/logo.png` and
//! `b/logo.png` map to the same cache file. Before the pool starts, sources
//! are claimed by filename in walk order: the first one is resized and the
//! rest are reported as [`WarmEvent::Duplicate`]. No two jobs ever write the
//! same file.

use crate::imaging::{Dimensions, ImageBackend, is_supported_image};
use crate::media::{MediaError, ReadDirectory, WriteDirectory};
use crate::resizer::ImageResizer;
use rayon::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WarmError {
    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

/// Outcome of one (image, size) job.
#[derive(Debug, Clone, PartialEq)]
pub enum WarmEvent {
    Resized {
        source: String,
        size: Dimensions,
        output: String,
    },
    /// The resizer returned no image (a filesystem guard failed).
    Skipped { source: String, size: Dimensions },
    /// Another image with the same filename claimed the cache slot.
    Duplicate {
        source: String,
        size: Dimensions,
        kept: String,
    },
    /// The backend could not decode or encode the image.
    Failed {
        source: String,
        size: Dimensions,
        error: String,
    },
}

/// Summary of a warm-up run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WarmReport {
    pub resized: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl WarmReport {
    fn record(&mut self, event: &WarmEvent) {
        match event {
            WarmEvent::Resized { .. } => self.resized += 1,
            WarmEvent::Skipped { .. } | WarmEvent::Duplicate { .. } => self.skipped += 1,
            WarmEvent::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.resized + self.skipped + self.failed
    }
}

impl fmt::Display for WarmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped > 0 || self.failed > 0 {
            write!(
                f,
                "{} resized, {} skipped, {} failed ({} total)",
                self.resized,
                self.skipped,
                self.failed,
                self.total()
            )
        } else {
            write!(f, "{} resized", self.resized)
        }
    }
}

/// List supported images under `root`, root-relative, sorted by path.
///
/// Directories for which `exclude` returns true are not descended into.
/// Unreadable entries are logged and skipped.
pub fn find_images(
    reader: &impl ReadDirectory,
    root: &Path,
    exclude: impl Fn(&Path) -> bool,
) -> Vec<String> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !exclude(entry.path()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable media entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_supported_image(entry.path()))
        .map(|entry| reader.relative_path(entry.path()))
        .collect()
}

/// Whether `path` is named like a size directory, e.g. `150x150`.
fn is_size_directory(path: &Path) -> bool {
    path.is_dir()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.parse::<Dimensions>().is_ok())
}

/// Split `images` into sources that own their cache filename and sources
/// that repeat a filename already seen, paired with the earlier owner.
///
/// Variants keep only the filename, so same-named sources would all write
/// the same file. The first one in walk order wins.
fn claim_filenames(images: &[String]) -> (Vec<&str>, Vec<(&str, &str)>) {
    let mut owners: HashMap<&OsStr, &str> = HashMap::new();
    let mut owned = Vec::new();
    let mut duplicates = Vec::new();
    for source in images {
        let name = Path::new(source).file_name().unwrap_or_default();
        match owners.entry(name) {
            Entry::Occupied(owner) => duplicates.push((source.as_str(), *owner.get())),
            Entry::Vacant(slot) => {
                slot.insert(source.as_str());
                owned.push(source.as_str());
            }
        }
    }
    (owned, duplicates)
}

/// Resize every image under the media root to every size in `sizes`.
///
/// Sources sharing a filename with an earlier source are reported as
/// [`WarmEvent::Duplicate`] and not resized.
pub fn warm<R, W, B>(
    resizer: &ImageResizer<R, W, B>,
    sizes: &[Dimensions],
    events: Option<Sender<WarmEvent>>,
) -> Result<WarmReport, WarmError>
where
    R: ReadDirectory,
    W: WriteDirectory,
    B: ImageBackend,
{
    let root = resizer.reader().absolute_path("")?;
    let cache_root = match resizer.subdirectory() {
        "" => None,
        sub => Some(root.join(sub)),
    };
    let images = find_images(resizer.reader(), &root, |path| match &cache_root {
        Some(cache_root) => path.starts_with(cache_root),
        // Variants sit in <w>x<h> directories straight under the root
        None => path.parent() == Some(root.as_path()) && is_size_directory(path),
    });
    let (owned, duplicates) = claim_filenames(&images);

    let mut outcomes: Vec<WarmEvent> = Vec::new();
    for &(source, kept) in &duplicates {
        warn!(source, kept, "same filename as another image, not resized");
        for &size in sizes {
            let event = WarmEvent::Duplicate {
                source: source.to_string(),
                size,
                kept: kept.to_string(),
            };
            if let Some(tx) = &events {
                tx.send(event.clone()).ok();
            }
            outcomes.push(event);
        }
    }

    let jobs: Vec<(&str, Dimensions)> = owned
        .iter()
        .flat_map(|&source| sizes.iter().map(move |size| (source, *size)))
        .collect();

    let resized: Vec<WarmEvent> = jobs
        .par_iter()
        .map(|&(source, size)| {
            let event = match resizer.resize(source, size.width, size.height) {
                Ok(Some(output)) => WarmEvent::Resized {
                    source: source.to_string(),
                    size,
                    output,
                },
                Ok(None) => WarmEvent::Skipped {
                    source: source.to_string(),
                    size,
                },
                Err(e) => {
                    warn!(source, %size, error = %e, "resize failed");
                    WarmEvent::Failed {
                        source: source.to_string(),
                        size,
                        error: e.to_string(),
                    }
                }
            };
            if let Some(tx) = &events {
                tx.send(event.clone()).ok();
            }
            event
        })
        .collect();
    outcomes.extend(resized);

    let mut report = WarmReport::default();
    for event in &outcomes {
        report.record(event);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{create_test_jpeg, create_test_png, sep, setup_media};
    use std::fs;

    #[test]
    fn find_images_skips_cache_and_unsupported_files() {
        let (tmp, media) = setup_media();
        fs::create_dir_all(tmp.path().join("catalog/product")).unwrap();
        fs::create_dir_all(tmp.path().join("resized/150x150")).unwrap();
        create_test_jpeg(&tmp.path().join("catalog/product/shoe.jpg"), 10, 10);
        create_test_png(&tmp.path().join("logo.png"), 10, 10);
        create_test_jpeg(&tmp.path().join("resized/150x150/shoe.jpg"), 10, 10);
        fs::write(tmp.path().join("catalog/readme.txt"), "hi").unwrap();

        let resized = media.root().join("resized");
        let images = find_images(&media, media.root(), |p| p.starts_with(&resized));
        assert_eq!(
            images,
            vec![sep(&["catalog", "product", "shoe.jpg"]), "logo.png".to_string()]
        );
    }

    #[test]
    fn warm_resizes_every_image_at_every_size() {
        let (tmp, media) = setup_media();
        fs::create_dir_all(tmp.path().join("catalog")).unwrap();
        create_test_jpeg(&tmp.path().join("catalog/shoe.jpg"), 400, 200);
        create_test_png(&tmp.path().join("logo.png"), 100, 100);
        let resizer = ImageResizer::new(media.clone(), media.clone(), RustBackend::new());

        let sizes = [Dimensions::new(150, 150), Dimensions::new(64, 64)];
        let report = warm(&resizer, &sizes, None).unwrap();

        assert_eq!(
            report,
            WarmReport {
                resized: 4,
                skipped: 0,
                failed: 0
            }
        );
        assert!(tmp.path().join("resized/150x150/shoe.jpg").is_file());
        assert!(tmp.path().join("resized/64x64/shoe.jpg").is_file());
        assert!(tmp.path().join("resized/150x150/logo.png").is_file());
        assert!(tmp.path().join("resized/64x64/logo.png").is_file());
    }

    #[test]
    fn warm_twice_does_not_resize_cached_variants() {
        let (tmp, media) = setup_media();
        create_test_jpeg(&tmp.path().join("shoe.jpg"), 40, 20);
        let resizer = ImageResizer::new(media.clone(), media.clone(), RustBackend::new());
        let sizes = [Dimensions::new(20, 20)];

        warm(&resizer, &sizes, None).unwrap();
        let second = warm(&resizer, &sizes, None).unwrap();
        // Only the source is picked up; resized/ is excluded from the walk
        assert_eq!(second.total(), 1);
        assert!(!tmp.path().join("resized/20x20/resized").exists());
    }

    #[test]
    fn warm_reports_failures_and_skips() {
        let (tmp, media) = setup_media();
        create_test_jpeg(&tmp.path().join("a.jpg"), 10, 10);
        fs::write(tmp.path().join("broken.jpg"), b"not an image").unwrap();

        // Failing backend: every job fails
        let failing = ImageResizer::new(media.clone(), media.clone(), MockBackend::failing());
        let report = warm(&failing, &[Dimensions::new(8, 8)], None).unwrap();
        assert_eq!(report.failed, 2);

        // Backend that writes nothing: every job is skipped
        let silent = ImageResizer::new(media.clone(), media.clone(), MockBackend::new());
        let report = warm(&silent, &[Dimensions::new(8, 8)], None).unwrap();
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn warm_streams_events() {
        let (tmp, media) = setup_media();
        create_test_jpeg(&tmp.path().join("a.jpg"), 10, 10);
        let resizer = ImageResizer::new(media.clone(), media.clone(), MockBackend::writing());

        let (tx, rx) = std::sync::mpsc::channel();
        let report = warm(&resizer, &[Dimensions::new(5, 5)], Some(tx)).unwrap();
        let events: Vec<WarmEvent> = rx.iter().collect();

        assert_eq!(report.resized, 1);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            WarmEvent::Resized { source, size, .. } if source == "a.jpg" && *size == Dimensions::new(5, 5)
        ));
    }

    #[test]
    fn warm_with_empty_subdirectory_still_finds_images() {
        let (tmp, media) = setup_media();
        create_test_jpeg(&tmp.path().join("a.jpg"), 10, 10);
        let resizer = ImageResizer::new(media.clone(), media.clone(), MockBackend::writing())
            .with_subdirectory("");

        let report = warm(&resizer, &[Dimensions::new(5, 5)], None).unwrap();
        assert_eq!(report.resized, 1);
        assert!(tmp.path().join("5x5/a.jpg").is_file());
    }

    #[test]
    fn warm_rerun_with_empty_subdirectory_skips_size_directories() {
        let (tmp, media) = setup_media();
        create_test_jpeg(&tmp.path().join("a.jpg"), 10, 10);
        fs::create_dir_all(tmp.path().join("photos")).unwrap();
        create_test_jpeg(&tmp.path().join("photos/b.jpg"), 10, 10);
        let resizer = ImageResizer::new(media.clone(), media.clone(), RustBackend::new())
            .with_subdirectory("");
        let sizes = [Dimensions::new(5, 5)];

        warm(&resizer, &sizes, None).unwrap();
        let second = warm(&resizer, &sizes, None).unwrap();

        assert_eq!(second.total(), 2);
        assert_eq!(second.resized, 2);
        assert!(!tmp.path().join("5x5/5x5").exists());
    }

    #[test]
    fn same_filename_in_different_directories_resizes_first_only() {
        let (tmp, media) = setup_media();
        fs::create_dir_all(tmp.path().join("a")).unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        create_test_png(&tmp.path().join("a/logo.png"), 40, 20);
        create_test_png(&tmp.path().join("b/logo.png"), 20, 40);
        let resizer = ImageResizer::new(media.clone(), media.clone(), RustBackend::new());

        let (tx, rx) = std::sync::mpsc::channel();
        let report = warm(&resizer, &[Dimensions::new(20, 20)], Some(tx)).unwrap();
        let events: Vec<WarmEvent> = rx.iter().collect();

        assert_eq!(
            report,
            WarmReport {
                resized: 1,
                skipped: 1,
                failed: 0
            }
        );
        let kept_source = sep(&["a", "logo.png"]);
        assert!(events.iter().any(|e| matches!(
            e,
            WarmEvent::Duplicate { source, kept, .. }
                if *source == sep(&["b", "logo.png"]) && *kept == kept_source
        )));
        // a/logo.png is 2:1, so its variant is 20x10
        assert_eq!(
            image::image_dimensions(tmp.path().join("resized/20x20/logo.png")).unwrap(),
            (20, 10)
        );
    }

    #[test]
    fn claim_filenames_keeps_first_in_order() {
        let images = vec![
            sep(&["a", "logo.png"]),
            sep(&["a", "shoe.jpg"]),
            sep(&["b", "logo.png"]),
            "logo.png".to_string(),
        ];
        let (owned, duplicates) = claim_filenames(&images);

        assert_eq!(owned, vec![images[0].as_str(), images[1].as_str()]);
        assert_eq!(
            duplicates,
            vec![
                (images[2].as_str(), images[0].as_str()),
                (images[3].as_str(), images[0].as_str()),
            ]
        );
    }

    #[test]
    fn warm_empty_media_root() {
        let (_tmp, media) = setup_media();
        let resizer = ImageResizer::new(media.clone(), media.clone(), MockBackend::writing());
        let report = warm(&resizer, &[Dimensions::new(5, 5)], None).unwrap();
        assert_eq!(report, WarmReport::default());
    }

    // =========================================================================
    // WarmReport
    // =========================================================================

    #[test]
    fn report_display_all_resized() {
        let report = WarmReport {
            resized: 7,
            ..WarmReport::default()
        };
        assert_eq!(report.to_string(), "7 resized");
    }

    #[test]
    fn report_display_with_problems() {
        let report = WarmReport {
            resized: 3,
            skipped: 1,
            failed: 2,
        };
        assert_eq!(report.to_string(), "3 resized, 1 skipped, 2 failed (6 total)");
    }
}
