//! Visual capture: designated regions → PNG data URIs, in document order.
//!
//! [`VisualCapturer`] is the capability the export pipeline depends on; any
//! environment that can rasterise the current view (a headless renderer, a
//! test double returning canned images) implements it. [`ImageRegionCapturer`]
//! is the headless implementation used by the CLI: each region is an already
//! rendered chart image on disk, tagged like a DOM element so the usual
//! `.chart-capture` selector picks it up.
//!
//! Regions are captured one at a time. Later regions never start before the
//! earlier ones finish, which keeps output order deterministic and avoids
//! contention on shared drawing state.

use crate::error::FilingError;
use crate::export::encode::encode_data_url;
use futures::stream::{self, StreamExt};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Upper bound of the capture scale factor.
pub const MAX_CAPTURE_SCALE: f64 = 3.0;

/// One rendered snapshot of a region, as sent to the report service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureImage {
    #[serde(rename = "dataUrl")]
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// Renders the regions matching a selector to images.
///
/// Implementations return an empty vec, never an error, when nothing matches
/// or when no visual environment is available.
pub trait VisualCapturer: Send + Sync {
    fn capture(&self, selector: &str) -> impl Future<Output = Vec<CaptureImage>> + Send;
}

/// Scale factor for a device pixel ratio: `min(3, ratio × 2)`.
///
/// Unknown, zero or negative ratios count as 1.
pub fn capture_scale(device_pixel_ratio: Option<f64>) -> f64 {
    let ratio = device_pixel_ratio
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(1.0);
    (ratio * 2.0).min(MAX_CAPTURE_SCALE)
}

/// A capturable region backed by a rendered image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRegion {
    /// Region id, matched by `#id` selectors.
    pub id: String,
    /// Class names, matched by `.class` selectors.
    pub classes: Vec<String>,
    /// Rendered image of the region at 1× density.
    pub source: PathBuf,
}

impl CaptureRegion {
    pub fn new(id: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            classes: Vec::new(),
            source: source.into(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Match a simple selector: `*`, `.class`, `#id`, or a comma-separated
    /// list of those.
    pub fn matches(&self, selector: &str) -> bool {
        selector.split(',').map(str::trim).any(|s| {
            if s == "*" {
                true
            } else if let Some(class) = s.strip_prefix('.') {
                self.classes.iter().any(|c| c == class)
            } else if let Some(id) = s.strip_prefix('#') {
                self.id == id
            } else {
                false
            }
        })
    }
}

/// Headless capturer over pre-rendered region images.
#[derive(Debug, Clone)]
pub struct ImageRegionCapturer {
    regions: Vec<CaptureRegion>,
    device_pixel_ratio: f64,
    available: bool,
}

impl ImageRegionCapturer {
    /// A capturer for a display with the given device pixel ratio.
    pub fn new(device_pixel_ratio: f64) -> Self {
        Self {
            regions: Vec::new(),
            device_pixel_ratio,
            available: true,
        }
    }

    /// A capturer with no visual environment; every capture is empty.
    pub fn unavailable() -> Self {
        Self {
            regions: Vec::new(),
            device_pixel_ratio: 1.0,
            available: false,
        }
    }

    /// Append a region; regions are captured in insertion order.
    pub fn with_region(mut self, region: CaptureRegion) -> Self {
        self.regions.push(region);
        self
    }

    pub fn regions(&self) -> &[CaptureRegion] {
        &self.regions
    }

    pub fn scale(&self) -> f64 {
        capture_scale(Some(self.device_pixel_ratio))
    }
}

impl VisualCapturer for ImageRegionCapturer {
    async fn capture(&self, selector: &str) -> Vec<CaptureImage> {
        if !self.available {
            debug!("No visual environment; skipping capture");
            return Vec::new();
        }

        let targets: Vec<&CaptureRegion> =
            self.regions.iter().filter(|r| r.matches(selector)).collect();
        if targets.is_empty() {
            debug!("No regions match '{}'", selector);
            return Vec::new();
        }

        let scale = self.scale();
        let total = targets.len();
        info!("Capturing {} region(s) at {}x", total, scale);

        stream::iter(targets)
            .then(|region| async move {
                let result = rasterize(region.source.clone(), scale).await;
                (region, result)
            })
            .filter_map(|(region, result)| async move {
                match result {
                    Ok(image) => {
                        debug!("Captured '{}' → {}x{}", region.id, image.width, image.height);
                        Some(image)
                    }
                    Err(e) => {
                        warn!("Skipping region '{}': {}", region.id, e);
                        None
                    }
                }
            })
            .collect()
            .await
    }
}

/// Decode, scale and encode one region off the async worker threads.
async fn rasterize(source: PathBuf, scale: f64) -> Result<CaptureImage, FilingError> {
    tokio::task::spawn_blocking(move || rasterize_blocking(&source, scale))
        .await
        .map_err(|e| FilingError::Internal(format!("Capture task panicked: {}", e)))?
}

fn rasterize_blocking(source: &Path, scale: f64) -> Result<CaptureImage, FilingError> {
    let img = image::open(source).map_err(|e| {
        FilingError::Internal(format!("cannot read '{}': {}", source.display(), e))
    })?;

    let width = scaled(img.width(), scale);
    let height = scaled(img.height(), scale);
    let img = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::CatmullRom)
    };

    let data_url = encode_data_url(&img)
        .map_err(|e| FilingError::Internal(format!("PNG encoding failed: {}", e)))?;

    Ok(CaptureImage {
        data_url,
        width,
        height,
    })
}

fn scaled(px: u32, scale: f64) -> u32 {
    ((px as f64) * scale).round().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.path().join(name);
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([34, 211, 238, 255])))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn scale_is_capped_at_three() {
        assert_eq!(capture_scale(Some(1.0)), 2.0);
        assert_eq!(capture_scale(Some(1.25)), 2.5);
        assert_eq!(capture_scale(Some(2.0)), 3.0);
        assert_eq!(capture_scale(Some(4.0)), 3.0);
        assert_eq!(capture_scale(None), 2.0);
        assert_eq!(capture_scale(Some(0.0)), 2.0);
        assert_eq!(capture_scale(Some(f64::NAN)), 2.0);
    }

    #[test]
    fn selector_matching() {
        let r = CaptureRegion::new("pl-chart", "pl.png").with_class("chart-capture");
        assert!(r.matches(".chart-capture"));
        assert!(r.matches("#pl-chart"));
        assert!(r.matches(".other, #pl-chart"));
        assert!(r.matches("*"));
        assert!(!r.matches(".other"));
        assert!(!r.matches("chart-capture"));
    }

    #[test]
    fn capture_image_serialises_camel_case() {
        let img = CaptureImage {
            data_url: "data:image/png;base64,AA==".into(),
            width: 2,
            height: 1,
        };
        let v = serde_json::to_value(&img).unwrap();
        assert_eq!(v["dataUrl"], "data:image/png;base64,AA==");
        assert_eq!(v["width"], 2);
    }

    #[tokio::test]
    async fn captures_matching_regions_in_order_at_scale() {
        let dir = TempDir::new().unwrap();
        let capturer = ImageRegionCapturer::new(1.0)
            .with_region(
                CaptureRegion::new("pl", write_png(&dir, "pl.png", 10, 5)).with_class("chart-capture"),
            )
            .with_region(CaptureRegion::new("raw", write_png(&dir, "raw.png", 3, 3)))
            .with_region(
                CaptureRegion::new("cf", write_png(&dir, "cf.png", 4, 8)).with_class("chart-capture"),
            );

        let images = capturer.capture(".chart-capture").await;
        let dims: Vec<(u32, u32)> = images.iter().map(|i| (i.width, i.height)).collect();
        assert_eq!(dims, [(20, 10), (8, 16)]);
        assert!(images[0].data_url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn unreadable_region_is_skipped() {
        let dir = TempDir::new().unwrap();
        let capturer = ImageRegionCapturer::new(2.0)
            .with_region(CaptureRegion::new("gone", dir.path().join("missing.png")).with_class("c"))
            .with_region(CaptureRegion::new("ok", write_png(&dir, "ok.png", 2, 2)).with_class("c"));

        let images = capturer.capture(".c").await;
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width, images[0].height), (6, 6));
    }

    #[tokio::test]
    async fn no_regions_or_no_environment_is_empty() {
        assert!(ImageRegionCapturer::new(1.0).capture(".chart-capture").await.is_empty());

        let dir = TempDir::new().unwrap();
        let headless = ImageRegionCapturer::unavailable().with_region(
            CaptureRegion::new("pl", write_png(&dir, "pl.png", 2, 2)).with_class("chart-capture"),
        );
        assert!(headless.capture(".chart-capture").await.is_empty());
    }
}
