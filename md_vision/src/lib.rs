//! ABOUTME: Block-based frame-difference motion detection for constrained devices
//! ABOUTME: Frame ingest, rolling background, block aggregation and edge-triggered publishing

use image::{GrayImage, Luma};
use md_core::{Error, MonotonicTimer, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use validator::Validate;

pub mod background;
pub mod block_detector;
pub mod blocks;
pub mod classifier;
pub mod frame;
pub mod ingest;
pub mod sink;

pub use background::{BackgroundModel, DiffMap};
pub use block_detector::BlockMotionDetector;
pub use blocks::{Block, BlockGrid};
pub use classifier::{MotionClassifier, MotionState};
pub use frame::Frame;
pub use ingest::FrameIngest;
pub use sink::{BinarySensor, EdgePublisher, LogSink, StateSink};

// Re-export image types for benchmarks
pub use image;

/// Detector parameters, fixed for the lifetime of a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MotionConfig {
    /// Per-pixel difference a pixel must exceed to count as changed
    #[serde(alias = "threshold")]
    pub pixel_diff_threshold: u32,
    /// Active blocks needed to report motion
    pub motion_blocks_threshold: u32,
    /// Frames skipped between evaluations (0 = evaluate every frame)
    pub frame_skip: u32,
    #[validate(range(min = 1))]
    pub block_width: u32,
    #[validate(range(min = 1))]
    pub block_height: u32,
    /// Background smoothing factor (0.0 to 1.0)
    #[validate(range(min = 0.0, max = 1.0))]
    pub background_alpha: f32,
    /// Working frame width after resizing
    #[validate(range(min = 1))]
    pub output_width: u32,
    /// Working frame height after resizing
    #[validate(range(min = 1))]
    pub output_height: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            pixel_diff_threshold: 25,
            motion_blocks_threshold: 5,
            frame_skip: 5,
            block_width: 8,
            block_height: 8,
            background_alpha: 0.05,
            output_width: 128,
            output_height: 96,
        }
    }
}

impl MotionConfig {
    /// Check every parameter against its allowed range
    pub fn check(&self) -> Result<()> {
        if !self.background_alpha.is_finite() {
            return Err(Error::ConfigOutOfRange(format!(
                "background_alpha must be finite, got {}",
                self.background_alpha
            )));
        }

        self.validate()
            .map_err(|e| Error::ConfigOutOfRange(e.to_string()))
    }
}

/// Outcome of ingesting one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionReport {
    /// Zero-based index among all ingested frames
    pub frame_index: u64,
    /// Whether diffing and classification ran for this frame
    pub evaluated: bool,
    /// Motion state after this frame
    pub motion_detected: bool,
    /// Active blocks in the most recent evaluation
    pub active_blocks: usize,
    /// Blocks in the grid
    pub total_blocks: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Detector plus decoding and edge-triggered publishing
pub struct MotionDetectionService {
    detector: BlockMotionDetector,
    publisher: Option<EdgePublisher>,
}

impl MotionDetectionService {
    /// Create a service without a sink
    pub fn new(config: MotionConfig) -> Result<Self> {
        Ok(Self {
            detector: BlockMotionDetector::new(config)?,
            publisher: None,
        })
    }

    /// Create a service that publishes state changes to `sink`
    pub fn with_sink(config: MotionConfig, sink: Box<dyn StateSink>) -> Result<Self> {
        Ok(Self {
            detector: BlockMotionDetector::new(config)?,
            publisher: Some(EdgePublisher::new(sink)),
        })
    }

    /// Detect motion in an encoded frame (JPEG/PNG bytes)
    pub fn detect_motion_from_bytes(&mut self, image_data: &[u8]) -> Result<MotionReport> {
        let timer = MonotonicTimer::new();

        let img = image::load_from_memory(image_data).map_err(|e| {
            warn!("Rejecting undecodable frame: {}", e);
            Error::Decode(format!("Failed to decode image: {}", e))
        })?;
        let gray_img = img.to_luma8();

        let mut report = self.detect(&Frame::try_from(&gray_img)?)?;
        report.processing_time_ms = timer.elapsed_ms();
        Ok(report)
    }

    /// Detect motion from raw grayscale frame data
    pub fn detect_motion_from_frame(
        &mut self,
        frame_data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<MotionReport> {
        let frame = Frame::new(width, height, frame_data).map_err(|e| {
            warn!("Rejecting raw frame: {}", e);
            e
        })?;
        self.detect(&frame)
    }

    fn detect(&mut self, frame: &Frame<'_>) -> Result<MotionReport> {
        let report = self.detector.process_detailed(frame)?;

        if report.evaluated {
            if let Some(publisher) = self.publisher.as_mut() {
                if publisher.offer(report.motion_detected) {
                    debug!(
                        "Published motion={} at frame {}",
                        report.motion_detected, report.frame_index
                    );
                }
            }
        }

        Ok(report)
    }

    /// Reset detector state
    pub fn reset(&mut self) {
        self.detector.reset();
    }

    /// Get current configuration
    pub fn config(&self) -> &MotionConfig {
        self.detector.config()
    }

    /// Replace the configuration; the background is rebuilt from scratch
    pub fn update_config(&mut self, config: MotionConfig) -> Result<()> {
        self.detector = BlockMotionDetector::new(config)?;
        Ok(())
    }

    pub fn detector(&self) -> &BlockMotionDetector {
        &self.detector
    }

    pub fn motion(&self) -> bool {
        self.detector.motion()
    }

    /// States forwarded to the sink so far
    pub fn published_count(&self) -> u64 {
        self.publisher
            .as_ref()
            .map(EdgePublisher::published_count)
            .unwrap_or(0)
    }
}

impl BinarySensor for MotionDetectionService {
    fn state(&self) -> bool {
        self.motion()
    }
}

/// Synthetic frame builders for tests, benches and demos
pub mod utils {
    use super::*;

    /// Frame of a single gray level
    pub fn create_uniform_frame(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    /// Fill a rectangle, clipped to the frame
    pub fn paint_region(img: &mut GrayImage, x: u32, y: u32, width: u32, height: u32, value: u8) {
        let (img_w, img_h) = img.dimensions();
        for py in y..(y + height).min(img_h) {
            for px in x..(x + width).min(img_w) {
                img.put_pixel(px, py, Luma([value]));
            }
        }
    }

    /// Create a synthetic frame with motion in specified region
    pub fn create_test_frame_with_motion(
        width: u32,
        height: u32,
        motion_x: u32,
        motion_y: u32,
        motion_width: u32,
        motion_height: u32,
        intensity: u8,
    ) -> GrayImage {
        let mut img = create_uniform_frame(width, height, 64); // Dark gray background
        paint_region(
            &mut img,
            motion_x,
            motion_y,
            motion_width,
            motion_height,
            intensity,
        );
        img
    }

    /// Square of `size` pixels sliding right by `step` pixels per frame
    pub fn create_moving_square_frame(
        width: u32,
        height: u32,
        frame_index: u32,
        size: u32,
        step: u32,
    ) -> GrayImage {
        let travel = width.saturating_sub(size).max(1);
        let x = (frame_index * step) % travel;
        let y = height.saturating_sub(size) / 2;
        create_test_frame_with_motion(width, height, x, y, size, size, 220)
    }

    /// Encode as PNG bytes (lossless, so decoded pixels match exactly)
    pub fn image_to_png_bytes(img: &GrayImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .map_err(|e| Error::Decode(format!("Failed to encode PNG: {}", e)))?;
        Ok(buffer)
    }

    /// Encode as JPEG bytes
    pub fn image_to_jpeg_bytes(img: &GrayImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb_img = image::DynamicImage::ImageLuma8(img.clone()).to_rgb8();
        rgb_img
            .write_to(
                &mut std::io::Cursor::new(&mut buffer),
                image::ImageFormat::Jpeg,
            )
            .map_err(|e| Error::Decode(format!("Failed to encode JPEG: {}", e)))?;
        Ok(buffer)
    }
}
