//! ABOUTME: Block-based frame-difference motion detector
//! ABOUTME: Wires ingest, background model, block grid and classifier per frame

use crate::{
    BackgroundModel, BinarySensor, Block, BlockGrid, Frame, FrameIngest, MotionClassifier,
    MotionConfig, MotionReport, MotionState,
};
use image::GrayImage;
use md_core::{MonotonicTimer, Result};
use tracing::{debug, info};

/// Motion detector over a stream of grayscale frames
///
/// Owns every buffer it needs; calls to [`process`](Self::process) must be
/// serialized by the caller.
pub struct BlockMotionDetector {
    config: MotionConfig,
    ingest: FrameIngest,
    background: BackgroundModel,
    grid: BlockGrid,
    classifier: MotionClassifier,
    last_active: usize,
}

impl BlockMotionDetector {
    /// Create a detector, rejecting out-of-range parameters
    pub fn new(config: MotionConfig) -> Result<Self> {
        config.check()?;

        info!(
            "Creating block motion detector: {}x{} working frame, {}x{} blocks, alpha={}",
            config.output_width,
            config.output_height,
            config.block_width,
            config.block_height,
            config.background_alpha
        );

        let mut grid = BlockGrid::new(config.block_width, config.block_height);
        grid.layout(config.output_width, config.output_height);

        Ok(Self {
            ingest: FrameIngest::new(config.output_width, config.output_height),
            background: BackgroundModel::new(config.background_alpha),
            grid,
            classifier: MotionClassifier::new(config.frame_skip, config.motion_blocks_threshold),
            last_active: 0,
            config,
        })
    }

    /// Ingest one frame and return the current motion state
    pub fn process(&mut self, frame: &Frame<'_>) -> Result<bool> {
        Ok(self.process_detailed(frame)?.motion_detected)
    }

    /// Validate a raw buffer as a frame and process it
    ///
    /// A rejected buffer does not count as an ingested frame.
    pub fn process_raw(&mut self, data: &[u8], width: u32, height: u32) -> Result<bool> {
        let frame = Frame::new(width, height, data)?;
        self.process(&frame)
    }

    /// Ingest one frame and report what happened to it
    pub fn process_detailed(&mut self, frame: &Frame<'_>) -> Result<MotionReport> {
        let timer = MonotonicTimer::new();
        let frame_index = self.classifier.frames_seen();

        if !self.classifier.tick() {
            return Ok(self.report(frame_index, false, timer.elapsed_ms()));
        }

        let working = self.ingest.resize(frame);
        let diff = self.background.update_and_diff(working);
        let active = self.grid.evaluate(diff, self.config.pixel_diff_threshold);
        let state = self.classifier.classify(active);
        self.last_active = active;

        debug!(
            "Frame {} evaluated: active_blocks={}/{}, state={}",
            frame_index,
            active,
            self.grid.len(),
            state
        );

        Ok(self.report(frame_index, true, timer.elapsed_ms()))
    }

    fn report(&self, frame_index: u64, evaluated: bool, processing_time_ms: u64) -> MotionReport {
        MotionReport {
            frame_index,
            evaluated,
            motion_detected: self.classifier.state().is_motion(),
            active_blocks: self.last_active,
            total_blocks: self.grid.len(),
            processing_time_ms,
        }
    }

    /// Drop the background and frame counter; the next frame starts fresh
    pub fn reset(&mut self) {
        debug!("Resetting block motion detector state");
        self.background.reset();
        self.classifier.reset();
        self.last_active = 0;
    }

    pub fn motion(&self) -> bool {
        self.classifier.state().is_motion()
    }

    pub fn state(&self) -> MotionState {
        self.classifier.state()
    }

    /// Ingested frames, skipped ones included
    pub fn frames_seen(&self) -> u64 {
        self.classifier.frames_seen()
    }

    /// Size-reduced frame from the last evaluation
    pub fn working_frame(&self) -> &GrayImage {
        self.ingest.working_frame()
    }

    /// Per-block counts from the last evaluation
    pub fn blocks(&self) -> &[Block] {
        self.grid.blocks()
    }

    pub fn grid(&self) -> &BlockGrid {
        &self.grid
    }

    pub fn background(&self) -> &BackgroundModel {
        &self.background
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn algorithm_name(&self) -> &'static str {
        "BlockDiff"
    }
}

impl BinarySensor for BlockMotionDetector {
    fn state(&self) -> bool {
        self.motion()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::*;
    use md_core::Error;

    fn create_test_config() -> MotionConfig {
        MotionConfig {
            pixel_diff_threshold: 25,
            motion_blocks_threshold: 5,
            frame_skip: 0,
            block_width: 8,
            block_height: 8,
            background_alpha: 0.05,
            output_width: 128,
            output_height: 96,
        }
    }

    /// 128x96 frame of gray(100) with one painted rectangle
    fn scene(x: u32, y: u32, width: u32, height: u32, value: u8) -> GrayImage {
        let mut img = create_uniform_frame(128, 96, 100);
        paint_region(&mut img, x, y, width, height, value);
        img
    }

    #[test]
    fn test_detector_creation() {
        let detector = BlockMotionDetector::new(create_test_config()).unwrap();
        assert_eq!(detector.algorithm_name(), "BlockDiff");
        assert_eq!(detector.grid().len(), 192);
        assert_eq!(detector.grid().grid_dimensions(), (16, 12));
        assert!(!detector.motion());
    }

    #[test]
    fn test_detector_rejects_bad_config() {
        let config = MotionConfig {
            block_width: 0,
            ..create_test_config()
        };
        assert!(matches!(
            BlockMotionDetector::new(config),
            Err(Error::ConfigOutOfRange(_))
        ));
    }

    #[test]
    fn test_first_frame_no_motion() {
        let mut detector = BlockMotionDetector::new(create_test_config()).unwrap();
        let frame = create_test_frame_with_motion(128, 96, 0, 0, 128, 96, 240);

        let report = detector
            .process_detailed(&Frame::try_from(&frame).unwrap())
            .unwrap();
        assert!(report.evaluated);
        assert!(!report.motion_detected);
        assert_eq!(report.active_blocks, 0);
        assert_eq!(report.frame_index, 0);
    }

    #[test]
    fn test_block_scenario() {
        let mut detector = BlockMotionDetector::new(create_test_config()).unwrap();

        let base = scene(0, 0, 0, 0, 100);
        let small = scene(16, 16, 16, 16, 200);
        let large = scene(16, 16, 24, 24, 200);

        assert!(!detector.process(&Frame::try_from(&base).unwrap()).unwrap());

        let report = detector
            .process_detailed(&Frame::try_from(&small).unwrap())
            .unwrap();
        assert_eq!(report.active_blocks, 4);
        assert!(!report.motion_detected);

        let report = detector
            .process_detailed(&Frame::try_from(&large).unwrap())
            .unwrap();
        assert_eq!(report.active_blocks, 9);
        assert!(report.motion_detected);
        assert_eq!(detector.state(), MotionState::Motion);
    }

    #[test]
    fn test_skipped_frames_keep_state() {
        let config = MotionConfig {
            frame_skip: 2,
            motion_blocks_threshold: 1,
            ..create_test_config()
        };
        let mut detector = BlockMotionDetector::new(config).unwrap();

        let base = scene(0, 0, 0, 0, 100);
        let moved = scene(40, 40, 16, 16, 220);

        // Frame 0 evaluated, frames 1 and 2 skipped even though they differ
        assert!(!detector.process(&Frame::try_from(&base).unwrap()).unwrap());
        let skipped = detector
            .process_detailed(&Frame::try_from(&moved).unwrap())
            .unwrap();
        assert!(!skipped.evaluated);
        assert!(!skipped.motion_detected);
        assert!(!detector.process(&Frame::try_from(&moved).unwrap()).unwrap());

        // Skipped frames never touched the background
        assert_eq!(detector.background().reference_at(45, 45), Some(100.0));

        // Frame 3 is evaluated
        let report = detector
            .process_detailed(&Frame::try_from(&moved).unwrap())
            .unwrap();
        assert!(report.evaluated);
        assert!(report.motion_detected);
        assert_eq!(report.active_blocks, 4);
    }

    #[test]
    fn test_invalid_frame_leaves_state_untouched() {
        let mut detector = BlockMotionDetector::new(create_test_config()).unwrap();
        let base = scene(0, 0, 0, 0, 100);
        detector.process(&Frame::try_from(&base).unwrap()).unwrap();

        let result = detector.process_raw(&[1, 2, 3], 10, 10);
        assert!(matches!(result, Err(Error::InvalidFrame(_))));
        let result = detector.process_raw(&[], 0, 0);
        assert!(matches!(result, Err(Error::InvalidFrame(_))));

        assert_eq!(detector.frames_seen(), 1);
        assert_eq!(detector.background().reference_at(0, 0), Some(100.0));
    }

    #[test]
    fn test_downscaled_working_frame() {
        let config = MotionConfig {
            output_width: 32,
            output_height: 24,
            ..create_test_config()
        };
        let mut detector = BlockMotionDetector::new(config).unwrap();
        let frame = create_test_frame_with_motion(128, 96, 0, 0, 64, 96, 200);

        detector.process(&Frame::try_from(&frame).unwrap()).unwrap();
        let working = detector.working_frame();
        assert_eq!(working.dimensions(), (32, 24));
        assert_eq!(working.get_pixel(0, 0).0[0], 200);
        assert_eq!(working.get_pixel(31, 23).0[0], 64);
        assert_eq!(detector.grid().len(), 4 * 3);
    }

    #[test]
    fn test_reset() {
        let mut detector = BlockMotionDetector::new(MotionConfig {
            motion_blocks_threshold: 1,
            ..create_test_config()
        })
        .unwrap();
        let base = scene(0, 0, 0, 0, 100);
        let moved = scene(0, 0, 32, 32, 250);

        detector.process(&Frame::try_from(&base).unwrap()).unwrap();
        assert!(detector.process(&Frame::try_from(&moved).unwrap()).unwrap());

        detector.reset();
        assert!(!detector.motion());
        assert_eq!(detector.frames_seen(), 0);
        assert!(!detector.background().is_initialized());

        // Behaves like a first frame again
        assert!(!detector.process(&Frame::try_from(&moved).unwrap()).unwrap());
    }
}
