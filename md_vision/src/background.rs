//! ABOUTME: Rolling per-pixel background reference with exponential smoothing
//! ABOUTME: Produces the absolute difference map against the pre-update reference

use image::GrayImage;
use tracing::{debug, warn};

/// Per-pixel absolute difference between a working frame and the background
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl DiffMap {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Largest difference in the map
    pub fn max(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.values.clear();
        self.values.resize(width as usize * height as usize, 0.0);
    }
}

/// Exponential moving average of past working frames
pub struct BackgroundModel {
    alpha: f32,
    reference: Vec<f32>,
    dims: Option<(u32, u32)>,
    diff: DiffMap,
}

impl BackgroundModel {
    /// Create an empty model; alpha is clamped into [0, 1]
    pub fn new(alpha: f32) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            alpha,
            reference: Vec::new(),
            dims: None,
            diff: DiffMap::default(),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_initialized(&self) -> bool {
        self.dims.is_some()
    }

    /// Reference value at (x, y), if the model has been seeded
    pub fn reference_at(&self, x: u32, y: u32) -> Option<f32> {
        let (width, height) = self.dims?;
        if x >= width || y >= height {
            return None;
        }
        Some(self.reference[y as usize * width as usize + x as usize])
    }

    /// Diff `frame` against the current reference, then blend it in
    ///
    /// The first frame (or the first after a size change) seeds the
    /// reference and yields an all-zero map.
    pub fn update_and_diff(&mut self, frame: &GrayImage) -> &DiffMap {
        let (width, height) = frame.dimensions();
        let pixels = frame.as_raw();

        if self.dims != Some((width, height)) {
            if let Some((old_w, old_h)) = self.dims {
                warn!(
                    "Working frame changed from {}x{} to {}x{}, resetting background",
                    old_w, old_h, width, height
                );
            } else {
                debug!("Seeding {}x{} background reference", width, height);
            }
            self.reference.clear();
            self.reference.extend(pixels.iter().map(|&p| p as f32));
            self.diff.resize(width, height);
            self.dims = Some((width, height));
            return &self.diff;
        }

        // Whole map first: every diff reads the pre-update reference
        for ((d, &bg), &p) in self
            .diff
            .values
            .iter_mut()
            .zip(self.reference.iter())
            .zip(pixels.iter())
        {
            *d = (p as f32 - bg).abs();
        }

        // bg += alpha * (p - bg) keeps bg bit-exact when p == bg
        let alpha = self.alpha;
        for (bg, &p) in self.reference.iter_mut().zip(pixels.iter()) {
            *bg += alpha * (p as f32 - *bg);
        }

        &self.diff
    }

    /// Forget the reference; the next frame reseeds it
    pub fn reset(&mut self) {
        self.reference.clear();
        self.dims = None;
        self.diff.resize(0, 0);
    }
}
