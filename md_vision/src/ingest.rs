//! ABOUTME: Frame ingest stage resizing incoming frames to the working resolution
//! ABOUTME: Deterministic area averaging into a buffer allocated once per detector

use crate::Frame;
use image::{GrayImage, Luma};
use tracing::debug;

/// Resizes frames to a fixed output size using area averaging
///
/// Each output pixel is the rounded mean of the source rectangle it covers.
/// When the source is smaller than the output along an axis, the covering
/// span collapses to the single nearest source sample. The result only
/// depends on the input frame; the buffer is reused between calls.
pub struct FrameIngest {
    output: GrayImage,
    // Source span per output column/row, rebuilt only when the source size changes
    x_spans: Vec<(u32, u32)>,
    y_spans: Vec<(u32, u32)>,
    source_dims: (u32, u32),
}

impl FrameIngest {
    /// Create an ingest stage producing `output_width` x `output_height` frames
    pub fn new(output_width: u32, output_height: u32) -> Self {
        Self {
            output: GrayImage::new(output_width, output_height),
            x_spans: Vec::with_capacity(output_width as usize),
            y_spans: Vec::with_capacity(output_height as usize),
            source_dims: (0, 0),
        }
    }

    pub fn output_dimensions(&self) -> (u32, u32) {
        self.output.dimensions()
    }

    /// The most recently produced working frame
    pub fn working_frame(&self) -> &GrayImage {
        &self.output
    }

    /// Resize `frame` into the working buffer and return it
    pub fn resize(&mut self, frame: &Frame<'_>) -> &GrayImage {
        let (out_w, out_h) = self.output.dimensions();

        if frame.dimensions() == (out_w, out_h) {
            let out: &mut [u8] = &mut self.output;
            out.copy_from_slice(frame.pixels());
            return &self.output;
        }

        if self.source_dims != frame.dimensions() {
            debug!(
                "Resampling {}x{} frames to {}x{}",
                frame.width(),
                frame.height(),
                out_w,
                out_h
            );
            self.x_spans = source_spans(frame.width(), out_w);
            self.y_spans = source_spans(frame.height(), out_h);
            self.source_dims = frame.dimensions();
        }

        for (oy, &(y0, y1)) in self.y_spans.iter().enumerate() {
            for (ox, &(x0, x1)) in self.x_spans.iter().enumerate() {
                let mut sum = 0u64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        sum += frame.pixel(x, y) as u64;
                    }
                }
                let count = span_area((x0, x1), (y0, y1));
                let mean = (sum + count / 2) / count;
                self.output
                    .put_pixel(ox as u32, oy as u32, Luma([mean as u8]));
            }
        }

        &self.output
    }
}

/// Half-open source ranges covered by each of `dst` output samples
fn source_spans(src: u32, dst: u32) -> Vec<(u32, u32)> {
    (0..dst)
        .map(|i| {
            let start = (i as u64 * src as u64 / dst as u64) as u32;
            let end = ((i as u64 + 1) * src as u64 / dst as u64) as u32;
            let start = start.min(src - 1);
            (start, end.max(start + 1).min(src))
        })
        .collect()
}

/// Number of source pixels averaged into one output pixel
fn span_area((x0, x1): (u32, u32), (y0, y1): (u32, u32)) -> u64 {
    (x1 - x0) as u64 * (y1 - y0) as u64
}
