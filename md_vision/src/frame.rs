//! ABOUTME: Borrowed single-channel frame view handed to the detector per call
//! ABOUTME: Validates dimensions against the pixel buffer before any processing

use image::GrayImage;
use md_core::{Error, Result};

/// Immutable grayscale frame, one byte per pixel, row-major
///
/// The detector only borrows the pixels for the duration of a single call.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Wrap a raw pixel buffer, rejecting zero or mismatched dimensions
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidFrame(format!(
                "frame dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }

        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::InvalidFrame(format!(
                "buffer holds {} bytes, {}x{} needs {}",
                data.len(),
                width,
                height,
                expected
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.data
    }

    /// Intensity at (x, y); caller guarantees the coordinates are in bounds
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

impl<'a> TryFrom<&'a GrayImage> for Frame<'a> {
    type Error = Error;

    fn try_from(img: &'a GrayImage) -> Result<Self> {
        Frame::new(img.width(), img.height(), img.as_raw())
    }
}
