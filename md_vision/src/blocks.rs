//! ABOUTME: Block grid partitioning the working frame into fixed-size tiles
//! ABOUTME: Counts threshold-exceeding diff pixels per block and active blocks

use crate::DiffMap;
use serde::{Deserialize, Serialize};

/// One tile of the working frame and its changed-pixel count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Pixels whose diff is strictly above the pixel threshold
    pub diff_pixel_count: u32,
}

impl Block {
    /// A block is active as soon as one of its pixels exceeds the threshold
    pub fn is_active(&self) -> bool {
        self.diff_pixel_count > 0
    }
}

/// Row-major grid of blocks, laid out once per frame size and reused
#[derive(Debug, Clone)]
pub struct BlockGrid {
    block_width: u32,
    block_height: u32,
    frame_dims: (u32, u32),
    columns: u32,
    rows: u32,
    blocks: Vec<Block>,
    active: usize,
}

impl BlockGrid {
    /// Create a grid of `block_width` x `block_height` tiles (minimum 1x1)
    pub fn new(block_width: u32, block_height: u32) -> Self {
        Self {
            block_width: block_width.max(1),
            block_height: block_height.max(1),
            frame_dims: (0, 0),
            columns: 0,
            rows: 0,
            blocks: Vec::new(),
            active: 0,
        }
    }

    /// Lay the grid out over a `width` x `height` frame
    ///
    /// Edge tiles shrink to fit rather than being dropped, so the grid
    /// always holds `ceil(w/bw) * ceil(h/bh)` blocks.
    pub fn layout(&mut self, width: u32, height: u32) {
        if self.frame_dims == (width, height) {
            return;
        }

        self.columns = width.div_ceil(self.block_width);
        self.rows = height.div_ceil(self.block_height);
        self.frame_dims = (width, height);
        self.active = 0;

        self.blocks.clear();
        self.blocks
            .reserve((self.columns as usize) * (self.rows as usize));
        for row in 0..self.rows {
            let y = row * self.block_height;
            let h = self.block_height.min(height - y);
            for col in 0..self.columns {
                let x = col * self.block_width;
                let w = self.block_width.min(width - x);
                self.blocks.push(Block {
                    x,
                    y,
                    width: w,
                    height: h,
                    diff_pixel_count: 0,
                });
            }
        }
    }

    /// Count exceeding pixels (`diff > pixel_threshold`) per block
    ///
    /// Returns the number of active blocks.
    pub fn evaluate(&mut self, diff: &DiffMap, pixel_threshold: u32) -> usize {
        let (width, height) = diff.dimensions();
        self.layout(width, height);

        let threshold = pixel_threshold as f32;
        let mut active = 0;
        for block in self.blocks.iter_mut() {
            let mut count = 0u32;
            for y in block.y..block.y + block.height {
                for x in block.x..block.x + block.width {
                    if diff.get(x, y) > threshold {
                        count += 1;
                    }
                }
            }
            block.diff_pixel_count = count;
            if count > 0 {
                active += 1;
            }
        }

        self.active = active;
        active
    }

    /// Active blocks from the last evaluation
    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Grid size as (columns, rows)
    pub fn grid_dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block at grid position (column, row)
    pub fn block(&self, column: u32, row: u32) -> Option<&Block> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.blocks.get((row * self.columns + column) as usize)
    }
}
