//! ABOUTME: Shared testing utilities and synthetic frame fixtures
//! ABOUTME: Raw grayscale buffers and scripted scenes reused across crates

/// Raw grayscale buffer of one gray level
pub fn uniform_frame(width: u32, height: u32, value: u8) -> Vec<u8> {
    vec![value; width as usize * height as usize]
}

/// Raw buffer with a filled rectangle, clipped to the frame
pub fn frame_with_rect(
    width: u32,
    height: u32,
    background: u8,
    rect: (u32, u32, u32, u32),
    value: u8,
) -> Vec<u8> {
    let mut data = uniform_frame(width, height, background);
    let (rx, ry, rw, rh) = rect;
    for y in ry..(ry + rh).min(height) {
        for x in rx..(rx + rw).min(width) {
            data[y as usize * width as usize + x as usize] = value;
        }
    }
    data
}

/// Three-frame 128x96 scene on gray(100): baseline, a 16x16 patch of
/// gray(200) at (16, 16), then the patch grown to 24x24
pub fn growing_patch_scene() -> Vec<Vec<u8>> {
    vec![
        uniform_frame(128, 96, 100),
        frame_with_rect(128, 96, 100, (16, 16, 16, 16), 200),
        frame_with_rect(128, 96, 100, (16, 16, 24, 24), 200),
    ]
}

/// Deterministic pseudo-random sequence of frames with drifting rectangles
pub fn random_scene(width: u32, height: u32, frames: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut state = seed.max(1);
    let mut next = move || {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    (0..frames)
        .map(|_| {
            let background = (next() % 256) as u8;
            let x = (next() % width as u64) as u32;
            let y = (next() % height as u64) as u32;
            let w = (next() % 32) as u32 + 1;
            let h = (next() % 32) as u32 + 1;
            let value = (next() % 256) as u8;
            frame_with_rect(width, height, background, (x, y, w, h), value)
        })
        .collect()
}
