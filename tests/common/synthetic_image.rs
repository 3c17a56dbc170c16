use glitchsort::{Mask, PixelBuffer};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Generates an image of seeded random samples.
pub fn noise_image(width: u32, height: u32, channels: u8, seed: u64) -> PixelBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = width as usize * height as usize * channels as usize;
    let data = (0..len).map(|_| rng.gen::<u8>()).collect();
    PixelBuffer::from_raw(width, height, channels, data).expect("valid dimensions")
}

/// A single row of gray RGB pixels.
pub fn gray_row(values: &[u8]) -> PixelBuffer {
    let data = values.iter().flat_map(|&v| vec![v, v, v]).collect();
    PixelBuffer::from_raw(values.len() as u32, 1, 3, data).expect("valid dimensions")
}

pub fn row_values(buffer: &PixelBuffer) -> Vec<u8> {
    buffer
        .as_raw()
        .chunks(buffer.channels() as usize)
        .map(|px| px[0])
        .collect()
}

/// A soft disc: 1.0 in the middle falling off to 0.0 at `radius`.
pub fn disc_mask(width: u32, height: u32, radius: f32) -> Mask {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    Mask::from_fn(width, height, |x, y| {
        let d = (x as f32 + 0.5 - cx).hypot(y as f32 + 0.5 - cy);
        1.0 - d / radius
    })
}

/// The sorted samples of every pixel, for multiset comparisons.
pub fn sorted_pixels(buffer: &PixelBuffer) -> Vec<Vec<u8>> {
    let mut pixels: Vec<Vec<u8>> = buffer
        .as_raw()
        .chunks(buffer.channels() as usize)
        .map(|px| px.to_vec())
        .collect();
    pixels.sort();
    pixels
}
