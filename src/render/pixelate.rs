//! Block pixelation for blur regions
//!
//! Each `block x block` cell inside the region is replaced by the average
//! of its RGBA channels. Works on premultiplied pixmap data, so averaging
//! keeps translucent pixels from bleeding color.

use tiny_skia::Pixmap;

/// Integer device-space region, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelRegion {
    /// Clamp a float box to a `width` x `height` surface
    ///
    /// `None` when the box lies completely outside.
    pub fn clamped(
        (x1, y1, x2, y2): (f32, f32, f32, f32),
        width: u32,
        height: u32,
    ) -> Option<Self> {
        if width == 0 || height == 0 || ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return None;
        }
        let (min_x, max_x) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
        let (min_y, max_y) = if y1 < y2 { (y1, y2) } else { (y2, y1) };
        let max_x = max_x.round() as i64 - 1;
        let max_y = max_y.round() as i64 - 1;
        if max_x < 0 || max_y < 0 {
            return None;
        }
        let min_x = (min_x.round() as i64).max(0);
        let min_y = (min_y.round() as i64).max(0);
        if min_x >= i64::from(width) || min_y >= i64::from(height) {
            return None;
        }
        let max_x = max_x.min(i64::from(width) - 1);
        let max_y = max_y.min(i64::from(height) - 1);
        if max_x < min_x || max_y < min_y {
            return None;
        }
        Some(Self {
            min_x: min_x as u32,
            min_y: min_y as u32,
            max_x: max_x as u32,
            max_y: max_y as u32,
        })
    }
}

/// Pixelate a region of a pixmap in place
pub fn pixelate_pixmap(pixmap: &mut Pixmap, region: PixelRegion, block_size: u32) {
    let block_size = block_size.max(1);
    let stride = pixmap.width() as usize * 4;
    let data = pixmap.data_mut();
    let PixelRegion {
        min_x,
        min_y,
        max_x,
        max_y,
    } = region;

    let mut block_y = min_y;
    while block_y <= max_y {
        let block_end_y = (block_y + block_size - 1).min(max_y);

        let mut block_x = min_x;
        while block_x <= max_x {
            let block_end_x = (block_x + block_size - 1).min(max_x);

            // Calculate average color for this block
            let mut totals = [0u64; 4];
            let mut pixel_count: u64 = 0;

            for py in block_y..=block_end_y {
                for px in block_x..=block_end_x {
                    let idx = py as usize * stride + px as usize * 4;
                    for (total, channel) in totals.iter_mut().zip(&data[idx..idx + 4]) {
                        *total += u64::from(*channel);
                    }
                    pixel_count += 1;
                }
            }

            if pixel_count > 0 {
                let avg = totals.map(|t| (t / pixel_count) as u8);
                for py in block_y..=block_end_y {
                    for px in block_x..=block_end_x {
                        let idx = py as usize * stride + px as usize * 4;
                        data[idx..idx + 4].copy_from_slice(&avg);
                    }
                }
            }

            block_x += block_size;
        }
        block_y += block_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(size: u32) -> Pixmap {
        let mut pixmap = Pixmap::new(size, size).unwrap();
        for (i, px) in pixmap.data_mut().chunks_exact_mut(4).enumerate() {
            let (x, y) = (i as u32 % size, i as u32 / size);
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            px.copy_from_slice(&[v, v, v, 255]);
        }
        pixmap
    }

    #[test]
    fn test_blocks_are_flat_averages() {
        let mut pixmap = checkerboard(8);
        let region = PixelRegion::clamped((0.0, 0.0, 8.0, 8.0), 8, 8).unwrap();
        pixelate_pixmap(&mut pixmap, region, 4);
        let first = &pixmap.data()[0..4];
        assert_eq!(first, &[127, 127, 127, 255]);
        assert!(pixmap.data().chunks_exact(4).all(|px| px == first));
    }

    #[test]
    fn test_outside_region_untouched() {
        let mut pixmap = checkerboard(8);
        let region = PixelRegion::clamped((0.0, 0.0, 4.0, 4.0), 8, 8).unwrap();
        pixelate_pixmap(&mut pixmap, region, 4);
        // Cells right of and below the region keep their checkerboard values
        let idx = (4 * 8 + 5) * 4;
        assert_eq!(&pixmap.data()[idx..idx + 4], &[0, 0, 0, 255]);
        let idx = (4 * 8 + 4) * 4;
        assert_eq!(&pixmap.data()[idx..idx + 4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_region_clamping() {
        assert_eq!(
            PixelRegion::clamped((-5.0, -5.0, 20.0, 3.0), 10, 10),
            Some(PixelRegion {
                min_x: 0,
                min_y: 0,
                max_x: 9,
                max_y: 2
            })
        );
        assert!(PixelRegion::clamped((20.0, 20.0, 30.0, 30.0), 10, 10).is_none());
        assert!(PixelRegion::clamped((f32::NAN, 0.0, 3.0, 3.0), 10, 10).is_none());
    }
}
