// Core types shared by the history, the rasterizer and the session.

/// Default brush: white ink on the black pad.
pub const MAIN_BRUSH: u32 = 0x00_FF_FF_FF;
/// Alternate brush: paints the background back in.
pub const ALT_BRUSH: u32 = 0x00_00_00_00;

/// Fixed-size grid of packed colors.
///
/// Each entry is `0x00RRGGBB`; only the low 24 bits carry meaning. Cells are
/// stored row-major, so `(x, y)` lives at `y * width + x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Raster {
    /// A `width x height` raster with every cell set to black.
    ///
    /// Zero dimensions are bumped to one so a raster always has a cell.
    pub fn new(width: usize, height: usize) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells (`width * height`).
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Packed color at `(x, y)`.
    ///
    /// Callers keep `x < width` and `y < height`; the rasterizer clamps before
    /// it ever reaches this layer. Out-of-range access panics.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        debug_assert!(x < self.width && y < self.height, "cell ({x}, {y}) out of range");
        self.pixels[y * self.width + x]
    }

    /// Overwrite the cell at `(x, y)`. Same bounds contract as [`Raster::get`].
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, color: u32) {
        debug_assert!(x < self.width && y < self.height, "cell ({x}, {y}) out of range");
        self.pixels[y * self.width + x] = color;
    }

    /// Deep copy: same dimensions, independently owned cells.
    pub fn copy(&self) -> Raster {
        self.clone()
    }

    /// Row-major view of every cell, ready to push to a window.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}

/// Split `0x00RRGGBB` into its three 8-bit channels.
#[inline]
pub fn channels(color: u32) -> (u8, u8, u8) {
    (((color >> 16) & 0xFF) as u8, ((color >> 8) & 0xFF) as u8, (color & 0xFF) as u8)
}

/// Pack three channels back into `0x00RRGGBB`.
#[inline]
pub fn pack(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// The brush a secondary pointer button paints with.
#[inline]
pub fn invert(brush: u32) -> u32 {
    0x00_FF_FF_FF - (brush & 0x00_FF_FF_FF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_raster_is_black() {
        let r = Raster::new(3, 2);
        assert_eq!(r.len(), 6);
        assert!(r.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn set_is_row_major() {
        let mut r = Raster::new(3, 2);
        r.set(2, 1, 0x12_34_56);
        assert_eq!(r.get(2, 1), 0x12_34_56);
        assert_eq!(r.pixels()[5], 0x12_34_56);
    }

    #[test]
    fn zero_dimensions_still_hold_a_cell() {
        let r = Raster::new(0, 0);
        assert_eq!((r.width(), r.height()), (1, 1));
    }

    #[test]
    fn channels_pack_and_invert() {
        assert_eq!(channels(0x00_AB_CD_EF), (0xAB, 0xCD, 0xEF));
        assert_eq!(pack(0xAB, 0xCD, 0xEF), 0x00_AB_CD_EF);
        assert_eq!(invert(MAIN_BRUSH), ALT_BRUSH);
        assert_eq!(invert(ALT_BRUSH), MAIN_BRUSH);
    }

    proptest! {
        #[test]
        fn copy_never_aliases(w in 1usize..12, h in 1usize..12, x in 0usize..12, y in 0usize..12, c in 1u32..0x00_FF_FF_FF) {
            let (x, y) = (x % w, y % h);
            let original = Raster::new(w, h);
            let mut copy = original.copy();
            copy.set(x, y, c);
            prop_assert_eq!(original.get(x, y), 0);
            prop_assert_eq!(copy.get(x, y), c);
        }
    }
}
