// Radial brush: blends the brush color into every cell near the pointer.
// Visual: a round dab with no hard edge; the center takes the full brush
// color and the weight falls off linearly to nothing at `radius + 1`.

use log::trace;

use crate::types::{channels, pack, Raster};

/// Inclusive box of cells a stroke touched, already clamped to the raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Region {
    pub fn cells(&self) -> usize {
        (self.x1 - self.x0 + 1) * (self.y1 - self.y0 + 1)
    }
}

/// Paint one dab centered at `(x, y)` (raster coordinates, cell centers on
/// integers) and return the box that was rewritten.
pub fn stroke(raster: &mut Raster, x: f64, y: f64, radius: f64, brush: u32) -> Option<Region> {
    stroke_with(raster, x, y, radius, brush, |_, _, _| {})
}

/// Same as [`stroke`], calling `paint(x, y, color)` once for every cell written.
///
/// The footprint is clamped to the raster, so a center far outside it paints
/// nothing and returns `None`.
pub fn stroke_with<F>(
    raster: &mut Raster,
    x: f64,
    y: f64,
    radius: f64,
    brush: u32,
    mut paint: F,
) -> Option<Region>
where
    F: FnMut(usize, usize, u32),
{
    let region = footprint(raster.width(), raster.height(), x, y, radius)?;
    trace!("stroke: center=({x:.2}, {y:.2}) r={radius} box={region:?}");

    for yi in region.y0..=region.y1 {
        for xi in region.x0..=region.x1 {
            let d = (xi as f64 - x).hypot(yi as f64 - y);
            let t = (d / (radius + 1.0)).min(1.0);

            let color = lerp(raster.get(xi, yi), brush, t);
            raster.set(xi, yi, color);
            paint(xi, yi, color);
        }
    }
    Some(region)
}

/// Cells within `radius` of the center on each axis, clamped to the grid.
fn footprint(width: usize, height: usize, x: f64, y: f64, radius: f64) -> Option<Region> {
    let offx = ((x - radius).floor() as i64).max(0);
    let offy = ((y - radius).floor() as i64).max(0);
    let limx = ((x + radius).ceil() as i64).min(width as i64 - 1);
    let limy = ((y + radius).ceil() as i64).min(height as i64 - 1);

    if offx > limx || offy > limy {
        return None;
    }
    Some(Region { x0: offx as usize, y0: offy as usize, x1: limx as usize, y1: limy as usize })
}

/// Per-channel blend: `t = 0` gives `to`, `t = 1` gives `from` unchanged.
#[inline]
pub fn lerp(from: u32, to: u32, t: f64) -> u32 {
    let (r0, g0, b0) = channels(from);
    let (r1, g1, b1) = channels(to);
    let mix = |c0: u8, c1: u8| (c0 as f64 * t + c1 as f64 * (1.0 - t)).floor() as u8;
    pack(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// Mean of the three channels mapped to `[0, 1]`; what the classifier sees.
#[inline]
pub fn saturation(color: u32) -> f64 {
    let (r, g, b) = channels(color);
    (r as f64 / 255.0 + g as f64 / 255.0 + b as f64 / 255.0) / 3.0
}
