// Window + software drawing for the pad.
// Visual layout:
// 1) Top: the raster, blown up `scale` times with hard cell edges.
// 2) A ring under the mouse showing the brush size.
// 3) Bottom strip: one bar per class score, the winner highlighted, plus a
//    swatch of the current brush color.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb, RgbImage};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::error::Error;
use crate::types::{channels, pack, Raster};

/// Height of the score strip under the canvas, in window pixels.
pub const PANEL_HEIGHT: usize = 96;

const PANEL_BG: u32 = 0x00_20_20_24;
const BAR_COLOR: u32 = 0x00_60_70_80;
const BAR_WINNER: u32 = 0x00_FF_CC_33;
const RING_COLOR: u32 = 0x00_33_CC_FF;
const BAR_GAP: usize = 4;
const SWATCH: usize = 24;

/// What gets pushed to the window each frame (`0x00RRGGBB` per pixel).
pub struct Screen {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Screen {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }
}

/// Axis-aligned box in window pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

pub struct Drawer {
    window: Window,
}

impl Drawer {
    /// Open a window of exactly `width x height` pixels.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self { window })
    }

    pub fn present(&mut self, screen: &Screen) -> Result<(), Error> {
        self.window
            .update_with_buffer(&screen.pixels, screen.width, screen.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Mouse position in window pixels. Positions just outside the window
    /// are passed through; the rasterizer clamps them.
    pub fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window.get_mouse_pos(MouseMode::Pass)
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    pub fn right_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Right)
    }

    pub fn ctrl_down(&self) -> bool {
        self.window.is_key_down(Key::LeftCtrl) || self.window.is_key_down(Key::RightCtrl)
    }

    /// True once per physical press, no auto-repeat.
    pub fn pressed_once(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }
}

/// Window pixel -> raster coordinates, with cell centers on integers.
pub fn window_to_raster(mx: f32, my: f32, scale: usize) -> (f64, f64) {
    let s = scale.max(1) as f64;
    (mx as f64 / s - 0.5, my as f64 / s - 0.5)
}

/// The raster as an RGB image, blown up `scale` times with nearest-neighbour.
pub fn upscale(raster: &Raster, scale: usize) -> RgbImage {
    let small: RgbImage = ImageBuffer::from_fn(raster.width() as u32, raster.height() as u32, |x, y| {
        let (r, g, b) = channels(raster.get(x as usize, y as usize));
        Rgb([r, g, b])
    });
    let scale = scale.max(1) as u32;
    imageops::resize(&small, small.width() * scale, small.height() * scale, FilterType::Nearest)
}

/// Copy `image` into the top-left corner of the screen.
pub fn blit(screen: &mut Screen, image: &RgbImage) {
    let w = (image.width() as usize).min(screen.width);
    let h = (image.height() as usize).min(screen.height);
    for y in 0..h {
        for x in 0..w {
            let Rgb([r, g, b]) = *image.get_pixel(x as u32, y as u32);
            screen.pixels[y * screen.width + x] = pack(r, g, b);
        }
    }
}

/// Bars for `scores` laid out left to right inside `area`; scores are read
/// as `[0, 1]` and clamped.
pub fn score_bars(scores: &[f64], area: Rect) -> Vec<Rect> {
    if scores.is_empty() {
        return Vec::new();
    }
    let slot = area.w / scores.len();
    let bar_w = slot.saturating_sub(BAR_GAP).max(1);

    scores
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let s = if s.is_finite() { s.clamp(0.0, 1.0) } else { 0.0 };
            let h = (s * area.h as f64).round() as usize;
            Rect { x: area.x + i * slot + BAR_GAP / 2, y: area.y + area.h - h, w: bar_w, h }
        })
        .collect()
}

/// Draw the score strip. `None` scores (classifier failed) leave it empty.
pub fn draw_panel(screen: &mut Screen, top: usize, scores: Option<&[f64]>, winner: Option<usize>, brush: u32) {
    let panel = Rect { x: 0, y: top, w: screen.width, h: screen.height.saturating_sub(top) };
    fill_rect(screen, panel, PANEL_BG);

    let swatch = Rect { x: BAR_GAP, y: top + BAR_GAP, w: SWATCH, h: SWATCH };
    fill_rect(screen, Rect { x: swatch.x - 1, y: swatch.y - 1, w: SWATCH + 2, h: SWATCH + 2 }, RING_COLOR);
    fill_rect(screen, swatch, brush);

    let Some(scores) = scores else { return };
    let area = Rect {
        x: SWATCH + 2 * BAR_GAP,
        y: top + BAR_GAP,
        w: screen.width.saturating_sub(SWATCH + 3 * BAR_GAP),
        h: panel.h.saturating_sub(2 * BAR_GAP),
    };
    for (i, bar) in score_bars(scores, area).into_iter().enumerate() {
        let color = if Some(i) == winner { BAR_WINNER } else { BAR_COLOR };
        fill_rect(screen, bar, color);
    }
}

/// Outline of the brush footprint around the mouse.
pub fn draw_ring(screen: &mut Screen, cx: i32, cy: i32, radius: i32) {
    // midpoint circle
    let (mut x, mut y, mut err) = (radius.max(1), 0, 1 - radius.max(1));
    while x >= y {
        for (dx, dy) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
            put_pixel(screen, cx + dx, cy + dy, RING_COLOR);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

fn fill_rect(screen: &mut Screen, rect: Rect, color: u32) {
    let x1 = (rect.x + rect.w).min(screen.width);
    let y1 = (rect.y + rect.h).min(screen.height);
    for y in rect.y.min(y1)..y1 {
        let row = y * screen.width;
        screen.pixels[row + rect.x.min(x1)..row + x1].fill(color);
    }
}

/// Put a pixel on the screen if (x,y) is inside bounds.
#[inline]
fn put_pixel(screen: &mut Screen, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= screen.width || y >= screen.height {
        return;
    }
    screen.pixels[y * screen.width + x] = color;
}
