// Edit session: the one place that owns the pad's history.
// Input glue calls begin/continue/end around each pointer interaction and
// asks for a classification after every edit.

use log::{debug, warn};

use crate::classifier::Classifier;
use crate::error::{Error, Result};
use crate::history::HistoryBuffer;
use crate::stroke::{self, saturation, Region};
use crate::types::{Raster, MAIN_BRUSH};

/// Default brush radius in cells.
pub const BRUSH_RADIUS: f64 = 1.5;

/// Display hook: "paint cell (x, y) with this color now".
pub type PaintHook = Box<dyn FnMut(usize, usize, u32)>;

/// Stroke bookkeeping between begin and end.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Pen {
    Up,
    /// A snapshot was appended for this stroke; `paints` counts dabs so far.
    Down { color: u32, paints: usize },
}

pub struct EditSession<C> {
    history: HistoryBuffer<Raster>,
    brush: u32,
    radius: f64,
    pen: Pen,
    // Refilled on every classification, always `width * height` long.
    samples: Vec<f64>,
    classifier: C,
    hook: Option<PaintHook>,
}

impl<C: Classifier> EditSession<C> {
    /// A blank `width x height` pad with room for `capacity` undo steps.
    pub fn new(width: usize, height: usize, capacity: usize, classifier: C) -> Self {
        let mut history = HistoryBuffer::new(capacity);
        let blank = Raster::new(width, height);
        let samples = vec![0.0; blank.len()];
        history.append(blank);

        Self {
            history,
            brush: MAIN_BRUSH,
            radius: BRUSH_RADIUS,
            pen: Pen::Up,
            samples,
            classifier,
            hook: None,
        }
    }

    /// Route every painted cell to `hook` as it is written.
    pub fn set_paint_hook(&mut self, hook: PaintHook) {
        self.hook = Some(hook);
    }

    pub fn brush(&self) -> u32 {
        self.brush
    }

    pub fn set_brush(&mut self, brush: u32) {
        self.brush = brush & 0x00_FF_FF_FF;
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
    }

    pub fn is_stroking(&self) -> bool {
        matches!(self.pen, Pen::Down { .. })
    }

    /// The raster under the history cursor.
    pub fn current(&self) -> &Raster {
        // The constructor appends, and nothing ever empties the history.
        match self.history.current() {
            Some(raster) => raster,
            None => unreachable!("edit session history is never empty"),
        }
    }

    pub fn history(&self) -> &HistoryBuffer<Raster> {
        &self.history
    }

    /// Open a stroke painted in `color`: the current raster is copied into a
    /// new history entry, which the stroke then edits. No-op mid-stroke.
    pub fn begin_stroke(&mut self, color: u32) {
        if self.is_stroking() {
            return;
        }
        let working = self.current().copy();
        self.history.append(working);
        self.pen = Pen::Down { color: color & 0x00_FF_FF_FF, paints: 0 };
        debug!("stroke: begin color={color:06X}");
    }

    /// Dab the open stroke's brush at `(x, y)`. Returns the cells rewritten;
    /// `None` when no stroke is open or the dab fell outside the raster.
    pub fn continue_stroke(&mut self, x: f64, y: f64, radius: f64) -> Option<Region> {
        let Pen::Down { color, paints } = self.pen else {
            debug!("stroke: dab at ({x:.2}, {y:.2}) with no open stroke ignored");
            return None;
        };
        self.pen = Pen::Down { color, paints: paints + 1 };

        let hook = &mut self.hook;
        let raster = self.history.current_mut()?;
        stroke::stroke_with(raster, x, y, radius, color, |px, py, c| {
            if let Some(paint) = hook.as_mut() {
                paint(px, py, c);
            }
        })
    }

    /// Close the stroke. A stroke that never painted takes its snapshot back
    /// out of the history so no empty entry is left behind.
    pub fn end_stroke(&mut self) {
        let Pen::Down { paints, .. } = self.pen else {
            return;
        };
        self.pen = Pen::Up;

        if paints == 0 {
            let dropped = self.history.retract();
            debug!("stroke: aborted before any paint, snapshot dropped={dropped}");
        } else {
            debug!("stroke: end after {paints} dabs");
        }
    }

    /// Step back one entry; `false` when nothing older is retained.
    pub fn undo(&mut self) -> bool {
        self.history.revert()
    }

    /// Step forward one entry; `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        self.history.advance()
    }

    /// Clear to black as one undoable entry.
    pub fn reset(&mut self) {
        self.begin_stroke(0);

        let hook = &mut self.hook;
        if let Some(raster) = self.history.current_mut() {
            for y in 0..raster.height() {
                for x in 0..raster.width() {
                    raster.set(x, y, 0);
                    if let Some(paint) = hook.as_mut() {
                        paint(x, y, 0);
                    }
                }
            }
        }
        if let Pen::Down { color, paints } = self.pen {
            self.pen = Pen::Down { color, paints: paints + 1 };
        }

        self.end_stroke();
    }

    /// Flatten the current raster to grayscale and run the classifier on it.
    pub fn classify(&mut self) -> Result<Vec<f64>> {
        let raster = match self.history.current() {
            Some(raster) => raster,
            None => return Err(Error::Classification("no raster to classify".into())),
        };
        let (width, height) = (raster.width(), raster.height());

        self.samples.resize(raster.len(), 0.0);
        for (sample, &color) in self.samples.iter_mut().zip(raster.pixels()) {
            *sample = saturation(color);
        }

        match self.classifier.classify(&self.samples, width, height) {
            Some(scores) if !scores.is_empty() => Ok(scores),
            Some(_) => {
                warn!("classifier returned no scores");
                Err(Error::Classification("classifier returned an empty result".into()))
            }
            None => {
                warn!("classifier could not classify a {width}x{height} raster");
                Err(Error::Classification("classifier signalled failure".into()))
            }
        }
    }

    /// The grayscale samples handed to the classifier on the last call.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}
