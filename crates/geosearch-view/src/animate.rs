//! Cooperative animated pan.
//!
//! The animation is a plain step generator: the driver asks for the next
//! center, moves the canvas, waits a tick, and repeats. Cancellation is a
//! single flag: abandoning the generator (closing the dialog) simply stops
//! producing steps. No timer state lives in the core.

use geosearch_host::{Point, Rect};

/// Number of interpolation steps.
const STEPS: u32 = 20;

/// Fraction the final extent grows beyond the feature bounding box, per
/// side.
const FINAL_MARGIN: f64 = 0.05;

/// A linear pan from the current canvas center to a target, finishing on a
/// margin-expanded extent around the target features.
#[derive(Debug, Clone)]
pub struct PanAnimation {
    /// Center at animation start.
    start: Point,
    /// Target center.
    end: Point,
    /// Steps already produced.
    produced: u32,
    /// Extent set once the pan completes.
    final_extent: Rect,
    /// Cooperative cancel flag.
    cancelled: bool,
}

impl PanAnimation {
    /// Suggested delay between steps, in milliseconds.
    pub const STEP_INTERVAL_MS: u64 = 40;

    /// Creates a pan from `start` to the center of `target_bbox`.
    pub fn new(start: Point, target_bbox: Rect) -> Self {
        Self {
            start,
            end: target_bbox.center(),
            produced: 0,
            final_extent: target_bbox.buffered(FINAL_MARGIN),
            cancelled: false,
        }
    }

    /// Total step count.
    pub fn steps(&self) -> u32 {
        STEPS
    }

    /// Stops the animation; no further steps are produced.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// True once every step was produced or the animation was cancelled.
    pub fn is_finished(&self) -> bool {
        self.cancelled || self.produced >= STEPS
    }

    /// The next interpolated center, or `None` when finished. The last
    /// step lands exactly on the target center.
    pub fn tick(&mut self) -> Option<Point> {
        if self.is_finished() {
            return None;
        }
        self.produced += 1;
        let t = f64::from(self.produced) / f64::from(STEPS);
        Some(Point::new(
            self.start.x + (self.end.x - self.start.x) * t,
            self.start.y + (self.end.y - self.start.y) * t,
        ))
    }

    /// The extent to set after the final step: the target box expanded by
    /// 5% on each side.
    pub fn final_extent(&self) -> Rect {
        self.final_extent
    }
}
