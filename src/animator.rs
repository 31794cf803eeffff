//! Reel/column animation.
//!
//! Each reel gets a long padded strip of random filler followed by its target
//! symbols. The strip scrolls until the targets sit in the visible window and,
//! exactly when the declared duration expires, is swapped for a short window of
//! `[filler, targets.., filler]` so strips never grow across spins.

use crate::{
    audio::{
        AudioCue,
        AudioSink,
    },
    symbols::{
        Symbol,
        SymbolSet,
    },
    table::{
        ReelView,
        SharedTable,
    },
};
use std::{
    sync::Arc,
    time::Duration,
};
use tokio::time::{
    self,
    Instant,
    MissedTickBehavior,
};

/// How many filler symbols precede the targets on each reel. Later reels get
/// more filler so they appear to spin faster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillerPolicy {
    pub base: usize,
    pub per_reel: usize,
    /// Number the first reel is counted as.
    pub first_reel_id: usize,
}

impl FillerPolicy {
    pub const CLASSIC: FillerPolicy = FillerPolicy {
        base: 20,
        per_reel: 5,
        first_reel_id: 1,
    };

    pub const GRAND: FillerPolicy = FillerPolicy {
        base: 20,
        per_reel: 4,
        first_reel_id: 0,
    };

    pub fn filler_count(&self, reel_index: usize) -> usize {
        self.base + (reel_index + self.first_reel_id) * self.per_reel
    }
}

/// CSS-style `cubic-bezier(x1, y1, x2, y2)` timing curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CubicBezier {
    pub const CLASSIC: CubicBezier = CubicBezier::new(0.25, 1.0, 0.5, 1.0);
    pub const GRAND: CubicBezier = CubicBezier::new(0.2, 0.8, 0.4, 1.05);

    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn component(p1: f64, p2: f64, s: f64) -> f64 {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
    }

    fn component_slope(p1: f64, p2: f64, s: f64) -> f64 {
        let inv = 1.0 - s;
        3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
    }

    /// Eased progress for linear progress `t` in `[0, 1]`.
    pub fn at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        let s = self.solve_x(t);
        Self::component(self.y1, self.y2, s)
    }

    fn solve_x(&self, t: f64) -> f64 {
        let mut s = t;
        for _ in 0..8 {
            let x = Self::component(self.x1, self.x2, s) - t;
            if x.abs() < 1e-7 {
                return s;
            }
            let slope = Self::component_slope(self.x1, self.x2, s);
            if slope.abs() < 1e-6 {
                break;
            }
            s -= x / slope;
        }
        // newton stalled, bisect
        let (mut lo, mut hi) = (0.0, 1.0);
        s = t;
        for _ in 0..32 {
            let x = Self::component(self.x1, self.x2, s);
            if (x - t).abs() < 1e-7 {
                break;
            }
            if x < t {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) / 2.0;
        }
        s
    }
}

/// One reel's share of a spin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReelAnimationTask {
    pub reel_index: usize,
    pub targets: Vec<Symbol>,
    pub duration: Duration,
}

/// Completion signal of one reel animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReelStopped {
    pub reel_index: usize,
    pub at: Instant,
}

#[derive(Clone)]
pub struct ReelAnimator {
    alphabet: SymbolSet,
    filler: FillerPolicy,
    easing: CubicBezier,
    frame_interval: Duration,
    audio: Arc<dyn AudioSink>,
}

impl ReelAnimator {
    pub fn new(
        alphabet: SymbolSet,
        filler: FillerPolicy,
        easing: CubicBezier,
        frame_interval: Duration,
        audio: Arc<dyn AudioSink>,
    ) -> Self {
        Self {
            alphabet,
            filler,
            easing,
            frame_interval: frame_interval.max(Duration::from_millis(1)),
            audio,
        }
    }

    /// `[filler x n][targets..][filler]`, where `n` grows with the reel index.
    pub fn padded_strip(&self, reel_index: usize, targets: &[Symbol]) -> Vec<Symbol> {
        let mut rng = rand::rng();
        let filler = self.filler.filler_count(reel_index);
        let mut strip = Vec::with_capacity(filler + targets.len() + 1);
        strip.extend((0..filler).map(|_| self.alphabet.random(&mut rng)));
        strip.extend_from_slice(targets);
        strip.push(self.alphabet.random(&mut rng));
        strip
    }

    /// The short strip a reel rests on: one hidden filler on either side.
    pub fn settled_window(&self, targets: &[Symbol]) -> Vec<Symbol> {
        let mut rng = rand::rng();
        let mut strip = Vec::with_capacity(targets.len() + 2);
        strip.push(self.alphabet.random(&mut rng));
        strip.extend_from_slice(targets);
        strip.push(self.alphabet.random(&mut rng));
        strip
    }

    /// Resting view shown before the first spin. `rest` pins the middle
    /// symbol of a single-row reel.
    pub fn initial_view(&self, rows: usize, rest: Option<&Symbol>) -> ReelView {
        let mut rng = rand::rng();
        let targets: Vec<Symbol> = (0..rows)
            .map(|row| match rest {
                Some(symbol) if row == rows / 2 => symbol.clone(),
                _ => self.alphabet.random(&mut rng),
            })
            .collect();
        ReelView::new(self.settled_window(&targets), 1.0)
    }

    /// Scrolls the reel to its targets over `task.duration` and resolves right
    /// after the strip has been swapped for its settled window.
    pub async fn animate(&self, table: &SharedTable, task: ReelAnimationTask) -> ReelStopped {
        let ReelAnimationTask {
            reel_index,
            targets,
            duration,
        } = task;
        let start = Instant::now();
        let deadline = start + duration;
        let travel = self.filler.filler_count(reel_index) as f64;
        let padded = self.padded_strip(reel_index, &targets);
        tracing::debug!(
            reel_index,
            strip_len = padded.len(),
            duration_ms = duration.as_millis() as u64,
            "reel animation started"
        );
        set_reel(table, reel_index, ReelView::new(padded, 0.0));

        if !duration.is_zero() {
            let mut frames = time::interval(self.frame_interval);
            frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let expiry = time::sleep_until(deadline);
            tokio::pin!(expiry);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut expiry => break,
                    now = frames.tick() => {
                        let progress = (now - start).as_secs_f64() / duration.as_secs_f64();
                        let offset = self.easing.at(progress) * travel;
                        table.update(|state| {
                            if let Some(view) = state.reels.get_mut(reel_index) {
                                view.offset = offset;
                            }
                        });
                    }
                }
            }
        }

        self.audio.play(AudioCue::ReelStop(reel_index));
        let settled = self.settled_window(&targets);
        set_reel(table, reel_index, ReelView::new(settled, 1.0));
        let at = Instant::now();
        tracing::debug!(reel_index, "reel settled");
        ReelStopped { reel_index, at }
    }
}

fn set_reel(table: &SharedTable, reel_index: usize, view: ReelView) {
    table.update(|state| {
        if state.reels.len() <= reel_index {
            state.reels.resize_with(reel_index + 1, ReelView::default);
        }
        state.reels[reel_index] = view;
    });
}
