use crate::{
    presenter::{
        HighlightedCell,
        LayoutGeometry,
        LinePath,
    },
    symbols::Symbol,
};
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};

/// Where the sequencer is within a spin cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpinPhase {
    #[default]
    Idle,
    Validating,
    Spinning,
    Animating,
    Reconciling,
    RollingBack,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusKind {
    #[default]
    Neutral,
    Busy,
    Win,
    Error,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub kind: StatusKind,
}

impl Status {
    pub fn new(text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// A reel strip and how far it has scrolled. `offset` counts symbol cells
/// between the top of the strip and the top of the visible window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReelView {
    pub strip: Vec<Symbol>,
    pub offset: f64,
}

impl ReelView {
    pub fn new(strip: Vec<Symbol>, offset: f64) -> Self {
        Self { strip, offset }
    }

    /// Symbols inside a window of `rows` cells at the nearest whole offset.
    pub fn visible(&self, rows: usize) -> Vec<Symbol> {
        let start = self.offset.round().max(0.0) as usize;
        self.strip.iter().skip(start).take(rows).cloned().collect()
    }
}

/// Everything the player sees. Owned by the sequencer and shared by handle
/// with the animators, the presenter and the renderer.
#[derive(Clone, Debug, Default)]
pub struct TableState {
    pub balance: u64,
    pub phase: SpinPhase,
    pub status: Status,
    pub win_amount: u64,
    pub reels: Vec<ReelView>,
    pub win_lines: Vec<LinePath>,
    pub highlights: Vec<HighlightedCell>,
    pub reset_offered: bool,
    pub layout: Option<LayoutGeometry>,
}

impl TableState {
    pub fn new(reels: Vec<ReelView>) -> Self {
        Self {
            reels,
            status: Status::new("Place your bet", StatusKind::Neutral),
            ..Self::default()
        }
    }

    pub fn clear_overlays(&mut self) {
        self.win_amount = 0;
        self.win_lines.clear();
        self.highlights.clear();
    }

    pub fn is_highlighted(&self, reel: usize, strip_index: usize) -> Option<&HighlightedCell> {
        self.highlights
            .iter()
            .find(|cell| cell.reel == reel && cell.strip_index == strip_index)
    }
}

/// Cheap handle to the table. The lock is never held across an await.
#[derive(Clone, Debug, Default)]
pub struct SharedTable {
    inner: Arc<Mutex<TableState>>,
}

impl SharedTable {
    pub fn new(state: TableState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut TableState) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn snapshot(&self) -> TableState {
        self.update(|state| state.clone())
    }

    pub fn balance(&self) -> u64 {
        self.update(|state| state.balance)
    }

    pub fn phase(&self) -> SpinPhase {
        self.update(|state| state.phase)
    }

    pub fn set_status(&self, text: impl Into<String>, kind: StatusKind) {
        let status = Status::new(text, kind);
        self.update(|state| state.status = status);
    }
}
