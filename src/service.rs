use crate::{
    error::ServiceError,
    symbols::Symbol,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Server-side grading of a spin result, used to pick the win cue and message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinCategory {
    #[default]
    Lose,
    Small,
    Medium,
    Jackpot,
}

impl WinCategory {
    pub fn message(self) -> &'static str {
        match self {
            WinCategory::Jackpot => "JACKPOT",
            WinCategory::Medium => "BIG WIN!",
            WinCategory::Small => "WIN!",
            WinCategory::Lose => "Try again",
        }
    }
}

/// One winning payline as reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinDetail {
    pub name: String,
    #[serde(default)]
    pub count: u32,
}

impl WinDetail {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Authoritative result of a spin. Every reel carries the symbols that must
/// end up in its visible window, top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpinOutcome {
    pub reels: Vec<Vec<Symbol>>,
    pub win_amount: u64,
    pub balance: u64,
    pub win_details: Vec<WinDetail>,
    pub category: WinCategory,
}

impl SpinOutcome {
    pub fn is_win(&self) -> bool {
        self.win_amount > 0
    }

    /// Category a win is presented with. A paying spin graded `Lose`, or not
    /// graded at all, counts as a small win.
    pub fn win_category(&self) -> WinCategory {
        match self.category {
            WinCategory::Lose if self.is_win() => WinCategory::Small,
            category => category,
        }
    }

    /// Checks the outcome matches the machine it is about to be drawn on.
    pub fn check_layout(&self, reel_count: usize, rows: usize) -> Result<(), ServiceError> {
        if self.reels.len() != reel_count {
            return Err(ServiceError::Decode(format!(
                "expected {reel_count} reels, got {}",
                self.reels.len()
            )));
        }
        if let Some((idx, reel)) =
            self.reels.iter().enumerate().find(|(_, r)| r.len() != rows)
        {
            return Err(ServiceError::Decode(format!(
                "reel {idx} has {} symbols, expected {rows}",
                reel.len()
            )));
        }
        Ok(())
    }
}

/// The remote slot server: spin outcomes, balance status and balance reset.
pub trait SlotService {
    fn spin(&self, wager: u64) -> impl Future<Output = Result<SpinOutcome, ServiceError>>;

    fn status(&self) -> impl Future<Output = Result<u64, ServiceError>>;

    /// Resets the balance to the server's default.
    fn reset(&self) -> impl Future<Output = Result<(), ServiceError>>;
}
