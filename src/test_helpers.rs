use crate::{
    audio::{
        AudioCue,
        AudioSink,
    },
    error::ServiceError,
    service::{
        SlotService,
        SpinOutcome,
        WinCategory,
        WinDetail,
    },
    symbols::Symbol,
};
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        Mutex,
        PoisonError,
    },
    time::Duration,
};

pub const FAKE_STARTING_BALANCE: u64 = 5000;

#[derive(Debug, Default)]
struct FakeState {
    balance: u64,
    spins: VecDeque<Result<SpinOutcome, ServiceError>>,
    spin_calls: Vec<u64>,
    status_calls: usize,
    reset_calls: usize,
    status_failure: Option<ServiceError>,
    reset_failure: Option<ServiceError>,
}

/// Scripted stand-in for the slot server.
#[derive(Clone, Debug, Default)]
pub struct FakeSlotService {
    state: Arc<Mutex<FakeState>>,
    latency: Duration,
}

impl FakeSlotService {
    pub fn new(balance: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                balance,
                ..FakeState::default()
            })),
            latency: Duration::ZERO,
        }
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push_spin(&self, response: Result<SpinOutcome, ServiceError>) {
        self.with_state(|state| state.spins.push_back(response));
    }

    pub fn fail_status(&self, err: ServiceError) {
        self.with_state(|state| state.status_failure = Some(err));
    }

    pub fn fail_reset(&self, err: ServiceError) {
        self.with_state(|state| state.reset_failure = Some(err));
    }

    pub fn spin_calls(&self) -> Vec<u64> {
        self.with_state(|state| state.spin_calls.clone())
    }

    pub fn status_calls(&self) -> usize {
        self.with_state(|state| state.status_calls)
    }

    pub fn reset_calls(&self) -> usize {
        self.with_state(|state| state.reset_calls)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl SlotService for FakeSlotService {
    async fn spin(&self, wager: u64) -> Result<SpinOutcome, ServiceError> {
        self.with_state(|state| state.spin_calls.push(wager));
        self.delay().await;
        self.with_state(|state| {
            let response = state.spins.pop_front().unwrap_or_else(|| {
                Err(ServiceError::Transport("no scripted spin left".to_string()))
            });
            if let Ok(outcome) = &response {
                state.balance = outcome.balance;
            }
            response
        })
    }

    async fn status(&self) -> Result<u64, ServiceError> {
        self.with_state(|state| state.status_calls += 1);
        self.delay().await;
        self.with_state(|state| match state.status_failure.clone() {
            Some(err) => Err(err),
            None => Ok(state.balance),
        })
    }

    async fn reset(&self) -> Result<(), ServiceError> {
        self.with_state(|state| state.reset_calls += 1);
        self.delay().await;
        self.with_state(|state| match state.reset_failure.clone() {
            Some(err) => Err(err),
            None => {
                state.balance = FAKE_STARTING_BALANCE;
                Ok(())
            }
        })
    }
}

/// Keeps every cue it is handed.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    cues: Mutex<Vec<AudioCue>>,
}

impl RecordingAudio {
    pub fn cues(&self) -> Vec<AudioCue> {
        self.cues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&self, cue: AudioCue) {
        self.cues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(cue);
    }
}

pub fn symbols(glyphs: &[&str]) -> Vec<Symbol> {
    glyphs.iter().map(|glyph| Symbol::from(*glyph)).collect()
}

/// Three-reel result; a win is drawn on the centre line.
pub fn classic_outcome(reels: [&str; 3], win_amount: u64, balance: u64) -> SpinOutcome {
    let won = win_amount > 0;
    SpinOutcome {
        reels: reels.iter().map(|glyph| vec![Symbol::from(*glyph)]).collect(),
        win_amount,
        balance,
        win_details: if won {
            vec![WinDetail::new("Center", 3)]
        } else {
            Vec::new()
        },
        category: if won {
            WinCategory::Small
        } else {
            WinCategory::Lose
        },
    }
}

/// Five-column result, given column by column, top row first.
pub fn grand_outcome(
    columns: [[&str; 3]; 5],
    win_amount: u64,
    balance: u64,
    lines: &[&str],
    category: WinCategory,
) -> SpinOutcome {
    SpinOutcome {
        reels: columns.iter().map(|column| symbols(column)).collect(),
        win_amount,
        balance,
        win_details: lines.iter().map(|name| WinDetail::new(*name, 3)).collect(),
        category,
    }
}

pub fn server_error(detail: &str) -> ServiceError {
    ServiceError::Server {
        status: 500,
        detail: detail.to_string(),
    }
}
