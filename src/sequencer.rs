//! The spin sequencer.
//!
//! A spin runs `Idle -> Validating -> Spinning -> Animating -> Reconciling ->
//! Idle`, or drops into `RollingBack` when the server call fails. The balance
//! is debited optimistically before the request and afterwards always ends
//! at either the server's figure or the pre-spin figure.
//!
//! Spins cannot be cancelled: once the request is out the spin runs to
//! completion or failure.

use crate::{
    animator::{
        ReelAnimationTask,
        ReelAnimator,
        ReelStopped,
    },
    audio::{
        AudioCue,
        AudioSink,
    },
    config::{
        TimingConfig,
        Variant,
        VariantSpec,
    },
    error::SpinError,
    presenter::{
        LayoutGeometry,
        WinLinePresenter,
    },
    service::{
        SlotService,
        SpinOutcome,
    },
    table::{
        SharedTable,
        SpinPhase,
        StatusKind,
        TableState,
    },
};
use futures::future::join_all;
use std::sync::{
    Arc,
    atomic::{
        AtomicBool,
        Ordering,
    },
};
use tokio::time::Instant;
use tracing::{
    debug,
    info,
    warn,
};

/// What a finished spin looked like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpinReport {
    pub wager: u64,
    pub outcome: SpinOutcome,
    pub reels: Vec<ReelStopped>,
    pub reconciled_at: Instant,
}

/// Holds the busy flag for as long as it lives.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct SpinSequencer<S> {
    service: S,
    spec: VariantSpec,
    timing: TimingConfig,
    table: SharedTable,
    busy: AtomicBool,
    animator: ReelAnimator,
    presenter: WinLinePresenter,
    fallback_layout: LayoutGeometry,
    audio: Arc<dyn AudioSink>,
}

impl<S: SlotService> SpinSequencer<S> {
    pub fn new(
        service: S,
        spec: VariantSpec,
        timing: TimingConfig,
        audio: Arc<dyn AudioSink>,
    ) -> Self {
        let animator = ReelAnimator::new(
            spec.alphabet.clone(),
            spec.filler,
            spec.easing,
            timing.frame_interval(),
            audio.clone(),
        );
        let reels = (0..spec.reel_count)
            .map(|_| animator.initial_view(spec.rows, spec.rest_symbol.as_ref()))
            .collect();
        let presenter = WinLinePresenter::new(spec.paylines.clone());
        let fallback_layout = LayoutGeometry::uniform(spec.reel_count, 10.0, 3.0);
        Self {
            service,
            spec,
            timing,
            table: SharedTable::new(TableState::new(reels)),
            busy: AtomicBool::new(false),
            animator,
            presenter,
            fallback_layout,
            audio,
        }
    }

    pub fn table(&self) -> &SharedTable {
        &self.table
    }

    pub fn spec(&self) -> &VariantSpec {
        &self.spec
    }

    pub fn timing(&self) -> TimingConfig {
        self.timing
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs one full spin. A spin requested while another is in flight is
    /// rejected with [`SpinError::Busy`] and leaves the table untouched.
    pub async fn spin(&self, wager: u64) -> Result<SpinReport, SpinError> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            debug!(wager, "spin ignored, another spin is in flight");
            return Err(SpinError::Busy);
        };

        self.enter(SpinPhase::Validating);
        let pre_balance = self.table.balance();
        if let Err(err) = self.validate(wager, pre_balance) {
            self.table.update(|state| {
                state.phase = SpinPhase::Idle;
                state.reset_offered = err.offers_reset();
            });
            self.table.set_status(err.to_string(), StatusKind::Error);
            info!(wager, pre_balance, %err, "spin rejected locally");
            return Err(err);
        }

        self.table.update(|state| {
            state.clear_overlays();
            state.reset_offered = false;
            state.balance = pre_balance - wager;
        });
        self.table.set_status("Spinning...", StatusKind::Busy);
        self.enter(SpinPhase::Spinning);
        self.audio.play(AudioCue::SpinStart);
        info!(wager, pre_balance, "spin started, wager debited");

        match self.run(wager).await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.roll_back(pre_balance, &err);
                Err(err)
            }
        }
    }

    fn validate(&self, wager: u64, balance: u64) -> Result<(), SpinError> {
        if wager == 0 {
            return Err(SpinError::Validation("wager must be positive".to_string()));
        }
        if !self.spec.wager.contains(wager) {
            return Err(SpinError::Validation(format!(
                "wager must be between {} and {}",
                self.spec.wager.min, self.spec.wager.max
            )));
        }
        if wager > balance {
            return Err(SpinError::InsufficientFunds {
                balance,
                wager,
                reset_offered: balance < self.spec.reset_floor,
            });
        }
        Ok(())
    }

    async fn run(&self, wager: u64) -> Result<SpinReport, SpinError> {
        let outcome = self.service.spin(wager).await?;
        outcome.check_layout(self.spec.reel_count, self.spec.rows)?;

        self.enter(SpinPhase::Animating);
        let tasks = outcome
            .reels
            .iter()
            .enumerate()
            .map(|(reel_index, targets)| ReelAnimationTask {
                reel_index,
                targets: targets.clone(),
                duration: self.timing.reel_duration(reel_index),
            });
        let reels =
            join_all(tasks.map(|task| self.animator.animate(&self.table, task))).await;
        self.audio.play(AudioCue::SpinStop);

        self.reconcile(&outcome);
        Ok(SpinReport {
            wager,
            outcome,
            reels,
            reconciled_at: Instant::now(),
        })
    }

    fn reconcile(&self, outcome: &SpinOutcome) {
        self.enter(SpinPhase::Reconciling);
        self.table.update(|state| state.balance = outcome.balance);

        if outcome.is_win() {
            let category = outcome.win_category();
            let message = match self.spec.variant {
                Variant::Classic => format!("WIN: {}", outcome.win_amount),
                Variant::Grand => category.message().to_string(),
            };
            self.table.update(|state| state.win_amount = outcome.win_amount);
            self.table.set_status(message, StatusKind::Win);
            self.audio.play(AudioCue::Win(category));
            self.presenter
                .present(&self.table, &self.fallback_layout, &outcome.win_details);
            info!(
                win_amount = outcome.win_amount,
                balance = outcome.balance,
                ?category,
                lines = outcome.win_details.len(),
                "spin won"
            );
        } else {
            self.table.set_status("Try again", StatusKind::Neutral);
            info!(balance = outcome.balance, "spin lost");
        }
        self.enter(SpinPhase::Idle);
    }

    fn roll_back(&self, pre_balance: u64, err: &SpinError) {
        self.enter(SpinPhase::RollingBack);
        self.audio.play(AudioCue::SpinStop);
        self.table.update(|state| state.balance = pre_balance);
        self.table
            .set_status(format!("Error: {err}"), StatusKind::Error);
        warn!(%err, pre_balance, "spin failed, balance rolled back");
        self.enter(SpinPhase::Idle);
    }

    /// Side path for a broke player: resets the balance server-side and
    /// shows the fresh figure.
    pub async fn reset_balance(&self) -> Result<u64, SpinError> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            return Err(SpinError::Busy);
        };
        let result = async {
            self.service.reset().await?;
            Ok::<_, SpinError>(self.service.status().await?)
        }
        .await;
        match result {
            Ok(balance) => {
                self.table.update(|state| {
                    state.balance = balance;
                    state.reset_offered = false;
                });
                self.table.set_status("Balance topped up!", StatusKind::Neutral);
                info!(balance, "balance reset");
                Ok(balance)
            }
            Err(err) => {
                self.table
                    .set_status(format!("Error: {err}"), StatusKind::Error);
                warn!(%err, "balance reset failed");
                Err(err)
            }
        }
    }

    /// Replaces the displayed balance with the server's.
    pub async fn sync_balance(&self) -> Result<u64, SpinError> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            return Err(SpinError::Busy);
        };
        match self.service.status().await {
            Ok(balance) => {
                self.table.update(|state| state.balance = balance);
                debug!(balance, "balance synced");
                Ok(balance)
            }
            Err(err) => {
                let err = SpinError::from(err);
                self.table
                    .set_status(format!("Error: {err}"), StatusKind::Error);
                warn!(%err, "balance sync failed");
                Err(err)
            }
        }
    }

    fn enter(&self, phase: SpinPhase) {
        let previous = self.table.update(|state| std::mem::replace(&mut state.phase, phase));
        debug!(?previous, ?phase, "spin phase");
    }
}
