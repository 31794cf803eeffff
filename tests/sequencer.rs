#![allow(non_snake_case)]
use proptest::prelude::*;
use reelspin::{
    audio::AudioCue,
    config::{
        TimingConfig,
        Variant,
    },
    error::SpinError,
    presenter::LINE_PALETTE,
    sequencer::SpinSequencer,
    service::WinCategory,
    table::{
        SpinPhase,
        StatusKind,
    },
    test_helpers::{
        FakeSlotService,
        RecordingAudio,
        classic_outcome,
        grand_outcome,
        server_error,
    },
};
use std::{
    sync::Arc,
    time::Duration,
};
use tokio::time::Instant;

fn sequencer(
    variant: Variant,
    service: FakeSlotService,
    balance: u64,
) -> (SpinSequencer<FakeSlotService>, Arc<RecordingAudio>) {
    let audio = Arc::new(RecordingAudio::default());
    let sequencer = SpinSequencer::new(
        service,
        variant.spec(),
        TimingConfig::for_variant(variant),
        audio.clone(),
    );
    sequencer.table().update(|state| state.balance = balance);
    (sequencer, audio)
}

#[tokio::test(start_paused = true)]
async fn spin__wager_above_balance_is_rejected_without_a_request() {
    // given
    let service = FakeSlotService::new(100);
    let (sequencer, audio) = sequencer(Variant::Classic, service.clone(), 100);

    // when
    let result = sequencer.spin(150).await;

    // then
    assert!(matches!(
        result,
        Err(SpinError::InsufficientFunds {
            balance: 100,
            wager: 150,
            ..
        })
    ));
    assert!(service.spin_calls().is_empty());
    let state = sequencer.table().snapshot();
    assert_eq!(state.balance, 100);
    assert_eq!(state.phase, SpinPhase::Idle);
    assert_eq!(state.status.text, "Insufficient funds!");
    assert!(!state.reset_offered);
    assert!(audio.cues().is_empty());
    assert!(!sequencer.is_busy());
}

#[tokio::test(start_paused = true)]
async fn spin__win_reconciles_to_the_server_balance() {
    // given
    let service = FakeSlotService::new(1000);
    service.push_spin(Ok(classic_outcome(["🍒", "🍒", "🍒"], 200, 1150)));
    let (sequencer, _audio) = sequencer(Variant::Classic, service.clone(), 1000);

    // when
    let report = sequencer.spin(50).await.unwrap();

    // then
    assert_eq!(report.outcome.win_amount, 200);
    assert_eq!(service.spin_calls(), vec![50]);
    let state = sequencer.table().snapshot();
    assert_eq!(state.balance, 1150);
    assert_eq!(state.win_amount, 200);
    assert_eq!(state.status.text, "WIN: 200");
    assert_eq!(state.status.kind, StatusKind::Win);
    assert_eq!(state.phase, SpinPhase::Idle);
    assert_eq!(state.win_lines.len(), 1);
    assert!(!sequencer.is_busy());
}

#[tokio::test(start_paused = true)]
async fn spin__server_failure_rolls_the_balance_back() {
    // given
    let service = FakeSlotService::new(1000);
    service.push_spin(Err(server_error("timeout")));
    let (sequencer, audio) = sequencer(Variant::Classic, service, 1000);

    // when
    let result = sequencer.spin(50).await;

    // then
    assert_eq!(result, Err(SpinError::Server("timeout".to_string())));
    let state = sequencer.table().snapshot();
    assert_eq!(state.balance, 1000);
    assert!(state.status.text.contains("timeout"));
    assert_eq!(state.status.kind, StatusKind::Error);
    assert_eq!(state.phase, SpinPhase::Idle);
    assert!(!sequencer.is_busy());
    assert_eq!(audio.cues(), vec![AudioCue::SpinStart, AudioCue::SpinStop]);
}

#[tokio::test(start_paused = true)]
async fn spin__loss_shows_try_again() {
    let service = FakeSlotService::new(500);
    service.push_spin(Ok(classic_outcome(["🍒", "🍋", "🍇"], 0, 490)));
    let (sequencer, audio) = sequencer(Variant::Classic, service, 500);

    sequencer.spin(10).await.unwrap();

    let state = sequencer.table().snapshot();
    assert_eq!(state.balance, 490);
    assert_eq!(state.win_amount, 0);
    assert_eq!(state.status.text, "Try again");
    assert!(state.win_lines.is_empty());
    assert!(!audio.cues().iter().any(|cue| matches!(cue, AudioCue::Win(_))));
}

#[tokio::test(start_paused = true)]
async fn spin__reconciles_only_after_the_last_reel_stops() {
    // given
    let service = FakeSlotService::new(1000);
    service.push_spin(Ok(classic_outcome(["💎", "💎", "7️⃣"], 0, 990)));
    let (sequencer, _audio) = sequencer(Variant::Classic, service, 1000);
    let start = Instant::now();

    // when
    let watcher = async {
        tokio::time::sleep(Duration::from_millis(2200)).await;
        sequencer.table().snapshot()
    };
    let (report, mid) = tokio::join!(sequencer.spin(10), watcher);

    // then
    let report = report.unwrap();
    let stops: Vec<Duration> = report.reels.iter().map(|r| r.at - start).collect();
    assert_eq!(
        stops,
        vec![
            Duration::from_millis(1500),
            Duration::from_millis(2000),
            Duration::from_millis(2500),
        ]
    );
    assert_eq!(report.reconciled_at - start, Duration::from_millis(2500));
    assert_eq!(mid.phase, SpinPhase::Animating);
    assert_eq!(mid.balance, 990);
    assert_eq!(mid.status.text, "Spinning...");
}

#[tokio::test(start_paused = true)]
async fn spin__reels_settle_on_the_outcome_symbols() {
    // given
    let service = FakeSlotService::new(1000);
    let columns = [
        ["A", "K", "Q"],
        ["10", "J", "Q"],
        ["👑", "💎", "7️⃣"],
        ["A", "A", "A"],
        ["K", "Q", "J"],
    ];
    service.push_spin(Ok(grand_outcome(columns, 0, 950, &[], WinCategory::Lose)));
    let (sequencer, _audio) = sequencer(Variant::Grand, service, 1000);

    // when
    sequencer.spin(50).await.unwrap();

    // then
    let state = sequencer.table().snapshot();
    for (reel, column) in state.reels.iter().zip(columns) {
        let glyphs: Vec<String> = reel.visible(3).iter().map(|s| s.as_str().to_owned()).collect();
        assert_eq!(glyphs, column.map(str::to_owned).to_vec());
        assert_eq!(reel.strip.len(), 5);
    }
}

#[tokio::test(start_paused = true)]
async fn spin__grand_jackpot_draws_every_reported_line() {
    // given
    let service = FakeSlotService::new(1000);
    let columns = [["7️⃣"; 3]; 5];
    service.push_spin(Ok(grand_outcome(
        columns,
        5000,
        5950,
        &["Center", "V-Shape"],
        WinCategory::Jackpot,
    )));
    let (sequencer, audio) = sequencer(Variant::Grand, service, 1000);

    // when
    sequencer.spin(50).await.unwrap();

    // then
    let state = sequencer.table().snapshot();
    assert_eq!(state.status.text, "JACKPOT");
    assert_eq!(state.win_lines.len(), 2);
    assert_eq!(state.highlights.len(), 8);
    let shared = state.is_highlighted(1, 2).unwrap();
    assert_eq!(shared.color, LINE_PALETTE[1]);
    assert_eq!(state.is_highlighted(0, 2).unwrap().color, LINE_PALETTE[0]);
    assert_eq!(
        audio.cues().last(),
        Some(&AudioCue::Win(WinCategory::Jackpot))
    );
}

#[tokio::test(start_paused = true)]
async fn spin__grand_win_graded_as_a_loss_is_shown_as_a_win() {
    // given
    let service = FakeSlotService::new(1000);
    let columns = [["A", "K", "Q"]; 5];
    service.push_spin(Ok(grand_outcome(columns, 300, 1250, &["Top"], WinCategory::Lose)));
    let (sequencer, audio) = sequencer(Variant::Grand, service, 1000);

    // when
    sequencer.spin(50).await.unwrap();

    // then
    let state = sequencer.table().snapshot();
    assert_eq!(state.status.text, "WIN!");
    assert_eq!(state.status.kind, StatusKind::Win);
    assert_eq!(state.balance, 1250);
    assert_eq!(state.win_lines.len(), 1);
    assert_eq!(audio.cues().last(), Some(&AudioCue::Win(WinCategory::Small)));
}

#[tokio::test(start_paused = true)]
async fn spin__audio_cues_follow_the_spin_lifecycle() {
    let service = FakeSlotService::new(1000);
    service.push_spin(Ok(classic_outcome(["🍋", "🍋", "🍋"], 40, 1030)));
    let (sequencer, audio) = sequencer(Variant::Classic, service, 1000);

    sequencer.spin(10).await.unwrap();

    assert_eq!(
        audio.cues(),
        vec![
            AudioCue::SpinStart,
            AudioCue::ReelStop(0),
            AudioCue::ReelStop(1),
            AudioCue::ReelStop(2),
            AudioCue::SpinStop,
            AudioCue::Win(WinCategory::Small),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn spin__next_spin_clears_previous_overlays() {
    // given
    let service = FakeSlotService::new(1000);
    service.push_spin(Ok(classic_outcome(["🍒", "🍒", "🍒"], 100, 1090)));
    service.push_spin(Ok(classic_outcome(["🍒", "🍋", "🍇"], 0, 1080)));
    let (sequencer, _audio) = sequencer(Variant::Classic, service, 1000);
    sequencer.spin(10).await.unwrap();

    // when
    let watcher = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        sequencer.table().snapshot()
    };
    let (_, mid) = tokio::join!(sequencer.spin(10), watcher);

    // then
    assert_eq!(mid.win_amount, 0);
    assert!(mid.win_lines.is_empty());
    assert!(mid.highlights.is_empty());
}

#[tokio::test(start_paused = true)]
async fn reset_balance__rejected_while_a_spin_is_in_flight() {
    // given
    let service = FakeSlotService::new(1000);
    service.push_spin(Ok(classic_outcome(["🍒", "🍋", "🍇"], 0, 990)));
    let (sequencer, _audio) = sequencer(Variant::Classic, service.clone(), 1000);

    // when
    let (spin, reset) = tokio::join!(sequencer.spin(10), sequencer.reset_balance());

    // then
    assert!(spin.is_ok());
    assert_eq!(reset, Err(SpinError::Busy));
    assert_eq!(service.reset_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn reset_balance__failure_is_reported_in_the_status() {
    let service = FakeSlotService::new(0);
    service.fail_reset(server_error("reset disabled"));
    let (sequencer, _audio) = sequencer(Variant::Grand, service, 0);

    let result = sequencer.reset_balance().await;

    assert_eq!(result, Err(SpinError::Server("reset disabled".to_string())));
    let state = sequencer.table().snapshot();
    assert_eq!(state.balance, 0);
    assert_eq!(state.status.text, "Error: reset disabled");
}

#[tokio::test(start_paused = true)]
async fn sync_balance__overwrites_the_displayed_balance() {
    let service = FakeSlotService::new(3210);
    let (sequencer, _audio) = sequencer(Variant::Grand, service.clone(), 0);

    let balance = sequencer.sync_balance().await.unwrap();

    assert_eq!(balance, 3210);
    assert_eq!(sequencer.table().balance(), 3210);
    assert_eq!(service.status_calls(), 1);
}

#[derive(Clone, Debug)]
enum Reply {
    Win { win: u64 },
    Fail,
}

fn replies() -> impl Strategy<Value = Reply> {
    prop_oneof![
        (0u64..5000).prop_map(|win| Reply::Win { win }),
        Just(Reply::Fail),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]
    #[test]
    fn spin__balance_ends_at_rollback_or_server_value(
        balance in 0u64..3000,
        wager in 0u64..2500,
        reply in replies(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        runtime.block_on(async {
            // given
            let service = FakeSlotService::new(balance);
            let server_balance = match reply {
                Reply::Win { win } => {
                    let after = balance.saturating_sub(wager) + win;
                    service.push_spin(Ok(classic_outcome(["🍒", "🍋", "🍇"], win, after)));
                    Some(after)
                }
                Reply::Fail => {
                    service.push_spin(Err(server_error("boom")));
                    None
                }
            };
            let (sequencer, _audio) = sequencer(Variant::Classic, service.clone(), balance);

            // when
            let result = sequencer.spin(wager).await;

            // then
            let shown = sequencer.table().balance();
            let valid = wager > 0 && (10..=2000).contains(&wager) && wager <= balance;
            if valid {
                prop_assert_eq!(service.spin_calls(), vec![wager]);
                match (result, server_balance) {
                    (Ok(_), Some(after)) => prop_assert_eq!(shown, after),
                    (Err(_), None) => prop_assert_eq!(shown, balance),
                    (other, expected) => {
                        prop_assert!(false, "unexpected {other:?} for {expected:?}")
                    }
                }
            } else {
                prop_assert!(result.is_err());
                prop_assert!(service.spin_calls().is_empty());
                prop_assert_eq!(shown, balance);
            }
            prop_assert!(!sequencer.is_busy());
            prop_assert_eq!(sequencer.table().phase(), SpinPhase::Idle);
            Ok(())
        })?;
    }
}
