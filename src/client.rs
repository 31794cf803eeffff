use crate::ui::{
    self,
    UserEvent,
    View,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use crossterm::event::EventStream;
use futures::{
    FutureExt,
    StreamExt,
    future::LocalBoxFuture,
    stream::FuturesUnordered,
};
use reelspin::{
    audio::TracingAudio,
    config::AppConfig,
    error::SpinError,
    http_client::HttpSlotClient,
    sequencer::{
        SpinReport,
        SpinSequencer,
    },
    service::SlotService,
    wager::WagerControl,
};
use std::sync::Arc;
use tokio::time::{
    self,
    MissedTickBehavior,
};

/// Work started from the input loop that finishes later.
enum ActionResult {
    Spin(Result<SpinReport, SpinError>),
    Reset(Result<u64, SpinError>),
    Sync(Result<u64, SpinError>),
}

type Action<'a> = LocalBoxFuture<'a, ActionResult>;

fn slot_client(config: &AppConfig) -> Result<HttpSlotClient> {
    HttpSlotClient::new(&config.server_url, config.variant, config.request_timeout)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let service = slot_client(&config)?;
    let sequencer = SpinSequencer::new(
        service,
        config.variant.spec(),
        config.timing,
        Arc::new(TracingAudio),
    );
    let mut ui_state = ui::UiState::default();

    tracing::info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&sequencer, &config, &mut ui_state).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop<S: SlotService>(
    sequencer: &SpinSequencer<S>,
    config: &AppConfig,
    ui_state: &mut ui::UiState,
) -> Result<()> {
    let mut wager = WagerControl::new(sequencer.spec().wager);
    let mut input_events = EventStream::new();
    let mut frames = time::interval(sequencer.timing().frame_interval());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut actions: FuturesUnordered<Action<'_>> = FuturesUnordered::new();
    actions.push(
        sequencer
            .sync_balance()
            .map(ActionResult::Sync)
            .boxed_local(),
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
            _ = frames.tick() => {
                redraw(sequencer, config, ui_state, wager.value())
                    .wrap_err("draw on frame tick failed")?;
            }
            Some(result) = actions.next(), if !actions.is_empty() => {
                handle_action_result(ui_state, result);
            }
            maybe_event = input_events.next() => {
                let Some(event) = maybe_event else {
                    tracing::warn!("input stream closed");
                    break;
                };
                let event = event.wrap_err("failed to read terminal event")?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                match ev {
                    UserEvent::Quit => break,
                    UserEvent::Spin => {
                        let amount = wager.value();
                        actions.push(
                            sequencer.spin(amount).map(ActionResult::Spin).boxed_local(),
                        );
                    }
                    UserEvent::WagerUp => {
                        wager.increase();
                    }
                    UserEvent::WagerDown => {
                        wager.decrease();
                    }
                    UserEvent::WagerUpBig => {
                        wager.increase_big();
                    }
                    UserEvent::WagerDownBig => {
                        wager.decrease_big();
                    }
                    UserEvent::ConfirmReset => {
                        actions.push(
                            sequencer
                                .reset_balance()
                                .map(ActionResult::Reset)
                                .boxed_local(),
                        );
                    }
                    UserEvent::DeclineReset | UserEvent::Redraw => {}
                }
                redraw(sequencer, config, ui_state, wager.value())
                    .wrap_err("draw after input failed")?;
            }
        }
    }
    Ok(())
}

fn handle_action_result(ui_state: &mut ui::UiState, result: ActionResult) {
    match result {
        ActionResult::Spin(Ok(report)) => {
            tracing::info!(
                wager = report.wager,
                win_amount = report.outcome.win_amount,
                balance = report.outcome.balance,
                "spin finished"
            );
        }
        ActionResult::Spin(Err(SpinError::Busy)) => {
            tracing::debug!("spin key pressed while reels were turning");
        }
        ActionResult::Spin(Err(err)) => {
            if err.offers_reset() {
                ui_state.open_reset_prompt();
            }
        }
        ActionResult::Reset(Ok(balance)) | ActionResult::Sync(Ok(balance)) => {
            tracing::debug!(balance, "balance refreshed");
        }
        ActionResult::Reset(Err(err)) | ActionResult::Sync(Err(err)) => {
            tracing::warn!(%err, "balance request failed");
        }
    }
}

fn redraw<S: SlotService>(
    sequencer: &SpinSequencer<S>,
    config: &AppConfig,
    ui_state: &mut ui::UiState,
    wager: u64,
) -> Result<()> {
    let table = sequencer.table().snapshot();
    let view = View {
        table: &table,
        spec: sequencer.spec(),
        wager,
        server_url: &config.server_url,
    };
    let geometry = ui::draw(ui_state, &view)?;
    if geometry.is_some() && geometry != table.layout {
        sequencer.table().update(|state| state.layout = geometry);
    }
    Ok(())
}

pub async fn print_status(config: &AppConfig) -> Result<()> {
    let client = slot_client(config)?;
    let balance = client
        .status()
        .await
        .wrap_err_with(|| format!("failed to fetch balance from {}", config.server_url))?;
    println!("Balance: {balance}");
    Ok(())
}

pub async fn reset_and_print(config: &AppConfig) -> Result<()> {
    let client = slot_client(config)?;
    client
        .reset()
        .await
        .wrap_err_with(|| format!("failed to reset balance on {}", config.server_url))?;
    let balance = client.status().await.wrap_err("failed to fetch balance after reset")?;
    tracing::info!(balance, "balance reset from the command line");
    println!("Balance topped up: {balance}");
    Ok(())
}
