mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::{Canned, FakeProvider, Harness, today};
use stock::{
    FormInput, MovingAverage, Phase, QuickRange, Trigger, ValidationError, ViewState,
    render::Applied,
};
use tokio::sync::Notify;

fn setup(provider: FakeProvider) -> (Harness, ViewState, FormInput) {
    let view = ViewState::new(today());
    let form = view.form();
    (Harness::new(provider, true), view, form)
}

#[tokio::test]
async fn successful_cycle_ends_idle_with_refresh_enabled() {
    let (mut h, mut view, mut form) = setup(FakeProvider::default().with("AAPL", Canned::Rows(60)));

    h.controller
        .trigger(Trigger::Initial, &mut form, &mut view, today(), &mut h.shell)
        .unwrap();
    assert_eq!(h.controller.phase(), Phase::Fetching);
    assert!(!h.shell.refresh_enabled);
    assert_eq!(
        h.shell.status[0],
        "Loading AAPL 1d from 2023-07-16 to 2024-07-15…"
    );

    let applied = h.complete(1).await;

    assert_eq!(applied, vec![Applied::Drawn { rows: 60 }]);
    assert_eq!(h.controller.phase(), Phase::Idle);
    assert!(h.shell.refresh_enabled);
    assert_eq!(h.shell.status.last().unwrap(), "Loaded AAPL: 60 rows");
    assert_eq!(
        h.controller.transitions(),
        &[
            Phase::Idle,
            Phase::Validating,
            Phase::Fetching,
            Phase::Transforming,
            Phase::Rendering,
            Phase::Idle,
        ]
    );

    let frame = &h.controller.dispatcher().surface().frames[0];
    let labels: Vec<_> = frame.lines.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(labels, vec!["Close", "MA5", "MA20", "MA50"]);
    assert!(frame.volume.is_some());
}

#[tokio::test]
async fn provider_is_asked_for_one_day_past_the_end() {
    let (mut h, mut view, mut form) = setup(FakeProvider::default().with("MSFT", Canned::Rows(5)));
    form.symbol = " msft ".into();
    form.start = "2024-01-01".into();
    form.end = "2024-03-31".into();
    form.interval = "1wk".into();

    h.controller
        .trigger(Trigger::Refresh, &mut form, &mut view, today(), &mut h.shell)
        .unwrap();
    h.complete(1).await;

    let queries = h.provider.queries.lock().unwrap();
    assert_eq!(queries[0].symbol, "MSFT");
    assert_eq!(queries[0].start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(queries[0].end, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    assert_eq!(view.symbol, "MSFT");
    assert_eq!(form.symbol, "MSFT");
}

#[tokio::test]
async fn empty_table_fails_without_rendering() {
    let (mut h, mut view, mut form) = setup(FakeProvider::default().with("AAPL", Canned::Empty));

    h.controller
        .trigger(Trigger::Refresh, &mut form, &mut view, today(), &mut h.shell)
        .unwrap();
    let applied = h.complete(1).await;

    assert_eq!(applied, vec![Applied::Failed]);
    assert!(h.controller.dispatcher().surface().frames.is_empty());
    assert_eq!(h.controller.dispatcher().surface().clears, 0);
    assert_eq!(h.shell.notices[0].0, "Download error");
    assert!(h.shell.notices[0].1.starts_with("No data returned for AAPL"));
    assert_eq!(h.controller.phase(), Phase::Idle);
    assert!(h.shell.refresh_enabled);
    assert!(!h.controller.transitions().contains(&Phase::Transforming));
}

#[tokio::test]
async fn provider_error_keeps_previous_chart() {
    let provider = FakeProvider::default()
        .with("AAPL", Canned::Rows(10))
        .with("DOWN", Canned::Fail);
    let (mut h, mut view, mut form) = setup(provider);

    h.controller
        .trigger(Trigger::Initial, &mut form, &mut view, today(), &mut h.shell)
        .unwrap();
    h.complete(1).await;

    form.symbol = "down".into();
    h.controller
        .trigger(Trigger::Refresh, &mut form, &mut view, today(), &mut h.shell)
        .unwrap();
    let applied = h.complete(1).await;

    assert_eq!(applied, vec![Applied::Failed]);
    let frames = &h.controller.dispatcher().surface().frames;
    assert_eq!(frames.len(), 1);
    assert!(frames[0].title.starts_with("AAPL"));
    assert_eq!(h.shell.status.last().unwrap(), "Error");
    assert!(h.shell.notices[0].1.contains("connection reset"));
    assert!(h.shell.refresh_enabled);
    assert_eq!(h.controller.phase(), Phase::Idle);
}

#[tokio::test]
async fn validation_failure_never_reaches_the_provider() {
    let (mut h, mut view, mut form) = setup(FakeProvider::default());
    form.start = "2024-05-01".into();
    form.end = "2024-04-01".into();

    let err = h
        .controller
        .trigger(Trigger::Refresh, &mut form, &mut view, today(), &mut h.shell)
        .unwrap_err();

    assert!(matches!(err, ValidationError::EndBeforeStart { .. }));
    assert_eq!(h.controller.phase(), Phase::Idle);
    assert_eq!(h.controller.in_flight(), 0);
    assert!(h.shell.refresh_enabled);
    assert_eq!(h.shell.refresh_history, vec![false, true]);
    assert_eq!(h.shell.notices[0].0, "Input error");
    assert!(h.provider.queries.lock().unwrap().is_empty());
    assert_eq!(
        h.controller.transitions(),
        &[Phase::Idle, Phase::Validating, Phase::Failed, Phase::Idle]
    );
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn far_future_end_date_never_spawns_a_cycle() {
    let (mut h, mut view, mut form) = setup(FakeProvider::default().with("AAPL", Canned::Rows(3)));
    form.end = "262142-12-31".into();

    let err = h
        .controller
        .trigger(Trigger::Refresh, &mut form, &mut view, today(), &mut h.shell)
        .unwrap_err();

    assert_eq!(err.field(), stock::Field::End);
    assert_eq!(h.controller.phase(), Phase::Idle);
    assert_eq!(h.controller.in_flight(), 0);
    assert!(h.shell.refresh_enabled);
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn quick_range_rewrites_the_dates() {
    let (mut h, mut view, mut form) = setup(FakeProvider::default().with("AAPL", Canned::Rows(3)));

    h.controller
        .trigger(
            Trigger::QuickRange(QuickRange::YearToDate),
            &mut form,
            &mut view,
            today(),
            &mut h.shell,
        )
        .unwrap();
    h.complete(1).await;

    assert_eq!(form.start, "2024-01-01");
    assert_eq!(form.end, "2024-07-15");
    assert_eq!(view.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
}

#[tokio::test]
async fn toggling_an_overlay_refetches_with_the_new_set() {
    let (mut h, mut view, mut form) = setup(FakeProvider::default().with("AAPL", Canned::Rows(30)));

    h.controller
        .trigger(
            Trigger::ToggleOverlay(MovingAverage::Ma20),
            &mut form,
            &mut view,
            today(),
            &mut h.shell,
        )
        .unwrap();
    h.complete(1).await;

    let frame = &h.controller.dispatcher().surface().frames[0];
    let labels: Vec<_> = frame.lines.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(labels, vec!["Close", "MA5", "MA50"]);
    assert!(frame.lines[2].values.iter().all(Option::is_none));
}

#[tokio::test]
async fn unusable_volume_only_drops_the_volume_panel() {
    let (mut h, mut view, mut form) =
        setup(FakeProvider::default().with("AAPL", Canned::BadVolume(8)));

    h.controller
        .trigger(Trigger::Refresh, &mut form, &mut view, today(), &mut h.shell)
        .unwrap();
    let applied = h.complete(1).await;

    assert_eq!(applied, vec![Applied::Drawn { rows: 8 }]);
    let frame = &h.controller.dispatcher().surface().frames[0];
    assert!(frame.volume.is_none());
    assert_eq!(h.shell.notices.len(), 1);
    assert_eq!(h.shell.notices[0].0, "Volume error");
    assert!(h.shell.notices[0].1.contains("row 0"));
    assert_eq!(h.shell.status.last().unwrap(), "Loaded AAPL: 8 rows");
}

#[tokio::test]
async fn slower_older_cycle_does_not_overwrite_newer_chart() {
    let gate = Arc::new(Notify::new());
    let provider = FakeProvider::default()
        .with("SLOW", Canned::Rows(4))
        .with("FAST", Canned::Rows(6))
        .gated("SLOW", Arc::clone(&gate));
    let (mut h, mut view, mut form) = setup(provider);

    form.symbol = "slow".into();
    let first = h
        .controller
        .trigger(Trigger::Refresh, &mut form, &mut view, today(), &mut h.shell)
        .unwrap();
    form.symbol = "fast".into();
    let second = h
        .controller
        .trigger(Trigger::Refresh, &mut form, &mut view, today(), &mut h.shell)
        .unwrap();
    assert!(second > first);
    assert_eq!(h.controller.in_flight(), 2);

    assert_eq!(h.complete(1).await, vec![Applied::Drawn { rows: 6 }]);

    gate.notify_one();
    assert_eq!(h.complete(1).await, vec![Applied::Stale]);

    let frames = &h.controller.dispatcher().surface().frames;
    assert!(frames[0].title.starts_with("FAST"));
    assert_eq!(h.shell.status.last().unwrap(), "Loaded FAST: 6 rows");
    assert!(h.shell.refresh_enabled);
    assert_eq!(h.controller.phase(), Phase::Idle);
    assert_eq!(h.controller.in_flight(), 0);
}

#[tokio::test]
async fn arrival_order_applies_when_stale_discard_is_off() {
    let gate = Arc::new(Notify::new());
    let provider = FakeProvider::default()
        .with("SLOW", Canned::Rows(4))
        .with("FAST", Canned::Rows(6))
        .gated("SLOW", Arc::clone(&gate));
    let mut h = Harness::new(provider, false);
    let mut view = ViewState::new(today());
    let mut form = view.form();

    for symbol in ["slow", "fast"] {
        form.symbol = symbol.into();
        h.controller
            .trigger(Trigger::Refresh, &mut form, &mut view, today(), &mut h.shell)
            .unwrap();
    }

    h.complete(1).await;
    gate.notify_one();
    assert_eq!(h.complete(1).await, vec![Applied::Drawn { rows: 4 }]);

    let frames = &h.controller.dispatcher().surface().frames;
    assert!(frames[0].title.starts_with("SLOW"));
}
