use std::{fmt, path::Path, sync::Arc};

use chrono::NaiveDate;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, info_span, warn};
use tracing_futures::Instrument;

use crate::{
    error::{ProviderError, RenderError},
    outcome::{FetchFailure, FetchOutcome, FetchResult, FetchSuccess},
    providers::DataProvider,
    render::{Applied, ChartSurface, RenderDispatcher, Shell},
    request::{FetchRequest, FormInput, QuickRange, ValidationError, validate},
    state::{MovingAverage, ViewState},
    transform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Fetching,
    Transforming,
    Rendering,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// User actions that start a fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Refresh,
    QuickRange(QuickRange),
    ToggleOverlay(MovingAverage),
}

/// Messages from background cycles to the interactive thread.
#[derive(Debug)]
pub enum Event {
    Progress { seq: u64, phase: Phase },
    Completed(FetchOutcome),
}

/// Drives fetch cycles. Lives on the interactive thread.
///
/// Background cycles only talk back through the event queue; whoever owns
/// the receiving end feeds every [`Event`] into [`FetchController::handle`].
pub struct FetchController<P, S> {
    provider: Arc<P>,
    dispatcher: RenderDispatcher<S>,
    events: UnboundedSender<Event>,
    last_seq: u64,
    in_flight: usize,
    phase: Phase,
    transitions: Vec<Phase>,
}

impl<P: DataProvider, S: ChartSurface> FetchController<P, S> {
    pub fn new(
        provider: Arc<P>,
        dispatcher: RenderDispatcher<S>,
        events: UnboundedSender<Event>,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            events,
            last_seq: 0,
            in_flight: 0,
            phase: Phase::Idle,
            transitions: vec![Phase::Idle],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every phase entered so far, oldest first.
    pub fn transitions(&self) -> &[Phase] {
        &self.transitions
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn dispatcher(&self) -> &RenderDispatcher<S> {
        &self.dispatcher
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = %self.phase, to = %phase, "phase transition");
        self.phase = phase;
        self.transitions.push(phase);
    }

    /// Start a cycle. Validation happens here, synchronously; on success the
    /// fetch is spawned and its sequence number returned.
    pub fn trigger(
        &mut self,
        trigger: Trigger,
        form: &mut FormInput,
        view: &mut ViewState,
        today: NaiveDate,
        shell: &mut impl Shell,
    ) -> Result<u64, ValidationError> {
        match trigger {
            Trigger::QuickRange(range) => {
                let (start, end) = range.bounds(today);
                form.start = start.to_string();
                form.end = end.to_string();
            }
            Trigger::ToggleOverlay(ma) => {
                let enabled = view.toggle(ma);
                debug!(overlay = %ma, enabled, "overlay toggled");
            }
            Trigger::Initial | Trigger::Refresh => {}
        }

        self.enter(Phase::Validating);
        shell.set_refresh_enabled(false);

        let request = match validate(form, &view.overlays, today, self.last_seq + 1) {
            Ok(request) => request,
            Err(e) => {
                warn!(?trigger, field = %e.field(), error = %e, "input rejected");
                self.enter(Phase::Failed);
                shell.set_status("Error");
                shell.notify_error("Input error", &e.to_string());
                shell.set_refresh_enabled(true);
                self.enter(Phase::Idle);
                return Err(e);
            }
        };

        self.last_seq = request.seq;
        view.commit(&request);
        *form = view.form();

        shell.set_status(&format!(
            "Loading {} {} from {} to {}…",
            request.symbol, request.interval, request.start, request.end
        ));
        info!(
            seq = request.seq,
            ?trigger,
            symbol = %request.symbol,
            interval = %request.interval,
            start = %request.start,
            end = %request.end,
            "fetch cycle started"
        );

        self.enter(Phase::Fetching);
        self.in_flight += 1;

        let seq = request.seq;
        let span = info_span!("fetch_cycle", seq, symbol = %request.symbol);
        tokio::spawn(
            run_cycle(Arc::clone(&self.provider), request, self.events.clone()).instrument(span),
        );

        Ok(seq)
    }

    /// Apply one queued event. Returns how a completed cycle was rendered.
    pub fn handle(&mut self, event: Event, shell: &mut impl Shell) -> Option<Applied> {
        match event {
            Event::Progress { seq, phase } => {
                debug!(seq, %phase, "cycle progress");
                self.enter(phase);
                None
            }
            Event::Completed(outcome) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.enter(if outcome.result.is_ok() {
                    Phase::Rendering
                } else {
                    Phase::Failed
                });
                let applied = self.dispatcher.apply(outcome, shell);
                self.enter(Phase::Idle);
                Some(applied)
            }
        }
    }

    pub fn export(&self, path: &Path, shell: &mut impl Shell) -> Result<(), RenderError> {
        self.dispatcher.export(path, shell)
    }
}

/// One background cycle: fetch, derive, report.
pub async fn run_cycle<P: DataProvider>(
    provider: Arc<P>,
    request: FetchRequest,
    events: UnboundedSender<Event>,
) {
    let seq = request.seq;
    let result = fetch_and_derive(provider.as_ref(), &request, &events).await;
    if events
        .send(Event::Completed(FetchOutcome { seq, result }))
        .is_err()
    {
        warn!(seq, "event queue closed; dropping fetch outcome");
    }
}

async fn fetch_and_derive<P: DataProvider>(
    provider: &P,
    request: &FetchRequest,
    events: &UnboundedSender<Event>,
) -> FetchResult {
    let query = request.provider_query();
    let fail = |error: ProviderError| FetchFailure {
        symbol: request.symbol.clone(),
        error,
    };

    debug!(
        provider = provider.name(),
        start = %query.start,
        end_exclusive = %query.end,
        interval = %query.interval,
        "requesting prices"
    );
    // PriceSeries cannot be empty; providers report that as NoData
    let series = provider.fetch(&query).await.map_err(fail)?;
    info!(rows = series.len(), "prices received");

    let _ = events.send(Event::Progress {
        seq: request.seq,
        phase: Phase::Transforming,
    });

    let (series, warnings) = transform::derive(&series, &request.overlays);

    Ok(FetchSuccess {
        symbol: request.symbol.clone(),
        interval: request.interval,
        start: request.start,
        end: request.end,
        series,
        warnings,
    })
}
