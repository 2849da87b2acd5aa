#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;
use stock::{
    DataProvider, FetchController, PriceSeries, ProviderError, ProviderQuery,
    render::{ChartFrame, ChartSurface, RenderDispatcher, Shell},
};
use tokio::sync::{
    Notify,
    mpsc::{self, UnboundedReceiver},
};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
}

#[derive(Default)]
pub struct RecordingShell {
    pub status: Vec<String>,
    pub refresh_enabled: bool,
    pub refresh_history: Vec<bool>,
    pub notices: Vec<(String, String)>,
}

impl Shell for RecordingShell {
    fn set_status(&mut self, text: &str) {
        self.status.push(text.to_string());
    }

    fn set_refresh_enabled(&mut self, enabled: bool) {
        self.refresh_enabled = enabled;
        self.refresh_history.push(enabled);
    }

    fn notify_error(&mut self, title: &str, message: &str) {
        self.notices.push((title.to_string(), message.to_string()));
    }
}

#[derive(Default)]
pub struct FakeSurface {
    pub frames: Vec<ChartFrame>,
    pub clears: usize,
}

impl ChartSurface for FakeSurface {
    fn clear(&mut self) {
        self.clears += 1;
        self.frames.clear();
    }

    fn draw(&mut self, frame: &ChartFrame) -> Result<(), stock::RenderError> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn export(&self, _path: &Path, _width: u32, _height: u32) -> Result<(), stock::RenderError> {
        Ok(())
    }
}

/// Canned responses keyed by symbol.
pub enum Canned {
    Rows(usize),
    Empty,
    Fail,
    BadVolume(usize),
}

#[derive(Default)]
pub struct FakeProvider {
    pub canned: HashMap<String, Canned>,
    pub queries: Mutex<Vec<ProviderQuery>>,
    /// Symbols listed here wait on the notify before answering
    pub gates: HashMap<String, Arc<Notify>>,
}

impl FakeProvider {
    pub fn with(mut self, symbol: &str, canned: Canned) -> Self {
        self.canned.insert(symbol.to_string(), canned);
        self
    }

    pub fn gated(mut self, symbol: &str, gate: Arc<Notify>) -> Self {
        self.gates.insert(symbol.to_string(), gate);
        self
    }
}

pub fn rows(symbol: &str, n: usize, volume: Vec<Value>) -> Result<PriceSeries, ProviderError> {
    let timestamps = (0..n as i64)
        .map(|d| Utc.timestamp_opt(1_704_205_800 + d * 86_400, 0).unwrap())
        .collect();
    let close = (0..n).map(|i| 100.0 + i as f64).collect();
    PriceSeries::new(symbol, timestamps, close, None, Some(volume))
}

impl DataProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<PriceSeries, ProviderError> {
        self.queries.lock().unwrap().push(query.clone());

        if let Some(gate) = self.gates.get(&query.symbol) {
            gate.notified().await;
        }

        match self.canned.get(&query.symbol) {
            Some(Canned::Rows(n)) => rows(&query.symbol, *n, vec![Value::from(1_000); *n]),
            Some(Canned::BadVolume(n)) => {
                rows(&query.symbol, *n, vec![Value::from("n/a"); *n])
            }
            Some(Canned::Empty) => rows(&query.symbol, 0, vec![]),
            Some(Canned::Fail) | None => Err(ProviderError::Upstream("connection reset".into())),
        }
    }
}

pub struct Harness {
    pub controller: FetchController<FakeProvider, FakeSurface>,
    pub events: UnboundedReceiver<stock::Event>,
    pub provider: Arc<FakeProvider>,
    pub shell: RecordingShell,
}

impl Harness {
    pub fn new(provider: FakeProvider, discard_stale: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let provider = Arc::new(provider);
        let dispatcher = RenderDispatcher::new(FakeSurface::default(), discard_stale, (10, 10));
        Self {
            controller: FetchController::new(Arc::clone(&provider), dispatcher, tx),
            events: rx,
            provider,
            shell: RecordingShell::default(),
        }
    }

    /// Feed queued events until `n` cycles have completed.
    pub async fn complete(&mut self, mut n: usize) -> Vec<stock::render::Applied> {
        let mut applied = Vec::new();
        while n > 0 {
            let event = self.events.recv().await.expect("event queue closed");
            if let Some(a) = self.controller.handle(event, &mut self.shell) {
                applied.push(a);
                n -= 1;
            }
        }
        applied
    }
}
