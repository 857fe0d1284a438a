//! In-memory data sources with scripted latency and results.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use lib_kiosk::models::{ArrivalsResponse, ContentResponse};
use lib_kiosk::{ArrivalsSource, ContentSource, FetchError};
use tokio::time::Instant;

/// One scripted answer.
#[derive(Debug, Clone)]
pub struct Step<T> {
    /// Time the fetch takes.
    pub latency: Duration,
    /// What it returns.
    pub result: Result<T, FetchError>,
}

impl<T> Step<T> {
    /// Immediate success.
    pub fn ok(value: T) -> Self {
        Self { latency: Duration::ZERO, result: Ok(value) }
    }

    /// Immediate failure.
    pub fn err(error: FetchError) -> Self {
        Self { latency: Duration::ZERO, result: Err(error) }
    }

    /// Takes `latency` before answering.
    pub fn after(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// A queue of steps; the last one repeats forever.
#[derive(Debug)]
struct Script<T> {
    steps: VecDeque<Step<T>>,
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Option<Step<T>> {
        match self.steps.len() {
            0 => None,
            1 => self.steps.front().cloned(),
            _ => self.steps.pop_front(),
        }
    }
}

/// Arrivals keyed by stop id.
#[derive(Debug, Default)]
pub struct ScriptedArrivals {
    scripts: Mutex<HashMap<String, Script<ArrivalsResponse>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedArrivals {
    /// Appends a step for `stop_id`.
    pub fn push(&self, stop_id: &str, step: Step<ArrivalsResponse>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(stop_id.to_string())
            .or_insert_with(|| Script { steps: VecDeque::new() })
            .steps
            .push_back(step);
    }

    /// Stop ids and (virtual) start times of every fetch so far.
    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ArrivalsSource for ScriptedArrivals {
    async fn fetch_arrivals(&self, stop_id: &str) -> Result<ArrivalsResponse, FetchError> {
        self.calls.lock().unwrap().push((stop_id.to_string(), Instant::now()));
        let step = self.scripts.lock().unwrap().get_mut(stop_id).and_then(Script::next);
        let Some(step) = step else {
            return Err(FetchError::Status { status: 404, body: Some(format!("unknown stop {stop_id}")) });
        };
        tokio::time::sleep(step.latency).await;
        step.result
    }
}

/// Shared content inventory.
#[derive(Debug)]
pub struct ScriptedContent {
    script: Mutex<Script<ContentResponse>>,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedContent {
    /// A source answering `steps` in order.
    pub fn new(steps: Vec<Step<ContentResponse>>) -> Self {
        Self { script: Mutex::new(Script { steps: steps.into() }), calls: Mutex::new(Vec::new()) }
    }

    /// (Virtual) start times of every fetch so far.
    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

impl ContentSource for ScriptedContent {
    async fn fetch_content(&self) -> Result<ContentResponse, FetchError> {
        self.calls.lock().unwrap().push(Instant::now());
        let step = self.script.lock().unwrap().next();
        let Some(step) = step else {
            return Ok(ContentResponse::default());
        };
        tokio::time::sleep(step.latency).await;
        step.result
    }
}
