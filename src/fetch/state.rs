use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc::UnboundedSender;

use crate::fetch::coordinator::Control;
use crate::transport::HttpResponse;

/// Terminal outcome reached by one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    DomainError,
    TransportFailed,
}

/// What a generation settled with, before it is applied to the visible state.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T, E> {
    Success(Option<T>),
    DomainError(Option<E>),
    TransportFailed,
}

/// Sorts a received response into success or domain error.
///
/// A body that does not parse is dropped: a 2xx yields `Success(None)`,
/// anything else `DomainError(None)`.
pub fn classify<T, E>(response: &HttpResponse) -> Settled<T, E>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    if response.is_success() {
        Settled::Success(serde_json::from_slice(&response.body).ok())
    } else {
        Settled::DomainError(serde_json::from_slice(&response.body).ok())
    }
}

/// Starts a new generation of the subscription it was taken from.
#[derive(Clone)]
pub struct Retrigger {
    control: UnboundedSender<Control>,
    requested: Arc<AtomicU64>,
}

impl Retrigger {
    pub(crate) fn new(control: UnboundedSender<Control>, requested: Arc<AtomicU64>) -> Self {
        Self { control, requested }
    }

    pub fn retrigger(&self) {
        let generation = self.requested.fetch_add(1, Ordering::SeqCst) + 1;
        // A closed channel means the subscription was torn down.
        let _ = self.control.send(Control::Start(generation));
    }

    pub(crate) fn retarget(&self, request: crate::fetch::FetchRequest) {
        let generation = self.requested.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.control.send(Control::Retarget(request, generation));
    }

    pub(crate) fn requested(&self) -> u64 {
        self.requested.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Retrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrigger")
            .field("requested", &self.requested())
            .finish()
    }
}

/// Observable state of a subscribed read.
#[derive(Debug, Clone)]
pub struct FetchState<T, E> {
    pub loading: bool,
    pub data: Option<T>,
    pub error: Option<E>,
    pub failed: bool,
    pub outcome: Option<Outcome>,
    pub generation: u64,
    retrigger: Retrigger,
}

impl<T, E> FetchState<T, E> {
    pub(crate) fn new(retrigger: Retrigger) -> Self {
        Self {
            loading: true,
            data: None,
            error: None,
            failed: false,
            outcome: None,
            generation: 0,
            retrigger,
        }
    }

    pub fn retrigger(&self) {
        self.retrigger.retrigger();
    }

    pub fn is_settled(&self) -> bool {
        !self.loading && self.outcome.is_some()
    }

    /// Marks `generation` as the current one. Previous data and error stay
    /// visible until it settles.
    pub(crate) fn begin(&mut self, generation: u64) {
        self.generation = generation;
        self.loading = true;
        self.failed = false;
        self.outcome = None;
    }

    /// Applies a terminal result; results of a superseded generation are
    /// ignored and reported as not applied.
    ///
    /// A generation is superseded as soon as a newer one is requested, even
    /// before the driver has begun it.
    pub(crate) fn settle(&mut self, generation: u64, settled: Settled<T, E>) -> bool {
        if generation != self.generation
            || generation < self.retrigger.requested()
            || !self.loading
        {
            return false;
        }
        self.loading = false;
        match settled {
            Settled::Success(data) => {
                self.data = data;
                self.error = None;
                self.outcome = Some(Outcome::Success);
            }
            Settled::DomainError(error) => {
                self.data = None;
                self.error = error;
                self.outcome = Some(Outcome::DomainError);
            }
            Settled::TransportFailed => {
                self.data = None;
                self.error = None;
                self.failed = true;
                self.outcome = Some(Outcome::TransportFailed);
            }
        }
        true
    }
}
