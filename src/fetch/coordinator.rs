use std::marker::PhantomData;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::fetch::retry::{sleep_unless_cancelled, RetryPolicy, RetryState};
use crate::fetch::state::{classify, FetchState, Retrigger, Settled};
use crate::fetch::FetchRequest;
use crate::transport::{HttpRequest, Transport};

#[derive(Debug)]
pub(crate) enum Control {
    Start(u64),
    Retarget(FetchRequest, u64),
}

/// Keeps one outstanding read per subscription and publishes its state.
///
/// Every retrigger or retarget starts a new generation and cancels the
/// previous one: its in-flight call is aborted, its pending backoff is
/// dropped and any result it still produces is discarded.
pub struct RequestCoordinator<T, E> {
    request: FetchRequest,
    retrigger: Retrigger,
    state: watch::Receiver<FetchState<T, E>>,
    shutdown: CancellationToken,
}

impl<T, E> RequestCoordinator<T, E>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    E: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Issues the first generation immediately. Must be called inside a tokio runtime.
    pub fn subscribe(
        transport: Arc<dyn Transport>,
        request: FetchRequest,
        policy: RetryPolicy,
    ) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let retrigger = Retrigger::new(control_tx, Arc::new(AtomicU64::new(0)));
        let (state_tx, state_rx) = watch::channel(FetchState::new(retrigger.clone()));
        let shutdown = CancellationToken::new();

        let driver = Driver {
            transport,
            policy,
            state: Arc::new(state_tx),
            shutdown: shutdown.clone(),
        };
        tokio::spawn(driver.run(request.clone(), control_rx));
        retrigger.retrigger();

        Self {
            request,
            retrigger,
            state: state_rx,
            shutdown,
        }
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState<T, E> {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<FetchState<T, E>> {
        self.state.clone()
    }

    pub fn retrigger(&self) {
        self.retrigger.retrigger();
    }

    /// Points the subscription at another endpoint or method. No-op when unchanged.
    pub fn set_request(&mut self, request: FetchRequest) {
        if request == self.request {
            return;
        }
        self.request = request.clone();
        self.retrigger.retarget(request);
    }

    /// Waits until the latest requested generation reaches a terminal outcome.
    pub async fn settled(&self) -> FetchState<T, E> {
        let wanted = self.retrigger.requested();
        let mut rx = self.state.clone();
        let result = rx
            .wait_for(|s| s.generation >= wanted && !s.loading)
            .await
            .map(|s| s.clone());
        match result {
            Ok(state) => state,
            Err(_) => rx.borrow().clone(),
        }
    }

    /// Tears the subscription down; nothing is issued or applied afterwards.
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

impl<T, E> Drop for RequestCoordinator<T, E> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct Driver<T, E> {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    state: Arc<watch::Sender<FetchState<T, E>>>,
    shutdown: CancellationToken,
}

impl<T, E> Driver<T, E>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    E: DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn run(self, mut request: FetchRequest, mut control: mpsc::UnboundedReceiver<Control>) {
        let mut pending = match control.recv().await {
            Some(Control::Start(generation)) => Some(generation),
            Some(Control::Retarget(target, generation)) => {
                request = target;
                Some(generation)
            }
            None => None,
        };

        while let Some(generation) = pending {
            if self.shutdown.is_cancelled() {
                break;
            }
            let token = self.shutdown.child_token();
            self.state.send_modify(|s| s.begin(generation));

            // The superseded task winds down on its own once its token is cancelled.
            let mut issue = tokio::spawn(Generation {
                transport: self.transport.clone(),
                request: request.clone(),
                policy: self.policy,
                state: self.state.clone(),
                cancel: token.clone(),
                generation,
                _marker: PhantomData,
            }
            .execute());

            let mut finished = false;
            pending = loop {
                tokio::select! {
                    _ = &mut issue, if !finished => finished = true,
                    msg = control.recv() => match msg {
                        Some(Control::Start(next)) => break Some(next),
                        Some(Control::Retarget(target, next)) => {
                            request = target;
                            break Some(next);
                        }
                        None => break None,
                    },
                    _ = self.shutdown.cancelled() => break None,
                }
            };
            token.cancel();
            if !finished {
                debug!(generation, "generation superseded before settling");
            }
        }
        debug!("subscription closed");
    }
}

struct Generation<T, E> {
    transport: Arc<dyn Transport>,
    request: FetchRequest,
    policy: RetryPolicy,
    state: Arc<watch::Sender<FetchState<T, E>>>,
    cancel: CancellationToken,
    generation: u64,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, E> Generation<T, E>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    #[instrument(skip(self), fields(generation = self.generation, method = %self.request.method, endpoint = %self.request.endpoint))]
    async fn execute(self) {
        let mut retry = RetryState::default();
        loop {
            if self.cancel.is_cancelled() {
                return;
            }
            let request = HttpRequest::new(self.request.method.clone(), self.request.endpoint.clone());
            let result = self.transport.send(request, &self.cancel).await;
            if self.cancel.is_cancelled() {
                debug!("generation cancelled, dropping result");
                return;
            }

            match result {
                Ok(response) => {
                    debug!(status = response.status, "response received");
                    self.apply(classify(&response));
                    return;
                }
                Err(e) => match retry.advance(&self.policy) {
                    Some(delay) => {
                        warn!(error = %e, attempt = retry.attempt, delay_ms = delay.as_millis() as u64, "transport failure, retrying");
                        if !sleep_unless_cancelled(delay, &self.cancel).await {
                            debug!("cancelled during backoff");
                            return;
                        }
                    }
                    None => {
                        warn!(error = %e, retries = retry.attempt, "transport failure, giving up");
                        self.apply(Settled::TransportFailed);
                        return;
                    }
                },
            }
        }
    }

    fn apply(&self, settled: Settled<T, E>) {
        let generation = self.generation;
        let applied = self
            .state
            .send_if_modified(|state| state.settle(generation, settled));
        if !applied {
            debug!(generation, "stale result dropped");
        }
    }
}
