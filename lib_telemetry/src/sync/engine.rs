//! # Auto-Refetch Engine
//!
//! One poll task per subscribed endpoint, shared by every consumer of that
//! endpoint. Subscriptions are reference-counted: the first `subscribe`
//! spawns the poll task, later ones attach to it, and the last handle to
//! drop cancels it: the pending timer dies and an in-flight request is
//! abandoned without mutating anything.
//!
//! Snapshots publish through a `watch` channel holding
//! `Option<Arc<Vec<Fm>>>`: `None` until the first successful fetch, then
//! always the most recent mapped collection. Fetch failures never reach
//! consumers; the previous snapshot is retained and the failure is counted
//! on a shared diagnostics counter.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::endpoints::Endpoint;
use crate::models::mapping::EndpointModel;
use crate::retrieve::http::ApiClient;
use crate::sync::poll_state::{Completion, PollState};

/// The published value of a subscription: `None` before the first
/// successful fetch, then the latest mapped collection.
pub type Snapshot<T> = Option<Arc<Vec<T>>>;

struct SubscriptionEntry {
    consumers: u32,
    token: CancellationToken,
    errors: Arc<AtomicU64>,
    /// `Arc<watch::Sender<Snapshot<Fm>>>`, type-erased so entries for
    /// different record shapes share one arena.
    channel: Box<dyn Any + Send + Sync>,
}

struct EngineInner {
    client: Arc<ApiClient>,
    poll_interval: Duration,
    subscriptions: Mutex<HashMap<Endpoint, SubscriptionEntry>>,
}

/// Polling coordinator over one backend. Cheap to clone; all clones share
/// the same subscription arena.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    /// Creates an engine polling through `client` at a fixed cadence.
    /// No polling starts until the first subscription.
    pub fn new(client: ApiClient, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                client: Arc::new(client),
                poll_interval,
                subscriptions: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Subscribes to the feed bound by `M`. Must be called from within a
    /// tokio runtime: the first subscriber for an endpoint spawns its poll
    /// task, which issues an immediate fetch and then re-fetches every
    /// interval. Later subscribers attach to the running task.
    ///
    /// # Panics
    /// If two `EndpointModel` impls with different view types claim the
    /// same endpoint. That is a programming error, not a runtime condition.
    pub fn subscribe<M: EndpointModel>(&self) -> Subscription<M::Fm> {
        let mut subs = self
            .inner
            .subscriptions
            .lock()
            .expect("engine lock poisoned");

        let entry = subs.entry(M::ENDPOINT).or_insert_with(|| {
            let (tx, _rx) = watch::channel::<Snapshot<M::Fm>>(None);
            let tx = Arc::new(tx);
            let token = CancellationToken::new();
            let errors = Arc::new(AtomicU64::new(0));

            tokio::spawn(poll_loop::<M>(
                Arc::clone(&self.inner.client),
                self.inner.poll_interval,
                Arc::clone(&tx),
                Arc::clone(&errors),
                token.clone(),
            ));

            SubscriptionEntry {
                consumers: 0,
                token,
                errors,
                channel: Box::new(tx),
            }
        });

        entry.consumers += 1;
        let tx = entry
            .channel
            .downcast_ref::<Arc<watch::Sender<Snapshot<M::Fm>>>>()
            .expect("conflicting view types registered for one endpoint");

        Subscription {
            endpoint: M::ENDPOINT,
            rx: tx.subscribe(),
            errors: Arc::clone(&entry.errors),
            engine: self.clone(),
        }
    }

    /// Number of endpoints currently being polled.
    pub fn active_subscriptions(&self) -> usize {
        self.inner
            .subscriptions
            .lock()
            .expect("engine lock poisoned")
            .len()
    }

    fn release(&self, endpoint: Endpoint) {
        let mut subs = self
            .inner
            .subscriptions
            .lock()
            .expect("engine lock poisoned");
        let Some(entry) = subs.get_mut(&endpoint) else {
            return;
        };
        entry.consumers = entry.consumers.saturating_sub(1);
        if entry.consumers == 0 {
            entry.token.cancel();
            subs.remove(&endpoint);
            log::debug!("{endpoint}: last consumer left, polling stopped");
        }
    }
}

/// Consumer handle for one feed. Dropping it detaches from the shared poll
/// task, which stops once the last handle is gone.
pub struct Subscription<T> {
    endpoint: Endpoint,
    rx: watch::Receiver<Snapshot<T>>,
    errors: Arc<AtomicU64>,
    engine: SyncEngine,
}

impl<T> Subscription<T> {
    /// The most recent snapshot, or `None` if no fetch has succeeded yet.
    pub fn latest(&self) -> Snapshot<T> {
        self.rx.borrow().clone()
    }

    /// Waits until a new snapshot is published.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }

    /// Consecutive fetch failures since the last successful poll.
    /// Diagnostics only; failures never surface as consumer errors.
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.engine.release(self.endpoint);
    }
}

async fn poll_loop<M: EndpointModel>(
    client: Arc<ApiClient>,
    poll_interval: Duration,
    tx: Arc<watch::Sender<Snapshot<M::Fm>>>,
    errors: Arc<AtomicU64>,
    token: CancellationToken,
) {
    let mut state = PollState::new();
    let mut ticker = tokio::time::interval(poll_interval);
    // Ticks that pile up behind a slow fetch are dropped, not replayed.
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    log::debug!("{}: polling started", M::ENDPOINT);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(seq) = state.on_tick() else {
            continue;
        };

        let fetched = tokio::select! {
            // Unsubscribed mid-fetch: drop the request, touch nothing.
            _ = token.cancelled() => break,
            result = client.fetch_array::<M::Dto>(M::ENDPOINT) => result,
        };

        match fetched {
            Ok(wire) => {
                let mapped: Vec<M::Fm> = wire.into_iter().map(M::map).collect();
                if state.on_success(seq) == Completion::Applied {
                    errors.store(0, Ordering::Relaxed);
                    log::debug!(
                        "{}: published {} records (seq {seq})",
                        M::ENDPOINT,
                        mapped.len()
                    );
                    tx.send_replace(Some(Arc::new(mapped)));
                }
            }
            Err(err) => {
                state.on_error(seq);
                errors.store(state.errors(), Ordering::Relaxed);
                log::warn!("{}: poll failed (seq {seq}): {err}", M::ENDPOINT);
            }
        }
    }

    log::debug!("{}: polling stopped", M::ENDPOINT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mapping::{CloudInvModel, WorldInvModel};
    use std::sync::atomic::AtomicUsize;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::time::timeout;

    const FAST_POLL: Duration = Duration::from_millis(50);
    const WAIT: Duration = Duration::from_secs(2);

    /// Mock backend: serves `responses` in order (the last one repeats),
    /// counting every request it accepts.
    async fn mock_backend(responses: Vec<(u16, String)>) -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_server = Arc::clone(&hits);

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let n = hits_server.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)].clone();
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn inventory_body(amount: i64) -> String {
        format!(r#"[{{"className":"Desc_IronIngot_C","name":"Iron Ingot","amount":{amount}}}]"#)
    }

    fn engine_for(base: &str) -> SyncEngine {
        SyncEngine::new(ApiClient::new(base).unwrap(), FAST_POLL)
    }

    #[tokio::test]
    async fn first_snapshot_arrives_after_subscribe() {
        let (base, _hits) = mock_backend(vec![(200, inventory_body(42))]).await;
        let engine = engine_for(&base);

        let mut sub = engine.subscribe::<CloudInvModel>();
        assert!(sub.latest().is_none());

        timeout(WAIT, sub.changed()).await.unwrap().unwrap();
        let snapshot = sub.latest().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].amount, 42);
    }

    #[tokio::test]
    async fn consumers_of_one_endpoint_share_one_poller() {
        let (base, _hits) = mock_backend(vec![(200, inventory_body(1))]).await;
        let engine = engine_for(&base);

        let mut first = engine.subscribe::<CloudInvModel>();
        let second = engine.subscribe::<CloudInvModel>();
        assert_eq!(engine.active_subscriptions(), 1);

        timeout(WAIT, first.changed()).await.unwrap().unwrap();
        // The attached consumer sees the same snapshot without ever having
        // triggered a fetch of its own.
        assert_eq!(second.latest().unwrap()[0].amount, 1);

        drop(first);
        assert_eq!(engine.active_subscriptions(), 1);
        drop(second);
        assert_eq!(engine.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn distinct_endpoints_poll_independently() {
        let (base, _hits) = mock_backend(vec![(200, inventory_body(7))]).await;
        let engine = engine_for(&base);

        let _cloud = engine.subscribe::<CloudInvModel>();
        let _world = engine.subscribe::<WorldInvModel>();
        assert_eq!(engine.active_subscriptions(), 2);
    }

    #[tokio::test]
    async fn dropping_the_last_handle_stops_polling() {
        let (base, hits) = mock_backend(vec![(200, inventory_body(9))]).await;
        let engine = engine_for(&base);

        let mut sub = engine.subscribe::<CloudInvModel>();
        timeout(WAIT, sub.changed()).await.unwrap().unwrap();
        drop(sub);

        // Give a possibly in-flight request time to drain, then check the
        // counter has gone quiet.
        tokio::time::sleep(FAST_POLL * 3).await;
        let settled = hits.load(Ordering::SeqCst);
        tokio::time::sleep(FAST_POLL * 5).await;
        assert_eq!(hits.load(Ordering::SeqCst), settled);
    }

    #[tokio::test]
    async fn unsubscribing_mid_fetch_mutates_nothing() {
        // First request: slow, answers 111. Every later request: instant,
        // answers 222. A consumer that unsubscribes while the slow request
        // is in flight must never see 111 anywhere afterwards.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let served = Arc::new(AtomicUsize::new(0));
        let served_server = Arc::clone(&served);

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let n = served_server.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf).await;
                    let amount = if n == 0 {
                        tokio::time::sleep(Duration::from_millis(400)).await;
                        111
                    } else {
                        222
                    };
                    let body = inventory_body(amount);
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                });
            }
        });

        let engine = engine_for(&format!("http://{addr}"));
        let first = engine.subscribe::<CloudInvModel>();

        // Let the immediate fetch get onto the wire, then walk away.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(first.latest().is_none());
        drop(first);
        assert_eq!(engine.active_subscriptions(), 0);

        // A fresh subscription starts clean and only ever sees the data
        // its own poller fetched.
        let mut second = engine.subscribe::<CloudInvModel>();
        assert!(second.latest().is_none());
        timeout(WAIT, second.changed()).await.unwrap().unwrap();
        assert_eq!(second.latest().unwrap()[0].amount, 222);

        // Outlive the abandoned slow response; it must not surface.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(second.latest().unwrap()[0].amount, 222);
    }

    #[tokio::test]
    async fn failures_keep_the_previous_snapshot() {
        let (base, _hits) =
            mock_backend(vec![(200, inventory_body(3)), (500, String::new())]).await;
        let engine = engine_for(&base);

        let mut sub = engine.subscribe::<CloudInvModel>();
        timeout(WAIT, sub.changed()).await.unwrap().unwrap();
        assert_eq!(sub.latest().unwrap()[0].amount, 3);

        // Let several failing polls go by.
        tokio::time::sleep(FAST_POLL * 6).await;
        assert_eq!(sub.latest().unwrap()[0].amount, 3);
        assert!(sub.error_count() >= 1);
    }

    #[tokio::test]
    async fn recovery_resets_the_error_counter() {
        let (base, _hits) = mock_backend(vec![
            (500, String::new()),
            (500, String::new()),
            (200, inventory_body(11)),
        ])
        .await;
        let engine = engine_for(&base);

        let mut sub = engine.subscribe::<CloudInvModel>();
        timeout(WAIT, sub.changed()).await.unwrap().unwrap();
        assert_eq!(sub.latest().unwrap()[0].amount, 11);
        assert_eq!(sub.error_count(), 0);
    }

    #[tokio::test]
    async fn empty_array_is_a_valid_snapshot() {
        let (base, _hits) = mock_backend(vec![(200, "[]".to_string())]).await;
        let engine = engine_for(&base);

        let mut sub = engine.subscribe::<CloudInvModel>();
        timeout(WAIT, sub.changed()).await.unwrap().unwrap();
        let snapshot = sub.latest().unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(sub.error_count(), 0);
    }
}
