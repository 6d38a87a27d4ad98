use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::config::ResourcesConfig;
use crate::interpreter::{RenderTree, ResourceState};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Resource loader needs a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Resource is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: usize },

    #[error("Unsupported resource URL '{0}'")]
    UnsupportedUrl(String),
}

/// Completion notice for a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    Loaded { url: String, generation: u64 },
    Failed { url: String, generation: u64, reason: String },
}

impl ResourceEvent {
    pub fn url(&self) -> &str {
        match self {
            ResourceEvent::Loaded { url, .. } | ResourceEvent::Failed { url, .. } => url,
        }
    }

    /// Newest render generation that asked for this resource.
    pub fn generation(&self) -> u64 {
        match self {
            ResourceEvent::Loaded { generation, .. } | ResourceEvent::Failed { generation, .. } => *generation,
        }
    }
}

#[derive(Clone)]
enum Cached {
    Loaded(Arc<Vec<u8>>),
    /// Failed for passes up to `generation`; newer passes fetch again.
    Failed { reason: String, generation: u64 },
}

impl Cached {
    fn state(&self) -> ResourceState {
        match self {
            Cached::Loaded(bytes) => ResourceState::Loaded { bytes: bytes.len() },
            Cached::Failed { reason, .. } => ResourceState::Failed {
                reason: reason.clone(),
            },
        }
    }

    fn size(&self) -> usize {
        match self {
            Cached::Loaded(bytes) => bytes.len(),
            Cached::Failed { .. } => 0,
        }
    }

    /// Whether a pass at `generation` can use this entry without fetching.
    fn settles(&self, generation: u64) -> bool {
        match self {
            Cached::Loaded(_) => true,
            Cached::Failed { generation: failed, .. } => *failed >= generation,
        }
    }
}

/// Most results the cache keeps, loaded or failed.
const MAX_CACHED_ENTRIES: usize = 1024;

/// Fetch results, evicted oldest first once the loaded bytes exceed
/// `capacity` or the entry count exceeds [`MAX_CACHED_ENTRIES`].
struct ResultCache {
    entries: HashMap<String, Cached>,
    order: VecDeque<String>,
    bytes: usize,
    capacity: usize,
}

impl ResultCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            bytes: 0,
            capacity,
        }
    }

    fn get(&self, url: &str) -> Option<&Cached> {
        self.entries.get(url)
    }

    fn insert(&mut self, url: String, cached: Cached) {
        self.bytes += cached.size();
        if let Some(previous) = self.entries.insert(url.clone(), cached) {
            self.bytes -= previous.size();
            self.order.retain(|queued| queued != &url);
        }
        self.order.push_back(url);

        while self.bytes > self.capacity || self.entries.len() > MAX_CACHED_ENTRIES {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.bytes -= evicted.size();
                tracing::debug!(url = %oldest, bytes = evicted.size(), "Evicted cached resource");
            }
        }
    }
}

struct InFlight {
    generation: u64,
    handle: AbortHandle,
}

struct Shared {
    cache: RwLock<ResultCache>,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

/// Fetches remote resources referenced by render trees.
///
/// Locks guard only map access; no lock is held while a fetch is awaited.
pub struct ResourceLoader {
    client: reqwest::Client,
    runtime: Handle,
    max_bytes: usize,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<ResourceEvent>,
}

impl ResourceLoader {
    /// Build a loader whose fetches run on the current tokio runtime, so
    /// [`request`](Self::request) may later be called from any thread.
    pub fn new(
        config: &ResourcesConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ResourceEvent>), ResourceError> {
        let runtime = Handle::try_current()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .build()
            .map_err(ResourceError::Client)?;
        let (events, receiver) = mpsc::unbounded_channel();
        let loader = Self {
            client,
            runtime,
            max_bytes: config.max_bytes,
            shared: Arc::new(Shared {
                cache: RwLock::new(ResultCache::new(config.cache_bytes)),
                in_flight: Mutex::new(HashMap::new()),
            }),
            events,
        };
        Ok((loader, receiver))
    }

    /// Start fetches for every placeholder resource in `tree` that is neither
    /// cached nor already in flight. A failure cached by an older pass is
    /// fetched again.
    ///
    /// Returns the number of fetches started.
    pub fn request(&self, tree: &RenderTree, generation: u64) -> usize {
        let mut started = 0;
        for descriptor in &tree.resources {
            if descriptor.state != ResourceState::Placeholder {
                continue;
            }
            let Some(url) = descriptor.remote_url() else {
                continue;
            };
            let settled = self
                .shared
                .cache
                .read()
                .get(url)
                .is_some_and(|cached| cached.settles(generation));
            if settled {
                continue;
            }

            let mut in_flight = self.shared.in_flight.lock();
            if let Some(existing) = in_flight.get_mut(url) {
                existing.generation = existing.generation.max(generation);
                continue;
            }

            if let Err(err) = check_url(url) {
                drop(in_flight);
                self.finish(url.to_string(), generation, Err(err));
                continue;
            }

            let handle = self.spawn_fetch(url.to_string(), generation);
            in_flight.insert(url.to_string(), InFlight { generation, handle });
            started += 1;
        }

        if started > 0 {
            tracing::debug!(generation, started, "Started resource fetches");
        }
        started
    }

    fn spawn_fetch(&self, url: String, generation: u64) -> AbortHandle {
        let client = self.client.clone();
        let max_bytes = self.max_bytes;
        let shared = self.shared.clone();
        let events = self.events.clone();

        let task = self.runtime.spawn(async move {
            let outcome = fetch(&client, &url, max_bytes).await;
            let generation = shared
                .in_flight
                .lock()
                .remove(&url)
                .map_or(generation, |entry| entry.generation);
            let event = record(&shared, url, generation, outcome);
            // Nobody listening is fine; the cache still has the result.
            let _ = events.send(event);
        });
        task.abort_handle()
    }

    fn finish(&self, url: String, generation: u64, outcome: Result<Vec<u8>, ResourceError>) {
        let event = record(&self.shared, url, generation, outcome);
        let _ = self.events.send(event);
    }

    /// Abort fetches wanted only by passes older than `generation`.
    ///
    /// Returns the number of fetches aborted.
    pub fn cancel_stale(&self, generation: u64) -> usize {
        let mut in_flight = self.shared.in_flight.lock();
        let before = in_flight.len();
        in_flight.retain(|url, entry| {
            if entry.generation >= generation {
                return true;
            }
            tracing::debug!(url = %url, stale = entry.generation, current = generation, "Aborting stale fetch");
            entry.handle.abort();
            false
        });
        before - in_flight.len()
    }

    /// Patch cached results into the resource states of `tree`.
    pub fn annotate(&self, tree: &mut RenderTree) {
        let cache = self.shared.cache.read();
        tree.update_resources(&mut |descriptor| {
            let cached = descriptor.remote_url().and_then(|url| cache.get(url));
            if let Some(cached) = cached {
                descriptor.state = cached.state();
            }
        });
    }

    /// Bytes of a loaded resource.
    pub fn get(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        match self.shared.cache.read().get(url) {
            Some(Cached::Loaded(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.lock().len()
    }
}

fn check_url(url: &str) -> Result<(), ResourceError> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ResourceError::UnsupportedUrl(url.to_string())),
    }
}

async fn fetch(client: &reqwest::Client, url: &str, max_bytes: usize) -> Result<Vec<u8>, ResourceError> {
    let response = client.get(url).send().await?.error_for_status()?;
    if let Some(size) = response.content_length() {
        if size > max_bytes as u64 {
            return Err(ResourceError::TooLarge { size, limit: max_bytes });
        }
    }
    let body = response.bytes().await?;
    if body.len() > max_bytes {
        return Err(ResourceError::TooLarge {
            size: body.len() as u64,
            limit: max_bytes,
        });
    }
    Ok(body.to_vec())
}

fn record(
    shared: &Shared,
    url: String,
    generation: u64,
    outcome: Result<Vec<u8>, ResourceError>,
) -> ResourceEvent {
    match outcome {
        Ok(bytes) => {
            tracing::debug!(url = %url, bytes = bytes.len(), "Resource loaded");
            shared.cache.write().insert(url.clone(), Cached::Loaded(Arc::new(bytes)));
            ResourceEvent::Loaded { url, generation }
        }
        Err(err) => {
            tracing::warn!(url = %url, error = %err, "Resource fetch failed");
            let reason = err.to_string();
            shared.cache.write().insert(
                url.clone(),
                Cached::Failed {
                    reason: reason.clone(),
                    generation,
                },
            );
            ResourceEvent::Failed {
                url,
                generation,
                reason,
            }
        }
    }
}
