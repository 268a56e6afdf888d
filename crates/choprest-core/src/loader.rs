// ── Map provider loader ──
//
// Brings the mapping SDK up exactly once per loader. The first caller drives
// the load; everyone else awaits the same shared future and sees the same
// outcome, success or failure.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{MapConfig, PollConfig};
use crate::error::LoadError;
use crate::sdk::MapSdk;

type LoadFuture = Shared<BoxFuture<'static, Result<MapHandle, LoadError>>>;

/// Where a loader is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderState {
    Unloaded,
    Loading { attempt: u32 },
    Ready,
    Failed(LoadError),
}

impl LoaderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }
}

/// Reference to an initialized SDK. Cheap to clone; every clone points at
/// the same SDK instance.
#[derive(Clone)]
pub struct MapHandle {
    sdk: Arc<dyn MapSdk>,
}

impl MapHandle {
    pub fn sdk(&self) -> &Arc<dyn MapSdk> {
        &self.sdk
    }

    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.sdk, &other.sdk)
    }
}

impl std::fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapHandle").finish_non_exhaustive()
    }
}

/// Single-flight SDK bootstrap.
pub struct MapProviderLoader {
    sdk: Arc<dyn MapSdk>,
    provider_key: SecretString,
    script_url: Url,
    poll: PollConfig,
    state: watch::Sender<LoaderState>,
    inflight: Mutex<Option<LoadFuture>>,
}

impl MapProviderLoader {
    pub fn new(sdk: Arc<dyn MapSdk>, provider_key: SecretString, script_url: Url, poll: PollConfig) -> Self {
        let (state, _) = watch::channel(LoaderState::Unloaded);
        Self {
            sdk,
            provider_key,
            script_url,
            poll,
            state,
            inflight: Mutex::new(None),
        }
    }

    pub fn from_config(sdk: Arc<dyn MapSdk>, config: &MapConfig) -> Self {
        Self::new(
            sdk,
            config.provider_key.clone(),
            config.script_url.clone(),
            config.poll,
        )
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoaderState {
        self.state.borrow().clone()
    }

    /// Subscribe to lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<LoaderState> {
        self.state.subscribe()
    }

    /// Resolve the SDK, loading it on first call.
    ///
    /// Concurrent and later callers share the first call's future. A failure
    /// is permanent for this loader.
    pub fn ensure_loaded(&self) -> impl Future<Output = Result<MapHandle, LoadError>> + Send + 'static {
        let mut slot = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert_with(|| {
            debug!("starting map SDK load");
            load(
                Arc::clone(&self.sdk),
                self.provider_key.clone(),
                self.script_url.clone(),
                self.poll,
                self.state.clone(),
            )
            .boxed()
            .shared()
        })
        .clone()
    }
}

/// The bootstrap URL: `{script_url}?appkey={key}&autoload=false`.
pub fn script_url_with_key(base: &Url, key: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("appkey", key)
        .append_pair("autoload", "false");
    url
}

/// Provider keys are 32 hex characters.
pub fn is_valid_provider_key(key: &str) -> bool {
    key.len() == 32 && key.bytes().all(|b| b.is_ascii_hexdigit())
}

async fn load(
    sdk: Arc<dyn MapSdk>,
    key: SecretString,
    base: Url,
    poll: PollConfig,
    state: watch::Sender<LoaderState>,
) -> Result<MapHandle, LoadError> {
    let outcome = drive(&*sdk, &key, &base, poll, &state).await;
    match &outcome {
        Ok(()) => {
            info!("map SDK ready");
            state.send_replace(LoaderState::Ready);
        }
        Err(e) => {
            warn!(error = %e, "map SDK failed to load");
            state.send_replace(LoaderState::Failed(e.clone()));
        }
    }
    outcome.map(|()| MapHandle { sdk })
}

async fn drive(
    sdk: &dyn MapSdk,
    key: &SecretString,
    base: &Url,
    poll: PollConfig,
    state: &watch::Sender<LoaderState>,
) -> Result<(), LoadError> {
    state.send_replace(LoaderState::Loading { attempt: 0 });

    let key = key.expose_secret();
    if !is_valid_provider_key(key) {
        return Err(LoadError::InvalidKey);
    }

    if sdk.is_ready() {
        debug!("map SDK already initialized, skipping script injection");
        return Ok(());
    }

    sdk.inject_script(&script_url_with_key(base, key))
        .await
        .map_err(|e| LoadError::Script { reason: e.0 })?;

    for attempt in 1..=poll.max_attempts {
        tokio::time::sleep(poll.interval).await;
        state.send_replace(LoaderState::Loading { attempt });
        if sdk.is_ready() {
            debug!(attempt, "map SDK reported ready");
            return Ok(());
        }
    }

    Err(LoadError::NotReady {
        attempts: poll.max_attempts,
        waited_ms: waited_ms(poll),
    })
}

fn waited_ms(poll: PollConfig) -> u64 {
    let total = poll.interval.saturating_mul(poll.max_attempts);
    u64::try_from(total.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sdk::HeadlessSdk;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn loader(sdk: &Arc<HeadlessSdk>, key: &str) -> MapProviderLoader {
        MapProviderLoader::new(
            Arc::clone(sdk) as Arc<dyn MapSdk>,
            SecretString::from(key.to_owned()),
            Url::parse("https://maps.example/sdk.js").unwrap(),
            PollConfig::default(),
        )
    }

    #[test]
    fn provider_key_shape() {
        assert!(is_valid_provider_key(KEY));
        assert!(is_valid_provider_key(&KEY.to_uppercase()));
        assert!(!is_valid_provider_key("0123"));
        assert!(!is_valid_provider_key("0123456789abcdef0123456789abcdeg"));
    }

    #[test]
    fn script_url_carries_key_and_disables_autoload() {
        let base = Url::parse("https://dapi.kakao.com/v2/maps/sdk.js").unwrap();
        let url = script_url_with_key(&base, KEY);
        assert_eq!(
            url.as_str(),
            "https://dapi.kakao.com/v2/maps/sdk.js?appkey=0123456789abcdef0123456789abcdef&autoload=false"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_load() {
        let sdk = Arc::new(HeadlessSdk::ready_after(3));
        let loader = loader(&sdk, KEY);

        let (a, b) = tokio::join!(loader.ensure_loaded(), loader.ensure_loaded());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a.same_as(&b));
        assert_eq!(sdk.injected_scripts().len(), 1);
        assert_eq!(loader.state(), LoaderState::Ready);

        // Later callers get the memoized handle without touching the SDK.
        let checks = sdk.readiness_checks();
        let c = loader.ensure_loaded().await.unwrap();
        assert!(c.same_as(&a));
        assert_eq!(sdk.readiness_checks(), checks);
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_is_polled_on_the_interval() {
        let sdk = Arc::new(HeadlessSdk::ready_after(3));
        let loader = loader(&sdk, KEY);

        let started = tokio::time::Instant::now();
        loader.ensure_loaded().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn preloaded_sdk_skips_injection() {
        let sdk = Arc::new(HeadlessSdk::preloaded());
        let loader = loader(&sdk, KEY);

        loader.ensure_loaded().await.unwrap();
        assert!(sdk.injected_scripts().is_empty());
        assert_eq!(loader.state(), LoaderState::Ready);
    }

    #[tokio::test]
    async fn invalid_key_never_reaches_sdk() {
        let sdk = Arc::new(HeadlessSdk::new());
        let loader = loader(&sdk, "not-a-key");

        let err = loader.ensure_loaded().await.unwrap_err();
        assert_eq!(err, LoadError::InvalidKey);
        assert_eq!(sdk.readiness_checks(), 0);
        assert!(sdk.injected_scripts().is_empty());
        assert_eq!(loader.state(), LoaderState::Failed(LoadError::InvalidKey));
    }

    #[tokio::test]
    async fn script_failure_is_immediate() {
        let sdk = Arc::new(HeadlessSdk::failing_script("net::ERR_BLOCKED_BY_CLIENT"));
        let loader = loader(&sdk, KEY);

        let err = loader.ensure_loaded().await.unwrap_err();
        assert_eq!(
            err,
            LoadError::Script {
                reason: "net::ERR_BLOCKED_BY_CLIENT".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn never_ready_fails_permanently() {
        let sdk = Arc::new(HeadlessSdk::never_ready());
        let loader = loader(&sdk, KEY);
        let mut states = loader.subscribe();

        let expected = LoadError::NotReady {
            attempts: 100,
            waited_ms: 10_000,
        };
        assert_eq!(loader.ensure_loaded().await.unwrap_err(), expected);
        assert!(states.borrow_and_update().is_terminal());

        // Second call replays the failure; no new injection, no new polling.
        let checks = sdk.readiness_checks();
        assert_eq!(loader.ensure_loaded().await.unwrap_err(), expected);
        assert_eq!(sdk.injected_scripts().len(), 1);
        assert_eq!(sdk.readiness_checks(), checks);
        assert_eq!(sdk.marker_count(), 0);
    }
}
