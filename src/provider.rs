use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ProviderError;
use crate::game::Identity;

/// Where pods come from and where eaten pods go.
pub trait Provider: Clone + Send + Sync + 'static {
    fn connect(config: &Config) -> impl Future<Output = Result<Self, ProviderError>> + Send;

    fn cluster_name(&self) -> &str;

    fn list_namespaces(&self) -> impl Future<Output = Result<Vec<String>, ProviderError>> + Send;

    /// Picks one pod at random, restricted to `namespace` when given and
    /// skipping everything in `exclude`. `Ok(None)` means nothing is left.
    fn pick_random(
        &self,
        namespace: Option<String>,
        exclude: HashSet<Identity>,
    ) -> impl Future<Output = Result<Option<Identity>, ProviderError>> + Send;

    fn delete(&self, identity: Identity) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Runs `fut`, giving up with [`ProviderError::Timeout`] after `limit`.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}

type Roster = BTreeMap<String, BTreeSet<String>>;

/// Pods kept in memory, seeded from the `roster` section of the config.
///
/// Clones share the same roster, so a delete issued from one task is seen by
/// the next fetch.
#[derive(Clone, Debug)]
pub struct RosterProvider {
    cluster: String,
    latency: Duration,
    pods: Arc<Mutex<Roster>>,
    rng: Arc<Mutex<SmallRng>>,
}

impl RosterProvider {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let pods: Roster = config
            .roster
            .namespaces
            .iter()
            .map(|(ns, names)| (ns.clone(), names.iter().cloned().collect()))
            .collect();

        if pods.is_empty() {
            return Err(ProviderError::Connection(format!(
                "cluster {} has no namespaces configured",
                config.cluster
            )));
        }

        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(1)),
            None => SmallRng::from_entropy(),
        };

        Ok(RosterProvider {
            cluster: config.cluster.clone(),
            latency: Duration::from_millis(config.roster.latency_ms),
            pods: Arc::new(Mutex::new(pods)),
            rng: Arc::new(Mutex::new(rng)),
        })
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn with_roster<T>(&self, f: impl FnOnce(&mut Roster) -> T) -> Result<T, ProviderError> {
        let mut pods = self
            .pods
            .lock()
            .map_err(|_| ProviderError::Unavailable("roster lock poisoned".to_owned()))?;
        Ok(f(&mut pods))
    }

    fn choose(&self, candidates: &[Identity]) -> Result<Option<Identity>, ProviderError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| ProviderError::Unavailable("rng lock poisoned".to_owned()))?;
        Ok(candidates.choose(&mut *rng).cloned())
    }

    #[cfg(test)]
    fn pod_count(&self) -> usize {
        self.with_roster(|pods| pods.values().map(BTreeSet::len).sum()).unwrap_or(0)
    }
}

impl Provider for RosterProvider {
    async fn connect(config: &Config) -> Result<Self, ProviderError> {
        let provider = RosterProvider::new(config)?;
        provider.delay().await;
        info!(cluster = %provider.cluster, "connected to roster");
        Ok(provider)
    }

    fn cluster_name(&self) -> &str {
        &self.cluster
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, ProviderError> {
        self.delay().await;
        self.with_roster(|pods| pods.keys().cloned().collect())
    }

    async fn pick_random(
        &self,
        namespace: Option<String>,
        exclude: HashSet<Identity>,
    ) -> Result<Option<Identity>, ProviderError> {
        self.delay().await;

        let candidates = self.with_roster(|pods| {
            pods.iter()
                .filter(|(ns, _)| namespace.as_deref().map_or(true, |want| want == ns.as_str()))
                .flat_map(|(ns, names)| names.iter().map(move |name| Identity::new(ns.as_str(), name.as_str())))
                .filter(|id| !exclude.contains(id))
                .collect::<Vec<_>>()
        })?;

        let pick = self.choose(&candidates)?;
        debug!(candidates = candidates.len(), picked = ?pick, "picked pod");
        Ok(pick)
    }

    async fn delete(&self, identity: Identity) -> Result<(), ProviderError> {
        self.delay().await;

        let removed = self.with_roster(|pods| {
            pods.get_mut(&identity.namespace)
                .map_or(false, |names| names.remove(&identity.name))
        })?;

        if removed {
            Ok(())
        } else {
            Err(ProviderError::NotFound(identity.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(namespaces: Vec<(&str, Vec<&str>)>) -> Config {
        let mut config = Config::default();
        config.seed = Some(11);
        config.roster.namespaces = namespaces
            .into_iter()
            .map(|(ns, names)| (ns.to_owned(), names.into_iter().map(str::to_owned).collect()))
            .collect();
        config
    }

    #[tokio::test]
    async fn empty_roster_refuses_to_connect() {
        let err = RosterProvider::connect(&config_with(vec![])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Connection(_)));
    }

    #[tokio::test]
    async fn lists_namespaces_in_order() {
        let provider = RosterProvider::connect(&config_with(vec![("b", vec!["x"]), ("a", vec!["y"])])).await.unwrap();
        assert_eq!(provider.list_namespaces().await.unwrap(), vec!["a", "b"]);
        assert_eq!(provider.cluster_name(), "local");
    }

    #[tokio::test]
    async fn pick_respects_namespace_and_exclusions() {
        let provider = RosterProvider::connect(&config_with(vec![
            ("apps", vec!["web-1", "web-2"]),
            ("infra", vec!["dns-0"]),
        ]))
        .await
        .unwrap();

        for _ in 0..20 {
            let pick = provider.pick_random(Some("infra".to_owned()), HashSet::new()).await.unwrap();
            assert_eq!(pick, Some(Identity::new("infra", "dns-0")));
        }

        let exclude: HashSet<_> = [Identity::new("apps", "web-1")].into_iter().collect();
        for _ in 0..20 {
            let pick = provider.pick_random(Some("apps".to_owned()), exclude.clone()).await.unwrap();
            assert_eq!(pick, Some(Identity::new("apps", "web-2")));
        }

        let all: HashSet<_> = [
            Identity::new("apps", "web-1"),
            Identity::new("apps", "web-2"),
            Identity::new("infra", "dns-0"),
        ]
        .into_iter()
        .collect();
        assert_eq!(provider.pick_random(None, all).await.unwrap(), None);
        assert_eq!(provider.pick_random(Some("nope".to_owned()), HashSet::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_once() {
        let provider = RosterProvider::connect(&config_with(vec![("apps", vec!["web-1", "web-2"])])).await.unwrap();
        let other = provider.clone();

        provider.delete(Identity::new("apps", "web-1")).await.unwrap();
        assert_eq!(other.pod_count(), 1);

        let err = other.delete(Identity::new("apps", "web-1")).await.unwrap_err();
        assert_eq!(err, ProviderError::NotFound("apps/web-1".to_owned()));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_calls_hit_the_deadline() {
        let mut config = config_with(vec![("apps", vec!["web-1"])]);
        config.roster.latency_ms = 2_000;
        let provider = RosterProvider::new(&config).unwrap();

        let res = with_deadline(Duration::from_secs(1), provider.list_namespaces()).await;
        assert_eq!(res, Err(ProviderError::Timeout(Duration::from_secs(1))));

        let res = with_deadline(Duration::from_secs(5), provider.list_namespaces()).await;
        assert_eq!(res, Ok(vec!["apps".to_owned()]));
    }
}
