//! Outstanding login challenges
//!
//! Each wallet address has at most one pending challenge. Issuing a new one
//! replaces the old; consuming removes it whether or not it has expired.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use super::clock::Clock;

/// Prefix of the human readable text the wallet is asked to sign
pub const CHALLENGE_PREFIX: &str = "Sign this message to authenticate: ";

/// Number of random bytes behind every nonce
const NONCE_BYTES: usize = 16;

/// A pending login challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub wallet_address: String,
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl Challenge {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Build the exact text a wallet signs for `nonce`
pub fn challenge_message(nonce: &str) -> String {
    format!("{}{}", CHALLENGE_PREFIX, nonce)
}

/// Storage for pending challenges.
///
/// `issue` and `consume` must each be atomic per address: of several
/// concurrent `consume` calls for one address at most one gets the challenge.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Create a fresh challenge for `wallet_address`, replacing any previous one
    async fn issue(&self, wallet_address: &str) -> Challenge;

    /// Remove and return the challenge for `wallet_address`, expired or not
    async fn consume(&self, wallet_address: &str) -> Option<Challenge>;

    /// Drop every challenge that expired before `now`, returning how many went
    async fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

/// Single-process store backed by a mutex-guarded map
pub struct InMemoryNonceStore {
    challenges: Mutex<HashMap<String, Challenge>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl InMemoryNonceStore {
    pub fn new(clock: Arc<dyn Clock>, ttl_seconds: i64) -> Self {
        Self {
            challenges: Mutex::new(HashMap::new()),
            clock,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Number of challenges currently held, expired ones included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Challenge>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.challenges.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl NonceStore for InMemoryNonceStore {
    async fn issue(&self, wallet_address: &str) -> Challenge {
        let nonce = generate_secure_nonce();
        let challenge = Challenge {
            wallet_address: wallet_address.to_string(),
            message: challenge_message(&nonce),
            nonce,
            expires_at: self.clock.now() + self.ttl,
        };

        self.lock()
            .insert(wallet_address.to_string(), challenge.clone());

        challenge
    }

    async fn consume(&self, wallet_address: &str) -> Option<Challenge> {
        self.lock().remove(wallet_address)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut challenges = self.lock();
        let before = challenges.len();
        challenges.retain(|_, c| !c.is_expired(now));
        before - challenges.len()
    }
}

/// Generate an unpredictable hex nonce from the OS random source
fn generate_secure_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Periodically purge expired challenges until the runtime shuts down
pub fn spawn_nonce_sweeper(
    store: Arc<dyn NonceStore>,
    clock: Arc<dyn Clock>,
    interval: StdDuration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(interval_secs = interval.as_secs(), "Starting nonce sweeper");

        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let purged = store.purge_expired(clock.now()).await;
            if purged > 0 {
                tracing::debug!(purged, "Purged expired nonces");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    fn store_with_clock() -> (InMemoryNonceStore, ManualClock) {
        let clock = ManualClock::default();
        let store = InMemoryNonceStore::new(Arc::new(clock.clone()), 300);
        (store, clock)
    }

    #[tokio::test]
    async fn test_issue_sets_message_and_expiry() {
        let (store, clock) = store_with_clock();
        let challenge = store.issue(WALLET).await;

        assert_eq!(challenge.wallet_address, WALLET);
        assert_eq!(challenge.nonce.len(), NONCE_BYTES * 2);
        assert_eq!(
            challenge.message,
            format!("Sign this message to authenticate: {}", challenge.nonce)
        );
        assert_eq!(challenge.expires_at, clock.now() + Duration::minutes(5));
    }

    #[tokio::test]
    async fn test_nonces_are_unique() {
        let (store, _) = store_with_clock();
        let a = store.issue(WALLET).await;
        let b = store.issue(WALLET).await;
        assert_ne!(a.nonce, b.nonce);
    }

    #[tokio::test]
    async fn test_reissue_overwrites_previous_challenge() {
        let (store, _) = store_with_clock();
        let first = store.issue(WALLET).await;
        let second = store.issue(WALLET).await;

        assert_eq!(store.len(), 1);
        let consumed = store.consume(WALLET).await.unwrap();
        assert_eq!(consumed, second);
        assert_ne!(consumed.nonce, first.nonce);
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let (store, _) = store_with_clock();
        store.issue(WALLET).await;

        assert!(store.consume(WALLET).await.is_some());
        assert!(store.consume(WALLET).await.is_none());
    }

    #[tokio::test]
    async fn test_consume_removes_expired_challenge() {
        let (store, clock) = store_with_clock();
        store.issue(WALLET).await;
        clock.advance(Duration::minutes(5) + Duration::seconds(1));

        let challenge = store.consume(WALLET).await.unwrap();
        assert!(challenge.is_expired(clock.now()));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_challenges() {
        let (store, clock) = store_with_clock();
        store.issue("old-wallet").await;
        clock.advance(Duration::minutes(4));
        store.issue(WALLET).await;
        clock.advance(Duration::minutes(2));

        assert_eq!(store.purge_expired(clock.now()).await, 1);
        assert_eq!(store.len(), 1);
        assert!(store.consume(WALLET).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_on_each_interval() {
        let (store, clock) = store_with_clock();
        let store = Arc::new(store);
        store.issue("old-wallet").await;
        clock.advance(Duration::minutes(6));
        store.issue(WALLET).await;

        let sweeper = spawn_nonce_sweeper(
            store.clone(),
            Arc::new(clock.clone()),
            StdDuration::from_secs(60),
        );

        // Nothing is swept before the first full interval
        tokio::time::sleep(StdDuration::from_secs(30)).await;
        assert_eq!(store.len(), 2);

        tokio::time::sleep(StdDuration::from_secs(31)).await;
        assert_eq!(store.len(), 1);
        assert!(store.consume(WALLET).await.is_some());

        sweeper.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consume_has_one_winner() {
        let (store, _) = store_with_clock();
        let store = Arc::new(store);
        store.issue(WALLET).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.consume(WALLET).await }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
