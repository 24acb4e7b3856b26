//! User-Agent management.
//!
//! This module holds a pool of real-world browser identity strings and the
//! stage that applies one of them to every request, optionally re-picking
//! after a configured time window.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use rand::seq::IndexedRandom;
use reqwest::header::USER_AGENT;

use crate::config::Identity;
use crate::error_handling::FetchError;
use crate::fetch::{Request, Response};
use crate::handler::{Handler, Next};

/// Fallback identity if the pool cannot be sampled.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Common desktop and mobile browser identities.
pub const COMMON_USER_AGENTS: &[&str] = &[
    DEFAULT_USER_AGENT,
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.7; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 18_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Mobile Safari/537.36",
];

/// Picks one identity from [`COMMON_USER_AGENTS`] at random.
pub fn random_user_agent() -> &'static str {
    COMMON_USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(DEFAULT_USER_AGENT)
}

struct Current {
    agent: String,
    chosen_at: Instant,
}

/// Sets the `User-Agent` header on every forwarded request.
pub struct UserAgent {
    current: Mutex<Current>,
    rotate_every: Option<Duration>,
}

impl UserAgent {
    /// Always sends `agent`.
    pub fn fixed(agent: impl Into<String>) -> Self {
        Self::with(agent.into(), None)
    }

    /// Sends one randomly picked identity, never changed.
    pub fn random() -> Self {
        Self::with(random_user_agent().to_string(), None)
    }

    /// Sends a random identity and re-picks once `every` has elapsed since the
    /// last pick. The check happens per request.
    pub fn rotating(every: Duration) -> Self {
        Self::with(random_user_agent().to_string(), Some(every))
    }

    /// Builds the stage for an identity policy; `None` for [`Identity::Off`].
    pub fn from_identity(identity: &Identity) -> Option<Self> {
        match identity {
            Identity::Off => None,
            Identity::Fixed(agent) => Some(Self::fixed(agent.clone())),
            Identity::Random => Some(Self::random()),
            Identity::Rotating(every) => Some(Self::rotating(*every)),
        }
    }

    fn with(agent: String, rotate_every: Option<Duration>) -> Self {
        Self {
            current: Mutex::new(Current {
                agent,
                chosen_at: Instant::now(),
            }),
            rotate_every,
        }
    }

    /// Identity that the next request will carry, rotating first if due.
    pub fn current(&self) -> String {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(every) = self.rotate_every {
            if current.chosen_at.elapsed() > every {
                current.agent = random_user_agent().to_string();
                current.chosen_at = Instant::now();
                debug!("Rotated User-Agent to {}", current.agent);
            }
        }
        current.agent.clone()
    }
}

#[async_trait]
impl Handler for UserAgent {
    fn name(&self) -> &str {
        "user-agent"
    }

    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response, FetchError> {
        let agent = self.current();
        request.set_header(USER_AGENT, &agent)?;
        next.run(request).await
    }
}
