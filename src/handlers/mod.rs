//! Policy stages of the handler chain.
//!
//! Each stage implements one concern. [`Transport`] is the terminal stage that
//! talks to the network; every other stage adjusts the request, answers it
//! itself or inspects what comes back.

mod cache;
mod delay;
mod history;
mod referer;
mod retry;
mod timeout;
mod transport;
mod user_agent;

pub use cache::Cache;
pub use delay::Delay;
pub use history::{History, HistoryEntry};
pub use referer::Referer;
pub use retry::{default_exclusions, Exclusion, RetryCustom, RetryOnError, RetryOnTimeout, RetryPredicate};
pub use timeout::{FixUrl, Timeout};
pub use transport::Transport;
pub use user_agent::{random_user_agent, UserAgent, COMMON_USER_AGENTS, DEFAULT_USER_AGENT};
