//! Handler chain.
//!
//! A [`Handler`] deals with one concern of web access. Handlers are assembled
//! into a [`Pipeline`]: a request enters at the head, each stage may answer it
//! directly or pass it on through [`Next`], and the last stage performs the
//! network call. Responses travel back through the same stages in reverse.

mod toggle;

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::error_handling::FetchError;
use crate::fetch::{Request, Response};

pub use toggle::Toggle;

/// One stage of a handler chain.
///
/// An implementation either resolves the request itself (a cache hit), or
/// adjusts it, forwards it with `next.run(request)` and inspects the result.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Short name used in logs and chain listings.
    fn name(&self) -> &str;

    /// Handles `request`, using `next` to reach the rest of the chain.
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response, FetchError>;
}

/// The part of the chain that follows the current stage.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Arc<dyn Handler>],
}

impl<'a> Next<'a> {
    /// A cursor over `stages`, starting at the first one.
    pub fn new(stages: &'a [Arc<dyn Handler>]) -> Self {
        Self { rest: stages }
    }

    /// Passes `request` to the next stage.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::EndOfChain` if no stage is left, otherwise
    /// whatever the remaining stages return.
    pub async fn run(self, request: Request) -> Result<Response, FetchError> {
        match self.rest.split_first() {
            Some((head, tail)) => head.handle(request, Next { rest: tail }).await,
            None => Err(FetchError::EndOfChain),
        }
    }

    /// Number of stages left, including the one `run` would call.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}

/// An item accepted by [`Pipeline::chain`]: a handler, an absent handler or a
/// nested group of items.
pub enum ChainItem {
    /// A single stage
    Handler(Arc<dyn Handler>),
    /// Items flattened in place
    Group(Vec<ChainItem>),
    /// Skipped
    Empty,
}

impl From<Arc<dyn Handler>> for ChainItem {
    fn from(handler: Arc<dyn Handler>) -> Self {
        ChainItem::Handler(handler)
    }
}

impl From<Option<Arc<dyn Handler>>> for ChainItem {
    fn from(handler: Option<Arc<dyn Handler>>) -> Self {
        handler.map_or(ChainItem::Empty, ChainItem::Handler)
    }
}

impl<T: Into<ChainItem>> From<Vec<T>> for ChainItem {
    fn from(items: Vec<T>) -> Self {
        ChainItem::Group(items.into_iter().map(Into::into).collect())
    }
}

fn flatten_into(item: ChainItem, out: &mut Vec<Arc<dyn Handler>>) {
    match item {
        ChainItem::Handler(handler) => out.push(handler),
        ChainItem::Group(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        ChainItem::Empty => {}
    }
}

/// An ordered chain of handlers.
///
/// The chain is immutable once built; reconfiguring a client builds a new
/// pipeline and swaps it in whole.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Handler>>,
}

impl Pipeline {
    /// Links `items` into a chain, in order.
    ///
    /// Absent items are dropped and nested groups are flattened, so
    /// `[A, None, [B, C]]` yields `A -> B -> C`.
    pub fn chain<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ChainItem>,
    {
        let mut stages = Vec::new();
        for item in items {
            flatten_into(item.into(), &mut stages);
        }
        let pipeline = Self { stages };
        debug!("Handler chain: {}", pipeline.names().join(" -> "));
        pipeline
    }

    /// Runs `request` through the whole chain.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::EndOfChain` for an empty chain, otherwise the
    /// failure surfaced by the stages.
    pub async fn handle(&self, request: Request) -> Result<Response, FetchError> {
        Next::new(&self.stages).run(request).await
    }

    /// First stage of the chain.
    pub fn head(&self) -> Option<&Arc<dyn Handler>> {
        self.stages.first()
    }

    /// All stages, head first.
    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.stages
    }

    /// Stage names, head first.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|h| h.name()).collect()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the chain has no stage at all.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
