// src/live/mod.rs
//
// Browser-facing side: a minimal Chrome DevTools Protocol client and the
// game interface built on top of it. The rest of the crate only sees the
// GameInterface trait, so tests drive the control loop with scripted fakes.

pub mod cdp;
pub mod chrome;

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use crate::types::GameSnapshot;

/// Boxed future alias used for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The external game seen through its two interfaces: an observation source
/// and a fire-and-forget input injector.
pub trait GameInterface: Send {
    /// One frame's snapshot, or `None` while the host state is not ready.
    /// Callers tolerate `None` by skipping the tick.
    fn snapshot(&mut self) -> BoxFuture<'_, Result<Option<GameSnapshot>>>;

    /// Press the jump key.
    fn press_jump(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Press the restart key after a crash.
    fn press_restart(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Best-effort teardown of the underlying connection.
    fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}
