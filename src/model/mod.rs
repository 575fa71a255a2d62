//! The learning/reply engine seam.

mod chain;

pub use chain::Chain;

use async_trait::async_trait;

/// A conversational model the router can feed and query.
///
/// Implementations must tolerate concurrent `learn` and `reply` calls:
/// `learn` runs on the event-delivery path while any number of reply
/// tasks are in flight. Both are total — a model never fails, it just
/// answers badly.
#[async_trait]
pub trait Model: Send + Sync + 'static {
    async fn learn(&self, text: &str);

    async fn reply(&self, text: &str) -> String;

    /// Display repair applied to a reply before it is sent: the model's
    /// own punctuation/quoting fixups. Defaults to a no-op.
    fn repair(&self, text: String) -> String {
        text
    }
}
