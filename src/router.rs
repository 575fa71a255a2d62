//! Message routing: filters, learn dispatch, and latency-floored replies.
//!
//! Routing runs synchronously on the event-delivery path and must stay
//! quick — it gates every subsequent inbound event. Reply generation is
//! therefore off-loaded into independent tasks, one per directly-addressed
//! message, with no queue or serialization between them.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::address;
use crate::client::Handle;
use crate::config::IgnoreSet;
use crate::model::Model;

/// Minimum observable reply latency. Replies never appear faster than
/// this, smoothing out cases where the model is fast enough to look
/// automated; a slower reply is never delayed further.
pub const REPLY_FLOOR: Duration = Duration::from_millis(250);

/// Routes inbound messages to the model and, when directly addressed,
/// schedules replies. Wired once at startup; holds no session state.
pub struct Router<M> {
    nick: String,
    channels: Vec<String>,
    ignore: IgnoreSet,
    model: Arc<M>,
}

impl<M: Model> Router<M> {
    pub fn new(
        nick: impl Into<String>,
        channels: Vec<String>,
        ignore: IgnoreSet,
        model: Arc<M>,
    ) -> Self {
        Self {
            nick: nick.into(),
            channels,
            ignore,
            model,
        }
    }

    /// Handle one inbound message. The learn call happens-before any
    /// reply task this spawns.
    pub async fn route(&self, speaker: &str, target: &str, body: &str, handle: &Handle) {
        if self.ignore.matches(speaker) {
            debug!(%speaker, "ignoring message from ignored identity");
            return;
        }
        if !self.channels.iter().any(|c| c == target) {
            debug!(%target, "ignoring message outside configured channels");
            return;
        }

        let directive = address::parse(body);
        debug!(%speaker, %target, text = %directive.body, "learn");
        self.model.learn(directive.body).await;

        if directive.addressee == Some(self.nick.as_str()) {
            self.spawn_reply(speaker, target, directive.body, handle);
        }
    }

    /// Launch an untracked reply task. Total latency is
    /// `max(reply_computation_time, REPLY_FLOOR)`.
    fn spawn_reply(&self, speaker: &str, target: &str, query: &str, handle: &Handle) {
        let model = Arc::clone(&self.model);
        let handle = handle.clone();
        let speaker = speaker.to_string();
        let target = target.to_string();
        let query = query.to_string();

        tokio::spawn(async move {
            let (reply, ()) = tokio::join!(model.reply(&query), tokio::time::sleep(REPLY_FLOOR));
            let reply = model.repair(reply);
            info!(%target, %speaker, "reply");
            handle.privmsg(&target, &format!("{speaker}: {reply}")).await;
        });
    }
}
