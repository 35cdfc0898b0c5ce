//! `TriviaBot`: the intake loop that ties a chat transport to the
//! dispatcher.
//!
//! The transport pushes every inbound line into [`TriviaBot::submit`] (or a
//! cloned [`intake`](TriviaBot::intake) sender) and reads room events from
//! the [`Outbound`] receiver returned by [`TriviaBot::start`]. Everything
//! in between runs on Tokio tasks owned by the bot.

use std::sync::Arc;

use roundtable_protocol::{InboundMessage, Outbound};
use roundtable_room::{Dispatcher, GameConfig, QuestionProvider, Routed};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::RoundtableError;

/// Intake channel size. Routing never waits on a room, so this only
/// fills up if the dispatcher itself falls behind.
const INTAKE_CHANNEL_SIZE: usize = 1024;

/// A running trivia bot.
pub struct TriviaBot<P: QuestionProvider> {
    dispatcher: Arc<Dispatcher<P>>,
    intake: mpsc::Sender<InboundMessage>,
    task: JoinHandle<()>,
}

impl<P: QuestionProvider> TriviaBot<P> {
    /// Validates `config`, spawns the intake loop, and returns the bot
    /// together with the stream of events to deliver to rooms.
    pub fn start(
        config: GameConfig,
        provider: P,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Outbound>), RoundtableError> {
        let (dispatcher, outbound) = Dispatcher::new(config, provider)?;
        let dispatcher = Arc::new(dispatcher);
        let (tx, rx) = mpsc::channel(INTAKE_CHANNEL_SIZE);

        let task = tokio::spawn(run_intake(Arc::clone(&dispatcher), rx));
        info!("trivia bot started");

        let bot = Self {
            dispatcher,
            intake: tx,
            task,
        };
        Ok((bot, outbound))
    }

    /// Hands one inbound message to the intake loop.
    pub async fn submit(&self, msg: InboundMessage) -> Result<(), RoundtableError> {
        self.intake
            .send(msg)
            .await
            .map_err(|_| RoundtableError::IntakeClosed)
    }

    /// A sender the transport can keep and clone.
    pub fn intake(&self) -> mpsc::Sender<InboundMessage> {
        self.intake.clone()
    }

    /// The dispatcher, for queries such as
    /// [`session_info`](Dispatcher::session_info).
    pub fn dispatcher(&self) -> &Dispatcher<P> {
        &self.dispatcher
    }

    /// Stops the intake loop, then every room session.
    ///
    /// Messages still queued in the intake channel are dropped.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
        self.dispatcher.shutdown().await;
        info!("trivia bot stopped");
    }
}

/// Routes intake messages until every sender is gone.
async fn run_intake<P: QuestionProvider>(
    dispatcher: Arc<Dispatcher<P>>,
    mut rx: mpsc::Receiver<InboundMessage>,
) {
    while let Some(msg) = rx.recv().await {
        let room_id = msg.room_id.clone();
        match dispatcher.route(msg).await {
            Ok(Routed::Ignored) => trace!(%room_id, "message ignored"),
            Ok(routed) => trace!(%room_id, ?routed, "message routed"),
            // The dispatcher has already logged why.
            Err(e) => debug!(%room_id, error = %e, "message dropped"),
        }
    }
    info!("intake closed");
}
