//! Per-chat worker tasks.
//!
//! Each chat gets one task that owns its [`ChatSession`] and drains an
//! mpsc queue, so events for a chat run strictly in order while chats
//! proceed independently. Idle workers exit after [`IDLE_TIMEOUT`] and
//! are respawned on the next event. A respawned worker waits for its
//! predecessor to hand over the [`ChatSession`] before touching any event,
//! so two workers never serve the same chat at once.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinSet;

use lightdesk_core::types::UserId;

use crate::event::UserEvent;
use crate::session::{ChatSession, Mode};
use crate::state::BotState;

/// Events buffered per chat before new ones are dropped.
pub const CHAT_QUEUE: usize = 64;

/// How long an idle chat keeps its worker.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Grace period for workers to finish on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Queue of a live worker plus the slot its session comes back through.
struct ChatWorker {
    tx: mpsc::Sender<UserEvent>,
    handoff: oneshot::Receiver<ChatSession>,
}

pub struct Dispatcher {
    state: BotState,
    idle_timeout: Duration,
    workers: HashMap<UserId, ChatWorker>,
    tasks: JoinSet<()>,
}

impl Dispatcher {
    pub fn new(state: BotState) -> Self {
        Self::with_idle_timeout(state, IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(state: BotState, idle_timeout: Duration) -> Self {
        Self {
            state,
            idle_timeout,
            workers: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Queue an event for its chat, starting a worker when needed.
    pub fn dispatch(&mut self, user_id: UserId, event: UserEvent) {
        while self.tasks.try_join_next().is_some() {}

        let event = match self.workers.get(&user_id) {
            Some(worker) => match worker.tx.try_send(event) {
                Ok(()) => return,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(user_id, "Chat queue full, dropping event");
                    return;
                }
                Err(TrySendError::Closed(event)) => event,
            },
            None => event,
        };

        let previous = self.workers.remove(&user_id).map(|w| w.handoff);
        let tx = self.spawn_worker(user_id, previous);
        if tx.try_send(event).is_err() {
            tracing::warn!(user_id, "Fresh chat worker rejected event");
        }
    }

    /// Number of chats with a live worker.
    pub fn active_chats(&self) -> usize {
        self.workers.values().filter(|w| !w.tx.is_closed()).count()
    }

    /// Stop accepting events and let workers drain their queues.
    pub async fn shutdown(mut self) {
        self.workers.clear();
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while self.tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!("Chat workers did not finish in time, aborting");
            self.tasks.abort_all();
        }
    }

    fn spawn_worker(
        &mut self,
        user_id: UserId,
        previous: Option<oneshot::Receiver<ChatSession>>,
    ) -> mpsc::Sender<UserEvent> {
        let (tx, rx) = mpsc::channel(CHAT_QUEUE);
        let (handoff_tx, handoff) = oneshot::channel();
        let fresh = ChatSession::new(user_id, self.state.clone());
        self.tasks
            .spawn(run_worker(fresh, previous, rx, handoff_tx, self.idle_timeout));
        self.workers.insert(
            user_id,
            ChatWorker {
                tx: tx.clone(),
                handoff,
            },
        );
        tracing::debug!(user_id, "Chat worker started");
        tx
    }
}

async fn run_worker(
    fresh: ChatSession,
    previous: Option<oneshot::Receiver<ChatSession>>,
    mut rx: mpsc::Receiver<UserEvent>,
    handoff: oneshot::Sender<ChatSession>,
    idle_timeout: Duration,
) {
    // The predecessor may still be draining its queue.
    let mut session = match previous {
        Some(previous) => previous.await.unwrap_or(fresh),
        None => fresh,
    };
    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(event)) => session.handle(event).await,
            Ok(None) => break,
            // Chats in the middle of a flow keep their worker.
            Err(_) if !matches!(session.mode(), Mode::Idle) => {}
            Err(_) => {
                // Events racing with the close are still handled.
                rx.close();
                while let Some(event) = rx.recv().await {
                    session.handle(event).await;
                }
                break;
            }
        }
    }
    tracing::debug!(user_id = session.user_id(), "Chat worker stopped");
    let _ = handoff.send(session);
}
