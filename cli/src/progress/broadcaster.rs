//! # Progress Broadcaster
//!
//! File: cli/src/progress/broadcaster.rs
//!
//! ## Overview
//!
//! A single task (the actor) owns the listener set. Every operation is a
//! message on one unbounded command channel, so registrations,
//! unregistrations and broadcasts are applied strictly in the order they
//! were sent and the listener set needs no lock.
//!
//! ## Delivery rules
//!
//! - An event goes to every listener registered for its generation id.
//! - Delivery uses `try_send` on the listener's bounded channel. A listener
//!   whose channel is full is dropped, and one whose receiver is gone is
//!   removed; neither ever blocks the actor.
//! - After a `complete` event is delivered, all listeners of that
//!   generation are released, which ends their streams.
//!
//! The actor stops once every [`BroadcasterHandle`] has been dropped.
//!
use super::event::ProgressEvent;
use crate::core::id::GenerationId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub type ListenerId = u64;

enum Command {
    Register {
        id: ListenerId,
        generation_id: GenerationId,
        sender: mpsc::Sender<ProgressEvent>,
    },
    Unregister {
        id: ListenerId,
    },
    Broadcast(ProgressEvent),
    ListenerCount {
        generation_id: GenerationId,
        reply: oneshot::Sender<usize>,
    },
}

struct Listener {
    id: ListenerId,
    sender: mpsc::Sender<ProgressEvent>,
}

/// The actor state. Only ever touched by its own task.
pub struct Broadcaster {
    commands: mpsc::UnboundedReceiver<Command>,
    listeners: HashMap<GenerationId, Vec<Listener>>,
}

impl Broadcaster {
    /// Starts the actor on the current Tokio runtime.
    ///
    /// `buffer` is the capacity of each listener's channel.
    pub fn spawn(buffer: usize) -> BroadcasterHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = Self {
            commands: rx,
            listeners: HashMap::new(),
        };
        tokio::spawn(actor.run());
        BroadcasterHandle {
            commands: tx,
            next_id: Arc::new(AtomicU64::new(1)),
            buffer: buffer.max(1),
        }
    }

    async fn run(mut self) {
        debug!("Progress broadcaster started");
        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Register {
                    id,
                    generation_id,
                    sender,
                } => {
                    self.listeners
                        .entry(generation_id)
                        .or_default()
                        .push(Listener { id, sender });
                    debug!(generation_id = %generation_id, listener = id, "Listener registered");
                }
                Command::Unregister { id } => self.unregister(id),
                Command::Broadcast(event) => self.broadcast(event),
                Command::ListenerCount {
                    generation_id,
                    reply,
                } => {
                    let count = self.listeners.get(&generation_id).map_or(0, Vec::len);
                    let _ = reply.send(count);
                }
            }
        }
        debug!("Progress broadcaster stopped");
    }

    fn unregister(&mut self, id: ListenerId) {
        self.listeners.retain(|_, listeners| {
            listeners.retain(|l| l.id != id);
            !listeners.is_empty()
        });
    }

    fn broadcast(&mut self, event: ProgressEvent) {
        let generation_id = event.generation_id;
        let Some(listeners) = self.listeners.get_mut(&generation_id) else {
            return;
        };

        listeners.retain(|listener| match listener.sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    generation_id = %generation_id,
                    listener = listener.id,
                    "Listener channel full, dropping listener"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(listener = listener.id, "Listener gone, removing");
                false
            }
        });

        if listeners.is_empty() || event.is_final() {
            self.listeners.remove(&generation_id);
        }
    }
}

/// Cheap, cloneable access to a running [`Broadcaster`].
#[derive(Clone)]
pub struct BroadcasterHandle {
    commands: mpsc::UnboundedSender<Command>,
    next_id: Arc<AtomicU64>,
    buffer: usize,
}

/// The receiving end of one registration.
#[derive(Debug)]
pub struct Subscription {
    pub id: ListenerId,
    pub generation_id: GenerationId,
    receiver: mpsc::Receiver<ProgressEvent>,
}

impl Subscription {
    /// Next event, or `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.receiver.recv().await
    }
}

impl BroadcasterHandle {
    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Progress broadcaster is not running; command discarded");
        }
    }

    pub fn register(&self, generation_id: GenerationId) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.buffer);
        self.send(Command::Register {
            id,
            generation_id,
            sender,
        });
        Subscription {
            id,
            generation_id,
            receiver,
        }
    }

    pub fn unregister(&self, id: ListenerId) {
        self.send(Command::Unregister { id });
    }

    /// Queues `event` for delivery. Never blocks.
    pub fn broadcast(&self, event: ProgressEvent) {
        self.send(Command::Broadcast(event));
    }

    /// Listeners currently registered for `generation_id`.
    pub async fn listener_count(&self, generation_id: GenerationId) -> usize {
        let (reply, response) = oneshot::channel();
        self.send(Command::ListenerCount {
            generation_id,
            reply,
        });
        response.await.unwrap_or(0)
    }
}
