use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use super::types::{Command, CommandSource};

/// Capacity of the command queue
pub const COMMAND_CAPACITY: usize = 256;

type Envelope = (Command, CommandSource);

/// Queue carrying edits and transport requests from an editor or script to
/// the engine loop
pub struct CommandBus {
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
}

impl CommandBus {
    pub fn new() -> Self {
        let (tx, rx) = bounded(COMMAND_CAPACITY);
        Self { tx, rx }
    }

    /// Get a sender that can be cloned and shared
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    /// Get a receiver for the engine loop
    pub fn receiver(&self) -> CommandReceiver {
        CommandReceiver {
            rx: self.rx.clone(),
        }
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable sender for dispatching commands
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Envelope>,
}

impl CommandSender {
    /// Queue a command without blocking. A full queue drops it and returns `false`.
    pub fn send(&self, cmd: Command, source: CommandSource) -> bool {
        match self.tx.try_send((cmd, source)) {
            Ok(()) => true,
            Err(TrySendError::Full((cmd, _))) => {
                warn!(command = %cmd.description(), "command buffer full, dropping command");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("command receiver gone");
                false
            }
        }
    }
}

#[derive(Clone)]
pub struct CommandReceiver {
    rx: Receiver<Envelope>,
}

impl CommandReceiver {
    pub fn try_recv(&self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    /// Everything queued right now, oldest first
    pub fn drain(&self) -> impl Iterator<Item = Envelope> + '_ {
        self.rx.try_iter()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
