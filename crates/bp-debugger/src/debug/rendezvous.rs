//! Single-slot command handoff and write-once results.
//!
//! The slot holds at most one pending command. A second offer while the slot
//! is occupied is rejected, never queued and never allowed to overwrite the
//! first. The blocking take lives in the engine, which waits on the slot under
//! its own state lock.

#![allow(missing_docs)]

use std::fmt;
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::time::Duration;

use crate::error::DebuggerError;

use super::{Command, CommandOutput};

pub type CommandResult = Result<CommandOutput, DebuggerError>;

/// Write side of a command result. Consumed on fulfilment.
pub(crate) struct CommandReply {
    tx: SyncSender<CommandResult>,
}

impl CommandReply {
    /// Deliver the result. A controller that stopped waiting is not an error.
    pub(crate) fn fulfill(self, result: CommandResult) {
        let _ = self.tx.send(result);
    }
}

impl fmt::Debug for CommandReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CommandReply")
    }
}

/// Read side of a command result, handed to the controller.
#[derive(Debug)]
pub struct CommandFuture {
    rx: Receiver<CommandResult>,
}

impl CommandFuture {
    pub(crate) fn pending() -> (CommandReply, CommandFuture) {
        let (tx, rx) = sync_channel(1);
        (CommandReply { tx }, CommandFuture { rx })
    }

    /// A future that is already fulfilled.
    pub(crate) fn ready(result: CommandResult) -> Self {
        let (reply, future) = Self::pending();
        reply.fulfill(result);
        future
    }

    /// Block until the result arrives.
    pub fn wait(self) -> CommandResult {
        self.rx.recv().unwrap_or(Err(DebuggerError::NotRunning))
    }

    /// Block for at most `timeout`; `None` means the result is not ready yet.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<CommandResult> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(DebuggerError::NotRunning)),
        }
    }

    /// Non-blocking poll.
    pub fn try_result(&self) -> Option<CommandResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(DebuggerError::NotRunning)),
        }
    }
}

#[derive(Debug)]
pub(crate) struct PendingCommand {
    pub command: Command,
    pub reply: CommandReply,
}

/// Capacity-one holder for the command in flight.
#[derive(Debug, Default)]
pub(crate) struct CommandSlot {
    pending: Option<PendingCommand>,
}

impl CommandSlot {
    /// Place a command in the slot, handing it back if the slot is occupied.
    pub(crate) fn offer(&mut self, pending: PendingCommand) -> Result<(), PendingCommand> {
        if self.pending.is_some() {
            return Err(pending);
        }
        self.pending = Some(pending);
        Ok(())
    }

    pub(crate) fn take(&mut self) -> Option<PendingCommand> {
        self.pending.take()
    }

    pub(crate) fn is_occupied(&self) -> bool {
        self.pending.is_some()
    }

    /// Fail the pending command, if any, so its future never dangles.
    pub(crate) fn cancel(&mut self, err: DebuggerError) {
        if let Some(pending) = self.pending.take() {
            pending.reply.fulfill(Err(err));
        }
    }
}
