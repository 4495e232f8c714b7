use crate::error::Error;
use crate::mi::record::{ResultClass, ResultRecord, Token};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

pub type CommandResult = Result<ResultRecord, Error>;

type PendingTable = HashMap<Token, Sender<CommandResult>>;

/// Receiving half of an issued command. Resolved exactly once, when a result
/// record with the same token arrives.
pub struct PendingResult {
    token: Token,
    rx: Receiver<CommandResult>,
    table: Weak<Mutex<PendingTable>>,
}

impl PendingResult {
    pub fn token(&self) -> Token {
        self.token
    }

    /// Block until the result arrives.
    pub fn wait(self) -> CommandResult {
        self.rx.recv().unwrap_or(Err(Error::SessionClosed))
    }

    /// Block until the result arrives or timeout expires.
    /// On timeout the token is retired, a result that comes later is dropped.
    pub fn wait_timeout(self, timeout: Duration) -> CommandResult {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                if let Some(table) = self.table.upgrade() {
                    table.lock().unwrap().remove(&self.token);
                }
                // result may arrive between the timeout and the removal
                match self.rx.try_recv() {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(self.token)),
                }
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::SessionClosed),
        }
    }

    /// Return result if it already arrived.
    pub fn try_take(&self) -> Option<CommandResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(Error::SessionClosed)),
        }
    }
}

/// Table of issued commands waiting for their result records.
///
/// Tokens start at 1 and are never reused. Results may complete in any order.
pub struct Correlator {
    next_token: u64,
    pending: Arc<Mutex<PendingTable>>,
    closed: bool,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            next_token: 1,
            pending: Arc::new(Mutex::new(HashMap::new())),
            closed: false,
        }
    }

    /// Allocate a fresh token and register a continuation for it.
    pub fn issue(&mut self) -> Result<PendingResult, Error> {
        if self.closed {
            return Err(Error::SessionClosed);
        }

        let token = Token(self.next_token);
        self.next_token += 1;

        let (tx, rx) = mpsc::channel();
        self.pending.lock().unwrap().insert(token, tx);
        Ok(PendingResult {
            token,
            rx,
            table: Arc::downgrade(&self.pending),
        })
    }

    /// Resolve the continuation of `token`. An `^error` record resolves into
    /// [`Error::Backend`] with the record message.
    ///
    /// Return `false` if there is no pending command for this token,
    /// such a record is dropped.
    pub fn complete(&mut self, token: Token, record: ResultRecord) -> bool {
        let Some(tx) = self.pending.lock().unwrap().remove(&token) else {
            crate::mib_debug!(target: "session", "no pending command for token {token}, drop result");
            return false;
        };

        let result = if record.class == ResultClass::Error {
            Err(Error::Backend(record.message().unwrap_or_default().to_string()))
        } else {
            Ok(record)
        };

        _ = tx.send(result);
        true
    }

    /// Forget a pending command, its receiver observes [`Error::SessionClosed`].
    pub fn cancel(&mut self, token: Token) -> bool {
        self.pending.lock().unwrap().remove(&token).is_some()
    }

    /// Reject all pending commands and refuse new ones.
    pub fn close(&mut self) {
        self.closed = true;
        for (_, tx) in self.pending.lock().unwrap().drain() {
            _ = tx.send(Err(Error::SessionClosed));
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}
