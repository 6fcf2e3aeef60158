use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, info, warn};

use crate::client::Lease;
use crate::command::{Command, IntoArg, Request};
use crate::frame::Frame;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    /// Keys are watched; a change to any of them makes the commit a no-op.
    Watching,
    /// `MULTI` was sent; commands are queued by the store instead of executed.
    Queuing,
    Committed,
    Aborted,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionState::Idle => "idle",
            TransactionState::Watching => "watching",
            TransactionState::Queuing => "queuing",
            TransactionState::Committed => "committed",
            TransactionState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Handle to one queued command. Redeem it against the commit results to get its typed reply.
pub struct Queued<T> {
    index: usize,
    decoder: fn(Frame) -> Result<T>,
    _output: PhantomData<fn() -> T>,
}

impl<T> Queued<T> {
    /// Position of the command in the queue.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Replies of a committed transaction, one per queued command in queue order.
#[derive(Debug)]
pub struct CommitResults {
    replies: Vec<Option<Frame>>,
}

impl CommitResults {
    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    /// Decodes the reply of `queued` with the rule its request was built with.
    ///
    /// A command that failed inside the transaction yields its own [`Error::Store`]; the other
    /// replies are unaffected.
    pub fn take<T>(&mut self, queued: Queued<T>) -> Result<T> {
        let frame = self
            .replies
            .get_mut(queued.index)
            .and_then(Option::take)
            .ok_or_else(|| {
                Error::Transaction(format!("no reply left at position {}", queued.index))
            })?;
        (queued.decoder)(frame)
    }

    /// Remaining raw replies, with `None` for those already taken.
    pub fn into_frames(self) -> Vec<Option<Frame>> {
        self.replies
    }
}

#[derive(Debug)]
pub enum TransactionOutcome {
    Committed(CommitResults),
    /// A watched key changed before the commit; nothing was applied.
    Interrupted,
}

impl TransactionOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, TransactionOutcome::Committed(_))
    }
}

/// A watch/multi/exec session owned by its caller and pinned to one channel.
///
/// Dropping a session that is still watching or queuing closes its channel, since the store
/// keeps that state per connection.
pub struct Transaction {
    lease: Lease,
    state: TransactionState,
    queued: usize,
    max_queued: usize,
}

impl Transaction {
    pub(crate) fn new(lease: Lease, max_queued: usize) -> Transaction {
        Transaction {
            lease,
            state: TransactionState::Idle,
            queued: 0,
            max_queued,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Number of commands queued so far.
    pub fn queued(&self) -> usize {
        self.queued
    }

    fn expect_state(&self, allowed: &[TransactionState], operation: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::Transaction(format!(
                "cannot {} while {}",
                operation, self.state
            )))
        }
    }

    fn transition(&mut self, state: TransactionState) {
        debug!(from = %self.state, to = %state, "transaction state change");
        self.state = state;
    }

    /// Gives up on the session and closes the channel on release.
    fn fail(&mut self) {
        self.transition(TransactionState::Aborted);
        self.lease.invalidate();
    }

    /// Drops the queued commands after a failed queue call.
    async fn abort(&mut self) {
        self.transition(TransactionState::Aborted);
        if let Err(err) = self.lease.exec(&Command::new("DISCARD")).await {
            warn!(error = %err, "discard after failed queue call failed");
            self.lease.invalidate();
        }
    }

    async fn expect_ok(&mut self, command: Command) -> Result<()> {
        let result = self.lease.send(Request::<()>::new(command)).await;
        if result.is_err() {
            self.fail();
        }
        result
    }

    pub async fn watch<I>(&mut self, keys: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        self.expect_state(&[TransactionState::Idle, TransactionState::Watching], "watch")?;
        self.expect_ok(Command::new("WATCH").args_from(keys)).await?;
        self.transition(TransactionState::Watching);
        Ok(())
    }

    pub async fn unwatch(&mut self) -> Result<()> {
        self.expect_state(&[TransactionState::Watching], "unwatch")?;
        self.expect_ok(Command::new("UNWATCH")).await?;
        self.transition(TransactionState::Idle);
        Ok(())
    }

    pub async fn multi(&mut self) -> Result<()> {
        self.expect_state(&[TransactionState::Idle, TransactionState::Watching], "multi")?;
        self.expect_ok(Command::new("MULTI")).await?;
        self.transition(TransactionState::Queuing);
        Ok(())
    }

    /// Queues one request. Any failure aborts the whole session. Exceeding
    /// `max_waiting_handlers` fails with a transaction error.
    pub async fn queue<T>(&mut self, request: Request<T>) -> Result<Queued<T>> {
        self.expect_state(&[TransactionState::Queuing], "queue")?;

        if self.queued >= self.max_queued {
            self.abort().await;
            return Err(Error::Transaction(format!(
                "transaction queue is full ({} commands)",
                self.max_queued
            )));
        }

        let (command, decoder) = request.into_parts();
        match self.lease.exec(&command).await {
            Ok(Frame::Simple(s)) if s == "QUEUED" => {
                let index = self.queued;
                self.queued += 1;
                Ok(Queued {
                    index,
                    decoder,
                    _output: PhantomData,
                })
            }
            Ok(frame) => {
                self.abort().await;
                Err(Error::unexpected("status QUEUED", &frame))
            }
            Err(err) => {
                if err.breaks_connection() {
                    self.fail();
                } else {
                    self.abort().await;
                }
                Err(err)
            }
        }
    }

    /// Commits the queued commands.
    ///
    /// Resolves to [`TransactionOutcome::Interrupted`] when a watched key changed; that is a
    /// normal outcome, not an error.
    pub async fn exec(mut self) -> Result<TransactionOutcome> {
        self.expect_state(&[TransactionState::Queuing], "exec")?;

        match self.lease.exec(&Command::new("EXEC")).await {
            Ok(Frame::Null) => {
                self.transition(TransactionState::Aborted);
                info!("transaction interrupted by a watched key change");
                Ok(TransactionOutcome::Interrupted)
            }
            Ok(Frame::Array(replies)) if replies.len() == self.queued => {
                self.transition(TransactionState::Committed);
                Ok(TransactionOutcome::Committed(CommitResults {
                    replies: replies.into_iter().map(Some).collect(),
                }))
            }
            Ok(frame) => {
                self.fail();
                Err(Error::unexpected(
                    format!("array of {} replies", self.queued),
                    &frame,
                ))
            }
            Err(err) => {
                // EXECABORT and friends leave the channel clean; transport errors already
                // invalidated it.
                self.transition(TransactionState::Aborted);
                Err(err)
            }
        }
    }

    /// Drops every queued command without running any.
    pub async fn discard(mut self) -> Result<()> {
        self.expect_state(&[TransactionState::Queuing], "discard")?;
        self.expect_ok(Command::new("DISCARD")).await?;
        self.transition(TransactionState::Idle);
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if matches!(
            self.state,
            TransactionState::Watching | TransactionState::Queuing
        ) {
            debug!(state = %self.state, "transaction dropped mid-session; closing connection");
            self.lease.invalidate();
        }
    }
}
