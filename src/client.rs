use futures::future::BoxFuture;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::command::{Command, Request};
use crate::config::Config;
use crate::frame::Frame;
use crate::pool::{Pool, PoolStatus, PooledConnection};
use crate::transaction::Transaction;
use crate::{Error, Result};

/// Shared handle to a store. Cheap to clone; every clone uses the same pool.
///
/// Each operation leases one channel for exactly one exchange and gives it back before the
/// returned future resolves, whatever the outcome.
#[derive(Clone)]
pub struct Client {
    pool: Pool,
}

impl Client {
    /// Builds the client and starts the idle sweep. Channels are opened on demand.
    pub async fn connect(config: Config) -> Result<Client> {
        let pool = Pool::new(config)?;
        pool.spawn_cleaner();
        Ok(Client { pool })
    }

    /// Shorthand for [`Client::connect`] with default settings.
    pub async fn open(url: &str) -> Result<Client> {
        Client::connect(Config::new(url)).await
    }

    pub fn config(&self) -> &Config {
        self.pool.config()
    }

    /// Leases a channel for several exchanges. It goes back to the pool when dropped.
    pub async fn lease(&self) -> Result<Lease> {
        let conn = self.pool.acquire().await?;
        Ok(Lease { conn })
    }

    /// Runs `f` against one leased channel and releases it on every exit path, including
    /// when the returned future is dropped before completion.
    pub async fn with_lease<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut Lease) -> BoxFuture<'a, Result<T>>,
    {
        let mut lease = self.lease().await?;
        f(&mut lease).await
    }

    /// Sends one typed request and decodes its reply.
    pub async fn send<T>(&self, request: Request<T>) -> Result<T> {
        let mut lease = self.lease().await?;
        lease.send(request).await
    }

    /// Sends a command and hands back the raw reply. Error replies still fail with
    /// [`Error::Store`].
    pub async fn execute_raw(&self, command: Command) -> Result<Frame> {
        let mut lease = self.lease().await?;
        lease.exec(&command).await
    }

    /// Opens a transaction session pinned to one channel for its whole lifetime.
    pub async fn transaction(&self) -> Result<Transaction> {
        let lease = self.lease().await?;
        Ok(Transaction::new(lease, self.config().max_waiting_handlers))
    }

    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    pub fn close(&self) {
        self.pool.close();
    }
}

/// Exclusive use of one pooled channel.
pub struct Lease {
    conn: PooledConnection,
}

impl Lease {
    pub fn connection_id(&self) -> Option<Uuid> {
        self.conn.id()
    }

    /// Sends `command` and returns its reply, turning error replies into [`Error::Store`].
    #[instrument(name = "exec", skip_all, fields(connection_id = tracing::field::Empty, command = command.name()))]
    pub async fn exec(&mut self, command: &Command) -> Result<Frame> {
        if let Some(id) = self.conn.id() {
            tracing::Span::current().record("connection_id", id.to_string());
        }

        debug!("sending command");
        match self.conn.round_trip(command).await {
            Ok(Frame::Error(message)) => {
                debug!(error = %message, "store replied with an error");
                Err(Error::Store(message))
            }
            Ok(frame) => {
                debug!(reply = frame.kind(), "received reply");
                Ok(frame)
            }
            Err(err) => {
                debug!(error = %err, "exchange failed");
                Err(err)
            }
        }
    }

    pub async fn send<T>(&mut self, request: Request<T>) -> Result<T> {
        let (command, decoder) = request.into_parts();
        let frame = self.exec(&command).await?;
        decoder(frame)
    }

    /// Closes the channel on release instead of returning it to the pool.
    pub fn invalidate(&mut self) {
        self.conn.invalidate();
    }
}
