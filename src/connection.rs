use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::command::Command;
use crate::config::ConnectionInfo;
use crate::frame::Frame;
use crate::{Error, Result};

/// One open channel to the store.
///
/// A connection carries a single request/reply exchange at a time. Replies are read back in the
/// order the requests were written.
pub struct Connection {
    pub id: Uuid,
    framed: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream, max_frame_size: usize) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            framed: Framed::new(stream, FrameCodec::new(max_frame_size)),
        }
    }

    /// Opens a channel and runs the AUTH and SELECT handshake the URL asks for.
    #[instrument(name = "connect", skip(info), fields(host = %info.host, port = info.port))]
    pub async fn connect(info: &ConnectionInfo, max_frame_size: usize) -> Result<Connection> {
        let stream = TcpStream::connect(info.addr()).await?;
        stream.set_nodelay(true)?;

        let mut conn = Connection::new(stream, max_frame_size);
        debug!(connection_id = %conn.id, "opened connection");

        if let Some(password) = &info.password {
            let auth = match &info.username {
                Some(username) => Command::new("AUTH").arg(username).arg(password),
                None => Command::new("AUTH").arg(password),
            };
            conn.handshake(auth).await?;
        }

        if info.db != 0 {
            conn.handshake(Command::new("SELECT").arg(info.db)).await?;
        }

        Ok(conn)
    }

    async fn handshake(&mut self, command: Command) -> Result<()> {
        match self.round_trip(&command).await? {
            Frame::Simple(s) if s == "OK" => Ok(()),
            Frame::Error(message) => Err(Error::ConnectionUnavailable(format!(
                "{} rejected; {}",
                command.name(),
                message
            ))),
            frame => Err(Error::ConnectionUnavailable(format!(
                "{} rejected; unexpected {}",
                command.name(),
                frame.kind()
            ))),
        }
    }

    pub async fn write_command(&mut self, command: &Command) -> Result<()> {
        self.framed.send(command).await
    }

    /// Reads the next reply. `None` means the store closed the channel cleanly.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.framed.next().await.transpose()
    }

    /// Writes one command and waits for its reply.
    pub async fn round_trip(&mut self, command: &Command) -> Result<Frame> {
        self.write_command(command).await?;
        self.read_frame().await?.ok_or(Error::ConnectionClosed)
    }
}
