use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};

use crate::command::Command;
use crate::frame::{self, Frame};
use crate::Error;

/// Frames replies coming from the store and serializes outgoing commands.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> FrameCodec {
        FrameCodec { max_frame_size }
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // A reply that never completes must not grow the buffer without bound.
        if src.len() > self.max_frame_size {
            return Err(frame::Error::Other("frame size exceeds limit".to_string()).into());
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            Err(frame::Error::Incomplete) => return Ok(None), // Not enough data to parse a frame.
            Err(err) => return Err(err.into()),
        };

        let position = usize::try_from(cursor.position())
            .map_err(|_| frame::Error::Other("cursor position is too large".to_string()))?;

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }
}

impl<'a> Encoder<&'a Command> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, command: &'a Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut bytes = Vec::new();
        command.to_frame().serialize_into(&mut bytes);
        dst.reserve(bytes.len());
        dst.put_slice(&bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn waits_for_complete_frames() {
        let mut codec = FrameCodec::new(1024);
        let mut buf = BytesMut::from(&b"$5\r\nhel"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"lo\r\n:1\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Bulk(Bytes::from("hello")))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::Integer(1)));
        assert!(buf.is_empty());
    }

    #[test]
    fn rejects_oversized_buffers() {
        let mut codec = FrameCodec::new(4);
        let mut buf = BytesMut::from(&b"$10\r\n0123"[..]);

        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn encodes_commands_as_bulk_arrays() {
        let mut codec = FrameCodec::new(1024);
        let mut buf = BytesMut::new();

        codec
            .encode(&Command::new("GET").arg("key"), &mut buf)
            .unwrap();

        assert_eq!(&buf[..], b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n");
    }
}
