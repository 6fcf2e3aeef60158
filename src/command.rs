use bytes::Bytes;
use std::fmt;
use std::marker::PhantomData;

use crate::decode::Decode;
use crate::frame::Frame;
use crate::Result;

/// One wire-level request: a command name followed by its arguments, in protocol order.
///
/// Commands are built with the chained methods below. Optional clauses are appended by the
/// caller in the command's canonical grammar order; a clause whose value is absent emits nothing
/// at all, never an empty token.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    name: &'static str,
    args: Vec<Bytes>,
}

impl Command {
    pub fn new(name: &'static str) -> Command {
        Command {
            name,
            args: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Arguments after the command name.
    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    pub fn arg(mut self, arg: impl IntoArg) -> Command {
        self.args.push(arg.into_arg());
        self
    }

    pub fn args_from<I>(mut self, args: I) -> Command
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        self.args.extend(args.into_iter().map(IntoArg::into_arg));
        self
    }

    /// Appends `token` only when `enabled`.
    pub fn flag(mut self, enabled: bool, token: &'static str) -> Command {
        if enabled {
            self.args.push(Bytes::from_static(token.as_bytes()));
        }
        self
    }

    /// Appends `token value` when the value is present.
    pub fn option<T: IntoArg>(mut self, token: &'static str, value: Option<T>) -> Command {
        if let Some(value) = value {
            self.args.push(Bytes::from_static(token.as_bytes()));
            self.args.push(value.into_arg());
        }
        self
    }

    /// Appends `token first second` only when both companions are present.
    pub fn option_pair<A, B>(mut self, token: &'static str, first: Option<A>, second: Option<B>) -> Command
    where
        A: IntoArg,
        B: IntoArg,
    {
        if let (Some(first), Some(second)) = (first, second) {
            self.args.push(Bytes::from_static(token.as_bytes()));
            self.args.push(first.into_arg());
            self.args.push(second.into_arg());
        }
        self
    }

    /// Appends `LIMIT offset count`.
    pub fn limit(self, limit: Option<Limit>) -> Command {
        let (offset, count) = match limit {
            Some(Limit { offset, count }) => (Some(offset), Some(count)),
            None => (None, None),
        };
        self.option_pair("LIMIT", offset, count)
    }

    /// Clients send commands to the store as RESP arrays of bulk strings.
    pub fn to_frame(&self) -> Frame {
        let mut frames = Vec::with_capacity(self.args.len() + 1);
        frames.push(Frame::Bulk(Bytes::from_static(self.name.as_bytes())));
        frames.extend(self.args.iter().cloned().map(Frame::Bulk));
        Frame::Array(frames)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}

/// Offset and count of a `LIMIT` clause. Both companions always travel together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limit {
    pub offset: i64,
    pub count: i64,
}

impl Limit {
    pub fn new(offset: i64, count: i64) -> Limit {
        Limit { offset, count }
    }
}

/// Conversion of a typed parameter into one protocol argument.
pub trait IntoArg {
    fn into_arg(self) -> Bytes;
}

impl IntoArg for Bytes {
    fn into_arg(self) -> Bytes {
        self
    }
}

impl IntoArg for &Bytes {
    fn into_arg(self) -> Bytes {
        self.clone()
    }
}

impl IntoArg for &str {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl IntoArg for String {
    fn into_arg(self) -> Bytes {
        Bytes::from(self)
    }
}

impl IntoArg for &String {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl IntoArg for &[u8] {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl IntoArg for Vec<u8> {
    fn into_arg(self) -> Bytes {
        Bytes::from(self)
    }
}

impl IntoArg for f64 {
    fn into_arg(self) -> Bytes {
        // `inf` and `-inf` are spelled the way the store expects them.
        Bytes::from(self.to_string())
    }
}

macro_rules! integer_arg {
    ($($ty:ty),*) => {
        $(
            impl IntoArg for $ty {
                fn into_arg(self) -> Bytes {
                    Bytes::from(self.to_string())
                }
            }
        )*
    };
}

integer_arg!(i32, i64, u8, u32, u64, usize);

/// Keyword enums are sent as their static protocol spelling.
macro_rules! keyword_arg {
    ($($ty:ty),*) => {
        $(
            impl $crate::command::IntoArg for $ty {
                fn into_arg(self) -> ::bytes::Bytes {
                    let keyword: &'static str = self.into();
                    ::bytes::Bytes::from_static(keyword.as_bytes())
                }
            }
        )*
    };
}

pub(crate) use keyword_arg;

/// A command paired with the decode rule for its reply.
///
/// The decode rule is fixed when the request is built, so a reply is never interpreted by
/// guessing from its shape.
pub struct Request<T> {
    command: Command,
    decoder: fn(Frame) -> Result<T>,
    _output: PhantomData<fn() -> T>,
}

impl<T> Request<T> {
    pub fn with_decoder(command: Command, decoder: fn(Frame) -> Result<T>) -> Request<T> {
        Request {
            command,
            decoder,
            _output: PhantomData,
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn decode(&self, frame: Frame) -> Result<T> {
        (self.decoder)(frame)
    }

    pub fn into_parts(self) -> (Command, fn(Frame) -> Result<T>) {
        (self.command, self.decoder)
    }
}

impl<T: Decode> Request<T> {
    pub fn new(command: Command) -> Request<T> {
        Request::with_decoder(command, T::decode)
    }
}

impl<T: Decode> From<Command> for Request<T> {
    fn from(command: Command) -> Request<T> {
        Request::new(command)
    }
}

impl<T> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("command", &self.command)
            .field("output", &std::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn arg_strings(command: &Command) -> Vec<String> {
    command
        .args()
        .iter()
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect()
}
