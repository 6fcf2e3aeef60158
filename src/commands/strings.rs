use bytes::Bytes;
use strum_macros::IntoStaticStr;

use crate::command::{keyword_arg, Command, IntoArg, Request};
use crate::decode::{applied, LcsMatches};

/// Expiration clause of `SET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetExpiry {
    /// Seconds from now.
    Ex(u64),
    /// Milliseconds from now.
    Px(u64),
    /// Unix time in seconds.
    ExAt(u64),
    /// Unix time in milliseconds.
    PxAt(u64),
    /// Keep the time to live the key already has.
    KeepTtl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SetCondition {
    /// Only set the key if it does not exist.
    Nx,
    /// Only set the key if it already exists.
    Xx,
}

keyword_arg!(SetCondition);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub expiry: Option<SetExpiry>,
    pub condition: Option<SetCondition>,
}

impl SetOptions {
    pub fn expiry(mut self, expiry: SetExpiry) -> SetOptions {
        self.expiry = Some(expiry);
        self
    }

    pub fn condition(mut self, condition: SetCondition) -> SetOptions {
        self.condition = Some(condition);
        self
    }

    fn apply(&self, command: Command) -> Command {
        let command = match self.expiry {
            Some(SetExpiry::Ex(seconds)) => command.arg("EX").arg(seconds),
            Some(SetExpiry::Px(millis)) => command.arg("PX").arg(millis),
            Some(SetExpiry::ExAt(timestamp)) => command.arg("EXAT").arg(timestamp),
            Some(SetExpiry::PxAt(timestamp)) => command.arg("PXAT").arg(timestamp),
            Some(SetExpiry::KeepTtl) => command.arg("KEEPTTL"),
            None => command,
        };
        match self.condition {
            Some(condition) => command.arg(condition),
            None => command,
        }
    }
}

/// Expiration clause of `GETEX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetExExpiry {
    Ex(u64),
    Px(u64),
    ExAt(u64),
    PxAt(u64),
    Persist,
}

impl GetExExpiry {
    fn apply(self, command: Command) -> Command {
        match self {
            GetExExpiry::Ex(seconds) => command.arg("EX").arg(seconds),
            GetExExpiry::Px(millis) => command.arg("PX").arg(millis),
            GetExExpiry::ExAt(timestamp) => command.arg("EXAT").arg(timestamp),
            GetExExpiry::PxAt(timestamp) => command.arg("PXAT").arg(timestamp),
            GetExExpiry::Persist => command.arg("PERSIST"),
        }
    }
}

requests! {
    /// Set `key` to hold the string `value`, discarding any previous time to live.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/set/>
    fn set(key: impl IntoArg, value: impl IntoArg) -> () {
        Command::new("SET").arg(key).arg(value)
    }

    /// `SET` with options. Resolves to `false` when the `NX`/`XX` condition was not met.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/set/>
    fn set_with(key: impl IntoArg, value: impl IntoArg, options: SetOptions) -> bool {
        let command = options.apply(Command::new("SET").arg(key).arg(value));
        Request::with_decoder(command, applied)
    }

    /// `SET ... GET`: sets the key and returns its previous value.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/set/>
    fn set_get(key: impl IntoArg, value: impl IntoArg, options: SetOptions) -> Option<String> {
        options.apply(Command::new("SET").arg(key).arg(value)).arg("GET")
    }

    /// Get the value of `key`. If the key does not exist `None` is returned.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/get/>
    fn get(key: impl IntoArg) -> Option<String> {
        Command::new("GET").arg(key)
    }

    /// `GET` for values that are not UTF-8 text.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/get/>
    fn get_bytes(key: impl IntoArg) -> Option<Bytes> {
        Command::new("GET").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/getrange/>
    fn getrange(key: impl IntoArg, start: i64, end: i64) -> String {
        Command::new("GETRANGE").arg(key).arg(start).arg(end)
    }

    /// Ref: <https://redis.io/docs/latest/commands/getdel/>
    fn getdel(key: impl IntoArg) -> Option<String> {
        Command::new("GETDEL").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/getex/>
    fn getex(key: impl IntoArg, expiry: Option<GetExExpiry>) -> Option<String> {
        let command = Command::new("GETEX").arg(key);
        match expiry {
            Some(expiry) => expiry.apply(command),
            None => command,
        }
    }

    /// Ref: <https://redis.io/docs/latest/commands/getset/>
    fn getset(key: impl IntoArg, value: impl IntoArg) -> Option<String> {
        Command::new("GETSET").arg(key).arg(value)
    }

    /// Ref: <https://redis.io/docs/latest/commands/incr/>
    fn incr(key: impl IntoArg) -> i64 {
        Command::new("INCR").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/incrby/>
    fn incrby(key: impl IntoArg, increment: i64) -> i64 {
        Command::new("INCRBY").arg(key).arg(increment)
    }

    /// Ref: <https://redis.io/docs/latest/commands/incrbyfloat/>
    fn incrbyfloat(key: impl IntoArg, increment: f64) -> f64 {
        Command::new("INCRBYFLOAT").arg(key).arg(increment)
    }

    /// Ref: <https://redis.io/docs/latest/commands/decr/>
    fn decr(key: impl IntoArg) -> i64 {
        Command::new("DECR").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/decrby/>
    fn decrby(key: impl IntoArg, decrement: i64) -> i64 {
        Command::new("DECRBY").arg(key).arg(decrement)
    }

    /// Appends `value` and returns the new length of the string.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/append/>
    fn append(key: impl IntoArg, value: impl IntoArg) -> i64 {
        Command::new("APPEND").arg(key).arg(value)
    }

    /// Ref: <https://redis.io/docs/latest/commands/setnx/>
    fn setnx(key: impl IntoArg, value: impl IntoArg) -> bool {
        Command::new("SETNX").arg(key).arg(value)
    }

    /// Ref: <https://redis.io/docs/latest/commands/setex/>
    fn setex(key: impl IntoArg, seconds: u64, value: impl IntoArg) -> () {
        Command::new("SETEX").arg(key).arg(seconds).arg(value)
    }

    /// Ref: <https://redis.io/docs/latest/commands/psetex/>
    fn psetex(key: impl IntoArg, millis: u64, value: impl IntoArg) -> () {
        Command::new("PSETEX").arg(key).arg(millis).arg(value)
    }

    /// Ref: <https://redis.io/docs/latest/commands/setrange/>
    fn setrange(key: impl IntoArg, offset: u64, value: impl IntoArg) -> i64 {
        Command::new("SETRANGE").arg(key).arg(offset).arg(value)
    }

    /// Length of the string at `key`, 0 when the key does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/strlen/>
    fn strlen(key: impl IntoArg) -> i64 {
        Command::new("STRLEN").arg(key)
    }

    /// Values of every key, with `None` for keys that do not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/mget/>
    fn mget(keys: impl IntoIterator<Item = impl IntoArg>) -> Vec<Option<String>> {
        Command::new("MGET").args_from(keys)
    }

    /// Ref: <https://redis.io/docs/latest/commands/mset/>
    fn mset(pairs: impl IntoIterator<Item = (impl IntoArg, impl IntoArg)>) -> () {
        pairs
            .into_iter()
            .fold(Command::new("MSET"), |command, (key, value)| command.arg(key).arg(value))
    }

    /// Ref: <https://redis.io/docs/latest/commands/msetnx/>
    fn msetnx(pairs: impl IntoIterator<Item = (impl IntoArg, impl IntoArg)>) -> bool {
        pairs
            .into_iter()
            .fold(Command::new("MSETNX"), |command, (key, value)| command.arg(key).arg(value))
    }

    /// Longest common subsequence of the strings at both keys.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lcs/>
    fn lcs(key1: impl IntoArg, key2: impl IntoArg) -> String {
        Command::new("LCS").arg(key1).arg(key2)
    }

    /// Ref: <https://redis.io/docs/latest/commands/lcs/>
    fn lcs_len(key1: impl IntoArg, key2: impl IntoArg) -> i64 {
        Command::new("LCS").arg(key1).arg(key2).arg("LEN")
    }

    /// Matched ranges of the longest common subsequence.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lcs/>
    fn lcs_idx(
        key1: impl IntoArg,
        key2: impl IntoArg,
        min_match_len: Option<u64>,
        with_match_len: bool
    ) -> LcsMatches {
        Command::new("LCS")
            .arg(key1)
            .arg(key2)
            .arg("IDX")
            .option("MINMATCHLEN", min_match_len)
            .flag(with_match_len, "WITHMATCHLEN")
    }
}
