use bytes::Bytes;
use strum_macros::{EnumString, IntoStaticStr};

use crate::command::{Command, IntoArg, Limit, Request};
use crate::decode::{mismatch, Decode, Status, Ttl};
use crate::frame::Frame;
use crate::{Error, Result};

/// Type of the value stored at a key, as reported by `TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    /// The key does not exist.
    None,
    String,
    List,
    Set,
    #[strum(serialize = "zset")]
    ZSet,
    Hash,
    Stream,
}

impl Decode for ValueType {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Simple(s) => s
                .parse()
                .map_err(|_| Error::Protocol(format!("unknown value type {:?}", s))),
            frame => mismatch("status", frame),
        }
    }
}

/// Clauses of `SORT`, appended in the command's grammar order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOptions {
    pub by: Option<String>,
    pub limit: Option<Limit>,
    pub get: Vec<String>,
    pub descending: bool,
    /// Sort lexicographically instead of numerically.
    pub alpha: bool,
}

impl SortOptions {
    pub fn by(mut self, pattern: impl Into<String>) -> SortOptions {
        self.by = Some(pattern.into());
        self
    }

    pub fn limit(mut self, offset: i64, count: i64) -> SortOptions {
        self.limit = Some(Limit::new(offset, count));
        self
    }

    pub fn get(mut self, pattern: impl Into<String>) -> SortOptions {
        self.get.push(pattern.into());
        self
    }

    pub fn descending(mut self) -> SortOptions {
        self.descending = true;
        self
    }

    pub fn alpha(mut self) -> SortOptions {
        self.alpha = true;
        self
    }

    fn apply(&self, command: Command) -> Command {
        let command = command.option("BY", self.by.as_deref()).limit(self.limit);
        let command = self
            .get
            .iter()
            .fold(command, |command, pattern| command.arg("GET").arg(pattern));
        command
            .flag(self.descending, "DESC")
            .flag(self.alpha, "ALPHA")
    }
}

requests! {
    /// Ref: <https://redis.io/docs/latest/commands/exists/>
    fn exists(key: impl IntoArg) -> bool {
        Command::new("EXISTS").arg(key)
    }

    /// Number of the given keys that exist. A key given twice counts twice.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/exists/>
    fn exists_many(keys: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("EXISTS").args_from(keys)
    }

    /// Ref: <https://redis.io/docs/latest/commands/del/>
    fn del(keys: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("DEL").args_from(keys)
    }

    /// Ref: <https://redis.io/docs/latest/commands/unlink/>
    fn unlink(keys: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("UNLINK").args_from(keys)
    }

    /// Ref: <https://redis.io/docs/latest/commands/type/>
    fn key_type(key: impl IntoArg) -> ValueType {
        Command::new("TYPE").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/randomkey/>
    fn randomkey() -> Option<String> {
        Command::new("RANDOMKEY")
    }

    /// `false` when the key does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/expire/>
    fn expire(key: impl IntoArg, seconds: u64) -> bool {
        Command::new("EXPIRE").arg(key).arg(seconds)
    }

    /// Ref: <https://redis.io/docs/latest/commands/expireat/>
    fn expireat(key: impl IntoArg, unix_seconds: u64) -> bool {
        Command::new("EXPIREAT").arg(key).arg(unix_seconds)
    }

    /// Ref: <https://redis.io/docs/latest/commands/pexpire/>
    fn pexpire(key: impl IntoArg, millis: u64) -> bool {
        Command::new("PEXPIRE").arg(key).arg(millis)
    }

    /// Ref: <https://redis.io/docs/latest/commands/pexpireat/>
    fn pexpireat(key: impl IntoArg, unix_millis: u64) -> bool {
        Command::new("PEXPIREAT").arg(key).arg(unix_millis)
    }

    /// Ref: <https://redis.io/docs/latest/commands/ttl/>
    fn ttl(key: impl IntoArg) -> Ttl {
        Request::with_decoder(Command::new("TTL").arg(key), Ttl::from_seconds)
    }

    /// Ref: <https://redis.io/docs/latest/commands/pttl/>
    fn pttl(key: impl IntoArg) -> Ttl {
        Request::with_decoder(Command::new("PTTL").arg(key), Ttl::from_millis)
    }

    /// Ref: <https://redis.io/docs/latest/commands/persist/>
    fn persist(key: impl IntoArg) -> bool {
        Command::new("PERSIST").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/keys/>
    fn keys(pattern: impl IntoArg) -> Vec<String> {
        Command::new("KEYS").arg(pattern)
    }

    /// Ref: <https://redis.io/docs/latest/commands/rename/>
    fn rename(key: impl IntoArg, new_key: impl IntoArg) -> () {
        Command::new("RENAME").arg(key).arg(new_key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/renamenx/>
    fn renamenx(key: impl IntoArg, new_key: impl IntoArg) -> bool {
        Command::new("RENAMENX").arg(key).arg(new_key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/touch/>
    fn touch(keys: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("TOUCH").args_from(keys)
    }

    /// Serialized value of the key, `None` when it does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/dump/>
    fn dump(key: impl IntoArg) -> Option<Bytes> {
        Command::new("DUMP").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/restore/>
    fn restore(key: impl IntoArg, ttl_millis: u64, payload: Bytes, replace: bool) -> () {
        Command::new("RESTORE")
            .arg(key)
            .arg(ttl_millis)
            .arg(payload)
            .flag(replace, "REPLACE")
    }

    /// Moves `keys` in one call, using the `KEYS` form with an empty key slot. Resolves to
    /// `OK`, or `NOKEY` when none of the keys was found.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/migrate/>
    fn migrate(
        host: &str,
        port: u16,
        keys: impl IntoIterator<Item = impl IntoArg>,
        destination_db: i64,
        timeout_millis: u64,
        copy: bool,
        replace: bool
    ) -> Status {
        Command::new("MIGRATE")
            .arg(host)
            .arg(u32::from(port))
            .arg("")
            .arg(destination_db)
            .arg(timeout_millis)
            .flag(copy, "COPY")
            .flag(replace, "REPLACE")
            .arg("KEYS")
            .args_from(keys)
    }

    /// Ref: <https://redis.io/docs/latest/commands/move/>
    fn move_key(key: impl IntoArg, db: i64) -> bool {
        Command::new("MOVE").arg(key).arg(db)
    }

    /// Ref: <https://redis.io/docs/latest/commands/object-encoding/>
    fn object_encoding(key: impl IntoArg) -> Option<String> {
        Command::new("OBJECT").arg("ENCODING").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/object-refcount/>
    fn object_refcount(key: impl IntoArg) -> Option<i64> {
        Command::new("OBJECT").arg("REFCOUNT").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/object-idletime/>
    fn object_idletime(key: impl IntoArg) -> Option<i64> {
        Command::new("OBJECT").arg("IDLETIME").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/object-freq/>
    fn object_freq(key: impl IntoArg) -> Option<i64> {
        Command::new("OBJECT").arg("FREQ").arg(key)
    }

    /// `GET` patterns may reference missing keys, hence the holes.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/sort/>
    fn sort(key: impl IntoArg, options: &SortOptions) -> Vec<Option<String>> {
        options.apply(Command::new("SORT").arg(key))
    }

    /// Ref: <https://redis.io/docs/latest/commands/sort/>
    fn sort_store(key: impl IntoArg, options: &SortOptions, destination: impl IntoArg) -> i64 {
        options
            .apply(Command::new("SORT").arg(key))
            .arg("STORE")
            .arg(destination)
    }

    /// Ref: <https://redis.io/docs/latest/commands/wait/>
    fn wait(replicas: u64, timeout_millis: u64) -> i64 {
        Command::new("WAIT").arg(replicas).arg(timeout_millis)
    }

    /// Ref: <https://redis.io/docs/latest/commands/copy/>
    fn copy(
        source: impl IntoArg,
        destination: impl IntoArg,
        db: Option<i64>,
        replace: bool
    ) -> bool {
        Command::new("COPY")
            .arg(source)
            .arg(destination)
            .option("DB", db)
            .flag(replace, "REPLACE")
    }
}
