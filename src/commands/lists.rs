use strum_macros::IntoStaticStr;

use crate::command::{keyword_arg, Command, IntoArg};
use crate::decode::KeyValue;

/// End of a list a move pops from or pushes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ListDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum InsertPosition {
    Before,
    After,
}

keyword_arg!(ListDirection, InsertPosition);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LposOptions {
    /// Which match to return; negative ranks search from the tail. 0 is the default and is
    /// never sent.
    pub rank: Option<i64>,
    /// Compare at most this many elements.
    pub maxlen: Option<u64>,
}

impl LposOptions {
    pub fn rank(mut self, rank: i64) -> LposOptions {
        self.rank = Some(rank);
        self
    }

    pub fn maxlen(mut self, maxlen: u64) -> LposOptions {
        self.maxlen = Some(maxlen);
        self
    }
}

fn lpos_command(
    key: impl IntoArg,
    element: impl IntoArg,
    count: Option<u64>,
    options: LposOptions,
) -> Command {
    Command::new("LPOS")
        .arg(key)
        .arg(element)
        .option("RANK", options.rank.filter(|rank| *rank != 0))
        .option("COUNT", count)
        .option("MAXLEN", options.maxlen)
}

requests! {
    /// Ref: <https://redis.io/docs/latest/commands/rpush/>
    fn rpush(key: impl IntoArg, elements: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("RPUSH").arg(key).args_from(elements)
    }

    /// Ref: <https://redis.io/docs/latest/commands/rpushx/>
    fn rpushx(key: impl IntoArg, elements: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("RPUSHX").arg(key).args_from(elements)
    }

    /// Ref: <https://redis.io/docs/latest/commands/lpush/>
    fn lpush(key: impl IntoArg, elements: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("LPUSH").arg(key).args_from(elements)
    }

    /// Ref: <https://redis.io/docs/latest/commands/lpushx/>
    fn lpushx(key: impl IntoArg, elements: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("LPUSHX").arg(key).args_from(elements)
    }

    /// Length of the list, 0 when the key does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/llen/>
    fn llen(key: impl IntoArg) -> i64 {
        Command::new("LLEN").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/lpop/>
    fn lpop(key: impl IntoArg) -> Option<String> {
        Command::new("LPOP").arg(key)
    }

    /// Pops up to `count` elements; `None` when the key does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lpop/>
    fn lpop_count(key: impl IntoArg, count: u64) -> Option<Vec<String>> {
        Command::new("LPOP").arg(key).arg(count)
    }

    /// Ref: <https://redis.io/docs/latest/commands/rpop/>
    fn rpop(key: impl IntoArg) -> Option<String> {
        Command::new("RPOP").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/rpop/>
    fn rpop_count(key: impl IntoArg, count: u64) -> Option<Vec<String>> {
        Command::new("RPOP").arg(key).arg(count)
    }

    /// Ref: <https://redis.io/docs/latest/commands/ltrim/>
    fn ltrim(key: impl IntoArg, start: i64, stop: i64) -> () {
        Command::new("LTRIM").arg(key).arg(start).arg(stop)
    }

    /// Ref: <https://redis.io/docs/latest/commands/lrange/>
    fn lrange(key: impl IntoArg, start: i64, stop: i64) -> Vec<String> {
        Command::new("LRANGE").arg(key).arg(start).arg(stop)
    }

    /// Ref: <https://redis.io/docs/latest/commands/lindex/>
    fn lindex(key: impl IntoArg, index: i64) -> Option<String> {
        Command::new("LINDEX").arg(key).arg(index)
    }

    /// New length of the list, -1 when `pivot` was not found and 0 when the key does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/linsert/>
    fn linsert(
        key: impl IntoArg,
        position: InsertPosition,
        pivot: impl IntoArg,
        element: impl IntoArg
    ) -> i64 {
        Command::new("LINSERT").arg(key).arg(position).arg(pivot).arg(element)
    }

    /// Index of the first match, after applying the options.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lpos/>
    fn lpos(key: impl IntoArg, element: impl IntoArg, options: LposOptions) -> Option<i64> {
        lpos_command(key, element, None, options)
    }

    /// Indexes of up to `count` matches; 0 means all of them.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/lpos/>
    fn lpos_count(
        key: impl IntoArg,
        element: impl IntoArg,
        count: u64,
        options: LposOptions
    ) -> Vec<i64> {
        lpos_command(key, element, Some(count), options)
    }

    /// Ref: <https://redis.io/docs/latest/commands/lrem/>
    fn lrem(key: impl IntoArg, count: i64, element: impl IntoArg) -> i64 {
        Command::new("LREM").arg(key).arg(count).arg(element)
    }

    /// Ref: <https://redis.io/docs/latest/commands/lset/>
    fn lset(key: impl IntoArg, index: i64, element: impl IntoArg) -> () {
        Command::new("LSET").arg(key).arg(index).arg(element)
    }

    /// Ref: <https://redis.io/docs/latest/commands/lmove/>
    fn lmove(
        source: impl IntoArg,
        destination: impl IntoArg,
        from: ListDirection,
        to: ListDirection
    ) -> Option<String> {
        Command::new("LMOVE").arg(source).arg(destination).arg(from).arg(to)
    }

    /// Blocking `LMOVE`. `timeout` is in seconds and travels as an argument; 0 blocks forever.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/blmove/>
    fn blmove(
        source: impl IntoArg,
        destination: impl IntoArg,
        from: ListDirection,
        to: ListDirection,
        timeout: f64
    ) -> Option<String> {
        Command::new("BLMOVE")
            .arg(source)
            .arg(destination)
            .arg(from)
            .arg(to)
            .arg(timeout)
    }

    /// Pops from the first non-empty list, or `None` once `timeout` seconds elapsed.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/blpop/>
    fn blpop(keys: impl IntoIterator<Item = impl IntoArg>, timeout: f64) -> Option<KeyValue> {
        Command::new("BLPOP").args_from(keys).arg(timeout)
    }

    /// Ref: <https://redis.io/docs/latest/commands/brpop/>
    fn brpop(keys: impl IntoIterator<Item = impl IntoArg>, timeout: f64) -> Option<KeyValue> {
        Command::new("BRPOP").args_from(keys).arg(timeout)
    }

    /// Ref: <https://redis.io/docs/latest/commands/brpoplpush/>
    fn brpoplpush(source: impl IntoArg, destination: impl IntoArg, timeout: f64) -> Option<String> {
        Command::new("BRPOPLPUSH").arg(source).arg(destination).arg(timeout)
    }

    /// Ref: <https://redis.io/docs/latest/commands/rpoplpush/>
    fn rpoplpush(source: impl IntoArg, destination: impl IntoArg) -> Option<String> {
        Command::new("RPOPLPUSH").arg(source).arg(destination)
    }
}
