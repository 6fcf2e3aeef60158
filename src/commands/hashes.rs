use std::collections::HashMap;

use crate::command::{Command, IntoArg};
use crate::decode::FieldValue;

requests! {
    /// Ref: <https://redis.io/docs/latest/commands/hdel/>
    fn hdel(key: impl IntoArg, fields: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("HDEL").arg(key).args_from(fields)
    }

    /// Ref: <https://redis.io/docs/latest/commands/hexists/>
    fn hexists(key: impl IntoArg, field: impl IntoArg) -> bool {
        Command::new("HEXISTS").arg(key).arg(field)
    }

    /// Ref: <https://redis.io/docs/latest/commands/hget/>
    fn hget(key: impl IntoArg, field: impl IntoArg) -> Option<String> {
        Command::new("HGET").arg(key).arg(field)
    }

    /// Every field and value of the hash; empty when the key does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/hgetall/>
    fn hgetall(key: impl IntoArg) -> HashMap<String, String> {
        Command::new("HGETALL").arg(key)
    }

    /// `HGETALL` keeping the order the store replied in.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/hgetall/>
    fn hgetall_pairs(key: impl IntoArg) -> Vec<FieldValue> {
        Command::new("HGETALL").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/hincrby/>
    fn hincrby(key: impl IntoArg, field: impl IntoArg, increment: i64) -> i64 {
        Command::new("HINCRBY").arg(key).arg(field).arg(increment)
    }

    /// Ref: <https://redis.io/docs/latest/commands/hincrbyfloat/>
    fn hincrbyfloat(key: impl IntoArg, field: impl IntoArg, increment: f64) -> f64 {
        Command::new("HINCRBYFLOAT").arg(key).arg(field).arg(increment)
    }

    /// Ref: <https://redis.io/docs/latest/commands/hkeys/>
    fn hkeys(key: impl IntoArg) -> Vec<String> {
        Command::new("HKEYS").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/hlen/>
    fn hlen(key: impl IntoArg) -> i64 {
        Command::new("HLEN").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/hmget/>
    fn hmget(key: impl IntoArg, fields: impl IntoIterator<Item = impl IntoArg>) -> Vec<Option<String>> {
        Command::new("HMGET").arg(key).args_from(fields)
    }

    /// Sets every field-value pair and returns the number of fields that were added.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/hset/>
    fn hset(key: impl IntoArg, pairs: impl IntoIterator<Item = (impl IntoArg, impl IntoArg)>) -> i64 {
        pairs
            .into_iter()
            .fold(Command::new("HSET").arg(key), |command, (field, value)| {
                command.arg(field).arg(value)
            })
    }

    /// Ref: <https://redis.io/docs/latest/commands/hsetnx/>
    fn hsetnx(key: impl IntoArg, field: impl IntoArg, value: impl IntoArg) -> bool {
        Command::new("HSETNX").arg(key).arg(field).arg(value)
    }

    /// Ref: <https://redis.io/docs/latest/commands/hstrlen/>
    fn hstrlen(key: impl IntoArg, field: impl IntoArg) -> i64 {
        Command::new("HSTRLEN").arg(key).arg(field)
    }

    /// Ref: <https://redis.io/docs/latest/commands/hvals/>
    fn hvals(key: impl IntoArg) -> Vec<String> {
        Command::new("HVALS").arg(key)
    }
}
