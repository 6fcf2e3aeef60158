use std::collections::HashSet;

use crate::command::{Command, IntoArg};

requests! {
    /// Ref: <https://redis.io/docs/latest/commands/sadd/>
    fn sadd(key: impl IntoArg, members: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("SADD").arg(key).args_from(members)
    }

    /// Cardinality of the set, 0 when the key does not exist.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/scard/>
    fn scard(key: impl IntoArg) -> i64 {
        Command::new("SCARD").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/sdiff/>
    fn sdiff(keys: impl IntoIterator<Item = impl IntoArg>) -> HashSet<String> {
        Command::new("SDIFF").args_from(keys)
    }

    /// Ref: <https://redis.io/docs/latest/commands/sdiffstore/>
    fn sdiffstore(destination: impl IntoArg, keys: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("SDIFFSTORE").arg(destination).args_from(keys)
    }

    /// Ref: <https://redis.io/docs/latest/commands/sinter/>
    fn sinter(keys: impl IntoIterator<Item = impl IntoArg>) -> HashSet<String> {
        Command::new("SINTER").args_from(keys)
    }

    /// Ref: <https://redis.io/docs/latest/commands/sinterstore/>
    fn sinterstore(destination: impl IntoArg, keys: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("SINTERSTORE").arg(destination).args_from(keys)
    }

    /// Ref: <https://redis.io/docs/latest/commands/sismember/>
    fn sismember(key: impl IntoArg, member: impl IntoArg) -> bool {
        Command::new("SISMEMBER").arg(key).arg(member)
    }

    /// Ref: <https://redis.io/docs/latest/commands/smembers/>
    fn smembers(key: impl IntoArg) -> HashSet<String> {
        Command::new("SMEMBERS").arg(key)
    }

    /// Membership of each member, in the order asked.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/smismember/>
    fn smismember(key: impl IntoArg, members: impl IntoIterator<Item = impl IntoArg>) -> Vec<bool> {
        Command::new("SMISMEMBER").arg(key).args_from(members)
    }

    /// Ref: <https://redis.io/docs/latest/commands/smove/>
    fn smove(source: impl IntoArg, destination: impl IntoArg, member: impl IntoArg) -> bool {
        Command::new("SMOVE").arg(source).arg(destination).arg(member)
    }

    /// Ref: <https://redis.io/docs/latest/commands/spop/>
    fn spop(key: impl IntoArg) -> Option<String> {
        Command::new("SPOP").arg(key)
    }

    /// Ref: <https://redis.io/docs/latest/commands/spop/>
    fn spop_count(key: impl IntoArg, count: u64) -> HashSet<String> {
        Command::new("SPOP").arg(key).arg(count)
    }

    /// Ref: <https://redis.io/docs/latest/commands/srandmember/>
    fn srandmember(key: impl IntoArg) -> Option<String> {
        Command::new("SRANDMEMBER").arg(key)
    }

    /// A negative `count` allows the same member more than once.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/srandmember/>
    fn srandmember_count(key: impl IntoArg, count: i64) -> Vec<String> {
        Command::new("SRANDMEMBER").arg(key).arg(count)
    }

    /// Ref: <https://redis.io/docs/latest/commands/srem/>
    fn srem(key: impl IntoArg, members: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("SREM").arg(key).args_from(members)
    }

    /// Ref: <https://redis.io/docs/latest/commands/sunion/>
    fn sunion(keys: impl IntoIterator<Item = impl IntoArg>) -> HashSet<String> {
        Command::new("SUNION").args_from(keys)
    }

    /// Ref: <https://redis.io/docs/latest/commands/sunionstore/>
    fn sunionstore(destination: impl IntoArg, keys: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("SUNIONSTORE").arg(destination).args_from(keys)
    }
}
