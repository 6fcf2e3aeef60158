use bytes::Bytes;
use strum_macros::IntoStaticStr;

use crate::command::{keyword_arg, Command, IntoArg, Limit};
use crate::decode::{KeyMemberScore, MemberScore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ZAddCondition {
    /// Only add new members.
    Nx,
    /// Only update existing members.
    Xx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ZAddComparison {
    /// Only update when the new score is greater.
    Gt,
    /// Only update when the new score is lower.
    Lt,
}

/// How scores are combined by `ZINTER`, `ZUNION` and their `STORE` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Aggregate {
    Sum,
    Min,
    Max,
}

keyword_arg!(ZAddCondition, ZAddComparison, Aggregate);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZAddOptions {
    pub condition: Option<ZAddCondition>,
    pub comparison: Option<ZAddComparison>,
    /// Count changed members instead of added ones.
    pub changed: bool,
}

impl ZAddOptions {
    pub fn condition(mut self, condition: ZAddCondition) -> ZAddOptions {
        self.condition = Some(condition);
        self
    }

    pub fn comparison(mut self, comparison: ZAddComparison) -> ZAddOptions {
        self.comparison = Some(comparison);
        self
    }

    pub fn changed(mut self) -> ZAddOptions {
        self.changed = true;
        self
    }

    fn apply(&self, command: Command) -> Command {
        let command = match self.condition {
            Some(condition) => command.arg(condition),
            None => command,
        };
        let command = match self.comparison {
            Some(comparison) => command.arg(comparison),
            None => command,
        };
        command.flag(self.changed, "CH")
    }
}

/// Optional clauses shared by the set-combining commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombineOptions {
    /// One multiplication factor per input key. Empty sends no `WEIGHTS` clause.
    pub weights: Vec<f64>,
    pub aggregate: Option<Aggregate>,
}

impl CombineOptions {
    pub fn weights(mut self, weights: impl IntoIterator<Item = f64>) -> CombineOptions {
        self.weights = weights.into_iter().collect();
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> CombineOptions {
        self.aggregate = Some(aggregate);
        self
    }
}

/// `numkeys key [key ...] [WEIGHTS ...] [AGGREGATE ...] [WITHSCORES]`
fn combine(
    command: Command,
    keys: impl IntoIterator<Item = impl IntoArg>,
    options: &CombineOptions,
    with_scores: bool,
) -> Command {
    let keys: Vec<Bytes> = keys.into_iter().map(IntoArg::into_arg).collect();
    let command = command.arg(keys.len()).args_from(keys);
    let command = if options.weights.is_empty() {
        command
    } else {
        command.arg("WEIGHTS").args_from(options.weights.iter().copied())
    };
    command
        .option("AGGREGATE", options.aggregate)
        .flag(with_scores, "WITHSCORES")
}

fn zadd_command(key: impl IntoArg, options: &ZAddOptions) -> Command {
    options.apply(Command::new("ZADD").arg(key))
}

requests! {
    /// Adds every score-member pair; returns the number of added (or, with `CH`, changed)
    /// members.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zadd/>
    fn zadd(
        key: impl IntoArg,
        members: impl IntoIterator<Item = (f64, impl IntoArg)>,
        options: ZAddOptions
    ) -> i64 {
        members
            .into_iter()
            .fold(zadd_command(key, &options), |command, (score, member)| {
                command.arg(score).arg(member)
            })
    }

    /// `ZADD ... INCR`. `None` when the update was skipped because of the options.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zadd/>
    fn zadd_incr(
        key: impl IntoArg,
        increment: f64,
        member: impl IntoArg,
        options: ZAddOptions
    ) -> Option<f64> {
        zadd_command(key, &options).arg("INCR").arg(increment).arg(member)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zcard/>
    fn zcard(key: impl IntoArg) -> i64 {
        Command::new("ZCARD").arg(key)
    }

    /// Bounds are sent as given, so `"(5"`, `"-inf"` and plain numbers all work.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zcount/>
    fn zcount(key: impl IntoArg, min: impl IntoArg, max: impl IntoArg) -> i64 {
        Command::new("ZCOUNT").arg(key).arg(min).arg(max)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zincrby/>
    fn zincrby(key: impl IntoArg, increment: f64, member: impl IntoArg) -> f64 {
        Command::new("ZINCRBY").arg(key).arg(increment).arg(member)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zinter/>
    fn zinter(keys: impl IntoIterator<Item = impl IntoArg>, options: &CombineOptions) -> Vec<String> {
        combine(Command::new("ZINTER"), keys, options, false)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zinter/>
    fn zinter_withscores(
        keys: impl IntoIterator<Item = impl IntoArg>,
        options: &CombineOptions
    ) -> Vec<MemberScore> {
        combine(Command::new("ZINTER"), keys, options, true)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zinterstore/>
    fn zinterstore(
        destination: impl IntoArg,
        keys: impl IntoIterator<Item = impl IntoArg>,
        options: &CombineOptions
    ) -> i64 {
        combine(Command::new("ZINTERSTORE").arg(destination), keys, options, false)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zunion/>
    fn zunion(keys: impl IntoIterator<Item = impl IntoArg>, options: &CombineOptions) -> Vec<String> {
        combine(Command::new("ZUNION"), keys, options, false)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zunion/>
    fn zunion_withscores(
        keys: impl IntoIterator<Item = impl IntoArg>,
        options: &CombineOptions
    ) -> Vec<MemberScore> {
        combine(Command::new("ZUNION"), keys, options, true)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zunionstore/>
    fn zunionstore(
        destination: impl IntoArg,
        keys: impl IntoIterator<Item = impl IntoArg>,
        options: &CombineOptions
    ) -> i64 {
        combine(Command::new("ZUNIONSTORE").arg(destination), keys, options, false)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zlexcount/>
    fn zlexcount(key: impl IntoArg, min: impl IntoArg, max: impl IntoArg) -> i64 {
        Command::new("ZLEXCOUNT").arg(key).arg(min).arg(max)
    }

    /// Scores of each member in the order asked, `None` for missing members.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zmscore/>
    fn zmscore(key: impl IntoArg, members: impl IntoIterator<Item = impl IntoArg>) -> Vec<Option<f64>> {
        Command::new("ZMSCORE").arg(key).args_from(members)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zpopmax/>
    fn zpopmax(key: impl IntoArg, count: Option<u64>) -> Vec<MemberScore> {
        Command::new("ZPOPMAX").arg(key).args_from(count)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zpopmin/>
    fn zpopmin(key: impl IntoArg, count: Option<u64>) -> Vec<MemberScore> {
        Command::new("ZPOPMIN").arg(key).args_from(count)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrange/>
    fn zrange(key: impl IntoArg, start: i64, stop: i64) -> Vec<String> {
        Command::new("ZRANGE").arg(key).arg(start).arg(stop)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrange/>
    fn zrange_withscores(key: impl IntoArg, start: i64, stop: i64) -> Vec<MemberScore> {
        Command::new("ZRANGE").arg(key).arg(start).arg(stop).arg("WITHSCORES")
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrangebylex/>
    fn zrangebylex(
        key: impl IntoArg,
        min: impl IntoArg,
        max: impl IntoArg,
        limit: Option<Limit>
    ) -> Vec<String> {
        Command::new("ZRANGEBYLEX").arg(key).arg(min).arg(max).limit(limit)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrangebyscore/>
    fn zrangebyscore(
        key: impl IntoArg,
        min: impl IntoArg,
        max: impl IntoArg,
        limit: Option<Limit>
    ) -> Vec<String> {
        Command::new("ZRANGEBYSCORE").arg(key).arg(min).arg(max).limit(limit)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrangebyscore/>
    fn zrangebyscore_withscores(
        key: impl IntoArg,
        min: impl IntoArg,
        max: impl IntoArg,
        limit: Option<Limit>
    ) -> Vec<MemberScore> {
        Command::new("ZRANGEBYSCORE")
            .arg(key)
            .arg(min)
            .arg(max)
            .arg("WITHSCORES")
            .limit(limit)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrank/>
    fn zrank(key: impl IntoArg, member: impl IntoArg) -> Option<i64> {
        Command::new("ZRANK").arg(key).arg(member)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrem/>
    fn zrem(key: impl IntoArg, members: impl IntoIterator<Item = impl IntoArg>) -> i64 {
        Command::new("ZREM").arg(key).args_from(members)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zremrangebylex/>
    fn zremrangebylex(key: impl IntoArg, min: impl IntoArg, max: impl IntoArg) -> i64 {
        Command::new("ZREMRANGEBYLEX").arg(key).arg(min).arg(max)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zremrangebyrank/>
    fn zremrangebyrank(key: impl IntoArg, start: i64, stop: i64) -> i64 {
        Command::new("ZREMRANGEBYRANK").arg(key).arg(start).arg(stop)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zremrangebyscore/>
    fn zremrangebyscore(key: impl IntoArg, min: impl IntoArg, max: impl IntoArg) -> i64 {
        Command::new("ZREMRANGEBYSCORE").arg(key).arg(min).arg(max)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrevrange/>
    fn zrevrange(key: impl IntoArg, start: i64, stop: i64) -> Vec<String> {
        Command::new("ZREVRANGE").arg(key).arg(start).arg(stop)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrevrange/>
    fn zrevrange_withscores(key: impl IntoArg, start: i64, stop: i64) -> Vec<MemberScore> {
        Command::new("ZREVRANGE").arg(key).arg(start).arg(stop).arg("WITHSCORES")
    }

    /// Note the bounds come in `max`, `min` order.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/zrevrangebylex/>
    fn zrevrangebylex(
        key: impl IntoArg,
        max: impl IntoArg,
        min: impl IntoArg,
        limit: Option<Limit>
    ) -> Vec<String> {
        Command::new("ZREVRANGEBYLEX").arg(key).arg(max).arg(min).limit(limit)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrevrangebyscore/>
    fn zrevrangebyscore(
        key: impl IntoArg,
        max: impl IntoArg,
        min: impl IntoArg,
        limit: Option<Limit>
    ) -> Vec<String> {
        Command::new("ZREVRANGEBYSCORE").arg(key).arg(max).arg(min).limit(limit)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrevrangebyscore/>
    fn zrevrangebyscore_withscores(
        key: impl IntoArg,
        max: impl IntoArg,
        min: impl IntoArg,
        limit: Option<Limit>
    ) -> Vec<MemberScore> {
        Command::new("ZREVRANGEBYSCORE")
            .arg(key)
            .arg(max)
            .arg(min)
            .arg("WITHSCORES")
            .limit(limit)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zrevrank/>
    fn zrevrank(key: impl IntoArg, member: impl IntoArg) -> Option<i64> {
        Command::new("ZREVRANK").arg(key).arg(member)
    }

    /// Ref: <https://redis.io/docs/latest/commands/zscore/>
    fn zscore(key: impl IntoArg, member: impl IntoArg) -> Option<f64> {
        Command::new("ZSCORE").arg(key).arg(member)
    }

    /// Ref: <https://redis.io/docs/latest/commands/bzpopmax/>
    fn bzpopmax(keys: impl IntoIterator<Item = impl IntoArg>, timeout: f64) -> Option<KeyMemberScore> {
        Command::new("BZPOPMAX").args_from(keys).arg(timeout)
    }

    /// Ref: <https://redis.io/docs/latest/commands/bzpopmin/>
    fn bzpopmin(keys: impl IntoIterator<Item = impl IntoArg>, timeout: f64) -> Option<KeyMemberScore> {
        Command::new("BZPOPMIN").args_from(keys).arg(timeout)
    }
}
