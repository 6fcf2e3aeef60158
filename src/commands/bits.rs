use strum_macros::IntoStaticStr;

use crate::command::{keyword_arg, Command, IntoArg};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum BitOperation {
    And,
    Or,
    Xor,
    Not,
}

keyword_arg!(BitOperation);

requests! {
    /// Number of set bits, optionally within a byte range.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/bitcount/>
    fn bitcount(key: impl IntoArg, range: Option<(i64, i64)>) -> i64 {
        let command = Command::new("BITCOUNT").arg(key);
        match range {
            Some((start, end)) => command.arg(start).arg(end),
            None => command,
        }
    }

    /// `BITFIELD key GET encoding offset`, e.g. encoding `"u8"` or `"i16"`.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/bitfield/>
    fn bitfield_get(key: impl IntoArg, encoding: &str, offset: impl IntoArg) -> Vec<Option<i64>> {
        Command::new("BITFIELD").arg(key).arg("GET").arg(encoding).arg(offset)
    }

    /// `BITFIELD key SET encoding offset value`; yields the previous value.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/bitfield/>
    fn bitfield_set(
        key: impl IntoArg,
        encoding: &str,
        offset: impl IntoArg,
        value: i64
    ) -> Vec<Option<i64>> {
        Command::new("BITFIELD")
            .arg(key)
            .arg("SET")
            .arg(encoding)
            .arg(offset)
            .arg(value)
    }

    /// Ref: <https://redis.io/docs/latest/commands/bitop/>
    fn bitop(
        operation: BitOperation,
        destination: impl IntoArg,
        keys: impl IntoIterator<Item = impl IntoArg>
    ) -> i64 {
        Command::new("BITOP").arg(operation).arg(destination).args_from(keys)
    }

    /// Position of the first bit set to `bit`. `end` is only sent together with `start`.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/bitpos/>
    fn bitpos(key: impl IntoArg, bit: bool, start: Option<i64>, end: Option<i64>) -> i64 {
        let command = Command::new("BITPOS").arg(key).arg(u8::from(bit));
        match (start, end) {
            (Some(start), Some(end)) => command.arg(start).arg(end),
            (Some(start), None) => command.arg(start),
            (None, _) => command,
        }
    }

    /// Ref: <https://redis.io/docs/latest/commands/getbit/>
    fn getbit(key: impl IntoArg, offset: u64) -> bool {
        Command::new("GETBIT").arg(key).arg(offset)
    }

    /// Sets or clears one bit and returns its previous value.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/setbit/>
    fn setbit(key: impl IntoArg, offset: u64, value: bool) -> bool {
        Command::new("SETBIT").arg(key).arg(offset).arg(u8::from(value))
    }
}
