use strum_macros::IntoStaticStr;

use crate::command::{keyword_arg, Command, IntoArg};
use crate::decode::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ClientType {
    Normal,
    Master,
    Replica,
    Pubsub,
}

keyword_arg!(ClientType);

requests! {
    /// Replies `PONG`, or echoes `message`.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/ping/>
    fn ping(message: Option<&str>) -> String {
        Command::new("PING").args_from(message)
    }

    /// Ref: <https://redis.io/docs/latest/commands/client-id/>
    fn client_id() -> i64 {
        Command::new("CLIENT").arg("ID")
    }

    /// Ref: <https://redis.io/docs/latest/commands/client-info/>
    fn client_info() -> String {
        Command::new("CLIENT").arg("INFO")
    }

    /// Ref: <https://redis.io/docs/latest/commands/client-list/>
    fn client_list(client_type: Option<ClientType>) -> String {
        Command::new("CLIENT").arg("LIST").option("TYPE", client_type)
    }

    /// Names the leased connection only; other pooled connections are unaffected.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/client-setname/>
    fn client_setname(name: impl IntoArg) -> () {
        Command::new("CLIENT").arg("SETNAME").arg(name)
    }

    /// Ref: <https://redis.io/docs/latest/commands/client-getname/>
    fn client_getname() -> Option<String> {
        Command::new("CLIENT").arg("GETNAME")
    }

    /// Ref: <https://redis.io/docs/latest/commands/dbsize/>
    fn dbsize() -> i64 {
        Command::new("DBSIZE")
    }

    /// Ref: <https://redis.io/docs/latest/commands/flushdb/>
    fn flushdb(asynchronous: bool) -> () {
        Command::new("FLUSHDB").flag(asynchronous, "ASYNC")
    }

    /// Ref: <https://redis.io/docs/latest/commands/flushall/>
    fn flushall(asynchronous: bool) -> () {
        Command::new("FLUSHALL").flag(asynchronous, "ASYNC")
    }

    /// Ref: <https://redis.io/docs/latest/commands/save/>
    fn save() -> () {
        Command::new("SAVE")
    }

    /// With `schedule`, a save already running makes the store schedule this one for later
    /// instead of failing.
    ///
    /// Ref: <https://redis.io/docs/latest/commands/bgsave/>
    fn bgsave(schedule: bool) -> Status {
        Command::new("BGSAVE").flag(schedule, "SCHEDULE")
    }
}
