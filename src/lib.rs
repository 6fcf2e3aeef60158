pub mod cache;
pub mod client;
pub mod codec;
pub mod command;
pub mod commands;
pub mod config;
pub mod connection;
pub mod decode;
pub mod error;
pub mod frame;
pub mod pool;
pub mod scan;
pub mod transaction;

pub use cache::RedisCache;
pub use client::{Client, Lease};
pub use command::{Command, IntoArg, Limit, Request};
pub use config::Config;
pub use error::{Error, ErrorKind};
pub use frame::Frame;
pub use pool::PoolStatus;
pub use scan::{Cursor, ScanOptions, ScanPage, Scanner};
pub use transaction::{CommitResults, Queued, Transaction, TransactionOutcome, TransactionState};

pub type Result<T> = std::result::Result<T, Error>;
