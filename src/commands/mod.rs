//! Typed operations, one per store command, grouped by data-type family.
//!
//! Every operation exists twice: as a free function building a [`Request`] (usable on its own
//! or queued inside a transaction) and as a [`Client`] method sending that request.
//!
//! [`Request`]: crate::command::Request
//! [`Client`]: crate::client::Client

/// Declares request builders and the matching `Client` methods.
///
/// Each entry reads like a function whose body evaluates to either a `Command`, decoded with
/// the [`Decode`](crate::decode::Decode) rule of the declared output, or a ready `Request`.
macro_rules! requests {
    ($(
        $(#[$meta:meta])*
        fn $name:ident($($arg:ident: $ty:ty),* $(,)?) -> $out:ty $body:block
    )*) => {
        $(
            $(#[$meta])*
            pub fn $name($($arg: $ty),*) -> $crate::command::Request<$out> {
                $crate::command::Request::from($body)
            }
        )*

        impl $crate::client::Client {
            $(
                $(#[$meta])*
                pub async fn $name(&self, $($arg: $ty),*) -> $crate::Result<$out> {
                    self.send($name($($arg),*)).await
                }
            )*
        }
    };
}

pub mod bits;
pub mod hashes;
pub mod keys;
pub mod lists;
pub mod server;
pub mod sets;
pub mod sorted_sets;
pub mod strings;
