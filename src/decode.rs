//! Decode rules turning a [`Frame`] into the value an operation declares as its result.
//!
//! A rule is picked by the Rust type the caller asks for, never by looking at the reply. When
//! the reply's shape differs from what the rule accepts the rule fails with
//! [`Error::UnexpectedReply`]; error replies are always surfaced as [`Error::Store`].

use bytes::Bytes;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::str::{self, FromStr};
use std::time::Duration;

use crate::error::Error;
use crate::frame::Frame;
use crate::Result;

pub trait Decode: Sized {
    fn decode(frame: Frame) -> Result<Self>;
}

/// Types that can be built from the elements of an array reply.
///
/// Scalars decode element by element; paired records consume two adjacent elements each.
pub trait FromArray: Sized {
    fn from_items(items: Vec<Frame>) -> Result<Vec<Self>>;
}

/// Fails with the store's own message when the reply is an error, and with a shape mismatch
/// otherwise.
pub(crate) fn mismatch<T>(expected: &str, frame: Frame) -> Result<T> {
    match frame {
        Frame::Error(message) => Err(Error::Store(message)),
        frame => Err(Error::unexpected(expected, &frame)),
    }
}

/// Splits a flat array into adjacent 2-tuples. Odd lengths are rejected, never truncated.
pub fn pairs(items: Vec<Frame>) -> Result<Vec<(Frame, Frame)>> {
    if items.len() % 2 != 0 {
        return Err(Error::unexpected("even-length array", &Frame::Array(items)));
    }
    Ok(items.into_iter().tuples().collect())
}

fn utf8(bytes: Bytes) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::Protocol("bulk string is not valid UTF-8".to_string()))
}

fn parse_float(text: &str) -> Result<f64> {
    f64::from_str(text).map_err(|_| Error::Protocol(format!("invalid float {:?}", text)))
}

impl Decode for Frame {
    fn decode(frame: Frame) -> Result<Self> {
        Ok(frame)
    }
}

/// Accepts only the `+OK` status.
impl Decode for () {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Simple(s) if s == "OK" => Ok(()),
            frame => mismatch("status OK", frame),
        }
    }
}

/// `+OK` when a conditional write happened, nil when its condition was not met.
pub fn applied(frame: Frame) -> Result<bool> {
    match frame {
        Frame::Simple(s) if s == "OK" => Ok(true),
        Frame::Null => Ok(false),
        frame => mismatch("status OK or nil", frame),
    }
}

/// Status text other than `OK`, e.g. the reply of `BGSAVE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status(pub String);

impl Decode for Status {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Simple(s) => Ok(Status(s)),
            frame => mismatch("status", frame),
        }
    }
}

impl Decode for String {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Bulk(bytes) => utf8(bytes),
            Frame::Simple(s) => Ok(s),
            frame => mismatch("string", frame),
        }
    }
}

impl Decode for Bytes {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Bulk(bytes) => Ok(bytes),
            frame => mismatch("bulk string", frame),
        }
    }
}

impl Decode for i64 {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Integer(i) => Ok(i),
            frame => mismatch("integer", frame),
        }
    }
}

/// The protocol's 1/0 integer convention. Any other integer is a mismatch.
impl Decode for bool {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Integer(1) => Ok(true),
            Frame::Integer(0) => Ok(false),
            frame => mismatch("integer 0 or 1", frame),
        }
    }
}

/// Floats travel as bulk text in RESP2 and as doubles in RESP3.
impl Decode for f64 {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Bulk(bytes) => {
                let text = str::from_utf8(&bytes)
                    .map_err(|_| Error::Protocol("float is not valid UTF-8".to_string()))?;
                parse_float(text)
            }
            Frame::Double(text) => parse_float(&text),
            frame => mismatch("float", frame),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Null => Ok(None),
            frame => T::decode(frame).map(Some),
        }
    }
}

impl<T: FromArray> Decode for Vec<T> {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Array(items) => T::from_items(items),
            frame => mismatch("array", frame),
        }
    }
}

impl<T: Decode + Eq + Hash> Decode for HashSet<T> {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Array(items) => items.into_iter().map(T::decode).collect(),
            frame => mismatch("array", frame),
        }
    }
}

impl Decode for HashMap<String, String> {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Array(items) => pairs(items)?
                .into_iter()
                .map(|(field, value)| Ok((String::decode(field)?, String::decode(value)?)))
                .collect(),
            frame => mismatch("array", frame),
        }
    }
}

macro_rules! elementwise {
    ($($ty:ty),*) => {
        $(
            impl FromArray for $ty {
                fn from_items(items: Vec<Frame>) -> Result<Vec<Self>> {
                    items.into_iter().map(<$ty>::decode).collect()
                }
            }
        )*
    };
}

elementwise!(Frame, String, Bytes, i64, bool, f64, Status);

impl<T: Decode> FromArray for Option<T> {
    fn from_items(items: Vec<Frame>) -> Result<Vec<Self>> {
        items.into_iter().map(Option::<T>::decode).collect()
    }
}

impl<T: FromArray> FromArray for Vec<T> {
    fn from_items(items: Vec<Frame>) -> Result<Vec<Self>> {
        items.into_iter().map(Vec::<T>::decode).collect()
    }
}

/// A hash field and its value, rebuilt from two adjacent array elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldValue {
    pub field: String,
    pub value: String,
}

impl FromArray for FieldValue {
    fn from_items(items: Vec<Frame>) -> Result<Vec<Self>> {
        pairs(items)?
            .into_iter()
            .map(|(field, value)| {
                Ok(FieldValue {
                    field: String::decode(field)?,
                    value: String::decode(value)?,
                })
            })
            .collect()
    }
}

/// A sorted-set member and its score, rebuilt from two adjacent array elements.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberScore {
    pub member: String,
    pub score: f64,
}

impl FromArray for MemberScore {
    fn from_items(items: Vec<Frame>) -> Result<Vec<Self>> {
        pairs(items)?
            .into_iter()
            .map(|(member, score)| {
                Ok(MemberScore {
                    member: String::decode(member)?,
                    score: f64::decode(score)?,
                })
            })
            .collect()
    }
}

/// Reply of the blocking list pops: the key that served the pop and the popped element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl Decode for KeyValue {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Array(items) => match <[Frame; 2]>::try_from(items) {
                Ok([key, value]) => Ok(KeyValue {
                    key: String::decode(key)?,
                    value: String::decode(value)?,
                }),
                Err(items) => mismatch("array of key and element", Frame::Array(items)),
            },
            frame => mismatch("array of key and element", frame),
        }
    }
}

/// Reply of the blocking sorted-set pops.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyMemberScore {
    pub key: String,
    pub member: String,
    pub score: f64,
}

impl Decode for KeyMemberScore {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Array(items) => match <[Frame; 3]>::try_from(items) {
                Ok([key, member, score]) => Ok(KeyMemberScore {
                    key: String::decode(key)?,
                    member: String::decode(member)?,
                    score: f64::decode(score)?,
                }),
                Err(items) => mismatch("array of key, member and score", Frame::Array(items)),
            },
            frame => mismatch("array of key, member and score", frame),
        }
    }
}

/// Remaining time to live of a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ttl {
    /// The key does not exist.
    Missing,
    /// The key exists and never expires.
    NoExpiry,
    ExpiresIn(Duration),
}

impl Ttl {
    fn from_reply(frame: Frame, unit: fn(u64) -> Duration) -> Result<Ttl> {
        match frame {
            Frame::Integer(-2) => Ok(Ttl::Missing),
            Frame::Integer(-1) => Ok(Ttl::NoExpiry),
            Frame::Integer(n) if n >= 0 => Ok(Ttl::ExpiresIn(unit(n as u64))),
            frame => mismatch("integer ttl", frame),
        }
    }

    pub fn from_seconds(frame: Frame) -> Result<Ttl> {
        Ttl::from_reply(frame, Duration::from_secs)
    }

    pub fn from_millis(frame: Frame) -> Result<Ttl> {
        Ttl::from_reply(frame, Duration::from_millis)
    }
}

/// One matched range pair of an `LCS ... IDX` reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LcsMatch {
    pub first: (i64, i64),
    pub second: (i64, i64),
    pub len: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LcsMatches {
    pub matches: Vec<LcsMatch>,
    pub len: i64,
}

fn range(frame: Frame) -> Result<(i64, i64)> {
    match frame {
        Frame::Array(items) => match <[Frame; 2]>::try_from(items) {
            Ok([start, end]) => Ok((i64::decode(start)?, i64::decode(end)?)),
            Err(items) => mismatch("range of two integers", Frame::Array(items)),
        },
        frame => mismatch("range of two integers", frame),
    }
}

impl Decode for LcsMatch {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Array(mut items) => {
                // WITHMATCHLEN appends the match length as a third element.
                let len = match items.len() {
                    3 => items.pop().map(i64::decode).transpose()?,
                    _ => None,
                };
                match <[Frame; 2]>::try_from(items) {
                    Ok([first, second]) => Ok(LcsMatch {
                        first: range(first)?,
                        second: range(second)?,
                        len,
                    }),
                    Err(items) => mismatch("lcs match", Frame::Array(items)),
                }
            }
            frame => mismatch("lcs match", frame),
        }
    }
}

impl FromArray for LcsMatch {
    fn from_items(items: Vec<Frame>) -> Result<Vec<Self>> {
        items.into_iter().map(LcsMatch::decode).collect()
    }
}

/// The nested `["matches", [...], "len", n]` reply.
impl Decode for LcsMatches {
    fn decode(frame: Frame) -> Result<Self> {
        let items = match frame {
            Frame::Array(items) => items,
            frame => return mismatch("lcs idx map", frame),
        };

        let mut matches = None;
        let mut len = None;
        for (name, value) in pairs(items)? {
            match String::decode(name)?.as_str() {
                "matches" => matches = Some(Vec::<LcsMatch>::decode(value)?),
                "len" => len = Some(i64::decode(value)?),
                _ => {}
            }
        }

        match (matches, len) {
            (Some(matches), Some(len)) => Ok(LcsMatches { matches, len }),
            _ => Err(Error::Protocol("lcs idx reply misses matches or len".to_string())),
        }
    }
}
