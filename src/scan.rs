use bytes::Bytes;
use futures::stream::{self, Stream, TryStreamExt};

use crate::client::Client;
use crate::command::{Command, IntoArg, Request};
use crate::decode::{mismatch, Decode, FieldValue, FromArray, MemberScore};
use crate::frame::Frame;
use crate::{Error, Result};

/// Opaque scan position handed back by the store. Only `"0"` carries meaning: the end.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub fn start() -> Cursor {
        Cursor("0".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_end(&self) -> bool {
        self.0 == "0"
    }
}

impl From<&str> for Cursor {
    fn from(cursor: &str) -> Cursor {
        Cursor(cursor.to_string())
    }
}

impl From<String> for Cursor {
    fn from(cursor: String) -> Cursor {
        Cursor(cursor)
    }
}

impl IntoArg for &Cursor {
    fn into_arg(self) -> Bytes {
        Bytes::copy_from_slice(self.0.as_bytes())
    }
}

/// One page of a scan: the cursor to resume from and the items of this page.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanPage<T> {
    pub cursor: Cursor,
    pub items: Vec<T>,
}

impl<T> ScanPage<T> {
    pub fn is_last(&self) -> bool {
        self.cursor.is_end()
    }
}

impl<T: FromArray> Decode for ScanPage<T> {
    fn decode(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Array(parts) => match <[Frame; 2]>::try_from(parts) {
                Ok([cursor, items]) => Ok(ScanPage {
                    cursor: Cursor(String::decode(cursor)?),
                    items: Vec::<T>::decode(items)?,
                }),
                Err(parts) => mismatch("array of cursor and items", Frame::Array(parts)),
            },
            frame => mismatch("array of cursor and items", frame),
        }
    }
}

/// Filters shared by every scan command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub pattern: Option<String>,
    pub count: Option<u64>,
}

impl ScanOptions {
    pub fn pattern(mut self, pattern: impl Into<String>) -> ScanOptions {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn count(mut self, count: u64) -> ScanOptions {
        self.count = Some(count);
        self
    }

    fn apply(&self, command: Command) -> Command {
        // An empty pattern matches nothing useful, so it is not sent at all.
        let pattern = self.pattern.as_deref().filter(|p| !p.is_empty());
        command.option("MATCH", pattern).option("COUNT", self.count)
    }
}

/// Ref: <https://redis.io/docs/latest/commands/scan/>
pub fn scan(
    cursor: &Cursor,
    options: &ScanOptions,
    value_type: Option<&str>,
) -> Request<ScanPage<String>> {
    let command = options
        .apply(Command::new("SCAN").arg(cursor))
        .option("TYPE", value_type);
    Request::new(command)
}

/// Ref: <https://redis.io/docs/latest/commands/hscan/>
pub fn hscan(
    key: impl IntoArg,
    cursor: &Cursor,
    options: &ScanOptions,
) -> Request<ScanPage<FieldValue>> {
    Request::new(options.apply(Command::new("HSCAN").arg(key).arg(cursor)))
}

/// Ref: <https://redis.io/docs/latest/commands/sscan/>
pub fn sscan(key: impl IntoArg, cursor: &Cursor, options: &ScanOptions) -> Request<ScanPage<String>> {
    Request::new(options.apply(Command::new("SSCAN").arg(key).arg(cursor)))
}

/// Ref: <https://redis.io/docs/latest/commands/zscan/>
pub fn zscan(
    key: impl IntoArg,
    cursor: &Cursor,
    options: &ScanOptions,
) -> Request<ScanPage<MemberScore>> {
    Request::new(options.apply(Command::new("ZSCAN").arg(key).arg(cursor)))
}

/// A scan command together with its fixed arguments, minus the cursor.
pub trait ScanFamily {
    type Item: FromArray;

    fn request(&self, cursor: &Cursor) -> Request<ScanPage<Self::Item>>;
}

#[derive(Clone, Debug, Default)]
pub struct KeyScan {
    pub options: ScanOptions,
    pub value_type: Option<String>,
}

impl ScanFamily for KeyScan {
    type Item = String;

    fn request(&self, cursor: &Cursor) -> Request<ScanPage<String>> {
        scan(cursor, &self.options, self.value_type.as_deref())
    }
}

#[derive(Clone, Debug)]
pub struct HashScan {
    pub key: Bytes,
    pub options: ScanOptions,
}

impl ScanFamily for HashScan {
    type Item = FieldValue;

    fn request(&self, cursor: &Cursor) -> Request<ScanPage<FieldValue>> {
        hscan(&self.key, cursor, &self.options)
    }
}

#[derive(Clone, Debug)]
pub struct SetScan {
    pub key: Bytes,
    pub options: ScanOptions,
}

impl ScanFamily for SetScan {
    type Item = String;

    fn request(&self, cursor: &Cursor) -> Request<ScanPage<String>> {
        sscan(&self.key, cursor, &self.options)
    }
}

#[derive(Clone, Debug)]
pub struct SortedSetScan {
    pub key: Bytes,
    pub options: ScanOptions,
}

impl ScanFamily for SortedSetScan {
    type Item = MemberScore;

    fn request(&self, cursor: &Cursor) -> Request<ScanPage<MemberScore>> {
        zscan(&self.key, cursor, &self.options)
    }
}

/// Drives a scan from the start cursor until the store reports the end.
///
/// Each page is fetched through its own lease, so nothing is held between pages and dropping
/// the scanner simply stops the iteration. Items changed while scanning may be seen zero, one
/// or more times.
pub struct Scanner<F> {
    client: Client,
    family: F,
    // `None` once the end was reached.
    cursor: Option<Cursor>,
}

impl<F: ScanFamily> Scanner<F> {
    pub fn new(client: Client, family: F) -> Scanner<F> {
        Scanner {
            client,
            family,
            cursor: Some(Cursor::start()),
        }
    }

    pub fn is_done(&self) -> bool {
        self.cursor.is_none()
    }

    /// Fetches the next page, or `None` after the last one. A failed fetch can be retried; the
    /// cursor only moves forward on success.
    pub async fn next_page(&mut self) -> Result<Option<ScanPage<F::Item>>> {
        let cursor = match self.cursor.take() {
            Some(cursor) => cursor,
            None => return Ok(None),
        };

        match self.client.send(self.family.request(&cursor)).await {
            Ok(page) => {
                if !page.is_last() {
                    self.cursor = Some(page.cursor.clone());
                }
                Ok(Some(page))
            }
            Err(err) => {
                self.cursor = Some(cursor);
                Err(err)
            }
        }
    }

    /// Flattens the remaining pages into a stream of items.
    pub fn into_stream(self) -> impl Stream<Item = Result<F::Item>> {
        stream::try_unfold(self, |mut scanner| async move {
            let page = scanner.next_page().await?;
            let items = page.map(|page| page.items.into_iter().map(Ok::<F::Item, Error>));
            Ok::<_, Error>(items.map(|items| (stream::iter(items), scanner)))
        })
        .try_flatten()
    }

    /// Reads every remaining page.
    pub async fn collect_all(mut self) -> Result<Vec<F::Item>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page.items);
        }
        Ok(items)
    }
}

impl Client {
    /// Ref: <https://redis.io/docs/latest/commands/scan/>
    pub async fn scan(
        &self,
        cursor: &Cursor,
        options: &ScanOptions,
        value_type: Option<&str>,
    ) -> Result<ScanPage<String>> {
        self.send(scan(cursor, options, value_type)).await
    }

    /// Ref: <https://redis.io/docs/latest/commands/hscan/>
    pub async fn hscan(
        &self,
        key: impl IntoArg,
        cursor: &Cursor,
        options: &ScanOptions,
    ) -> Result<ScanPage<FieldValue>> {
        self.send(hscan(key, cursor, options)).await
    }

    /// Ref: <https://redis.io/docs/latest/commands/sscan/>
    pub async fn sscan(
        &self,
        key: impl IntoArg,
        cursor: &Cursor,
        options: &ScanOptions,
    ) -> Result<ScanPage<String>> {
        self.send(sscan(key, cursor, options)).await
    }

    /// Ref: <https://redis.io/docs/latest/commands/zscan/>
    pub async fn zscan(
        &self,
        key: impl IntoArg,
        cursor: &Cursor,
        options: &ScanOptions,
    ) -> Result<ScanPage<MemberScore>> {
        self.send(zscan(key, cursor, options)).await
    }

    pub fn scan_keys(&self, options: ScanOptions, value_type: Option<String>) -> Scanner<KeyScan> {
        Scanner::new(self.clone(), KeyScan { options, value_type })
    }

    pub fn scan_hash(&self, key: impl IntoArg, options: ScanOptions) -> Scanner<HashScan> {
        let key = key.into_arg();
        Scanner::new(self.clone(), HashScan { key, options })
    }

    pub fn scan_set(&self, key: impl IntoArg, options: ScanOptions) -> Scanner<SetScan> {
        let key = key.into_arg();
        Scanner::new(self.clone(), SetScan { key, options })
    }

    pub fn scan_sorted_set(
        &self,
        key: impl IntoArg,
        options: ScanOptions,
    ) -> Scanner<SortedSetScan> {
        let key = key.into_arg();
        Scanner::new(self.clone(), SortedSetScan { key, options })
    }
}
