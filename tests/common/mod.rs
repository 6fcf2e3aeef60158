#![allow(dead_code)]

use bytes::Bytes;
use futures::StreamExt;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::FramedRead;

use rediskit::codec::FrameCodec;
use rediskit::{Client, Config, Frame};

const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// An in-process store speaking enough of the protocol to exercise the client.
///
/// Besides the regular commands it understands `DROP`, which closes the connection without a
/// reply.
#[derive(Clone)]
pub struct FakeStore {
    pub addr: SocketAddr,
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    values: BTreeMap<String, Value>,
    versions: HashMap<String, u64>,
    connections: usize,
    password: Option<String>,
}

enum Value {
    String(Bytes),
    Hash(Vec<(String, String)>),
    Set(BTreeSet<String>),
}

impl FakeStore {
    pub async fn start() -> FakeStore {
        FakeStore::start_with_password(None).await
    }

    pub async fn start_with_password(password: Option<&str>) -> FakeStore {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State {
            password: password.map(str::to_string),
            ..State::default()
        }));

        tokio::spawn({
            let state = state.clone();
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    state.lock().unwrap().connections += 1;
                    tokio::spawn(serve(socket, state.clone()));
                }
            }
        });

        FakeStore { addr, state }
    }

    pub fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }

    pub fn config(&self) -> Config {
        Config::new(self.url())
    }

    pub async fn client(&self) -> Client {
        Client::connect(self.config()).await.unwrap()
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.state.lock().unwrap().connections
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().values.len()
    }
}

#[derive(Default)]
struct Session {
    watched: Vec<(String, u64)>,
    queue: Option<Vec<Vec<String>>>,
    dirty: bool,
}

async fn serve(stream: TcpStream, state: Arc<Mutex<State>>) {
    let (read, mut write) = stream.into_split();
    let mut frames = FramedRead::new(read, FrameCodec::new(MAX_FRAME_SIZE));
    let mut session = Session::default();

    while let Some(Ok(frame)) = frames.next().await {
        let args = match to_args(frame) {
            Some(args) if !args.is_empty() => args,
            _ => return,
        };

        let reply = {
            let mut state = state.lock().unwrap();
            match session.handle(&mut state, &args) {
                Some(reply) => reply,
                None => return,
            }
        };

        if write.write_all(&reply.serialize()).await.is_err() {
            return;
        }
    }
}

fn to_args(frame: Frame) -> Option<Vec<String>> {
    match frame {
        Frame::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Frame::Bulk(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

fn ok() -> Frame {
    Frame::Simple("OK".to_string())
}

fn err(message: &str) -> Frame {
    Frame::Error(message.to_string())
}

fn bulk(s: &str) -> Frame {
    Frame::Bulk(Bytes::copy_from_slice(s.as_bytes()))
}

const KNOWN: &[&str] = &[
    "PING", "AUTH", "SELECT", "GET", "SET", "SETEX", "DEL", "EXISTS", "INCR", "TYPE", "HSET",
    "HGETALL", "HSCAN", "SADD", "SMEMBERS", "SSCAN", "SCAN",
];

impl Session {
    fn handle(&mut self, state: &mut State, args: &[String]) -> Option<Frame> {
        let name = args[0].to_uppercase();

        let reply = match name.as_str() {
            "DROP" => return None,
            "WATCH" if self.queue.is_some() => err("ERR WATCH inside MULTI is not allowed"),
            "WATCH" => {
                for key in &args[1..] {
                    self.watched.push((key.clone(), state.version(key)));
                }
                ok()
            }
            "UNWATCH" => {
                self.watched.clear();
                ok()
            }
            "MULTI" if self.queue.is_some() => err("ERR MULTI calls can not be nested"),
            "MULTI" => {
                self.queue = Some(Vec::new());
                self.dirty = false;
                ok()
            }
            "DISCARD" => match self.queue.take() {
                Some(_) => {
                    self.watched.clear();
                    ok()
                }
                None => err("ERR DISCARD without MULTI"),
            },
            "EXEC" => {
                let queue = match self.queue.take() {
                    Some(queue) => queue,
                    None => return Some(err("ERR EXEC without MULTI")),
                };
                let watched = std::mem::take(&mut self.watched);

                if self.dirty {
                    err("EXECABORT Transaction discarded because of previous errors.")
                } else if watched.iter().any(|(key, v)| state.version(key) != *v) {
                    Frame::Null
                } else {
                    Frame::Array(queue.iter().map(|args| state.apply(args)).collect())
                }
            }
            _ => match &mut self.queue {
                Some(_) if !KNOWN.contains(&name.as_str()) => {
                    self.dirty = true;
                    err(&format!("ERR unknown command '{}'", args[0]))
                }
                Some(queue) => {
                    queue.push(args.to_vec());
                    Frame::Simple("QUEUED".to_string())
                }
                None => state.apply(args),
            },
        };

        Some(reply)
    }
}

impl State {
    fn version(&self, key: &str) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }

    fn touch(&mut self, key: &str) {
        *self.versions.entry(key.to_string()).or_default() += 1;
    }

    fn apply(&mut self, args: &[String]) -> Frame {
        let name = args[0].to_uppercase();
        let args = &args[1..];

        match name.as_str() {
            "PING" => match args.first() {
                Some(message) => bulk(message),
                None => Frame::Simple("PONG".to_string()),
            },
            "AUTH" => match (&self.password, args.last()) {
                (Some(expected), Some(given)) if expected == given => ok(),
                _ => err("WRONGPASS invalid username-password pair"),
            },
            "SELECT" => ok(),
            "GET" => match self.values.get(&args[0]) {
                Some(Value::String(data)) => Frame::Bulk(data.clone()),
                Some(_) => wrong_type(),
                None => Frame::Null,
            },
            "SET" => self.set(args),
            "SETEX" => {
                let value = Bytes::from(args[2].clone());
                self.values.insert(args[0].clone(), Value::String(value));
                self.touch(&args[0]);
                ok()
            }
            "DEL" => {
                let mut removed = 0;
                for key in args {
                    if self.values.remove(key).is_some() {
                        self.touch(key);
                        removed += 1;
                    }
                }
                Frame::Integer(removed)
            }
            "EXISTS" => Frame::Integer(
                args.iter()
                    .filter(|key| self.values.contains_key(*key))
                    .count() as i64,
            ),
            "INCR" => {
                let current = match self.values.get(&args[0]) {
                    Some(Value::String(data)) => match std::str::from_utf8(data)
                        .ok()
                        .and_then(|s| s.parse::<i64>().ok())
                    {
                        Some(n) => n,
                        None => return err("ERR value is not an integer or out of range"),
                    },
                    Some(_) => return wrong_type(),
                    None => 0,
                };
                let next = current + 1;
                self.values
                    .insert(args[0].clone(), Value::String(Bytes::from(next.to_string())));
                self.touch(&args[0]);
                Frame::Integer(next)
            }
            "TYPE" => Frame::Simple(
                match self.values.get(&args[0]) {
                    Some(Value::String(_)) => "string",
                    Some(Value::Hash(_)) => "hash",
                    Some(Value::Set(_)) => "set",
                    None => "none",
                }
                .to_string(),
            ),
            "HSET" => {
                let entry = self
                    .values
                    .entry(args[0].clone())
                    .or_insert_with(|| Value::Hash(Vec::new()));
                let fields = match entry {
                    Value::Hash(fields) => fields,
                    _ => return wrong_type(),
                };
                let mut added = 0;
                for pair in args[1..].chunks(2) {
                    match fields.iter_mut().find(|(field, _)| *field == pair[0]) {
                        Some((_, value)) => *value = pair[1].clone(),
                        None => {
                            fields.push((pair[0].clone(), pair[1].clone()));
                            added += 1;
                        }
                    }
                }
                self.touch(&args[0]);
                Frame::Integer(added)
            }
            "HGETALL" => match self.values.get(&args[0]) {
                Some(Value::Hash(fields)) => Frame::Array(
                    fields
                        .iter()
                        .flat_map(|(field, value)| [bulk(field), bulk(value)])
                        .collect(),
                ),
                Some(_) => wrong_type(),
                None => Frame::Array(vec![]),
            },
            "SADD" => {
                let entry = self
                    .values
                    .entry(args[0].clone())
                    .or_insert_with(|| Value::Set(BTreeSet::new()));
                let members = match entry {
                    Value::Set(members) => members,
                    _ => return wrong_type(),
                };
                let added = args[1..]
                    .iter()
                    .filter(|member| members.insert((*member).clone()))
                    .count();
                self.touch(&args[0]);
                Frame::Integer(added as i64)
            }
            "SMEMBERS" => match self.values.get(&args[0]) {
                Some(Value::Set(members)) => Frame::Array(members.iter().map(|m| bulk(m)).collect()),
                Some(_) => wrong_type(),
                None => Frame::Array(vec![]),
            },
            "SCAN" => {
                let keys: Vec<String> = self.values.keys().cloned().collect();
                let options = match ScanArgs::parse(&args[1..]) {
                    Ok(options) => options,
                    Err(reply) => return reply,
                };
                let wanted_type = options.value_type.clone();
                scan_page(&keys, &args[0], &options, |key| match &wanted_type {
                    Some(t) => match self.values.get(key) {
                        Some(Value::String(_)) => t == "string",
                        Some(Value::Hash(_)) => t == "hash",
                        Some(Value::Set(_)) => t == "set",
                        None => false,
                    },
                    None => true,
                })
                .map(|(cursor, keys)| page_frame(cursor, keys.iter().map(|k| bulk(k)).collect()))
                .unwrap_or_else(|reply| reply)
            }
            "HSCAN" => {
                let options = match ScanArgs::parse(&args[2..]) {
                    Ok(options) => options,
                    Err(reply) => return reply,
                };
                let fields = match self.values.get(&args[0]) {
                    Some(Value::Hash(fields)) => fields.clone(),
                    Some(_) => return wrong_type(),
                    None => Vec::new(),
                };
                scan_page(&fields, &args[1], &options, |_| true)
                    .map(|(cursor, fields)| {
                        page_frame(
                            cursor,
                            fields
                                .iter()
                                .filter(|(field, _)| options.matches(field))
                                .flat_map(|(field, value)| [bulk(field), bulk(value)])
                                .collect(),
                        )
                    })
                    .unwrap_or_else(|reply| reply)
            }
            "SSCAN" => {
                let options = match ScanArgs::parse(&args[2..]) {
                    Ok(options) => options,
                    Err(reply) => return reply,
                };
                let members: Vec<String> = match self.values.get(&args[0]) {
                    Some(Value::Set(members)) => members.iter().cloned().collect(),
                    Some(_) => return wrong_type(),
                    None => Vec::new(),
                };
                scan_page(&members, &args[1], &options, |_| true)
                    .map(|(cursor, members)| {
                        page_frame(cursor, members.iter().map(|m| bulk(m)).collect())
                    })
                    .unwrap_or_else(|reply| reply)
            }
            _ => err(&format!("ERR unknown command '{}'", name)),
        }
    }

    fn set(&mut self, args: &[String]) -> Frame {
        let (key, value) = (&args[0], &args[1]);
        let flags: Vec<String> = args[2..].iter().map(|a| a.to_uppercase()).collect();
        let nx = flags.iter().any(|f| f == "NX");
        let xx = flags.iter().any(|f| f == "XX");
        let get = flags.iter().any(|f| f == "GET");

        let old = match self.values.get(key) {
            Some(Value::String(data)) => Some(data.clone()),
            Some(_) if get => return wrong_type(),
            Some(_) => None,
            None => None,
        };
        let exists = self.values.contains_key(key);

        let applies = !(nx && exists) && !(xx && !exists);
        if applies {
            self.values
                .insert(key.clone(), Value::String(Bytes::from(value.clone())));
            self.touch(key);
        }

        match (get, applies) {
            (true, _) => old.map(Frame::Bulk).unwrap_or(Frame::Null),
            (false, true) => ok(),
            (false, false) => Frame::Null,
        }
    }
}

fn wrong_type() -> Frame {
    err("WRONGTYPE Operation against a key holding the wrong kind of value")
}

struct ScanArgs {
    pattern: Option<String>,
    count: usize,
    value_type: Option<String>,
}

impl ScanArgs {
    fn parse(args: &[String]) -> Result<ScanArgs, Frame> {
        let mut options = ScanArgs {
            pattern: None,
            count: 10,
            value_type: None,
        };

        let mut args: VecDeque<&String> = args.iter().collect();
        while let Some(token) = args.pop_front() {
            let value = args.pop_front().ok_or_else(|| err("ERR syntax error"))?;
            match token.to_uppercase().as_str() {
                "MATCH" => options.pattern = Some(value.clone()),
                "COUNT" => {
                    options.count = value
                        .parse()
                        .ok()
                        .filter(|count| *count > 0)
                        .ok_or_else(|| err("ERR value is out of range"))?
                }
                "TYPE" => options.value_type = Some(value.to_lowercase()),
                _ => return Err(err("ERR syntax error")),
            }
        }

        Ok(options)
    }

    fn matches(&self, item: &str) -> bool {
        match &self.pattern {
            Some(pattern) => glob_match::glob_match(pattern, item),
            None => true,
        }
    }
}

/// Cursor-paged view over `items`. The cursor is the index of the next item, `0` at the end.
fn scan_page<'a, T>(
    items: &'a [T],
    cursor: &str,
    options: &ScanArgs,
    keep: impl Fn(&T) -> bool,
) -> Result<(String, Vec<&'a T>), Frame>
where
    T: AsScanItem,
{
    let start: usize = cursor.parse().map_err(|_| err("ERR invalid cursor"))?;
    let end = (start + options.count).min(items.len());
    let page = items
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .filter(|item| keep(*item) && item.matches_pattern(options))
        .collect();
    let next = if end >= items.len() { 0 } else { end };

    Ok((next.to_string(), page))
}

trait AsScanItem {
    fn matches_pattern(&self, options: &ScanArgs) -> bool;
}

impl AsScanItem for String {
    fn matches_pattern(&self, options: &ScanArgs) -> bool {
        options.matches(self)
    }
}

impl AsScanItem for (String, String) {
    // Hash pages are filtered by field after the page is cut.
    fn matches_pattern(&self, _: &ScanArgs) -> bool {
        true
    }
}

fn page_frame(cursor: String, items: Vec<Frame>) -> Frame {
    Frame::Array(vec![bulk(&cursor), Frame::Array(items)])
}

/// A store that answers each command, on any connection, with the next canned reply and
/// records the commands it received. It closes the connection once out of replies.
#[derive(Clone)]
pub struct ScriptedStore {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedStore {
    pub async fn start(replies: Vec<&'static str>) -> ScriptedStore {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let replies = Arc::new(Mutex::new(VecDeque::from(replies)));

        tokio::spawn({
            let received = received.clone();
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    tokio::spawn(replay(socket, replies.clone(), received.clone()));
                }
            }
        });

        ScriptedStore { addr, received }
    }

    pub fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }

    pub async fn client(&self) -> Client {
        Client::connect(Config::new(self.url())).await.unwrap()
    }

    pub fn received(&self) -> Vec<Vec<String>> {
        self.received.lock().unwrap().clone()
    }
}

async fn replay(
    stream: TcpStream,
    replies: Arc<Mutex<VecDeque<&'static str>>>,
    received: Arc<Mutex<Vec<Vec<String>>>>,
) {
    let (read, mut write) = stream.into_split();
    let mut frames = FramedRead::new(read, FrameCodec::new(MAX_FRAME_SIZE));

    while let Some(Ok(frame)) = frames.next().await {
        if let Some(args) = to_args(frame) {
            received.lock().unwrap().push(args);
        }

        let reply = replies.lock().unwrap().pop_front();
        match reply {
            Some(bytes) => {
                if write.write_all(bytes.as_bytes()).await.is_err() {
                    return;
                }
            }
            None => return,
        }
    }
}
