use futures::future::{self, FutureExt};
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpListener;

use rediskit::commands::{hashes, keys, server, strings};
use rediskit::commands::keys::ValueType;
use rediskit::commands::strings::{SetCondition, SetOptions};
use rediskit::{Client, Command, Config, Error, ErrorKind, Frame, RedisCache, Request};

mod common;

use common::FakeStore;

fn assert_balanced(client: &Client) {
    let status = client.status();
    assert_eq!(status.acquired, status.released, "{:?}", status);
    assert_eq!(status.leased, 0, "{:?}", status);
}

#[tokio::test]
async fn test_typed_commands() {
    let store = FakeStore::start().await;
    let client = store.client().await;

    client.set("greeting", "hello").await.unwrap();
    assert_eq!(client.get("greeting").await.unwrap(), Some("hello".to_string()));
    assert_eq!(client.get("missing").await.unwrap(), None);

    assert_eq!(client.incr("counter").await.unwrap(), 1);
    assert_eq!(client.incr("counter").await.unwrap(), 2);

    assert_eq!(client.hset("h", [("f1", "v1"), ("f2", "v2")]).await.unwrap(), 2);
    let all = client.hgetall("h").await.unwrap();
    assert_eq!(
        all,
        HashMap::from([
            ("f1".to_string(), "v1".to_string()),
            ("f2".to_string(), "v2".to_string()),
        ])
    );

    assert_eq!(client.key_type("h").await.unwrap(), ValueType::Hash);
    assert_eq!(client.key_type("nope").await.unwrap(), ValueType::None);
    assert!(client.exists("greeting").await.unwrap());
    assert_eq!(client.del(["greeting", "missing"]).await.unwrap(), 1);
    assert!(!client.exists("greeting").await.unwrap());

    assert_eq!(client.ping(None).await.unwrap(), "PONG");
    assert_eq!(client.ping(Some("hi")).await.unwrap(), "hi");

    assert_balanced(&client);
}

#[tokio::test]
async fn test_conditional_set() {
    let store = FakeStore::start().await;
    let client = store.client().await;
    let nx = SetOptions::default().condition(SetCondition::Nx);

    assert!(client.set_with("k", "first", nx).await.unwrap());
    assert!(!client.set_with("k", "second", nx).await.unwrap());
    assert_eq!(client.get("k").await.unwrap(), Some("first".to_string()));

    let previous = client
        .set_get("k", "third", SetOptions::default())
        .await
        .unwrap();
    assert_eq!(previous, Some("first".to_string()));
}

#[tokio::test]
async fn test_connections_are_reused() {
    let store = FakeStore::start().await;
    let client = store.client().await;

    for i in 0..10 {
        client.set(format!("k{}", i), i).await.unwrap();
    }

    assert_eq!(store.connections(), 1);
    assert_eq!(client.status().idle, 1);
    assert_balanced(&client);
}

#[tokio::test]
async fn test_store_error_keeps_the_connection() {
    let store = FakeStore::start().await;
    let client = store.client().await;

    client.hset("h", [("f", "v")]).await.unwrap();
    let err = client.get("h").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Store);
    assert!(err.to_string().starts_with("WRONGTYPE"));

    client.ping(None).await.unwrap();
    assert_eq!(store.connections(), 1);
    assert_balanced(&client);
}

#[tokio::test]
async fn test_decode_mismatch_keeps_the_connection() {
    let store = FakeStore::start().await;
    let client = store.client().await;

    client.set("k", "text").await.unwrap();
    let err = client
        .send(Request::<i64>::new(Command::new("GET").arg("k")))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProtocolMismatch);

    client.ping(None).await.unwrap();
    assert_eq!(store.connections(), 1);
    assert_balanced(&client);
}

#[tokio::test]
async fn test_transport_failure_closes_the_connection() {
    let store = FakeStore::start().await;
    let client = store.client().await;

    client.ping(None).await.unwrap();
    let err = client.execute_raw(Command::new("DROP")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(client.status().idle, 0);

    client.ping(None).await.unwrap();
    assert_eq!(store.connections(), 2);
    assert_balanced(&client);
}

#[tokio::test]
async fn test_leases_balance_under_injected_failures() {
    let store = FakeStore::start().await;
    let client = store.client().await;
    client.hset("hash", [("f", "v")]).await.unwrap();

    let mut rng = rand::thread_rng();
    for i in 0..100 {
        let result = match rng.gen_range(0..4) {
            0 => client.set(format!("k{}", i), "v").await.map(|_| ()),
            1 => client.execute_raw(Command::new("DROP")).await.map(|_| ()),
            2 => client.get("hash").await.map(|_| ()),
            _ => client
                .send(Request::<bool>::new(Command::new("PING")))
                .await
                .map(|_| ()),
        };
        let _ = result;

        assert_balanced(&client);
    }

    assert_eq!(client.status().acquired, 101);
}

#[tokio::test]
async fn test_concurrent_calls() {
    let store = FakeStore::start().await;
    let config = Config {
        max_pool_size: 4,
        max_pool_waiting: 64,
        ..store.config()
    };
    let client = Client::connect(config).await.unwrap();

    let calls = (0..50).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.incr("counter").await })
    });
    for result in future::join_all(calls).await {
        result.unwrap().unwrap();
    }

    assert_eq!(client.get("counter").await.unwrap(), Some("50".to_string()));
    assert!(store.connections() <= 4);
    assert_balanced(&client);
}

#[tokio::test]
async fn test_exhausted_pool_fails_without_sending() {
    let store = FakeStore::start().await;
    let config = Config {
        max_pool_size: 1,
        max_pool_waiting: 0,
        ..store.config()
    };
    let client = Client::connect(config).await.unwrap();

    let held = client.lease().await.unwrap();
    let err = client.set("k", "v").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionUnavailable);

    drop(held);
    assert_eq!(client.get("k").await.unwrap(), None);
    client.set("k", "v").await.unwrap();
}

#[tokio::test]
async fn test_waiters_are_bounded() {
    let store = FakeStore::start().await;
    let config = Config {
        max_pool_size: 1,
        max_pool_waiting: 1,
        ..store.config()
    };
    let client = Client::connect(config).await.unwrap();

    let held = client.lease().await.unwrap();
    let waiter = tokio::spawn({
        let client = client.clone();
        async move { client.incr("n").await }
    });

    while client.status().waiting == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let err = client.incr("n").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionUnavailable);

    drop(held);
    assert_eq!(waiter.await.unwrap().unwrap(), 1);
    assert_eq!(client.status().waiting, 0);
    assert_balanced(&client);
}

#[tokio::test]
async fn test_unreachable_store() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = Client::open(&format!("redis://{}", addr)).await.unwrap();
    let err = client.ping(None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConnectionUnavailable);
    assert_eq!(client.status().acquired, 0);
}

#[tokio::test]
async fn test_cancelled_call_closes_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            // Held open but never answered.
            open.push(socket);
        }
    });

    let client = Client::open(&format!("redis://{}", addr)).await.unwrap();
    let result = tokio::time::timeout(Duration::from_millis(50), client.get("k")).await;
    assert!(result.is_err());

    // The dropped call gave its lease back without pooling a half-read channel.
    let status = client.status();
    assert_eq!(status.acquired, 1, "{:?}", status);
    assert_eq!(status.released, 1, "{:?}", status);
    assert_eq!(status.leased, 0, "{:?}", status);
    assert_eq!(status.idle, 0, "{:?}", status);
}

#[tokio::test]
async fn test_invalid_url() {
    let err = Client::open("http://localhost").await.err().unwrap();

    assert_eq!(err.kind(), ErrorKind::ConnectionUnavailable);
}

#[tokio::test]
async fn test_closed_client() {
    let store = FakeStore::start().await;
    let client = store.client().await;

    client.ping(None).await.unwrap();
    client.close();

    let err = client.ping(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionUnavailable);
    assert_eq!(client.status().idle, 0);
}

#[tokio::test]
async fn test_idle_connections_are_reaped() {
    let store = FakeStore::start().await;
    let config = Config {
        pool_cleaner_interval: 50,
        ..store.config()
    };
    let client = Client::connect(config).await.unwrap();

    client.ping(None).await.unwrap();
    assert_eq!(client.status().idle, 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(client.status().idle, 0);

    client.ping(None).await.unwrap();
    assert_eq!(store.connections(), 2);
}

#[tokio::test]
async fn test_with_lease_runs_on_one_connection() {
    let store = FakeStore::start().await;
    let client = store.client().await;

    let value = client
        .with_lease(|lease| {
            async move {
                lease.send(strings::set("a", "1")).await?;
                lease.send(strings::incr("a")).await
            }
            .boxed()
        })
        .await
        .unwrap();

    assert_eq!(value, 2);
    assert_eq!(store.connections(), 1);
    assert_balanced(&client);
}

#[tokio::test]
async fn test_with_lease_releases_on_error() {
    let store = FakeStore::start().await;
    let client = store.client().await;

    let err = client
        .with_lease(|lease| {
            async move {
                lease.send(hashes::hset("h", [("f", "v")])).await?;
                lease.send(strings::incr("h")).await
            }
            .boxed()
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Store);
    assert_balanced(&client);
}

#[tokio::test]
async fn test_execute_raw() {
    let store = FakeStore::start().await;
    let client = store.client().await;

    client.send(keys::del(["x"])).await.unwrap();
    let reply = client
        .execute_raw(Command::new("EXISTS").arg("x"))
        .await
        .unwrap();
    assert_eq!(reply, Frame::Integer(0));

    let err = client
        .execute_raw(Command::new("NOPE"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Store);

    assert_eq!(client.send(server::ping(None)).await.unwrap(), "PONG");
}

#[tokio::test]
async fn test_cache() {
    let store = FakeStore::start().await;
    let cache = RedisCache::new(store.client().await);

    assert_eq!(cache.read("entry").await.unwrap(), None);
    assert_eq!(cache.read_or("entry", "fallback").await, "fallback");

    cache.save_default("entry", "cached").await.unwrap();
    assert_eq!(cache.read("entry").await.unwrap(), Some("cached".to_string()));

    cache.remove("entry").await.unwrap();
    assert_eq!(cache.read("entry").await.unwrap(), None);
}

#[tokio::test]
async fn test_cache_generates_once() {
    let store = FakeStore::start().await;
    let cache = RedisCache::new(store.client().await);
    let life = Duration::from_secs(30);

    let value = cache
        .read_or_generate("answer", |_| async { Ok::<_, Error>("42".to_string()) }, life)
        .await
        .unwrap();
    assert_eq!(value, "42");

    let value = cache
        .read_or_generate("answer", |_| async { Ok::<_, Error>("regenerated".to_string()) }, life)
        .await
        .unwrap();
    assert_eq!(value, "42");
}

#[tokio::test]
async fn test_cache_falls_back_on_failures() {
    let store = FakeStore::start().await;
    let client = store.client().await;
    client.hset("entry", [("f", "v")]).await.unwrap();
    let cache = RedisCache::new(client);

    assert_eq!(cache.read_or("entry", "fallback").await, "fallback");

    let value = cache
        .read_or_generate(
            "entry",
            |key| {
                let generated = format!("fresh {}", key);
                async move { Ok::<_, Error>(generated) }
            },
            Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(value, "fresh entry");
}
