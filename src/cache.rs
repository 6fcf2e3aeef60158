use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::Client;
use crate::commands::{keys, strings};
use crate::Result;

pub const DEFAULT_LIFE: Duration = Duration::from_secs(60);

/// A string cache whose entries live in the store and expire on their own.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    pub fn new(client: Client) -> RedisCache {
        RedisCache { client }
    }

    /// Stores `value` for `life`, rounded down to whole seconds but never below one.
    pub async fn save(&self, key: &str, value: &str, life: Duration) -> Result<()> {
        let seconds = life.as_secs().max(1);
        self.client
            .send(strings::setex(key, seconds, value))
            .await
    }

    pub async fn save_default(&self, key: &str, value: &str) -> Result<()> {
        self.save(key, value, DEFAULT_LIFE).await
    }

    /// `None` when the entry is missing or expired.
    pub async fn read(&self, key: &str) -> Result<Option<String>> {
        self.client.send(strings::get(key)).await
    }

    /// Reads the entry, falling back to `fallback` on a miss or on any failure.
    pub async fn read_or(&self, key: &str, fallback: &str) -> String {
        match self.read(key).await {
            Ok(Some(value)) => value,
            Ok(None) => fallback.to_string(),
            Err(err) => {
                debug!(key, error = %err, "cache read failed, using fallback");
                fallback.to_string()
            }
        }
    }

    /// Reads the entry, or generates, stores and returns a fresh one.
    ///
    /// Failing to store the generated value is logged and otherwise ignored; a failing
    /// generator fails the call.
    pub async fn read_or_generate<F, Fut>(&self, key: &str, generator: F, life: Duration) -> Result<String>
    where
        F: FnOnce(&str) -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        match self.read(key).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(err) => debug!(key, error = %err, "cache read failed, regenerating"),
        }

        let value = generator(key).await?;
        if let Err(err) = self.save(key, &value, life).await {
            warn!(key, error = %err, "failed to cache generated value");
        }
        Ok(value)
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.client.send(keys::del([key])).await.map(|_| ())
    }
}
