use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rediskit::commands::{hashes, keys, server, strings};
use rediskit::{Client, Config, Error, ScanOptions};

#[derive(Parser, Debug)]
#[command(version, about = "Send typed commands to a Redis-compatible store")]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Check the store is reachable
    Ping,
    /// Print the value of a key
    Get { key: String },
    /// Set a key, optionally expiring after some seconds
    Set {
        key: String,
        value: String,
        #[arg(long)]
        ex: Option<u64>,
    },
    /// Delete keys and print how many existed
    Del {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Iterate the whole key space
    Scan {
        #[arg(long = "match")]
        pattern: Option<String>,
        #[arg(long)]
        count: Option<u64>,
        #[arg(long = "type")]
        value_type: Option<String>,
    },
    /// Print every field of a hash
    Hgetall { key: String },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let args = Args::parse();
    let client = Client::connect(args.config).await?;

    let result = run(&client, args.command).await;
    client.close();
    result
}

async fn run(client: &Client, command: Cmd) -> Result<(), Error> {
    match command {
        Cmd::Ping => println!("{}", client.send(server::ping(None)).await?),
        Cmd::Get { key } => match client.send(strings::get(key)).await? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Cmd::Set { key, value, ex } => {
            match ex {
                Some(seconds) => client.send(strings::setex(key, seconds, value)).await?,
                None => client.send(strings::set(key, value)).await?,
            }
            println!("OK");
        }
        Cmd::Del { keys: names } => println!("{}", client.send(keys::del(names)).await?),
        Cmd::Scan {
            pattern,
            count,
            value_type,
        } => {
            let options = ScanOptions { pattern, count };
            let mut found = Box::pin(client.scan_keys(options, value_type).into_stream());
            while let Some(key) = found.try_next().await? {
                println!("{}", key);
            }
        }
        Cmd::Hgetall { key } => {
            for pair in client.send(hashes::hgetall_pairs(key)).await? {
                println!("{}\t{}", pair.field, pair.value);
            }
        }
    }

    Ok(())
}
