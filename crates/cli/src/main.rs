//! Command-line client for a keyhub hub and its instances.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::future::Future;
use std::time::Duration;

use clap::{Parser, Subcommand};
use keyhub_sdk::{Config, HubClient, InstanceClient};
use tracing::{Level, debug};

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Hub or instance call failed
    #[error(transparent)]
    Sdk(#[from] keyhub_sdk::Error),

    /// No reply arrived in time
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Hub host name or IP address
    #[arg(long, default_value = keyhub_sdk::DEFAULT_HOST, env = "KEYHUB_HOST")]
    host: String,

    /// Hub port
    #[arg(long, default_value_t = keyhub_sdk::DEFAULT_PORT, env = "KEYHUB_PORT")]
    port: u16,

    /// Log connection lifecycle and traffic
    #[arg(long, short, env = "KEYHUB_VERBOSE")]
    verbose: bool,

    /// Seconds to wait for a reply before giving up
    #[arg(long, default_value_t = 10, env = "KEYHUB_TIMEOUT")]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Control the hub
    Hub {
        #[command(subcommand)]
        command: HubCommand,
    },

    /// Use the key-value instance with the given suffix
    Instance {
        /// Instance suffix, e.g. `1` for `/ws1`
        suffix: String,

        #[command(subcommand)]
        command: InstanceCommand,
    },
}

#[derive(Clone, Debug, Subcommand)]
enum HubCommand {
    /// List running instances
    List,
    /// Start an instance
    Run {
        /// Instance suffix
        suffix: String,
    },
    /// Stop an instance
    Stop {
        /// Instance suffix
        suffix: String,
    },
    /// Check that the hub answers
    Ping,
}

#[derive(Clone, Debug, Subcommand)]
enum InstanceCommand {
    /// List all entries
    List,
    /// Print the value stored under a key
    Get {
        /// Key to read
        key: String,
    },
    /// Store a value
    Set {
        /// Key to write
        key: String,
        /// Value to store
        value: String,
    },
    /// Delete a key
    Remove {
        /// Key to delete
        key: String,
    },
    /// Check that the instance answers
    Ping,
}

async fn run_hub(hub: HubClient, command: HubCommand) -> Result<(), keyhub_sdk::Error> {
    match command {
        HubCommand::List => {
            for url in hub.list().await? {
                println!("{url}");
            }
        }
        HubCommand::Run { suffix } => {
            println!("{}", hub.start(&suffix).await?);
        }
        HubCommand::Stop { suffix } => hub.stop(&suffix).await?,
        HubCommand::Ping => {
            hub.ping().await?;
            println!("pong");
        }
    }

    Ok(())
}

async fn run_instance(
    instance: InstanceClient,
    command: InstanceCommand,
) -> Result<(), keyhub_sdk::Error> {
    match command {
        InstanceCommand::List => {
            for (key, value) in instance.list().await? {
                println!("{key}\t{value}");
            }
        }
        InstanceCommand::Get { key } => println!("{}", instance.get(&key).await?),
        InstanceCommand::Set { key, value } => instance.set(&key, &value).await?,
        InstanceCommand::Remove { key } => instance.remove(&key).await?,
        InstanceCommand::Ping => {
            instance.ping().await?;
            println!("pong");
        }
    }

    Ok(())
}

async fn with_timeout(
    timeout: Duration,
    call: impl Future<Output = Result<(), keyhub_sdk::Error>>,
) -> Result<(), Error> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| Error::Timeout(timeout))?
        .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let config = Config::new(args.host, args.port).verbose(args.verbose);
    let timeout = Duration::from_secs(args.timeout);
    debug!("using hub at {}:{}", config.host, config.port);

    match args.command {
        Command::Hub { command } => {
            let hub = HubClient::connect(config)?;
            with_timeout(timeout, run_hub(hub, command)).await
        }
        Command::Instance { suffix, command } => {
            let instance = InstanceClient::connect(&config, &suffix)?;
            with_timeout(timeout, run_instance(instance, command)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instance_set() {
        let args = Args::try_parse_from(["keyhub", "--port", "9000", "instance", "1", "set", "k1", "v1"])
            .unwrap();

        assert_eq!(args.port, 9000);
        assert_eq!(args.host, "localhost");
        match args.command {
            Command::Instance {
                suffix,
                command: InstanceCommand::Set { key, value },
            } => {
                assert_eq!(suffix, "1");
                assert_eq!(key, "k1");
                assert_eq!(value, "v1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_hub_run() {
        let args = Args::try_parse_from(["keyhub", "-v", "hub", "run", "2"]).unwrap();

        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Command::Hub {
                command: HubCommand::Run { ref suffix }
            } if suffix == "2"
        ));
    }

    #[test]
    fn test_set_requires_value() {
        assert!(Args::try_parse_from(["keyhub", "instance", "1", "set", "k1"]).is_err());
    }

    #[test]
    fn test_args_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
