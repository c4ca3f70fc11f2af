use std::fmt;
use std::str::FromStr;

/// Actions understood by hub and instance servers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read the value stored under a key.
    Get,
    /// Store a value, or start an instance when sent to the hub.
    Set,
    /// Enumerate keys or running instances.
    List,
    /// Delete a key, or stop an instance when sent to the hub.
    Remove,
    /// Liveness check.
    Ping,
    /// Start an instance.
    Run,
}

impl Action {
    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Set => "SET",
            Self::List => "LIST",
            Self::Remove => "REMOVE",
            Self::Ping => "PING",
            Self::Run => "RUN",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "SET" => Ok(Self::Set),
            "LIST" => Ok(Self::List),
            "REMOVE" => Ok(Self::Remove),
            "PING" => Ok(Self::Ping),
            "RUN" => Ok(Self::Run),
            other => Err(format!("unknown action: {other}")),
        }
    }
}
