//! SET/GET/DEL and their multi-key variants.

use std::time::Duration;

use async_trait::async_trait;

use atomkv_core::store::Store;

use super::{CommandError, CommandHandler};
use crate::reply::Reply;

/// GET command - retrieve a value by key
#[derive(Debug)]
pub struct Get {
    pub key: String,
}

impl Get {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity);
        }
        Ok(Get {
            key: args[0].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Get {
    fn name(&self) -> &'static str {
        "GET"
    }

    async fn execute(&self, store: &Store) -> Reply {
        match store.get(&self.key) {
            Some(value) => Reply::Simple(value),
            None => Reply::Nil,
        }
    }
}

/// SET command - store a key-value pair, optionally with `PX <ms>`
#[derive(Debug)]
pub struct Set {
    pub key: String,
    pub value: String,
    pub ttl: Option<Duration>,
}

impl Set {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.len() < 2 {
            return Err(CommandError::WrongArity);
        }

        let mut ttl = None;
        if args.len() >= 4 && args[2].eq_ignore_ascii_case("PX") {
            let ms: u64 = args[3].parse().map_err(|_| CommandError::InvalidNumber)?;
            if ms > 0 {
                ttl = Some(Duration::from_millis(ms));
            }
        }

        Ok(Set {
            key: args[0].to_string(),
            value: args[1].to_string(),
            ttl,
        })
    }
}

#[async_trait]
impl CommandHandler for Set {
    fn name(&self) -> &'static str {
        "SET"
    }

    async fn execute(&self, store: &Store) -> Reply {
        store.set(&self.key, &self.value, self.ttl);
        Reply::ok()
    }
}

/// DEL command - remove a key
#[derive(Debug)]
pub struct Del {
    pub key: String,
}

impl Del {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity);
        }
        Ok(Del {
            key: args[0].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Del {
    fn name(&self) -> &'static str {
        "DEL"
    }

    async fn execute(&self, store: &Store) -> Reply {
        Reply::Int(if store.del(&self.key) { 1 } else { 0 })
    }
}

/// MGET command - values for several keys, nil-aligned to the input
#[derive(Debug)]
pub struct Mget {
    pub keys: Vec<String>,
}

impl Mget {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity);
        }
        Ok(Mget {
            keys: args.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[async_trait]
impl CommandHandler for Mget {
    fn name(&self) -> &'static str {
        "MGET"
    }

    async fn execute(&self, store: &Store) -> Reply {
        let replies = store
            .mget(&self.keys)
            .into_iter()
            .map(|value| match value {
                Some(v) => Reply::Simple(v),
                None => Reply::Nil,
            })
            .collect();
        Reply::Many(replies)
    }
}

/// MSET command - store several pairs from a flat k v list
#[derive(Debug)]
pub struct Mset {
    pub kv: Vec<String>,
}

impl Mset {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.len() < 2 || args.len() % 2 != 0 {
            return Err(CommandError::WrongArity);
        }
        Ok(Mset {
            kv: args.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[async_trait]
impl CommandHandler for Mset {
    fn name(&self) -> &'static str {
        "MSET"
    }

    async fn execute(&self, store: &Store) -> Reply {
        store.mset(&self.kv);
        Reply::ok()
    }
}
