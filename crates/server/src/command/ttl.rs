//! TTL commands: EXPIRE, TTL, PERSIST.

use async_trait::async_trait;

use atomkv_core::store::Store;

use super::{CommandError, CommandHandler};
use crate::reply::Reply;

/// EXPIRE command - set a key's TTL in seconds
#[derive(Debug)]
pub struct Expire {
    pub key: String,
    pub seconds: u64,
}

impl Expire {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.len() < 2 {
            return Err(CommandError::WrongArity);
        }
        let seconds = args[1].parse().map_err(|_| CommandError::InvalidNumber)?;
        Ok(Expire {
            key: args[0].to_string(),
            seconds,
        })
    }
}

#[async_trait]
impl CommandHandler for Expire {
    fn name(&self) -> &'static str {
        "EXPIRE"
    }

    async fn execute(&self, store: &Store) -> Reply {
        Reply::Int(if store.expire(&self.key, self.seconds) {
            1
        } else {
            0
        })
    }
}

/// TTL command - remaining milliseconds, -1 without TTL, -2 when missing
#[derive(Debug)]
pub struct Ttl {
    pub key: String,
}

impl Ttl {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity);
        }
        Ok(Ttl {
            key: args[0].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Ttl {
    fn name(&self) -> &'static str {
        "TTL"
    }

    async fn execute(&self, store: &Store) -> Reply {
        Reply::Int(store.ttl(&self.key))
    }
}

/// PERSIST command - clear a key's TTL
#[derive(Debug)]
pub struct Persist {
    pub key: String,
}

impl Persist {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity);
        }
        Ok(Persist {
            key: args[0].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Persist {
    fn name(&self) -> &'static str {
        "PERSIST"
    }

    async fn execute(&self, store: &Store) -> Reply {
        Reply::Int(if store.persist(&self.key) { 1 } else { 0 })
    }
}
