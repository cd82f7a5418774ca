//! Generic key commands: EXISTS, TYPE, RENAME, FLUSHALL.

use async_trait::async_trait;

use atomkv_core::store::Store;

use super::{CommandError, CommandHandler};
use crate::reply::Reply;

/// EXISTS command - check for a live key
#[derive(Debug)]
pub struct Exists {
    pub key: String,
}

impl Exists {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity);
        }
        Ok(Exists {
            key: args[0].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Exists {
    fn name(&self) -> &'static str {
        "EXISTS"
    }

    async fn execute(&self, store: &Store) -> Reply {
        Reply::Int(if store.exists(&self.key) { 1 } else { 0 })
    }
}

/// TYPE command - classify a key as none/string/number/ttl_key
#[derive(Debug)]
pub struct Type {
    pub key: String,
}

impl Type {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity);
        }
        Ok(Type {
            key: args[0].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Type {
    fn name(&self) -> &'static str {
        "TYPE"
    }

    async fn execute(&self, store: &Store) -> Reply {
        Reply::Simple(store.key_type(&self.key).to_string())
    }
}

/// RENAME command - rebind a key, overwriting the destination
#[derive(Debug)]
pub struct Rename {
    pub src: String,
    pub dst: String,
}

impl Rename {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.len() < 2 {
            return Err(CommandError::WrongArity);
        }
        Ok(Rename {
            src: args[0].to_string(),
            dst: args[1].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Rename {
    fn name(&self) -> &'static str {
        "RENAME"
    }

    async fn execute(&self, store: &Store) -> Reply {
        if store.rename(&self.src, &self.dst) {
            Reply::ok()
        } else {
            Reply::Error("no such key".to_string())
        }
    }
}

/// FLUSHALL command - drop every key
#[derive(Debug)]
pub struct FlushAll;

impl FlushAll {
    pub fn parse(_args: &[&str]) -> Result<Self, CommandError> {
        Ok(FlushAll)
    }
}

#[async_trait]
impl CommandHandler for FlushAll {
    fn name(&self) -> &'static str {
        "FLUSHALL"
    }

    async fn execute(&self, store: &Store) -> Reply {
        store.flush_all();
        Reply::ok()
    }
}
