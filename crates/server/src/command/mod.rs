//! Command parsing and dispatch for the line protocol.
//!
//! One struct per command, grouped by family. A command parses from the
//! whitespace-split tokens of one request line and executes against the
//! engine, producing a [`Reply`]. Execution never closes the connection;
//! every failure maps to a `-ERR` line.

use async_trait::async_trait;
use thiserror::Error;

use atomkv_core::store::Store;

use crate::reply::Reply;

pub mod connection;
pub mod generic;
pub mod scan;
pub mod set_get;
pub mod string;
pub mod ttl;

/// Client-visible parse failures. The display text is the wire message
/// after the `-ERR ` prefix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("wrong number of args")]
    WrongArity,

    #[error("unknown command")]
    UnknownCommand,

    #[error("invalid number")]
    InvalidNumber,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, store: &Store) -> Reply;
}

#[derive(Debug)]
pub enum Command {
    Get(set_get::Get),
    Set(set_get::Set),
    Del(set_get::Del),
    Mget(set_get::Mget),
    Mset(set_get::Mset),
    Append(string::Append),
    Incr(string::Incr),
    Decr(string::Decr),
    Strlen(string::Strlen),
    Expire(ttl::Expire),
    Ttl(ttl::Ttl),
    Persist(ttl::Persist),
    Exists(generic::Exists),
    Type(generic::Type),
    Rename(generic::Rename),
    FlushAll(generic::FlushAll),
    Keys(scan::Keys),
    Ping(connection::Ping),
    Quit(connection::Quit),
}

impl Command {
    /// Parse one request line. Verbs are case-insensitive.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let verb = tokens.first().ok_or(CommandError::UnknownCommand)?;
        let args = &tokens[1..];

        if verb.eq_ignore_ascii_case("GET") {
            Ok(Command::Get(set_get::Get::parse(args)?))
        } else if verb.eq_ignore_ascii_case("SET") {
            Ok(Command::Set(set_get::Set::parse(args)?))
        } else if verb.eq_ignore_ascii_case("DEL") {
            Ok(Command::Del(set_get::Del::parse(args)?))
        } else if verb.eq_ignore_ascii_case("MGET") {
            Ok(Command::Mget(set_get::Mget::parse(args)?))
        } else if verb.eq_ignore_ascii_case("MSET") {
            Ok(Command::Mset(set_get::Mset::parse(args)?))
        } else if verb.eq_ignore_ascii_case("APPEND") {
            Ok(Command::Append(string::Append::parse(args)?))
        } else if verb.eq_ignore_ascii_case("INCR") {
            Ok(Command::Incr(string::Incr::parse(args)?))
        } else if verb.eq_ignore_ascii_case("DECR") {
            Ok(Command::Decr(string::Decr::parse(args)?))
        } else if verb.eq_ignore_ascii_case("STRLEN") {
            Ok(Command::Strlen(string::Strlen::parse(args)?))
        } else if verb.eq_ignore_ascii_case("EXPIRE") {
            Ok(Command::Expire(ttl::Expire::parse(args)?))
        } else if verb.eq_ignore_ascii_case("TTL") {
            Ok(Command::Ttl(ttl::Ttl::parse(args)?))
        } else if verb.eq_ignore_ascii_case("PERSIST") {
            Ok(Command::Persist(ttl::Persist::parse(args)?))
        } else if verb.eq_ignore_ascii_case("EXISTS") {
            Ok(Command::Exists(generic::Exists::parse(args)?))
        } else if verb.eq_ignore_ascii_case("TYPE") {
            Ok(Command::Type(generic::Type::parse(args)?))
        } else if verb.eq_ignore_ascii_case("RENAME") {
            Ok(Command::Rename(generic::Rename::parse(args)?))
        } else if verb.eq_ignore_ascii_case("FLUSHALL") {
            Ok(Command::FlushAll(generic::FlushAll::parse(args)?))
        } else if verb.eq_ignore_ascii_case("KEYS") {
            Ok(Command::Keys(scan::Keys::parse(args)?))
        } else if verb.eq_ignore_ascii_case("PING") {
            Ok(Command::Ping(connection::Ping::parse(args)?))
        } else if verb.eq_ignore_ascii_case("QUIT") {
            Ok(Command::Quit(connection::Quit::parse(args)?))
        } else {
            Err(CommandError::UnknownCommand)
        }
    }

    pub fn name(&self) -> &'static str {
        self.handler().name()
    }

    pub async fn execute(&self, store: &Store) -> Reply {
        self.handler().execute(store).await
    }

    /// QUIT is handled specially by the connection loop: reply then close.
    pub fn is_quit(&self) -> bool {
        matches!(self, Command::Quit(_))
    }

    fn handler(&self) -> &dyn CommandHandler {
        match self {
            Command::Get(c) => c,
            Command::Set(c) => c,
            Command::Del(c) => c,
            Command::Mget(c) => c,
            Command::Mset(c) => c,
            Command::Append(c) => c,
            Command::Incr(c) => c,
            Command::Decr(c) => c,
            Command::Strlen(c) => c,
            Command::Expire(c) => c,
            Command::Ttl(c) => c,
            Command::Persist(c) => c,
            Command::Exists(c) => c,
            Command::Type(c) => c,
            Command::Rename(c) => c,
            Command::FlushAll(c) => c,
            Command::Keys(c) => c,
            Command::Ping(c) => c,
            Command::Quit(c) => c,
        }
    }
}
