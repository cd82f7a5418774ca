//! Connection-level commands: PING, QUIT.

use async_trait::async_trait;

use atomkv_core::store::Store;

use super::{CommandError, CommandHandler};
use crate::reply::Reply;

/// PING command
#[derive(Debug)]
pub struct Ping;

impl Ping {
    pub fn parse(_args: &[&str]) -> Result<Self, CommandError> {
        Ok(Ping)
    }
}

#[async_trait]
impl CommandHandler for Ping {
    fn name(&self) -> &'static str {
        "PING"
    }

    async fn execute(&self, _store: &Store) -> Reply {
        Reply::Simple("PONG".to_string())
    }
}

/// QUIT command - the connection loop replies `+BYE` and closes
#[derive(Debug)]
pub struct Quit;

impl Quit {
    pub fn parse(_args: &[&str]) -> Result<Self, CommandError> {
        Ok(Quit)
    }
}

#[async_trait]
impl CommandHandler for Quit {
    fn name(&self) -> &'static str {
        "QUIT"
    }

    async fn execute(&self, _store: &Store) -> Reply {
        Reply::Simple("BYE".to_string())
    }
}
