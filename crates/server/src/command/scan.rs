//! Key scanning: the KEYS command.

use async_trait::async_trait;
use tracing::warn;

use atomkv_core::pattern::Pattern;
use atomkv_core::store::Store;

use super::{CommandError, CommandHandler};
use crate::reply::Reply;

/// Threshold for warning about KEYS on large datasets
const KEYS_WARNING_THRESHOLD: usize = 10_000;

/// KEYS command - list live keys matching a glob pattern.
///
/// O(n) over the whole map; the scan does not snapshot, so keys written
/// concurrently may or may not appear.
#[derive(Debug)]
pub struct Keys {
    pub pattern: String,
}

impl Keys {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        // No pattern means everything
        let pattern = args.first().unwrap_or(&"*").to_string();
        Ok(Keys { pattern })
    }
}

#[async_trait]
impl CommandHandler for Keys {
    fn name(&self) -> &'static str {
        "KEYS"
    }

    async fn execute(&self, store: &Store) -> Reply {
        if store.len() > KEYS_WARNING_THRESHOLD {
            warn!(keys = store.len(), "KEYS executed on a large dataset");
        }

        let pattern = Pattern::new(self.pattern.as_bytes());
        let keys = store.keys(&pattern);
        if keys.is_empty() {
            return Reply::Nil;
        }
        Reply::Many(keys.into_iter().map(Reply::Simple).collect())
    }
}
