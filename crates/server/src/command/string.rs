//! String value commands: APPEND, INCR, DECR, STRLEN.

use async_trait::async_trait;

use atomkv_core::store::Store;

use super::{CommandError, CommandHandler};
use crate::reply::Reply;

/// APPEND command - concatenate onto a value, creating it when absent
#[derive(Debug)]
pub struct Append {
    pub key: String,
    pub suffix: String,
}

impl Append {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.len() < 2 {
            return Err(CommandError::WrongArity);
        }
        Ok(Append {
            key: args[0].to_string(),
            suffix: args[1].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Append {
    fn name(&self) -> &'static str {
        "APPEND"
    }

    async fn execute(&self, store: &Store) -> Reply {
        Reply::Int(store.append(&self.key, &self.suffix) as i64)
    }
}

/// INCR command - add one to an integer value
#[derive(Debug)]
pub struct Incr {
    pub key: String,
}

impl Incr {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity);
        }
        Ok(Incr {
            key: args[0].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Incr {
    fn name(&self) -> &'static str {
        "INCR"
    }

    async fn execute(&self, store: &Store) -> Reply {
        match store.incr(&self.key) {
            Ok(n) => Reply::Int(n),
            Err(e) => Reply::Error(e.to_string()),
        }
    }
}

/// DECR command - subtract one from an integer value
#[derive(Debug)]
pub struct Decr {
    pub key: String,
}

impl Decr {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity);
        }
        Ok(Decr {
            key: args[0].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Decr {
    fn name(&self) -> &'static str {
        "DECR"
    }

    async fn execute(&self, store: &Store) -> Reply {
        match store.decr(&self.key) {
            Ok(n) => Reply::Int(n),
            Err(e) => Reply::Error(e.to_string()),
        }
    }
}

/// STRLEN command - byte length of a value, 0 when absent
#[derive(Debug)]
pub struct Strlen {
    pub key: String,
}

impl Strlen {
    pub fn parse(args: &[&str]) -> Result<Self, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity);
        }
        Ok(Strlen {
            key: args[0].to_string(),
        })
    }
}

#[async_trait]
impl CommandHandler for Strlen {
    fn name(&self) -> &'static str {
        "STRLEN"
    }

    async fn execute(&self, store: &Store) -> Reply {
        Reply::Int(store.strlen(&self.key) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_incr_on_miss_and_garbage() {
        let store = Store::new(100);

        let reply = Incr::parse(&["n"]).unwrap().execute(&store).await;
        assert_eq!(reply, Reply::Int(1));

        store.set("n", "41", None);
        let reply = Incr::parse(&["n"]).unwrap().execute(&store).await;
        assert_eq!(reply, Reply::Int(42));

        store.set("n", "abc", None);
        let reply = Incr::parse(&["n"]).unwrap().execute(&store).await;
        assert_eq!(reply, Reply::Error("value is not an integer".to_string()));
    }

    #[tokio::test]
    async fn test_decr_on_miss() {
        let store = Store::new(100);
        let reply = Decr::parse(&["n"]).unwrap().execute(&store).await;
        assert_eq!(reply, Reply::Int(-1));
    }

    #[tokio::test]
    async fn test_append_returns_new_length() {
        let store = Store::new(100);
        let reply = Append::parse(&["k", "abc"]).unwrap().execute(&store).await;
        assert_eq!(reply, Reply::Int(3));
        let reply = Append::parse(&["k", "de"]).unwrap().execute(&store).await;
        assert_eq!(reply, Reply::Int(5));
    }

    #[tokio::test]
    async fn test_strlen() {
        let store = Store::new(100);
        store.set("k", "hello", None);
        let reply = Strlen::parse(&["k"]).unwrap().execute(&store).await;
        assert_eq!(reply, Reply::Int(5));
        let reply = Strlen::parse(&["missing"]).unwrap().execute(&store).await;
        assert_eq!(reply, Reply::Int(0));
    }
}
