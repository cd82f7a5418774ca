//! Wire replies for the line-oriented text protocol.
//!
//! Responses use a reduced RESP-style framing, one line per element:
//! `+string`, `:integer`, `$-1` for nil, `-ERR message`. Multi-element
//! replies (KEYS, MGET) are just concatenated lines.

use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+<string>\n`
    Simple(String),
    /// `:<int>\n`
    Int(i64),
    /// `$-1\n`
    Nil,
    /// `-ERR <msg>\n`
    Error(String),
    /// Concatenation of inner replies, one line each
    Many(Vec<Reply>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Reply::Simple(s) => {
                let _ = write!(out, "+{}\n", s);
            }
            Reply::Int(n) => {
                let _ = write!(out, ":{}\n", n);
            }
            Reply::Nil => out.push_str("$-1\n"),
            Reply::Error(msg) => {
                let _ = write!(out, "-ERR {}\n", msg);
            }
            Reply::Many(items) => {
                for item in items {
                    item.write_to(out);
                }
            }
        }
    }
}
