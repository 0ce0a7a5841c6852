//! RESP Command Dispatch
//!
//! Turns a decoded frame into a [`Command`] and runs it against the cache.
//! Values written over this protocol are always stored as text.

use crate::cache::{current_timestamp_ms, parse_ttl_ms, Cache, CacheValue, SetOptions};
use crate::resp::codec::Reply;

/// A parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Get(String),
    Set {
        key: String,
        value: String,
        ttl_ms: Option<u64>,
    },
    Del(String),
    Exists(String),
    Ttl(String),
    Pttl(String),
    Info,
    Quit,
}

impl Command {
    /// Parses a frame. Malformed requests come back as the error reply to send.
    pub fn parse(frame: &[Option<Vec<u8>>]) -> Result<Command, Reply> {
        let args: Vec<String> = frame
            .iter()
            .map(|arg| {
                arg.as_deref()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                    .unwrap_or_default()
            })
            .collect();

        let Some(name) = args.first() else {
            return Err(Reply::error("ERR invalid command"));
        };
        let name = name.to_ascii_uppercase();
        let key = args.get(1).filter(|key| !key.is_empty()).cloned();

        let command = match name.as_str() {
            "PING" => Command::Ping,
            "INFO" => Command::Info,
            "QUIT" => Command::Quit,
            "GET" => Command::Get(require_key(key, &name)?),
            "DEL" => Command::Del(require_key(key, &name)?),
            "EXISTS" => Command::Exists(require_key(key, &name)?),
            "TTL" => Command::Ttl(require_key(key, &name)?),
            "PTTL" => Command::Pttl(require_key(key, &name)?),
            "SET" => {
                if args.len() < 3 {
                    return Err(wrong_arity(&name));
                }
                let key = require_key(key, &name)?;
                let ttl_ms = match args.get(3) {
                    Some(option) if option.eq_ignore_ascii_case("PX") => {
                        args.get(4).and_then(|ms| parse_ttl_ms(ms))
                    }
                    _ => None,
                };
                Command::Set {
                    key,
                    value: args[2].clone(),
                    ttl_ms,
                }
            }
            _ => {
                return Err(Reply::error(format!(
                    "ERR unknown command '{}'",
                    args[0]
                )))
            }
        };
        Ok(command)
    }

    /// Label used for the latency histogram.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Get(_) => "GET",
            Command::Set { .. } => "SET",
            Command::Del(_) => "DEL",
            Command::Exists(_) => "EXISTS",
            Command::Ttl(_) => "TTL",
            Command::Pttl(_) => "PTTL",
            Command::Info => "INFO",
            Command::Quit => "QUIT",
        }
    }

    /// True for commands after which the connection closes.
    pub fn closes_connection(&self) -> bool {
        matches!(self, Command::Quit)
    }

    /// Runs the command against `cache` and builds its reply.
    pub fn execute(self, cache: &Cache) -> Reply {
        match self {
            Command::Ping => Reply::Simple("PONG".to_string()),
            Command::Get(key) => match cache.get(&key) {
                Some(value) => Reply::bulk(value.to_string()),
                None => Reply::null(),
            },
            Command::Set { key, value, ttl_ms } => {
                let options = match ttl_ms {
                    Some(ttl) => SetOptions::new().with_ttl_ms(ttl),
                    None => SetOptions::new(),
                };
                // rejected writes are not surfaced over this protocol
                cache.set(key, CacheValue::Text(value), options);
                Reply::ok()
            }
            Command::Del(key) => Reply::Integer(i64::from(cache.del(&key))),
            Command::Exists(key) => Reply::Integer(i64::from(cache.has(&key))),
            Command::Ttl(key) => ttl_reply(cache, &key, 1000),
            Command::Pttl(key) => ttl_reply(cache, &key, 1),
            Command::Info => Reply::bulk(info_block(cache)),
            Command::Quit => Reply::ok(),
        }
    }
}

fn require_key(key: Option<String>, name: &str) -> Result<String, Reply> {
    key.ok_or_else(|| wrong_arity(name))
}

fn wrong_arity(name: &str) -> Reply {
    Reply::error(format!(
        "ERR wrong number of arguments for '{}' command",
        name.to_ascii_lowercase()
    ))
}

/// `-2` when absent, `-1` without expiry, else remaining time in `unit_ms`.
fn ttl_reply(cache: &Cache, key: &str, unit_ms: u64) -> Reply {
    if !cache.has(key) {
        return Reply::Integer(-2);
    }
    match cache.ttl_remaining_ms(key) {
        Some(remaining) => Reply::Integer(i64::try_from(remaining / unit_ms).unwrap_or(i64::MAX)),
        None => Reply::Integer(-1),
    }
}

fn info_block(cache: &Cache) -> String {
    let stats = cache.stats();
    let uptime_ms = current_timestamp_ms().saturating_sub(stats.started_at);
    [
        "# Server".to_string(),
        format!("zencache_version:{}", env!("CARGO_PKG_VERSION")),
        format!("uptime_ms:{}", uptime_ms),
        "# Stats".to_string(),
        format!("hits:{}", stats.hits),
        format!("misses:{}", stats.misses),
        format!("evictions:{}", stats.evictions),
        format!("rejections:{}", stats.rejections),
        format!("items:{}", stats.items),
        format!("size_bytes:{}", stats.total_size_bytes),
        format!("capacity_bytes:{}", stats.capacity_bytes),
        format!("lfu_enabled:{}", u8::from(stats.lfu_enabled)),
    ]
    .join("\r\n")
}
