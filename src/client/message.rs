//! Minimal owned IRC message model.
//!
//! Covers what a client bot needs: a prefix, a command, and parameters.
//! IRCv3 tag blocks on inbound lines are tolerated and skipped.

use std::fmt;
use std::str::FromStr;

use super::ProtocolError;

/// A parsed IRC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message source (`nick!user@host` or a server name), without the `:`.
    pub prefix: Option<String>,
    /// Command or three-digit numeric, uppercased.
    pub command: String,
    /// Parameters; a trailing parameter keeps its spaces.
    pub params: Vec<String>,
}

impl Message {
    fn new(command: &str, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.to_string(),
            params,
        }
    }

    pub fn pass(password: &str) -> Self {
        Self::new("PASS", vec![password.to_string()])
    }

    pub fn nick(nick: &str) -> Self {
        Self::new("NICK", vec![nick.to_string()])
    }

    /// USER command; the nick doubles as ident and realname.
    pub fn user(nick: &str) -> Self {
        Self::new(
            "USER",
            vec![
                nick.to_string(),
                "0".to_string(),
                "*".to_string(),
                nick.to_string(),
            ],
        )
    }

    pub fn join(channel: &str, key: Option<&str>) -> Self {
        let mut params = vec![channel.to_string()];
        if let Some(key) = key {
            params.push(key.to_string());
        }
        Self::new("JOIN", params)
    }

    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", vec![target.to_string(), text.to_string()])
    }

    pub fn pong(token: &str) -> Self {
        Self::new("PONG", vec![token.to_string()])
    }

    /// Nickname portion of the prefix, if the message has one.
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .and_then(|p| p.split(['!', '@']).next())
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim_end_matches(['\r', '\n']).trim_start();

        if let Some(tagged) = rest.strip_prefix('@') {
            rest = match tagged.split_once(' ') {
                Some((_, r)) => r.trim_start(),
                None => "",
            };
        }

        let mut prefix = None;
        if let Some(prefixed) = rest.strip_prefix(':') {
            let (p, r) = prefixed
                .split_once(' ')
                .ok_or(ProtocolError::EmptyMessage)?;
            prefix = Some(p.to_string());
            rest = r.trim_start();
        }

        let command = match rest.split_once(' ') {
            Some((c, r)) => {
                rest = r.trim_start();
                c
            }
            None => {
                let c = rest;
                rest = "";
                c
            }
        };
        if command.is_empty() {
            return Err(ProtocolError::EmptyMessage);
        }

        let mut params = Vec::new();
        while !rest.is_empty() {
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((p, r)) => {
                    params.push(p.to_string());
                    rest = r.trim_start();
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Ok(Message {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;
        if let Some((last, rest)) = self.params.split_last() {
            for param in rest {
                write!(f, " {param}")?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{last}")?;
            } else {
                write!(f, " {last}")?;
            }
        }
        Ok(())
    }
}
