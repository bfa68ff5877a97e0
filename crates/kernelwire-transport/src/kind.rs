//! Socket kinds.
//!
//! Only [`SocketKind::Router`] changes framing behaviour in [`crate::LocalSocket`];
//! the rest are carried as labels for the transport to interpret.

use std::fmt;
use std::str::FromStr;

use crate::error::TransportError;

/// Kind of multipart socket an endpoint was constructed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketKind {
    Pair,
    Pub,
    Sub,
    Req,
    Rep,
    Dealer,
    Router,
    Push,
    Pull,
    XPub,
    XSub,
}

impl SocketKind {
    /// Lowercase name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            SocketKind::Pair => "pair",
            SocketKind::Pub => "pub",
            SocketKind::Sub => "sub",
            SocketKind::Req => "req",
            SocketKind::Rep => "rep",
            SocketKind::Dealer => "dealer",
            SocketKind::Router => "router",
            SocketKind::Push => "push",
            SocketKind::Pull => "pull",
            SocketKind::XPub => "xpub",
            SocketKind::XSub => "xsub",
        }
    }

    /// Returns true if received frames are prefixed with the sender identity.
    pub fn is_routing(self) -> bool {
        matches!(self, SocketKind::Router)
    }
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocketKind {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "pair" => SocketKind::Pair,
            "pub" => SocketKind::Pub,
            "sub" => SocketKind::Sub,
            "req" => SocketKind::Req,
            "rep" => SocketKind::Rep,
            "dealer" => SocketKind::Dealer,
            "router" => SocketKind::Router,
            "push" => SocketKind::Push,
            "pull" => SocketKind::Pull,
            "xpub" => SocketKind::XPub,
            "xsub" => SocketKind::XSub,
            _ => return Err(TransportError::UnknownKind(s.to_string())),
        };
        Ok(kind)
    }
}
