//! Network kinds accepted by the namespace-scoped operations

use netat_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Network name, in the `tcp` / `tcp4` / `udp6` / `unix` style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// TCP over IPv4 or IPv6
    Tcp,
    /// TCP over IPv4 only
    Tcp4,
    /// TCP over IPv6 only
    Tcp6,
    /// UDP over IPv4 or IPv6
    Udp,
    /// UDP over IPv4 only
    Udp4,
    /// UDP over IPv6 only
    Udp6,
    /// Unix stream socket
    Unix,
}

/// IP family restriction of a [`Network`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Either family
    Any,
    /// IPv4 only
    V4,
    /// IPv6 only
    V6,
}

impl Network {
    /// Network name as written by callers
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Tcp4 => "tcp4",
            Self::Tcp6 => "tcp6",
            Self::Udp => "udp",
            Self::Udp4 => "udp4",
            Self::Udp6 => "udp6",
            Self::Unix => "unix",
        }
    }

    /// Connection-oriented network
    #[must_use]
    pub const fn is_stream(self) -> bool {
        matches!(self, Self::Tcp | Self::Tcp4 | Self::Tcp6 | Self::Unix)
    }

    /// TCP or UDP network
    #[must_use]
    pub const fn is_ip(self) -> bool {
        !matches!(self, Self::Unix)
    }

    /// UDP network
    #[must_use]
    pub const fn is_udp(self) -> bool {
        matches!(self, Self::Udp | Self::Udp4 | Self::Udp6)
    }

    /// Family restriction
    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::Tcp4 | Self::Udp4 => Family::V4,
            Self::Tcp6 | Self::Udp6 => Family::V6,
            Self::Tcp | Self::Udp | Self::Unix => Family::Any,
        }
    }

    /// Whether `addr` may be used with this network
    #[must_use]
    pub const fn accepts(self, addr: &SocketAddr) -> bool {
        match self.family() {
            Family::Any => true,
            Family::V4 => addr.is_ipv4(),
            Family::V6 => addr.is_ipv6(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "tcp4" => Ok(Self::Tcp4),
            "tcp6" => Ok(Self::Tcp6),
            "udp" => Ok(Self::Udp),
            "udp4" => Ok(Self::Udp4),
            "udp6" => Ok(Self::Udp6),
            "unix" => Ok(Self::Unix),
            _ => Err(Error::UnsupportedNetwork {
                network: s.to_string(),
            }),
        }
    }
}
