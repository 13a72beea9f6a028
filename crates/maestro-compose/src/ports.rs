//! Exposed-port specifications attached to service jobs, parsed with `nom`.
//!
//! Each entry reads `[host_port:]container_port[/tcp|/udp]`. A port list is
//! written as a single number, a string of comma-separated entries, or a
//! YAML list mixing both.

use std::fmt;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, opt, value},
    sequence::preceded,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport protocol of an exposed port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP (the default).
    #[default]
    Tcp,
    /// UDP.
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// A port a job exposes on its instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExposedPort {
    /// Port published on the instance.
    pub host: u16,
    /// Port the container listens on.
    pub container: u16,
    /// Transport protocol.
    pub protocol: Protocol,
}

impl fmt::Display for ExposedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.container, self.protocol)
    }
}

/// A malformed port entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{spec}': {message}")]
pub struct PortSyntaxError {
    /// The offending entry as written.
    pub spec: String,
    /// What is wrong with it.
    pub message: String,
}

/// One item of a port list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortItem {
    /// A bare container port.
    Number(i64),
    /// One or more textual entries.
    Text(String),
}

/// A job's port list as written in the `services` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortList {
    /// A single port or comma-separated entries.
    Single(PortItem),
    /// A list of ports or entries.
    List(Vec<PortItem>),
    /// A job listed without ports (`null` in YAML).
    Empty,
}

impl Default for PortList {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl PortList {
    /// Parses every entry of the list.
    ///
    /// # Errors
    ///
    /// Returns the first malformed entry.
    pub fn parse(&self) -> Result<Vec<ExposedPort>, PortSyntaxError> {
        let items = match self {
            Self::Single(item) => std::slice::from_ref(item),
            Self::List(items) => items.as_slice(),
            Self::Empty => &[],
        };
        let mut ports = Vec::new();
        for item in items {
            match item {
                PortItem::Number(n) => ports.push(number_port(*n)?),
                PortItem::Text(text) => {
                    for entry in text.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                        ports.push(parse_entry(entry)?);
                    }
                }
            }
        }
        Ok(ports)
    }
}

fn number_port(n: i64) -> Result<ExposedPort, PortSyntaxError> {
    let port = u16::try_from(n)
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| PortSyntaxError {
            spec: n.to_string(),
            message: "port out of range 1-65535".into(),
        })?;
    Ok(ExposedPort {
        host: port,
        container: port,
        protocol: Protocol::Tcp,
    })
}

fn port_number(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |digits: &str| digits.parse::<u16>()).parse(input)
}

fn protocol(input: &str) -> IResult<&str, Protocol> {
    alt((
        value(Protocol::Tcp, tag_no_case("tcp")),
        value(Protocol::Udp, tag_no_case("udp")),
    ))
    .parse(input)
}

/// `first[:second][/proto]`; with two numbers the first is the host port.
fn port_entry(input: &str) -> IResult<&str, (u16, Option<u16>, Option<Protocol>)> {
    let (input, first) = port_number(input)?;
    let (input, second) = opt(preceded(char(':'), port_number)).parse(input)?;
    let (input, proto) = opt(preceded(char('/'), protocol)).parse(input)?;
    Ok((input, (first, second, proto)))
}

/// Parses a single `[host:]container[/proto]` entry.
///
/// # Errors
///
/// Returns an error on any syntax problem or a zero port.
pub fn parse_entry(entry: &str) -> Result<ExposedPort, PortSyntaxError> {
    let syntax_err = |message: &str| PortSyntaxError {
        spec: entry.to_owned(),
        message: message.to_owned(),
    };

    let (_, (first, second, proto)) = all_consuming(port_entry)
        .parse(entry.trim())
        .map_err(|_| syntax_err("expected [host:]container[/tcp|udp]"))?;

    let (host, container) = second.map_or((first, first), |c| (first, c));
    if host == 0 || container == 0 {
        return Err(syntax_err("port out of range 1-65535"));
    }
    Ok(ExposedPort {
        host,
        container,
        protocol: proto.unwrap_or_default(),
    })
}
