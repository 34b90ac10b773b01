//! Option schemas for attack configuration
//!
//! Every attack publishes a static table of [`OptionSpec`]s. The table is the
//! only place an option name appears: lookups, validation, rendering and the
//! string-based front-end contract all go through it.

use crate::config::REDACTED;
use crate::{Error, MacAddr, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Value type of an option, as shown to front ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Free-form string
    String,
    /// Unsigned integer
    U32,
    /// Boolean flag (`true|false|1|0`)
    Bool,
    /// 2.4 GHz channel number
    Channel,
    /// Interval in milliseconds
    Millis,
    /// MAC address
    MacAddr,
    /// IPv4 address
    IpAddr,
    /// One of a fixed set of keywords
    Choice,
    /// Comma separated list
    List,
}

/// How an option may be accessed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Configuration value, rendered in the parameter map
    ReadWrite,
    /// Report or derived value
    ReadOnly,
    /// Command with no stored value (e.g. `clear`)
    Action,
}

/// One named option of an attack
pub struct OptionSpec<T: 'static> {
    /// Parameter name
    pub name: &'static str,
    /// Parameter description
    pub description: &'static str,
    /// Parameter type
    pub value_type: ParameterType,
    pub access: Access,
    /// Value is never returned verbatim
    pub secret: bool,
    pub set: fn(&mut T, &str) -> Result<()>,
    pub get: fn(&T) -> String,
}

/// Schema entry as published to front ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionInfo {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub value_type: ParameterType,
    pub access: Access,
    pub secret: bool,
}

/// Describe every option of a schema, actions and reports included
pub fn describe_options<T>(schema: &[OptionSpec<T>]) -> Vec<OptionInfo> {
    schema
        .iter()
        .map(|spec| OptionInfo {
            name: spec.name,
            description: spec.description,
            value_type: spec.value_type,
            access: spec.access,
            secret: spec.secret,
        })
        .collect()
}

/// Placeholder setter for read-only options
pub fn not_writable<T>(_: &mut T, _: &str) -> Result<()> {
    Ok(())
}

/// Placeholder getter for actions
pub fn not_readable<T>(_: &T) -> String {
    String::new()
}

fn lookup<'a, T>(schema: &'a [OptionSpec<T>], name: &str) -> Result<&'a OptionSpec<T>> {
    schema
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| Error::UnknownParameter(name.to_string()))
}

/// Apply `value` to the option called `name`
pub fn set_option<T>(schema: &[OptionSpec<T>], target: &mut T, name: &str, value: &str) -> Result<()> {
    let spec = lookup(schema, name)?;
    if spec.access == Access::ReadOnly {
        return Err(Error::ReadOnlyParameter(name.to_string()));
    }
    (spec.set)(target, value)
}

/// Read the option called `name`, redacting secrets
pub fn get_option<T>(schema: &[OptionSpec<T>], target: &T, name: &str) -> Result<String> {
    let spec = lookup(schema, name)?;
    match spec.access {
        Access::Action => Err(Error::invalid_parameter(name, "action has no value")),
        _ if spec.secret => Ok(REDACTED.to_string()),
        _ => Ok((spec.get)(target)),
    }
}

/// Render every read-write option in schema order
pub fn render_options<T>(schema: &[OptionSpec<T>], target: &T) -> ParameterMap {
    let entries = schema
        .iter()
        .filter(|spec| spec.access == Access::ReadWrite)
        .map(|spec| {
            let value = if spec.secret {
                REDACTED.to_string()
            } else {
                (spec.get)(target)
            };
            (spec.name, value)
        })
        .collect();
    ParameterMap(entries)
}

/// Ordered `name -> value` rendering of an attack's configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap(Vec<(&'static str, String)>);

impl ParameterMap {
    /// Look up a rendered value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }

    /// Append the entries of another map, keeping order
    pub fn extend(&mut self, other: ParameterMap) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ParameterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// Value parsers shared by the schemas

/// Parse `true|false|1|0`
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::invalid_parameter(
            name,
            "Invalid value (use true/false or 1/0)",
        )),
    }
}

/// Render a flag the way [`parse_bool`] reads it
pub fn format_bool(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// Parse an integer in `min..=max`
pub fn parse_ranged(name: &str, value: &str, min: u32, max: u32) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(v) if (min..=max).contains(&v) => Ok(v),
        _ => Err(Error::invalid_parameter(
            name,
            format!("must be {}-{}", min, max),
        )),
    }
}

/// Parse a millisecond interval with a lower bound
pub fn parse_interval(name: &str, value: &str, min: Duration) -> Result<Duration> {
    match value.trim().parse::<u64>() {
        Ok(ms) if Duration::from_millis(ms) >= min => Ok(Duration::from_millis(ms)),
        _ => Err(Error::invalid_parameter(
            name,
            format!("Invalid interval (must be >= {}ms)", min.as_millis()),
        )),
    }
}

/// Render an interval in milliseconds
pub fn format_interval(interval: Duration) -> String {
    interval.as_millis().to_string()
}

/// Parse a dotted-quad IPv4 address
pub fn parse_ipv4(name: &str, value: &str) -> Result<Ipv4Addr> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_parameter(name, "Invalid IP address format"))
}

/// Parse a MAC address; an empty string clears it
pub fn parse_optional_mac(name: &str, value: &str) -> Result<Option<MacAddr>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| Error::invalid_parameter(name, "Invalid MAC address format"))
}

/// Render a resolved MAC address, empty when unresolved
pub fn format_optional_mac(mac: Option<MacAddr>) -> String {
    mac.map(|m| m.to_string()).unwrap_or_default()
}
