//! Input validation for definition panels and document loading
//!
//! Address literals are validated per family: a host entry must parse as a
//! plain IPv4 or IPv6 address, a network entry as a CIDR of the matching
//! family. Resolution and the check battery rely on the same predicates, so
//! an entry that fails here never reaches a generated ruleset.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// `true` if `input` is a plain dotted-quad IPv4 address.
pub fn is_valid_ipv4(input: &str) -> bool {
    Ipv4Addr::from_str(input).is_ok()
}

/// `true` if `input` is a plain IPv6 address.
pub fn is_valid_ipv6(input: &str) -> bool {
    Ipv6Addr::from_str(input).is_ok()
}

/// Validates an IPv4 host entry.
///
/// # Errors
///
/// Returns `Err` if `input` is not a plain IPv4 address.
pub fn validate_ipv4_address(input: &str) -> Result<String, String> {
    if is_valid_ipv4(input) {
        Ok(input.to_string())
    } else {
        Err(format!("{input} is not a valid IPv4 address"))
    }
}

/// Validates an IPv6 host entry.
///
/// # Errors
///
/// Returns `Err` if `input` is not a plain IPv6 address.
pub fn validate_ipv6_address(input: &str) -> Result<String, String> {
    if is_valid_ipv6(input) {
        Ok(input.to_string())
    } else {
        Err(format!("{input} is not a valid IPv6 address"))
    }
}

/// Validates an IPv4 network entry in CIDR notation.
///
/// # Errors
///
/// Returns `Err` if `input` does not parse as an IPv4 network.
pub fn validate_ipv4_network(input: &str) -> Result<String, String> {
    match ipnetwork::Ipv4Network::from_str(input) {
        Ok(_) => Ok(input.to_string()),
        Err(_) => Err(format!("{input} is not a valid IPv4 network")),
    }
}

/// Validates an IPv6 network entry in CIDR notation.
///
/// # Errors
///
/// Returns `Err` if `input` does not parse as an IPv6 network.
pub fn validate_ipv6_network(input: &str) -> Result<String, String> {
    match ipnetwork::Ipv6Network::from_str(input) {
        Ok(_) => Ok(input.to_string()),
        Err(_) => Err(format!("{input} is not a valid IPv6 network")),
    }
}

/// Validates a definition name (interface, host, group, network, service).
///
/// Names end up as dictionary keys and inside generated chain names, so
/// they are restricted to ASCII alphanumerics plus dot, dash, underscore.
///
/// # Errors
///
/// Returns `Err` if:
/// - Name is empty
/// - Name exceeds 64 characters
/// - Name contains characters outside the allowed set
pub fn validate_name(name: &str) -> Result<String, String> {
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if name.len() > 64 {
        return Err("Name too long (max 64 characters)".to_string());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err("Name contains invalid characters".to_string());
    }

    Ok(name.to_string())
}

/// Validates a single port number.
///
/// # Errors
///
/// Returns `Err` if port is 0 (reserved).
pub fn validate_port(port: u16) -> Result<u16, String> {
    if port == 0 {
        Err("Port must be between 1 and 65535".to_string())
    } else {
        Ok(port)
    }
}

/// Sanitizes a rule comment.
///
/// Removes control characters, quotes, and shell metacharacters, and limits
/// length to 64 bytes.
pub fn sanitize_comment(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | ':'))
        .take(64)
        .collect()
}
