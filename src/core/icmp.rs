//! Fixed ICMP type-name lists
//!
//! Filter rule service cells accept these names in addition to defined
//! services; NAT service cells never do. The names are the nftables
//! `icmp type` / `icmpv6 type` keywords and are not user-editable.

/// ICMPv4 type names accepted in filter rule service fields
pub const ICMPV4_TYPES: &[&str] = &[
    "echo-reply",
    "destination-unreachable",
    "source-quench",
    "redirect",
    "echo-request",
    "router-advertisement",
    "router-solicitation",
    "time-exceeded",
    "parameter-problem",
    "timestamp-request",
    "timestamp-reply",
    "info-request",
    "info-reply",
    "address-mask-request",
    "address-mask-reply",
];

/// ICMPv6 type names accepted in filter rule service fields
pub const ICMPV6_TYPES: &[&str] = &[
    "destination-unreachable",
    "packet-too-big",
    "time-exceeded",
    "parameter-problem",
    "echo-request",
    "echo-reply",
    "mld-listener-query",
    "mld-listener-report",
    "mld-listener-done",
    "nd-router-solicit",
    "nd-router-advert",
    "nd-neighbor-solicit",
    "nd-neighbor-advert",
    "nd-redirect",
    "router-renumbering",
];

/// Returns `true` if `name` is a known ICMPv4 or ICMPv6 type name.
pub fn is_icmp_type(name: &str) -> bool {
    ICMPV4_TYPES.contains(&name) || ICMPV6_TYPES.contains(&name)
}
