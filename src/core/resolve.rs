//! Address-name resolution
//!
//! Expands an address definition name into the literal lists the checks
//! reason about, one family at a time. A name may simultaneously be a host,
//! a member-bearing group, and a network; all three contribute.
//!
//! Resolution rules:
//! - Host literals are validated for the requested family and deduplicated
//!   within one resolution; malformed entries are skipped silently here
//!   (the definition panels flag them at entry time).
//! - Group expansion goes through the hosts map only and is one level deep.
//!   A group member that is itself a group contributes nothing.
//! - A network entry is appended verbatim, without validation or dedup.

use indexmap::IndexMap;

use crate::core::model::HostDef;
use crate::validators;

/// The address dictionaries resolution reads from.
pub struct AddressBook<'a> {
    pub hosts: &'a IndexMap<String, HostDef>,
    pub hostgroups: &'a IndexMap<String, Vec<String>>,
    pub ipv4networks: &'a IndexMap<String, String>,
    pub ipv6networks: &'a IndexMap<String, String>,
}

impl<'a> AddressBook<'a> {
    pub fn of(doc: &'a crate::core::model::Document) -> Self {
        Self {
            hosts: &doc.hosts,
            hostgroups: &doc.hostgroups,
            ipv4networks: &doc.ipv4networks,
            ipv6networks: &doc.ipv6networks,
        }
    }

    /// IPv4 literals for `name`: host addresses, then one-level group
    /// expansion, then the network CIDR if any.
    pub fn ipv4_literals(&self, name: &str) -> Vec<String> {
        self.literals(
            name,
            |host| &host.ipv4,
            validators::is_valid_ipv4,
            self.ipv4networks,
        )
    }

    /// IPv6 literals for `name`, same shape as [`Self::ipv4_literals`].
    pub fn ipv6_literals(&self, name: &str) -> Vec<String> {
        self.literals(
            name,
            |host| &host.ipv6,
            validators::is_valid_ipv6,
            self.ipv6networks,
        )
    }

    /// `true` when `name` resolves to nothing in either family.
    pub fn is_unresolved(&self, name: &str) -> bool {
        self.ipv4_literals(name).is_empty() && self.ipv6_literals(name).is_empty()
    }

    fn literals(
        &self,
        name: &str,
        family_list: impl Fn(&HostDef) -> &Vec<String>,
        is_valid: impl Fn(&str) -> bool,
        networks: &IndexMap<String, String>,
    ) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push_host = |host: &HostDef, out: &mut Vec<String>| {
            for ip in family_list(host) {
                if is_valid(ip) && !out.iter().any(|seen| seen == ip) {
                    out.push(ip.clone());
                }
            }
        };

        if let Some(host) = self.hosts.get(name) {
            push_host(host, &mut out);
        }
        if let Some(members) = self.hostgroups.get(name) {
            for member in members {
                // One level only: nested groups do not expand
                if let Some(host) = self.hosts.get(member) {
                    push_host(host, &mut out);
                }
            }
        }
        if let Some(network) = networks.get(name) {
            out.push(network.clone());
        }
        out
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::core::model::Document;
    use proptest::prelude::*;

    fn ipv4_literal() -> impl Strategy<Value = String> {
        (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>())
            .prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}"))
    }

    proptest! {
        #[test]
        fn test_names_absent_from_every_dictionary_resolve_empty(name in "[a-z]{1,16}") {
            let doc = Document::new();
            let book = AddressBook::of(&doc);
            prop_assert!(book.ipv4_literals(&name).is_empty());
            prop_assert!(book.ipv6_literals(&name).is_empty());
        }

        #[test]
        fn test_host_resolution_has_no_duplicates(ips in prop::collection::vec(ipv4_literal(), 0..8)) {
            let mut doc = Document::new();
            doc.hosts.insert(
                "h".to_string(),
                HostDef {
                    ipv4: ips,
                    ipv6: vec![],
                },
            );
            let book = AddressBook::of(&doc);
            let resolved = book.ipv4_literals("h");
            let mut deduped = resolved.clone();
            deduped.sort();
            deduped.dedup();
            prop_assert_eq!(resolved.len(), deduped.len());
        }

        #[test]
        fn test_group_resolution_includes_member_hosts(ips in prop::collection::vec(ipv4_literal(), 1..4)) {
            let mut doc = Document::new();
            doc.hosts.insert(
                "member".to_string(),
                HostDef {
                    ipv4: ips.clone(),
                    ipv6: vec![],
                },
            );
            doc.hostgroups
                .insert("grp".to_string(), vec!["member".to_string()]);
            let book = AddressBook::of(&doc);
            let resolved = book.ipv4_literals("grp");
            for ip in &ips {
                prop_assert!(resolved.iter().any(|r| r == ip));
            }
            prop_assert!(book.ipv6_literals("grp").is_empty());
        }
    }
}
