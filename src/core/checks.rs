//! Configuration check battery
//!
//! Nine fixed checks run in a fixed order over the whole document. Each
//! check owns a report slot with a status and an ordered finding list;
//! findings append and never overwrite, and a slot's status only escalates
//! (error beats warning beats ok) within one run. Running the battery
//! resets every slot first, so a report always reflects exactly one run.
//!
//! Tombstoned tables and inactive rules are skipped everywhere; rule
//! numbers in messages are 1-based row positions.

use tracing::debug;

use crate::core::icmp;
use crate::core::model::{Document, NatRule, Tables, NO_IFACE};
use crate::core::resolve::AddressBook;

/// Status of one check slot after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    #[default]
    #[strum(serialize = "unchecked")]
    Unchecked,
    #[strum(serialize = "ok")]
    Ok,
    #[strum(serialize = "warning")]
    Warning,
    #[strum(serialize = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[strum(serialize = "warning")]
    Warning,
    #[strum(serialize = "error")]
    Error,
}

/// A single diagnostic line under a check slot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Finding {
    pub text: String,
    pub severity: Severity,
}

/// One check slot: fixed title, merged status, appended findings.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CheckItem {
    pub title: &'static str,
    pub status: CheckStatus,
    pub findings: Vec<Finding>,
}

const CHECK_TITLES: [&str; 9] = [
    "Check if any interface is listed.",
    "Check if interfaces are part of the system.",
    "Check if all interfaces in chains are defined.",
    "Check if all parts of the filter rules are defined.",
    "Check if all filter rules have valid IPv4/IPv6 source/destination combinations.",
    "Check if all parts of the SNAT rules are defined.",
    "Check if all SNAT rules have valid IPv4/IPv6 source/destination combinations.",
    "Check if all parts of the DNAT rules are defined.",
    "Check if all DNAT rules have valid IPv4/IPv6 source/destination combinations.",
];

/// Mutable view of one slot while its check runs.
///
/// `finish` must be called exactly once per run; it marks a slot ok only
/// when nothing was recorded against it.
struct Check<'a> {
    item: &'a mut CheckItem,
    clean: bool,
}

impl Check<'_> {
    fn error(&mut self, text: String) {
        self.clean = false;
        self.item.status = CheckStatus::Error;
        self.item.findings.push(Finding {
            text,
            severity: Severity::Error,
        });
    }

    fn warning(&mut self, text: String) {
        self.clean = false;
        if self.item.status != CheckStatus::Error {
            self.item.status = CheckStatus::Warning;
        }
        self.item.findings.push(Finding {
            text,
            severity: Severity::Warning,
        });
    }

    fn finish(self) {
        if self.clean {
            self.item.status = CheckStatus::Ok;
        }
    }
}

/// Result of one full battery run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidationReport {
    pub items: [CheckItem; 9],
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            items: CHECK_TITLES.map(|title| CheckItem {
                title,
                status: CheckStatus::Unchecked,
                findings: Vec::new(),
            }),
        }
    }

    pub fn reset(&mut self) {
        for item in &mut self.items {
            item.status = CheckStatus::Unchecked;
            item.findings.clear();
        }
    }

    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.status == CheckStatus::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.status == CheckStatus::Warning)
    }

    /// All findings across slots, in battery order.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.items.iter().flat_map(|item| item.findings.iter())
    }

    /// Runs the full battery against `doc`. `system_interfaces` is the
    /// live kernel interface name list used by the existence check.
    pub fn run_all(&mut self, doc: &Document, system_interfaces: &[String]) {
        self.reset();
        debug!(
            chains = doc.chains.len(),
            interfaces = doc.interfaces.len(),
            "running check battery"
        );

        let book = AddressBook::of(doc);
        // Slot order matches CHECK_TITLES
        let [s0, s1, s2, s3, s4, s5, s6, s7, s8] = &mut self.items;
        let slot = |item| Check { item, clean: true };

        check_interfaces_listed(slot(s0), doc);
        check_interfaces_exist(slot(s1), doc, system_interfaces);
        check_chain_interfaces_defined(slot(s2), doc);
        check_filter_defined(slot(s3), doc, &book);
        check_filter_ip46(slot(s4), doc, &book);
        check_nat_defined(slot(s5), &doc.snat, NatKind::Snat, doc, &book);
        check_nat_ip46(slot(s6), &doc.snat, &book);
        check_nat_defined(slot(s7), &doc.dnat, NatKind::Dnat, doc, &book);
        check_nat_ip46(slot(s8), &doc.dnat, &book);
    }
}

fn check_interfaces_listed(mut check: Check<'_>, doc: &Document) {
    if doc.interfaces.is_empty() {
        check.error("No interfaces defined.".to_string());
    }
    check.finish();
}

fn check_interfaces_exist(mut check: Check<'_>, doc: &Document, system_interfaces: &[String]) {
    for iface in doc.interfaces.values() {
        if !system_interfaces.contains(&iface.systemname) {
            check.error(format!("Interface {} not found.", iface.systemname));
        }
    }
    check.finish();
}

fn check_chain_interfaces_defined(mut check: Check<'_>, doc: &Document) {
    for (name, chain) in &doc.chains {
        if chain.iface_in != NO_IFACE && !doc.interfaces.contains_key(&chain.iface_in) {
            check.error(format!(
                "Chain {name} uses undefined interface {}.",
                chain.iface_in
            ));
        }
        if chain.iface_out != NO_IFACE && !doc.interfaces.contains_key(&chain.iface_out) {
            check.error(format!(
                "Chain {name} uses undefined interface {}.",
                chain.iface_out
            ));
        }
    }
    check.finish();
}

fn check_filter_defined(mut check: Check<'_>, doc: &Document, book: &AddressBook<'_>) {
    for (chain, table) in doc.filter.iter() {
        if table.is_tombstoned() {
            continue;
        }
        for (index, rule) in table.rules.iter().enumerate() {
            if !rule.active {
                continue;
            }
            let row = index + 1;
            for def in &rule.source {
                if book.is_unresolved(def) {
                    check.error(format!(
                        "Rule {row} in chain {chain} has undefined or empty source definition named {def}."
                    ));
                }
            }
            for def in &rule.destination {
                if book.is_unresolved(def) {
                    check.error(format!(
                        "Rule {row} in chain {chain} has an undefined or empty destination definition named {def}."
                    ));
                }
            }
            // Filter service cells also accept ICMP type names
            for def in &rule.source_service {
                if !doc.services.contains_key(def) && !icmp::is_icmp_type(def) {
                    check.error(format!(
                        "Rule {row} in chain {chain} has an undefined source service named {def}."
                    ));
                }
            }
            for def in &rule.destination_service {
                if !doc.services.contains_key(def) && !icmp::is_icmp_type(def) {
                    check.error(format!(
                        "Rule {row} in chain {chain} has an undefined destination service named {def}."
                    ));
                }
            }
        }
    }
    check.finish();
}

fn check_filter_ip46(mut check: Check<'_>, doc: &Document, book: &AddressBook<'_>) {
    for (chain, table) in doc.filter.iter() {
        if table.is_tombstoned() {
            continue;
        }
        for (index, rule) in table.rules.iter().enumerate() {
            if !rule.active {
                continue;
            }
            let row = index + 1;
            let (v4s, v6s) = resolve_all(book, &rule.source);
            let (v4d, v6d) = resolve_all(book, &rule.destination);

            if !v4s.is_empty() && v6s.is_empty() && !v6d.is_empty() && v4d.is_empty() {
                check.error(format!(
                    "Rule {row} in chain {chain} has IPv4 source addresses but only IPv6 destination addresses."
                ));
            }
            if !v6s.is_empty() && v4s.is_empty() && !v4d.is_empty() && v6d.is_empty() {
                check.error(format!(
                    "Rule {row} in chain {chain} has IPv6 source addresses but only IPv4 destination addresses."
                ));
            }
        }
    }
    check.finish();
}

#[derive(Clone, Copy)]
enum NatKind {
    Snat,
    Dnat,
}

impl NatKind {
    fn label(self) -> &'static str {
        match self {
            Self::Snat => "SNAT",
            Self::Dnat => "DNAT",
        }
    }

    fn translated_noun(self) -> &'static str {
        match self {
            Self::Snat => "translated source definition",
            Self::Dnat => "translated destination definition",
        }
    }
}

fn check_nat_defined(
    mut check: Check<'_>,
    tables: &Tables<NatRule>,
    kind: NatKind,
    doc: &Document,
    book: &AddressBook<'_>,
) {
    let label = kind.label();
    for (chain, table) in tables.iter() {
        if table.is_tombstoned() {
            continue;
        }
        for (index, rule) in table.rules.iter().enumerate() {
            if !rule.active {
                continue;
            }
            let row = index + 1;
            for def in &rule.source {
                if book.is_unresolved(def) {
                    check.error(format!(
                        "Rule {row} in {label} chain {chain} has undefined or empty source definition named {def}."
                    ));
                }
            }
            for def in &rule.destination {
                if book.is_unresolved(def) {
                    check.error(format!(
                        "Rule {row} in {label} chain {chain} has an undefined or empty destination definition named {def}."
                    ));
                }
            }
            // An unset translated cell resolves to nothing and reports here
            if book.is_unresolved(&rule.translated) {
                check.error(format!(
                    "Rule {row} in {label} chain {chain} has an undefined or empty {} named {}.",
                    kind.translated_noun(),
                    rule.translated
                ));
            }
            // NAT service cells take plain services only, never ICMP names
            for def in &rule.source_service {
                if !doc.services.contains_key(def) {
                    check.error(format!(
                        "Rule {row} in {label} chain {chain} has an undefined source service named {def}."
                    ));
                }
            }
            for def in &rule.destination_service {
                if !doc.services.contains_key(def) {
                    check.error(format!(
                        "Rule {row} in {label} chain {chain} has an undefined destination service named {def}."
                    ));
                }
            }
            if !rule.translated_service.is_empty()
                && !doc.services.contains_key(&rule.translated_service)
            {
                // Historical quirk: this line says SNAT for both NAT kinds
                check.error(format!(
                    "Rule {row} in SNAT chain {chain} has an undefined translated service named {}.",
                    rule.translated_service
                ));
            }
        }
    }
    check.finish();
}

#[allow(clippy::too_many_lines)]
fn check_nat_ip46(mut check: Check<'_>, tables: &Tables<NatRule>, book: &AddressBook<'_>) {
    for (chain, table) in tables.iter() {
        if table.is_tombstoned() {
            continue;
        }
        for (index, rule) in table.rules.iter().enumerate() {
            if !rule.active {
                continue;
            }
            let row = index + 1;
            let (v4s, v6s) = resolve_all(book, &rule.source);
            let (v4d, v6d) = resolve_all(book, &rule.destination);
            let v4t = book.ipv4_literals(&rule.translated);
            let v6t = book.ipv6_literals(&rule.translated);

            if v4t.is_empty() && v6t.is_empty() {
                check.error(format!(
                    "Rule {row} in chain {chain} has no translated addresses."
                ));
            }
            if v4t.len() > 1 {
                check.error(format!(
                    "Rule {row} in chain {chain} has multiple translated IPv4 addresses. Only a single address per type is allowed."
                ));
            }
            if v6t.len() > 1 {
                check.error(format!(
                    "Rule {row} in chain {chain} has multiple translated IPv6 addresses. Only a single address per type is allowed."
                ));
            }
            if !v4s.is_empty() && v6s.is_empty() {
                if !v6d.is_empty() && v4d.is_empty() {
                    check.error(format!(
                        "Rule {row} in chain {chain} has only IPv4 source addresses but only IPv6 destination addresses."
                    ));
                }
                if v4t.is_empty() {
                    check.error(format!(
                        "Rule {row} in chain {chain} has only IPv4 source addresses but no translated IPv4 address."
                    ));
                }
            }
            if !v6s.is_empty() && v4s.is_empty() {
                if !v4d.is_empty() && v6d.is_empty() {
                    check.error(format!(
                        "Rule {row} in chain {chain} has only IPv6 source addresses but only IPv4 destination addresses."
                    ));
                }
                if v6t.is_empty() {
                    check.error(format!(
                        "Rule {row} in chain {chain} has only IPv6 source addresses but no translated IPv6 address."
                    ));
                }
            }
            if !v4d.is_empty() && v6d.is_empty() && v4t.is_empty() {
                check.error(format!(
                    "Rule {row} in chain {chain} has only IPv4 destination addresses but no translated IPv4 address."
                ));
            }
            if !v6d.is_empty() && v4d.is_empty() && v6t.is_empty() {
                check.error(format!(
                    "Rule {row} in chain {chain} has only IPv6 destination addresses but no translated IPv6 address."
                ));
            }

            // Softer overlap diagnostics for mixed-family rules; these
            // intentionally re-cover some of the pure-family errors above
            if !v4s.is_empty() && v4t.is_empty() {
                check.warning(format!(
                    "Rule {row} in chain {chain} has IPv4 source addresses but no translated IPv4 address."
                ));
            }
            if !v6s.is_empty() && v6t.is_empty() {
                check.warning(format!(
                    "Rule {row} in chain {chain} has IPv6 source addresses but no translated IPv6 address."
                ));
            }
            if !v4d.is_empty() && v4t.is_empty() {
                check.warning(format!(
                    "Rule {row} in chain {chain} has IPv4 destination addresses but no translated IPv4 address."
                ));
            }
            if !v6d.is_empty() && v6t.is_empty() {
                check.warning(format!(
                    "Rule {row} in chain {chain} has IPv6 Destination addresses but no translated IPv6 address."
                ));
            }
        }
    }
    check.finish();
}

fn resolve_all(book: &AddressBook<'_>, names: &[String]) -> (Vec<String>, Vec<String>) {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    for name in names {
        v4.extend(book.ipv4_literals(name));
        v6.extend(book.ipv6_literals(name));
    }
    (v4, v6)
}
