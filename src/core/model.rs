//! Configuration document model
//!
//! This module defines the in-memory form of an editor document: interface,
//! host, host-group, network and service dictionaries, the chain list, and
//! the three rule-table collections (filter, SNAT, DNAT).
//!
//! # Names
//!
//! Rules reference address and service definitions by name only; resolution
//! to literals happens in [`super::resolve`] and nothing here enforces that a
//! referenced name exists. Dangling names are what the check battery is for.
//!
//! # Save shape
//!
//! Dictionaries serialize as JSON objects in insertion order. Rule-table
//! collections serialize as `{ "tables": [{chain, policy, deleted, rules}],
//! "dragpos": [...] }`; the `visible` fold flag is transient and not saved.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// A named network interface definition.
///
/// The display name (the dictionary key) is user-chosen; `systemname` is the
/// kernel name checked against the live interface list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDef {
    pub systemname: String,
    /// Human-readable address summary from detection, display only
    #[serde(default)]
    pub addresses: String,
    #[serde(default)]
    pub loopback: bool,
}

/// A host definition: ordered IPv4 and IPv6 literal lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDef {
    #[serde(default)]
    pub ipv4: Vec<String>,
    #[serde(default)]
    pub ipv6: Vec<String>,
}

/// Transport protocol of a service definition
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum ServiceProtocol {
    #[serde(rename = "TCP")]
    #[strum(serialize = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    #[strum(serialize = "UDP")]
    Udp,
    #[serde(rename = "TCP/UDP")]
    #[strum(serialize = "TCP/UDP")]
    TcpUdp,
}

/// A service definition: a single port plus protocol.
///
/// ICMP type names are deliberately not services; they live in
/// [`super::icmp`] and are only accepted by filter rule service cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDef {
    pub port: u16,
    pub protocol: ServiceProtocol,
    /// Built-in services are seeded by [`Document::new`] and protected from
    /// deletion in the UI layer.
    #[serde(rename = "default", default)]
    pub builtin: bool,
}

/// Traffic direction of a chain
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[strum(serialize = "input")]
    Input,
    #[strum(serialize = "output")]
    Output,
    #[strum(serialize = "forward")]
    Forward,
}

/// Default verdict of a chain or table
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    #[strum(serialize = "accept")]
    Accept,
    #[strum(serialize = "drop")]
    Drop,
}

/// Verdict of a single filter rule
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[strum(serialize = "accept")]
    Accept,
    /// New rules start as drop so a half-built rule never opens a hole.
    #[default]
    #[strum(serialize = "drop")]
    Drop,
}

/// Dropped-packet logging policy for the generated ruleset
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum Logging {
    #[default]
    #[strum(serialize = "none")]
    None,
    #[strum(serialize = "counter")]
    Counter,
    #[strum(serialize = "log")]
    Log,
}

/// One generated chain: which rule surfaces are enabled and where it hooks.
///
/// `iface_in`/`iface_out` hold an interface display name or the `"-"`
/// placeholder for "not applicable in this direction".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainItem {
    pub filter: bool,
    pub snat: bool,
    pub dnat: bool,
    pub iface_in: String,
    pub iface_out: String,
    pub direction: Direction,
    pub policy: Policy,
}

/// Placeholder used by [`ChainItem::iface_in`]/[`ChainItem::iface_out`] when
/// a chain has no interface on that side.
pub const NO_IFACE: &str = "-";

/// Chain dictionary in generation order.
pub type ChainsMap = IndexMap<String, ChainItem>;

/// Identity of one rule cell within a table row.
///
/// The `Display` form matches the cell-id suffixes used by the rendering
/// layer (`source`, `destinationservice`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum CellField {
    #[strum(serialize = "source")]
    Source,
    #[strum(serialize = "destination")]
    Destination,
    #[strum(serialize = "sourceservice")]
    SourceService,
    #[strum(serialize = "destinationservice")]
    DestinationService,
    #[strum(serialize = "translated")]
    Translated,
    #[strum(serialize = "translatedservice")]
    TranslatedService,
}

/// Uniform cell access for drag mutations over both rule kinds.
///
/// List cells (source/destination and their service counterparts) collect
/// names; single cells (the translated pair) hold at most one name, with the
/// empty string meaning unset. A rule kind returns `None` for cells it does
/// not have.
pub trait RuleCells: Sized {
    /// Fresh rule with `value` placed in `field`, or `None` if this rule
    /// kind has no such cell.
    fn from_value(field: CellField, value: &str) -> Option<Self>;

    fn list_mut(&mut self, field: CellField) -> Option<&mut Vec<String>>;

    fn single_mut(&mut self, field: CellField) -> Option<&mut String>;

    /// `true` when every cell and the comment are empty; blank rules are
    /// auto-deleted when a drag removes their last value.
    fn is_blank(&self) -> bool;
}

/// One row of a chain's filter table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(default)]
    pub source: Vec<String>,
    #[serde(rename = "sourceservice", default)]
    pub source_service: Vec<String>,
    #[serde(default)]
    pub destination: Vec<String>,
    #[serde(rename = "destinationservice", default)]
    pub destination_service: Vec<String>,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub comment: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Default for FilterRule {
    fn default() -> Self {
        Self {
            source: Vec::new(),
            source_service: Vec::new(),
            destination: Vec::new(),
            destination_service: Vec::new(),
            action: Action::Drop,
            comment: String::new(),
            active: true,
        }
    }
}

impl RuleCells for FilterRule {
    fn from_value(field: CellField, value: &str) -> Option<Self> {
        let mut rule = Self::default();
        rule.list_mut(field)?.push(value.to_string());
        Some(rule)
    }

    fn list_mut(&mut self, field: CellField) -> Option<&mut Vec<String>> {
        match field {
            CellField::Source => Some(&mut self.source),
            CellField::Destination => Some(&mut self.destination),
            CellField::SourceService => Some(&mut self.source_service),
            CellField::DestinationService => Some(&mut self.destination_service),
            CellField::Translated | CellField::TranslatedService => None,
        }
    }

    fn single_mut(&mut self, _field: CellField) -> Option<&mut String> {
        None
    }

    fn is_blank(&self) -> bool {
        self.source.is_empty()
            && self.destination.is_empty()
            && self.source_service.is_empty()
            && self.destination_service.is_empty()
            && self.comment.is_empty()
    }
}

/// One row of a chain's SNAT or DNAT table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatRule {
    #[serde(default)]
    pub source: Vec<String>,
    #[serde(rename = "sourceservice", default)]
    pub source_service: Vec<String>,
    #[serde(default)]
    pub destination: Vec<String>,
    #[serde(rename = "destinationservice", default)]
    pub destination_service: Vec<String>,
    /// Single translated address name, empty string when unset
    #[serde(default)]
    pub translated: String,
    #[serde(rename = "translatedservice", default)]
    pub translated_service: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Default for NatRule {
    fn default() -> Self {
        Self {
            source: Vec::new(),
            source_service: Vec::new(),
            destination: Vec::new(),
            destination_service: Vec::new(),
            translated: String::new(),
            translated_service: String::new(),
            comment: String::new(),
            active: true,
        }
    }
}

impl RuleCells for NatRule {
    fn from_value(field: CellField, value: &str) -> Option<Self> {
        let mut rule = Self::default();
        if let Some(list) = rule.list_mut(field) {
            list.push(value.to_string());
        } else {
            *rule.single_mut(field)? = value.to_string();
        }
        Some(rule)
    }

    fn list_mut(&mut self, field: CellField) -> Option<&mut Vec<String>> {
        match field {
            CellField::Source => Some(&mut self.source),
            CellField::Destination => Some(&mut self.destination),
            CellField::SourceService => Some(&mut self.source_service),
            CellField::DestinationService => Some(&mut self.destination_service),
            CellField::Translated | CellField::TranslatedService => None,
        }
    }

    fn single_mut(&mut self, field: CellField) -> Option<&mut String> {
        match field {
            CellField::Translated => Some(&mut self.translated),
            CellField::TranslatedService => Some(&mut self.translated_service),
            _ => None,
        }
    }

    fn is_blank(&self) -> bool {
        self.source.is_empty()
            && self.destination.is_empty()
            && self.source_service.is_empty()
            && self.destination_service.is_empty()
            && self.translated.is_empty()
            && self.translated_service.is_empty()
            && self.comment.is_empty()
    }
}

fn default_true() -> bool {
    true
}

/// Lifecycle of a rule table after chain regeneration.
///
/// A table whose chain disappeared keeps its rules as a tombstone so history
/// survives regeneration; it is purged once its rule list empties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Active,
    Tombstoned,
}

/// Rule table of one chain: ordered rules plus UI fold state and lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable<R> {
    pub rules: Vec<R>,
    /// Fold state; only visible tables contribute drag receivers
    pub visible: bool,
    pub lifecycle: Lifecycle,
    /// Mirror of the owning chain's default policy
    pub policy: Policy,
}

impl<R> RuleTable<R> {
    pub fn new(policy: Policy) -> Self {
        Self {
            rules: Vec::new(),
            visible: false,
            lifecycle: Lifecycle::Active,
            policy,
        }
    }

    pub fn is_tombstoned(&self) -> bool {
        self.lifecycle == Lifecycle::Tombstoned
    }
}

/// Screen position of a floating panel, persisted with the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelPos {
    pub top: f32,
    pub left: f32,
}

/// Chain-name-keyed collection of rule tables plus its floating palette
/// positions, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tables<R> {
    map: IndexMap<String, RuleTable<R>>,
    pub dragpos: Vec<PanelPos>,
}

impl<R> Default for Tables<R> {
    fn default() -> Self {
        Self {
            map: IndexMap::new(),
            dragpos: Vec::new(),
        }
    }
}

impl<R> Deref for Tables<R> {
    type Target = IndexMap<String, RuleTable<R>>;

    fn deref(&self) -> &Self::Target {
        &self.map
    }
}

impl<R> DerefMut for Tables<R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.map
    }
}

impl<R> Tables<R> {
    /// Drops tombstoned tables whose rule list has emptied.
    pub fn purge_empty_tombstones(&mut self) {
        self.map
            .retain(|_, table| !(table.is_tombstoned() && table.rules.is_empty()));
    }
}

#[derive(Serialize)]
struct TableRecordRef<'a, R> {
    chain: &'a str,
    policy: Policy,
    deleted: bool,
    rules: &'a [R],
}

#[derive(Deserialize)]
struct TableRecord<R> {
    chain: String,
    policy: Policy,
    #[serde(default)]
    deleted: bool,
    #[serde(default = "Vec::new")]
    rules: Vec<R>,
}

#[derive(Deserialize)]
struct TablesRepr<R> {
    #[serde(default = "Vec::new")]
    tables: Vec<TableRecord<R>>,
    #[serde(default)]
    dragpos: Vec<PanelPos>,
}

impl<R: Serialize> Serialize for Tables<R> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let records: Vec<TableRecordRef<'_, R>> = self
            .map
            .iter()
            .map(|(chain, table)| TableRecordRef {
                chain,
                policy: table.policy,
                deleted: table.is_tombstoned(),
                rules: &table.rules,
            })
            .collect();

        let mut state = serializer.serialize_struct("Tables", 2)?;
        state.serialize_field("tables", &records)?;
        state.serialize_field("dragpos", &self.dragpos)?;
        state.end()
    }
}

impl<'de, R: Deserialize<'de>> Deserialize<'de> for Tables<R> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = TablesRepr::<R>::deserialize(deserializer)?;
        let mut map = IndexMap::with_capacity(repr.tables.len());
        for record in repr.tables {
            map.insert(
                record.chain,
                RuleTable {
                    rules: record.rules,
                    visible: false,
                    lifecycle: if record.deleted {
                        Lifecycle::Tombstoned
                    } else {
                        Lifecycle::Active
                    },
                    policy: record.policy,
                },
            );
        }
        Ok(Self {
            map,
            dragpos: repr.dragpos,
        })
    }
}

/// The full editor document.
///
/// All dictionaries are insertion-ordered so saved documents render the same
/// way they were built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub interfaces: IndexMap<String, InterfaceDef>,
    #[serde(default)]
    pub hosts: IndexMap<String, HostDef>,
    #[serde(default)]
    pub hostgroups: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub ipv4networks: IndexMap<String, String>,
    #[serde(default)]
    pub ipv6networks: IndexMap<String, String>,
    #[serde(default)]
    pub services: IndexMap<String, ServiceDef>,
    #[serde(default)]
    pub chains: ChainsMap,
    #[serde(rename = "filters", default)]
    pub filter: Tables<FilterRule>,
    #[serde(default)]
    pub snat: Tables<NatRule>,
    #[serde(default)]
    pub dnat: Tables<NatRule>,
    /// Manual rule text inserted before the generated rules
    #[serde(default)]
    pub pre: String,
    /// Manual rule text appended after the generated rules
    #[serde(default)]
    pub post: String,
    #[serde(default)]
    pub logging: Logging,
    #[serde(rename = "checksdragpos", default)]
    pub checks_panel: PanelPos,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document seeded with the built-in service list.
    pub fn new() -> Self {
        let mut services = IndexMap::new();
        for (name, port, protocol) in [
            ("DNS", 53, ServiceProtocol::TcpUdp),
            ("HTTP", 80, ServiceProtocol::TcpUdp),
            ("HTTPS", 443, ServiceProtocol::TcpUdp),
            ("SMTP", 25, ServiceProtocol::Tcp),
            ("SSH", 22, ServiceProtocol::Tcp),
        ] {
            services.insert(
                name.to_string(),
                ServiceDef {
                    port,
                    protocol,
                    builtin: true,
                },
            );
        }

        Self {
            interfaces: IndexMap::new(),
            hosts: IndexMap::new(),
            hostgroups: IndexMap::new(),
            ipv4networks: IndexMap::new(),
            ipv6networks: IndexMap::new(),
            services,
            chains: IndexMap::new(),
            filter: Tables::default(),
            snat: Tables::default(),
            dnat: Tables::default(),
            pre: String::new(),
            post: String::new(),
            logging: Logging::None,
            checks_panel: PanelPos {
                top: 140.0,
                left: 620.0,
            },
        }
    }

    /// `true` if `name` is taken by any address definition kind.
    ///
    /// Address names share one namespace across hosts, groups, and networks.
    pub fn address_name_taken(&self, name: &str) -> bool {
        self.hosts.contains_key(name)
            || self.hostgroups.contains_key(name)
            || self.ipv4networks.contains_key(name)
            || self.ipv6networks.contains_key(name)
    }
}

impl fmt::Display for ChainItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} ({})",
            self.direction, self.iface_in, self.iface_out, self.policy
        )
    }
}
