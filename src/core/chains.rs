//! Chain generation from the interface list
//!
//! Rebuilds the chain dictionary from the defined interfaces and re-keys
//! the three rule-table collections to match. Existing chain entries and
//! rule tables survive regeneration under the same name; tables whose
//! chain disappeared are tombstoned while they still hold rules and
//! dropped once empty.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::core::error::{Error, Result};
use crate::core::model::{
    ChainItem, ChainsMap, Direction, Document, Lifecycle, Policy, RuleTable, Tables, NO_IFACE,
};

/// Regenerates `doc.chains` and re-keys the filter/SNAT/DNAT tables.
///
/// Per interface, in dictionary order: an `In-on-{name}` chain, a
/// `Forward-{name}-to-{other}` chain for every other non-loopback
/// interface (loopback never forwards), and an `Out-on-{name}` chain.
/// New chains default to accept on loopback interfaces and drop
/// everywhere else; chains that already exist keep their settings.
pub fn generate_chains(doc: &mut Document) -> Result<()> {
    if doc.interfaces.is_empty() {
        return Err(Error::NoInterfaces);
    }

    let mut chains: ChainsMap = IndexMap::new();
    for (name, iface) in &doc.interfaces {
        let policy = if iface.loopback {
            Policy::Accept
        } else {
            Policy::Drop
        };

        let key = format!("In-on-{name}");
        let entry = doc.chains.get(&key).cloned().unwrap_or(ChainItem {
            filter: false,
            snat: false,
            dnat: false,
            iface_in: name.clone(),
            iface_out: NO_IFACE.to_string(),
            direction: Direction::Input,
            policy,
        });
        chains.insert(key, entry);

        if !iface.loopback {
            for (other, other_iface) in &doc.interfaces {
                if other == name || other_iface.loopback {
                    continue;
                }
                let key = format!("Forward-{name}-to-{other}");
                let entry = doc.chains.get(&key).cloned().unwrap_or(ChainItem {
                    filter: false,
                    snat: false,
                    dnat: false,
                    iface_in: name.clone(),
                    iface_out: other.clone(),
                    direction: Direction::Forward,
                    policy,
                });
                chains.insert(key, entry);
            }
        }

        let key = format!("Out-on-{name}");
        let entry = doc.chains.get(&key).cloned().unwrap_or(ChainItem {
            filter: false,
            snat: false,
            dnat: false,
            iface_in: NO_IFACE.to_string(),
            iface_out: name.clone(),
            direction: Direction::Output,
            policy,
        });
        chains.insert(key, entry);
    }

    info!(chains = chains.len(), "generated chains");
    doc.chains = chains;

    rekey(&doc.chains, &mut doc.filter, |_| true);
    rekey(&doc.chains, &mut doc.snat, |chain| {
        matches!(chain.direction, Direction::Output | Direction::Forward)
    });
    rekey(&doc.chains, &mut doc.dnat, |chain| {
        matches!(chain.direction, Direction::Input | Direction::Forward)
    });
    Ok(())
}

/// Rebuilds `tables` in chain order, keeping only chains `wants` accepts.
///
/// A surviving table keeps its rules, fold state, and stored policy, and
/// is reactivated if a tombstone's chain came back. Orphaned tables keep
/// their rules behind a tombstone; empty orphans are dropped.
fn rekey<R>(
    chains: &ChainsMap,
    tables: &mut Tables<R>,
    wants: impl Fn(&ChainItem) -> bool,
) {
    let mut old = std::mem::take(&mut **tables);
    for (name, chain) in chains {
        if !wants(chain) {
            continue;
        }
        let table = match old.shift_remove(name) {
            Some(mut table) => {
                table.lifecycle = Lifecycle::Active;
                table
            }
            None => RuleTable::new(chain.policy),
        };
        tables.insert(name.clone(), table);
    }
    for (name, mut table) in old {
        if table.rules.is_empty() {
            debug!(chain = %name, "dropping empty orphaned table");
        } else {
            table.lifecycle = Lifecycle::Tombstoned;
            tables.insert(name, table);
        }
    }
}
