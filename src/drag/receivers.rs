//! Receiver collection and hit-testing
//!
//! When a drag starts, every cell that may accept the dragged value kind is
//! measured once into a flat receiver list. Only visible, non-tombstoned
//! tables contribute. Receivers are ordered table by table, rows before the
//! trailing append row, and hit-testing returns the first match in that
//! order, so overlapping rectangles resolve deterministically.

use crate::core::model::{CellField, FilterRule, NatRule, RuleCells, Tables};
use crate::drag::geometry::{cell_id, CellGeometry, Rect, RowSlot};

/// What kind of value is being dragged.
///
/// Hosts and addresses land on address cells; only hosts may land on a NAT
/// translated cell, since translation targets a single concrete address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum DragKind {
    #[strum(serialize = "host")]
    Host,
    #[strum(serialize = "address")]
    Address,
    #[strum(serialize = "service")]
    Service,
}

/// One droppable cell with its measured rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    pub chain: String,
    pub field: CellField,
    pub slot: RowSlot,
    pub rect: Rect,
}

impl Receiver {
    pub fn id(&self) -> String {
        cell_id(&self.chain, self.field, self.slot)
    }
}

/// Which cells of a rule kind accept a given drag kind.
pub trait DragTargets: RuleCells {
    fn drag_fields(kind: DragKind) -> &'static [CellField];
}

impl DragTargets for FilterRule {
    fn drag_fields(kind: DragKind) -> &'static [CellField] {
        match kind {
            DragKind::Host | DragKind::Address => &[CellField::Source, CellField::Destination],
            DragKind::Service => &[CellField::SourceService, CellField::DestinationService],
        }
    }
}

impl DragTargets for NatRule {
    fn drag_fields(kind: DragKind) -> &'static [CellField] {
        match kind {
            DragKind::Host => &[
                CellField::Source,
                CellField::Destination,
                CellField::Translated,
            ],
            DragKind::Address => &[CellField::Source, CellField::Destination],
            DragKind::Service => &[
                CellField::SourceService,
                CellField::DestinationService,
                CellField::TranslatedService,
            ],
        }
    }
}

/// Measures every receiver for `kind` across `tables`, in hit-test order.
pub fn collect_receivers<R: DragTargets>(
    tables: &Tables<R>,
    kind: DragKind,
    geometry: &impl CellGeometry,
) -> Vec<Receiver> {
    let fields = R::drag_fields(kind);
    let mut receivers = Vec::new();
    for (chain, table) in tables.iter() {
        if !table.visible || table.is_tombstoned() {
            continue;
        }
        for index in 0..table.rules.len() {
            push_cells(&mut receivers, chain, fields, RowSlot::Row(index), geometry);
        }
        push_cells(&mut receivers, chain, fields, RowSlot::Append, geometry);
    }
    receivers
}

fn push_cells(
    receivers: &mut Vec<Receiver>,
    chain: &str,
    fields: &[CellField],
    slot: RowSlot,
    geometry: &impl CellGeometry,
) {
    for &field in fields {
        if let Some(rect) = geometry.cell_rect(chain, field, slot) {
            receivers.push(Receiver {
                chain: chain.to_string(),
                field,
                slot,
                rect,
            });
        }
    }
}

/// First receiver containing the point, in collection order.
pub fn hit(receivers: &[Receiver], x: f32, y: f32) -> Option<usize> {
    receivers
        .iter()
        .position(|receiver| receiver.rect.contains(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Policy, RuleTable};
    use std::collections::HashMap;

    fn geometry_for(ids: &[&str]) -> HashMap<String, Rect> {
        // Stack the cells vertically, 10 units tall each
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                let top = (i as f32) * 10.0;
                ((*id).to_string(), Rect::new(top, 0.0, top + 10.0, 100.0))
            })
            .collect()
    }

    fn visible_table<R>(rules: Vec<R>) -> RuleTable<R> {
        let mut table = RuleTable::new(Policy::Drop);
        table.rules = rules;
        table.visible = true;
        table
    }

    #[test]
    fn test_rows_come_before_append() {
        let mut tables = Tables::<FilterRule>::default();
        tables.insert("c".to_string(), visible_table(vec![FilterRule::default()]));
        let geometry = geometry_for(&[
            "c-source-0",
            "c-destination-0",
            "c-source-empty",
            "c-destination-empty",
        ]);

        let receivers = collect_receivers(&tables, DragKind::Address, &geometry);
        let ids: Vec<String> = receivers.iter().map(Receiver::id).collect();
        assert_eq!(
            ids,
            [
                "c-source-0",
                "c-destination-0",
                "c-source-empty",
                "c-destination-empty",
            ]
        );
    }

    #[test]
    fn test_hidden_and_tombstoned_tables_skipped() {
        let mut tables = Tables::<FilterRule>::default();
        let mut folded = visible_table(vec![FilterRule::default()]);
        folded.visible = false;
        tables.insert("folded".to_string(), folded);
        let mut dead = visible_table(vec![FilterRule::default()]);
        dead.lifecycle = crate::core::model::Lifecycle::Tombstoned;
        tables.insert("dead".to_string(), dead);

        let geometry = geometry_for(&["folded-source-0", "dead-source-0"]);
        assert!(collect_receivers(&tables, DragKind::Address, &geometry).is_empty());
    }

    #[test]
    fn test_unmeasured_cells_silently_skipped() {
        let mut tables = Tables::<FilterRule>::default();
        tables.insert("c".to_string(), visible_table(vec![FilterRule::default()]));
        // Only one of the four cells is measurable
        let geometry = geometry_for(&["c-destination-0"]);

        let receivers = collect_receivers(&tables, DragKind::Address, &geometry);
        assert_eq!(receivers.len(), 1);
        assert_eq!(receivers[0].field, CellField::Destination);
    }

    #[test]
    fn test_translated_receiver_for_host_drags_only() {
        let mut tables = Tables::<NatRule>::default();
        tables.insert("n".to_string(), visible_table(vec![NatRule::default()]));
        let geometry = geometry_for(&[
            "n-source-0",
            "n-destination-0",
            "n-translated-0",
            "n-translated-empty",
        ]);

        let host = collect_receivers(&tables, DragKind::Host, &geometry);
        assert!(host.iter().any(|r| r.field == CellField::Translated));

        let address = collect_receivers(&tables, DragKind::Address, &geometry);
        assert!(address.iter().all(|r| r.field != CellField::Translated));
    }

    #[test]
    fn test_service_drags_reach_translated_service_on_nat() {
        let mut tables = Tables::<NatRule>::default();
        tables.insert("n".to_string(), visible_table(vec![NatRule::default()]));
        let geometry = geometry_for(&[
            "n-sourceservice-0",
            "n-destinationservice-0",
            "n-translatedservice-0",
        ]);

        let receivers = collect_receivers(&tables, DragKind::Service, &geometry);
        assert_eq!(receivers.len(), 3);
        assert_eq!(receivers[2].field, CellField::TranslatedService);
    }

    #[test]
    fn test_hit_returns_first_match() {
        let receivers = vec![
            Receiver {
                chain: "a".to_string(),
                field: CellField::Source,
                slot: RowSlot::Row(0),
                rect: Rect::new(0.0, 0.0, 50.0, 50.0),
            },
            Receiver {
                chain: "b".to_string(),
                field: CellField::Source,
                slot: RowSlot::Row(0),
                // Overlaps the first receiver
                rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            },
        ];
        assert_eq!(hit(&receivers, 25.0, 25.0), Some(0));
        assert_eq!(hit(&receivers, 75.0, 75.0), Some(1));
        assert_eq!(hit(&receivers, 500.0, 500.0), None);
    }
}
