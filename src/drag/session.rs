//! Drag session state machine
//!
//! A [`DragSession`] is a value object owned by the event loop, replacing
//! any notion of process-wide drag state. It is either idle, dragging a
//! value (from a palette or out of a cell), or dragging a floating panel.
//!
//! A value dragged out of a cell is not detached immediately: the value
//! stays in place until the pointer first leaves the origin cell's
//! rectangle. At that moment the value is removed at the origin, a rule
//! left fully blank is deleted, an emptied tombstoned table is purged, and
//! the receiver list is rebuilt against the post-mutation layout. Dropping
//! before leaving the origin cell is a no-op, as is releasing outside
//! every receiver.

use tracing::debug;

use crate::core::model::{CellField, PanelPos, RuleCells, Tables};
use crate::drag::geometry::{CellGeometry, Rect, RowSlot};
use crate::drag::receivers::{collect_receivers, hit, DragKind, DragTargets, Receiver};

/// Where a drag grabbed its payload: the payload's top-left corner and the
/// pointer position at grab time. Ghost and panel positions follow the
/// pointer keeping this offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabAnchor {
    pub item_left: f32,
    pub item_top: f32,
    pub mouse_x: f32,
    pub mouse_y: f32,
}

impl GrabAnchor {
    fn dragged_to(&self, x: f32, y: f32) -> PanelPos {
        PanelPos {
            left: x - self.mouse_x + self.item_left,
            top: y - self.mouse_y + self.item_top,
        }
    }
}

/// The cell a value drag started from, while the value is still attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub chain: String,
    pub row: usize,
    pub field: CellField,
    pub rect: Rect,
}

/// Which floating panel a panel drag moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelHandle {
    /// Index into the surface's `dragpos` list
    Palette(usize),
    Checks,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueDrag {
    pub value: String,
    pub kind: DragKind,
    anchor: GrabAnchor,
    origin: Option<Origin>,
    receivers: Vec<Receiver>,
    hover: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelDrag {
    pub panel: PanelHandle,
    anchor: GrabAnchor,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragSession {
    #[default]
    Idle,
    Value(ValueDrag),
    Panel(PanelDrag),
}

/// What a pointer move changed; the host applies ghost/panel positions and
/// hover highlights from this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveEffect {
    /// New top-left of the dragged value's ghost
    pub ghost: Option<PanelPos>,
    /// Receiver currently under the pointer, by cell id
    pub hover: Option<String>,
    /// The origin cell released its value during this move
    pub detached: bool,
    /// New position for the dragged panel
    pub panel: Option<(PanelHandle, PanelPos)>,
}

/// How a pointer release ended the session.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Nothing droppable was in flight
    None,
    /// Released outside every receiver, or before leaving the origin cell
    Miss,
    /// Value landed on a receiver; `changed` is false when the drop was
    /// absorbed (duplicate in a list cell, same value in a single cell)
    Applied {
        chain: String,
        field: CellField,
        slot: RowSlot,
        changed: bool,
    },
}

impl DragSession {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Starts dragging `value` from a definitions palette.
    pub fn start_palette_drag<R: DragTargets>(
        kind: DragKind,
        value: &str,
        anchor: GrabAnchor,
        tables: &Tables<R>,
        geometry: &impl CellGeometry,
    ) -> Self {
        let receivers = collect_receivers(tables, kind, geometry);
        debug!(value, %kind, receivers = receivers.len(), "palette drag started");
        Self::Value(ValueDrag {
            value: value.to_string(),
            kind,
            anchor,
            origin: None,
            receivers,
            hover: None,
        })
    }

    /// Starts dragging a value out of the cell described by `origin`.
    ///
    /// The value stays in the cell until the pointer leaves `origin.rect`.
    pub fn start_cell_drag<R: DragTargets>(
        kind: DragKind,
        value: &str,
        origin: Origin,
        anchor: GrabAnchor,
        tables: &Tables<R>,
        geometry: &impl CellGeometry,
    ) -> Self {
        let receivers = collect_receivers(tables, kind, geometry);
        debug!(
            value,
            %kind,
            chain = %origin.chain,
            row = origin.row,
            "cell drag started"
        );
        Self::Value(ValueDrag {
            value: value.to_string(),
            kind,
            anchor,
            origin: Some(origin),
            receivers,
            hover: None,
        })
    }

    pub fn start_panel_drag(panel: PanelHandle, anchor: GrabAnchor) -> Self {
        Self::Panel(PanelDrag { panel, anchor })
    }

    /// Rebuilds the receiver list against the current table structure.
    ///
    /// The owning surface calls this whenever it mutates rule tables while
    /// a value drag is in flight (row insertion, table fold, undo); the
    /// rebuild must happen before the next hit-test or stale rectangles
    /// could receive the drop.
    pub fn refresh_receivers<R: DragTargets>(
        &mut self,
        tables: &Tables<R>,
        geometry: &impl CellGeometry,
    ) {
        if let Self::Value(drag) = self {
            drag.receivers = collect_receivers(tables, drag.kind, geometry);
            drag.hover = None;
        }
    }

    /// Advances the session for a pointer move to `(x, y)`.
    ///
    /// `tables` is the rule surface the drag runs over; it is mutated only
    /// when a cell drag detaches. After a detach the receiver list is
    /// rebuilt from `geometry` so stale rectangles never receive a drop.
    pub fn pointer_moved<R: DragTargets>(
        &mut self,
        x: f32,
        y: f32,
        tables: &mut Tables<R>,
        geometry: &impl CellGeometry,
    ) -> MoveEffect {
        match self {
            Self::Idle => MoveEffect::default(),
            Self::Panel(drag) => MoveEffect {
                panel: Some((drag.panel, drag.anchor.dragged_to(x, y))),
                ..MoveEffect::default()
            },
            Self::Value(drag) => {
                let mut effect = MoveEffect {
                    ghost: Some(drag.anchor.dragged_to(x, y)),
                    ..MoveEffect::default()
                };
                if let Some(origin) = &drag.origin {
                    if origin.rect.contains(x, y) {
                        // Still inside the origin cell, nothing to do yet
                        return effect;
                    }
                    detach_value(tables, origin, &drag.value);
                    debug!(value = %drag.value, chain = %origin.chain, "value detached");
                    drag.origin = None;
                    drag.receivers = collect_receivers(tables, drag.kind, geometry);
                    drag.hover = None;
                    effect.detached = true;
                }
                drag.hover = hit(&drag.receivers, x, y);
                effect.hover = drag.hover.map(|index| drag.receivers[index].id());
                effect
            }
        }
    }

    /// Ends the session at `(x, y)`, applying a value drop if one lands.
    pub fn pointer_released<R: RuleCells>(
        &mut self,
        x: f32,
        y: f32,
        tables: &mut Tables<R>,
    ) -> DropOutcome {
        let session = std::mem::take(self);
        let Self::Value(drag) = session else {
            return DropOutcome::None;
        };
        if drag.origin.is_some() {
            // Never left the origin cell, the value stays where it was
            return DropOutcome::Miss;
        }
        let Some(index) = hit(&drag.receivers, x, y) else {
            debug!(value = %drag.value, "drop missed all receivers");
            return DropOutcome::Miss;
        };
        let receiver = &drag.receivers[index];
        let changed = apply_drop(tables, receiver, &drag.value);
        debug!(value = %drag.value, cell = %receiver.id(), changed, "value dropped");
        DropOutcome::Applied {
            chain: receiver.chain.clone(),
            field: receiver.field,
            slot: receiver.slot,
            changed,
        }
    }
}

/// Removes `value` from its origin cell, deleting the rule if that left it
/// blank and purging the table if an emptied tombstone remains.
fn detach_value<R: RuleCells>(tables: &mut Tables<R>, origin: &Origin, value: &str) {
    if let Some(table) = tables.get_mut(&origin.chain) {
        if let Some(rule) = table.rules.get_mut(origin.row) {
            if let Some(list) = rule.list_mut(origin.field) {
                list.retain(|v| v != value);
            } else if let Some(cell) = rule.single_mut(origin.field) {
                if cell == value {
                    cell.clear();
                }
            }
            if rule.is_blank() {
                table.rules.remove(origin.row);
            }
        }
    }
    tables.purge_empty_tombstones();
}

/// Applies a drop to `receiver`, returning whether anything changed.
///
/// Append receivers push a fresh rule holding the value. Row receivers
/// append to list cells unless already present and overwrite single cells
/// unless equal.
fn apply_drop<R: RuleCells>(tables: &mut Tables<R>, receiver: &Receiver, value: &str) -> bool {
    let Some(table) = tables.get_mut(&receiver.chain) else {
        return false;
    };
    match receiver.slot {
        RowSlot::Append => match R::from_value(receiver.field, value) {
            Some(rule) => {
                table.rules.push(rule);
                true
            }
            None => false,
        },
        RowSlot::Row(row) => {
            let Some(rule) = table.rules.get_mut(row) else {
                return false;
            };
            if let Some(list) = rule.list_mut(receiver.field) {
                if list.iter().any(|v| v == value) {
                    false
                } else {
                    list.push(value.to_string());
                    true
                }
            } else if let Some(cell) = rule.single_mut(receiver.field) {
                if cell == value {
                    false
                } else {
                    *cell = value.to_string();
                    true
                }
            } else {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{FilterRule, Lifecycle, NatRule, Policy, RuleTable};
    use crate::drag::geometry::cell_id;
    use std::collections::HashMap;

    const CELL: f32 = 10.0;

    fn anchor() -> GrabAnchor {
        GrabAnchor {
            item_left: 0.0,
            item_top: 0.0,
            mouse_x: 0.0,
            mouse_y: 0.0,
        }
    }

    /// Lays every cell of the chain out on a vertical strip, rows first,
    /// then the append row, matching receiver collection order.
    fn strip_geometry(ids: &[&str]) -> HashMap<String, Rect> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                let top = (i as f32) * CELL;
                ((*id).to_string(), Rect::new(top, 0.0, top + CELL, 100.0))
            })
            .collect()
    }

    fn center_of(geometry: &HashMap<String, Rect>, id: &str) -> (f32, f32) {
        let rect = geometry[id];
        ((rect.left + rect.right) / 2.0, (rect.top + rect.bottom) / 2.0)
    }

    fn filter_tables(chain: &str, rules: Vec<FilterRule>) -> Tables<FilterRule> {
        let mut tables = Tables::default();
        let mut table = RuleTable::new(Policy::Drop);
        table.rules = rules;
        table.visible = true;
        tables.insert(chain.to_string(), table);
        tables
    }

    fn nat_tables(chain: &str, rules: Vec<NatRule>) -> Tables<NatRule> {
        let mut tables = Tables::default();
        let mut table = RuleTable::new(Policy::Drop);
        table.rules = rules;
        table.visible = true;
        tables.insert(chain.to_string(), table);
        tables
    }

    #[test]
    fn test_palette_drop_on_append_creates_rule() {
        let mut tables = filter_tables("c", vec![]);
        let geometry = strip_geometry(&["c-source-empty", "c-destination-empty"]);
        let mut session = DragSession::start_palette_drag(
            DragKind::Host,
            "web",
            anchor(),
            &tables,
            &geometry,
        );

        let (x, y) = center_of(&geometry, "c-source-empty");
        session.pointer_moved(x, y, &mut tables, &geometry);
        let outcome = session.pointer_released(x, y, &mut tables);

        assert_eq!(
            outcome,
            DropOutcome::Applied {
                chain: "c".to_string(),
                field: CellField::Source,
                slot: RowSlot::Append,
                changed: true,
            }
        );
        let rule = &tables["c"].rules[0];
        assert_eq!(rule.source, ["web"]);
        assert!(rule.active);
        assert!(session.is_idle());
    }

    #[test]
    fn test_drop_on_row_is_idempotent() {
        let mut rule = FilterRule::default();
        rule.source.push("web".to_string());
        let mut tables = filter_tables("c", vec![rule]);
        let geometry = strip_geometry(&["c-source-0"]);

        let mut session = DragSession::start_palette_drag(
            DragKind::Host,
            "web",
            anchor(),
            &tables,
            &geometry,
        );
        let (x, y) = center_of(&geometry, "c-source-0");
        let outcome = session.pointer_released(x, y, &mut tables);
        assert_eq!(
            outcome,
            DropOutcome::Applied {
                chain: "c".to_string(),
                field: CellField::Source,
                slot: RowSlot::Row(0),
                changed: false,
            }
        );
        assert_eq!(tables["c"].rules[0].source, ["web"]);
    }

    #[test]
    fn test_drop_outside_receivers_is_noop() {
        let mut tables = filter_tables("c", vec![FilterRule::default()]);
        let geometry = strip_geometry(&["c-source-0"]);
        let mut session = DragSession::start_palette_drag(
            DragKind::Host,
            "web",
            anchor(),
            &tables,
            &geometry,
        );
        let before = tables.clone();
        let outcome = session.pointer_released(500.0, 500.0, &mut tables);
        assert_eq!(outcome, DropOutcome::Miss);
        assert_eq!(tables, before);
    }

    #[test]
    fn test_cell_drag_keeps_value_until_pointer_leaves() {
        let mut rule = FilterRule::default();
        rule.source.push("web".to_string());
        let mut tables = filter_tables("c", vec![rule]);
        let geometry = strip_geometry(&["c-source-0", "c-destination-0"]);
        let origin_rect = geometry["c-source-0"];

        let mut session = DragSession::start_cell_drag(
            DragKind::Host,
            "web",
            Origin {
                chain: "c".to_string(),
                row: 0,
                field: CellField::Source,
                rect: origin_rect,
            },
            anchor(),
            &tables,
            &geometry,
        );

        // Wiggle inside the origin cell: value stays put
        let effect = session.pointer_moved(50.0, 5.0, &mut tables, &geometry);
        assert!(!effect.detached);
        assert_eq!(tables["c"].rules[0].source, ["web"]);

        // Release inside the origin cell: still a no-op
        let outcome = session.pointer_released(50.0, 5.0, &mut tables);
        assert_eq!(outcome, DropOutcome::Miss);
        assert_eq!(tables["c"].rules[0].source, ["web"]);
    }

    #[test]
    fn test_cell_drag_detaches_on_leaving_origin() {
        let mut rule = FilterRule::default();
        rule.source.push("web".to_string());
        rule.destination.push("lan".to_string());
        let mut tables = filter_tables("c", vec![rule]);
        let geometry = strip_geometry(&["c-source-0", "c-destination-0"]);

        let mut session = DragSession::start_cell_drag(
            DragKind::Host,
            "web",
            Origin {
                chain: "c".to_string(),
                row: 0,
                field: CellField::Source,
                rect: geometry["c-source-0"],
            },
            anchor(),
            &tables,
            &geometry,
        );

        let effect = session.pointer_moved(500.0, 500.0, &mut tables, &geometry);
        assert!(effect.detached);
        assert!(tables["c"].rules[0].source.is_empty());
        // Rule survives, another cell still holds a value
        assert_eq!(tables["c"].rules.len(), 1);

        // Miss on release leaves the value removed: drag to trash
        let outcome = session.pointer_released(500.0, 500.0, &mut tables);
        assert_eq!(outcome, DropOutcome::Miss);
        assert!(tables["c"].rules[0].source.is_empty());
    }

    #[test]
    fn test_detaching_last_value_deletes_rule() {
        let mut rule = FilterRule::default();
        rule.source.push("web".to_string());
        let mut tables = filter_tables("c", vec![rule]);
        let geometry = strip_geometry(&["c-source-0"]);

        let mut session = DragSession::start_cell_drag(
            DragKind::Host,
            "web",
            Origin {
                chain: "c".to_string(),
                row: 0,
                field: CellField::Source,
                rect: geometry["c-source-0"],
            },
            anchor(),
            &tables,
            &geometry,
        );
        session.pointer_moved(500.0, 500.0, &mut tables, &geometry);
        assert!(tables["c"].rules.is_empty());
    }

    #[test]
    fn test_comment_keeps_rule_alive_on_detach() {
        let mut rule = FilterRule::default();
        rule.source.push("web".to_string());
        rule.comment = "keep".to_string();
        let mut tables = filter_tables("c", vec![rule]);
        let geometry = strip_geometry(&["c-source-0"]);

        let mut session = DragSession::start_cell_drag(
            DragKind::Host,
            "web",
            Origin {
                chain: "c".to_string(),
                row: 0,
                field: CellField::Source,
                rect: geometry["c-source-0"],
            },
            anchor(),
            &tables,
            &geometry,
        );
        session.pointer_moved(500.0, 500.0, &mut tables, &geometry);
        assert_eq!(tables["c"].rules.len(), 1);
    }

    #[test]
    fn test_emptied_tombstoned_table_is_purged() {
        let mut rule = FilterRule::default();
        rule.source.push("web".to_string());
        let mut tables = filter_tables("c", vec![rule]);
        tables.get_mut("c").unwrap().lifecycle = Lifecycle::Tombstoned;
        // Tombstoned tables contribute no receivers, but the origin cell of
        // an in-flight drag can still sit in one
        let geometry = strip_geometry(&["c-source-0"]);

        let mut session = DragSession::start_cell_drag(
            DragKind::Host,
            "web",
            Origin {
                chain: "c".to_string(),
                row: 0,
                field: CellField::Source,
                rect: geometry["c-source-0"],
            },
            anchor(),
            &tables,
            &geometry,
        );
        session.pointer_moved(500.0, 500.0, &mut tables, &geometry);
        assert!(!tables.contains_key("c"));
    }

    #[test]
    fn test_receivers_rebuilt_after_detach() {
        // Two rules; detaching the only value of row 0 deletes it and row 1
        // shifts up, so the rebuilt receivers must target the new layout
        let mut first = FilterRule::default();
        first.source.push("web".to_string());
        let mut second = FilterRule::default();
        second.source.push("db".to_string());
        let mut tables = filter_tables("c", vec![first, second]);

        let geometry = strip_geometry(&[
            "c-source-0",
            "c-destination-0",
            "c-source-empty",
            "c-destination-empty",
        ]);

        let mut session = DragSession::start_cell_drag(
            DragKind::Host,
            "web",
            Origin {
                chain: "c".to_string(),
                row: 0,
                field: CellField::Source,
                rect: geometry["c-source-0"],
            },
            anchor(),
            &tables,
            &geometry,
        );

        session.pointer_moved(500.0, 500.0, &mut tables, &geometry);
        assert_eq!(tables["c"].rules.len(), 1);

        // Drop onto what is now row 0, which holds the former second rule
        let (x, y) = center_of(&geometry, &cell_id("c", CellField::Source, RowSlot::Row(0)));
        let outcome = session.pointer_released(x, y, &mut tables);
        assert_eq!(
            outcome,
            DropOutcome::Applied {
                chain: "c".to_string(),
                field: CellField::Source,
                slot: RowSlot::Row(0),
                changed: true,
            }
        );
        assert_eq!(tables["c"].rules[0].source, ["db", "web"]);
    }

    #[test]
    fn test_translated_cell_overwrites_on_drop() {
        let mut rule = NatRule::default();
        rule.translated = "old-gw".to_string();
        let mut tables = nat_tables("n", vec![rule]);
        let geometry = strip_geometry(&["n-source-0", "n-destination-0", "n-translated-0"]);

        let mut session = DragSession::start_palette_drag(
            DragKind::Host,
            "new-gw",
            anchor(),
            &tables,
            &geometry,
        );
        let (x, y) = center_of(&geometry, "n-translated-0");
        let outcome = session.pointer_released(x, y, &mut tables);
        assert!(matches!(outcome, DropOutcome::Applied { changed: true, .. }));
        assert_eq!(tables["n"].rules[0].translated, "new-gw");
    }

    #[test]
    fn test_refresh_receivers_sees_external_mutation() {
        let mut tables = filter_tables("c", vec![]);
        let geometry = strip_geometry(&["c-source-0", "c-source-empty"]);
        let mut session = DragSession::start_palette_drag(
            DragKind::Host,
            "web",
            anchor(),
            &tables,
            &geometry,
        );

        // A row appears under the drag; without a refresh its cell is
        // unknown to the session
        let mut rule = FilterRule::default();
        rule.destination.push("lan".to_string());
        tables.get_mut("c").unwrap().rules.push(rule);
        session.refresh_receivers(&tables, &geometry);

        let (x, y) = center_of(&geometry, "c-source-0");
        let outcome = session.pointer_released(x, y, &mut tables);
        assert_eq!(
            outcome,
            DropOutcome::Applied {
                chain: "c".to_string(),
                field: CellField::Source,
                slot: RowSlot::Row(0),
                changed: true,
            }
        );
        assert_eq!(tables["c"].rules[0].source, ["web"]);
    }

    #[test]
    fn test_hover_reports_receiver_id() {
        let mut tables = filter_tables("c", vec![FilterRule::default()]);
        let geometry = strip_geometry(&["c-source-0", "c-destination-0"]);
        let mut session = DragSession::start_palette_drag(
            DragKind::Host,
            "web",
            anchor(),
            &tables,
            &geometry,
        );

        let (x, y) = center_of(&geometry, "c-destination-0");
        let effect = session.pointer_moved(x, y, &mut tables, &geometry);
        assert_eq!(effect.hover.as_deref(), Some("c-destination-0"));
        assert_eq!(effect.ghost, Some(PanelPos { left: x, top: y }));

        let effect = session.pointer_moved(500.0, 500.0, &mut tables, &geometry);
        assert_eq!(effect.hover, None);
    }

    #[test]
    fn test_panel_drag_follows_anchor_offset() {
        let mut tables = Tables::<FilterRule>::default();
        let geometry: HashMap<String, Rect> = HashMap::new();
        let mut session = DragSession::start_panel_drag(
            PanelHandle::Palette(2),
            GrabAnchor {
                item_left: 1000.0,
                item_top: 300.0,
                mouse_x: 1010.0,
                mouse_y: 310.0,
            },
        );

        let effect = session.pointer_moved(1050.0, 350.0, &mut tables, &geometry);
        assert_eq!(
            effect.panel,
            Some((
                PanelHandle::Palette(2),
                PanelPos {
                    left: 1040.0,
                    top: 340.0,
                }
            ))
        );

        let outcome = session.pointer_released(1050.0, 350.0, &mut tables);
        assert_eq!(outcome, DropOutcome::None);
        assert!(session.is_idle());
    }
}
