//! A single grid slot, its residents and its aggregate stats.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::event::{Event, EventContext, ObjectRef, PointerButton};
use crate::grid::GridError;
use crate::objects::{MapObject, Modifier, ModifierKind, ObjectId, ObjectInfo};
use crate::resources::ResourceHandle;
use crate::spatial::{GridPos, Layout, Point, Rect};

pub const BASE_MOVEMENT_COST: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellStats {
    movement_cost: u32,
}

impl CellStats {
    /// Rebuilds stats from scratch: base values plus the per-kind sum of
    /// `modifiers`. Movement cost never drops below zero.
    pub fn from_modifiers<'m>(modifiers: impl IntoIterator<Item = &'m Modifier>) -> Self {
        let mut totals: BTreeMap<ModifierKind, i32> = BTreeMap::new();
        for modifier in modifiers {
            *totals.entry(modifier.kind).or_default() += modifier.magnitude;
        }
        let movement_cost = BASE_MOVEMENT_COST
            + totals
                .get(&ModifierKind::MovementCost)
                .copied()
                .unwrap_or(0);
        Self {
            movement_cost: movement_cost.max(0) as u32,
        }
    }

    pub fn movement_cost(&self) -> u32 {
        self.movement_cost
    }
}

impl Default for CellStats {
    fn default() -> Self {
        Self::from_modifiers(std::iter::empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellInfo {
    pub grid_pos: GridPos,
    pub terrain_type: String,
    pub movement_cost: u32,
    pub objects: Vec<ObjectInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DrawLayer {
    Terrain,
    Objects,
    Focus,
}

impl DrawLayer {
    pub const ALL: [DrawLayer; 3] = [DrawLayer::Terrain, DrawLayer::Objects, DrawLayer::Focus];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DrawItem {
    Terrain {
        cell: GridPos,
        sprite: ResourceHandle,
    },
    Object {
        cell: GridPos,
        object: ObjectId,
        sprite: ResourceHandle,
    },
    FocusMarker {
        cell: GridPos,
    },
}

impl DrawItem {
    pub fn layer(&self) -> DrawLayer {
        match self {
            DrawItem::Terrain { .. } => DrawLayer::Terrain,
            DrawItem::Object { .. } => DrawLayer::Objects,
            DrawItem::FocusMarker { .. } => DrawLayer::Focus,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pos: GridPos,
    terrain: String,
    terrain_sprite: ResourceHandle,
    objects: Vec<MapObject>,
    stats: CellStats,
    focused: bool,
    scroll: Point,
}

impl Cell {
    pub fn new(pos: GridPos, terrain: &str, terrain_sprite: ResourceHandle) -> Self {
        Self {
            pos,
            terrain: terrain.to_string(),
            terrain_sprite,
            objects: Vec::new(),
            stats: CellStats::default(),
            focused: false,
            scroll: Point::default(),
        }
    }

    pub fn grid_pos(&self) -> GridPos {
        self.pos
    }

    pub fn terrain(&self) -> &str {
        &self.terrain
    }

    pub fn stats(&self) -> &CellStats {
        &self.stats
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Residents in stacking order; the last one is on top.
    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    pub(crate) fn objects_mut(&mut self) -> impl Iterator<Item = &mut MapObject> {
        self.objects.iter_mut()
    }

    pub fn topmost(&self) -> Option<&MapObject> {
        self.objects.last()
    }

    pub fn object(&self, id: ObjectId) -> Option<&MapObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    pub fn add_object(&mut self, object: MapObject) {
        self.objects.push(object);
        self.recompute_stats();
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Result<MapObject, GridError> {
        let index = self
            .objects
            .iter()
            .position(|object| object.id() == id)
            .ok_or(GridError::ObjectNotFound { id, pos: self.pos })?;
        let object = self.objects.remove(index);
        self.recompute_stats();
        Ok(object)
    }

    /// Static residents are the only modifier sources.
    pub fn recompute_stats(&mut self) {
        self.stats = CellStats::from_modifiers(
            self.objects
                .iter()
                .filter(|object| object.is_static())
                .flat_map(|object| object.modifiers()),
        );
    }

    pub fn info(&self) -> CellInfo {
        CellInfo {
            grid_pos: self.pos,
            terrain_type: self.terrain.clone(),
            movement_cost: self.stats.movement_cost(),
            objects: self.objects.iter().map(MapObject::info).collect(),
        }
    }

    pub fn rect(&self, layout: &Layout) -> Rect {
        layout.cell_rect(self.pos, self.scroll)
    }

    pub fn draw_items(&self, layer: DrawLayer, out: &mut Vec<DrawItem>) {
        match layer {
            DrawLayer::Terrain => out.push(DrawItem::Terrain {
                cell: self.pos,
                sprite: self.terrain_sprite,
            }),
            DrawLayer::Objects => out.extend(self.objects.iter().map(|object| DrawItem::Object {
                cell: self.pos,
                object: object.id(),
                sprite: object.sprite(),
            })),
            DrawLayer::Focus => {
                if self.focused {
                    out.push(DrawItem::FocusMarker { cell: self.pos });
                }
            }
        }
    }

    /// Residents see the event first; the first one to handle it wins.
    pub fn handle_event(&mut self, event: &Event, ctx: &mut EventContext<'_>) -> bool {
        for object in &mut self.objects {
            if object.handle_event(event, ctx) {
                return true;
            }
        }

        match event {
            Event::TurnStart { .. } => {
                self.recompute_stats();
                false
            }
            Event::EdgeScroll { delta, pointer } => {
                self.scroll = *delta;
                self.focused = self.rect(&ctx.layout).contains(*pointer);
                false
            }
            Event::PointerMotion { pointer } => {
                self.focused = self.rect(&ctx.layout).contains(*pointer);
                false
            }
            Event::PointerButton { button, pointer } => {
                self.focused = self.rect(&ctx.layout).contains(*pointer);
                if !self.focused {
                    return false;
                }
                self.handle_click(*button, ctx);
                true
            }
            _ => false,
        }
    }

    fn handle_click(&self, button: PointerButton, ctx: &mut EventContext<'_>) {
        match button {
            PointerButton::Primary => match self.topmost() {
                Some(object) => {
                    ctx.publish(Event::Select {
                        object: Some(ObjectRef {
                            id: object.id(),
                            position: self.pos,
                        }),
                    });
                    ctx.publish(Event::ObjectInfoRequested {
                        info: object.info(),
                    });
                }
                None => {
                    ctx.publish(Event::Select { object: None });
                    ctx.publish(Event::ObjectInfoHidden);
                }
            },
            PointerButton::Middle => {
                let anchor = self.rect(&ctx.layout).center();
                ctx.publish(Event::CellInfoRequested {
                    info: self.info(),
                    anchor,
                });
            }
            PointerButton::Secondary => ctx.publish(Event::MoveRequest { target: self.pos }),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::event::EventBus;
    use crate::objects::catalog;
    use crate::resources::{ResourceRegistry, ResourceResolver};

    fn plains_cell(registry: &ResourceRegistry, pos: GridPos) -> Cell {
        let sprite = registry
            .resolve("terrain.plains")
            .expect("default terrain resolves");
        Cell::new(pos, "plains", sprite)
    }

    fn placed(mut object: MapObject, id: u64) -> MapObject {
        object.assign_id(ObjectId::from_raw(id));
        object
    }

    #[test]
    fn empty_cell_has_base_movement_cost() {
        let registry = ResourceRegistry::with_defaults();
        let cell = plains_cell(&registry, GridPos::new(0, 0));
        assert_eq!(cell.stats().movement_cost(), 1);
    }

    #[test]
    fn modifiers_are_summed_and_removal_restores_base() {
        let registry = ResourceRegistry::with_defaults();
        let mut cell = plains_cell(&registry, GridPos::new(0, 0));
        cell.add_object(placed(catalog::boulders(&registry).unwrap(), 1));
        cell.add_object(placed(catalog::forest(10, 0, &registry).unwrap(), 2));
        cell.add_object(placed(catalog::tribe(&registry).unwrap(), 3));
        assert_eq!(cell.stats().movement_cost(), 1 + 1 + 2);

        // Recomputing repeatedly must not accumulate.
        cell.recompute_stats();
        cell.recompute_stats();
        assert_eq!(cell.stats().movement_cost(), 4);

        cell.remove_object(ObjectId::from_raw(1)).unwrap();
        cell.remove_object(ObjectId::from_raw(2)).unwrap();
        assert_eq!(cell.stats().movement_cost(), 1);
    }

    #[test]
    fn negative_modifiers_clamp_at_zero() {
        let stats = CellStats::from_modifiers(&[Modifier::movement_cost(-5)]);
        assert_eq!(stats.movement_cost(), 0);
    }

    #[test]
    fn removing_missing_object_fails() {
        let registry = ResourceRegistry::with_defaults();
        let mut cell = plains_cell(&registry, GridPos::new(2, 1));
        let err = cell.remove_object(ObjectId::from_raw(9)).unwrap_err();
        assert!(matches!(err, GridError::ObjectNotFound { .. }));
    }

    #[test]
    fn primary_click_selects_topmost_object() {
        let registry = ResourceRegistry::with_defaults();
        let mut cell = plains_cell(&registry, GridPos::new(1, 1));
        cell.add_object(placed(catalog::boulders(&registry).unwrap(), 1));
        cell.add_object(placed(catalog::tribe(&registry).unwrap(), 2));

        let mut bus = EventBus::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = EventContext::new(&mut bus, &mut rng, Layout::new(50));
        let click = Event::PointerButton {
            button: PointerButton::Primary,
            pointer: Point::new(60, 60),
        };
        assert!(cell.handle_event(&click, &mut ctx));
        assert!(cell.is_focused());

        let published = bus.drain();
        assert_eq!(published.len(), 2);
        assert_eq!(
            published[0],
            Event::Select {
                object: Some(ObjectRef {
                    id: ObjectId::from_raw(2),
                    position: GridPos::new(1, 1),
                })
            }
        );
        assert!(matches!(
            &published[1],
            Event::ObjectInfoRequested { info } if info.name == "Tribe"
        ));
    }

    #[test]
    fn clicks_outside_the_cell_are_ignored() {
        let registry = ResourceRegistry::with_defaults();
        let mut cell = plains_cell(&registry, GridPos::new(1, 1));
        let mut bus = EventBus::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = EventContext::new(&mut bus, &mut rng, Layout::new(50));
        let click = Event::PointerButton {
            button: PointerButton::Secondary,
            pointer: Point::new(10, 10),
        };
        assert!(!cell.handle_event(&click, &mut ctx));
        assert!(bus.is_empty());
    }

    #[test]
    fn edge_scroll_shifts_hit_testing() {
        let registry = ResourceRegistry::with_defaults();
        let mut cell = plains_cell(&registry, GridPos::new(2, 0));
        let mut bus = EventBus::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = EventContext::new(&mut bus, &mut rng, Layout::new(50));

        let scroll = Event::EdgeScroll {
            delta: Point::new(100, 0),
            pointer: Point::new(10, 10),
        };
        assert!(!cell.handle_event(&scroll, &mut ctx));
        assert!(cell.is_focused());

        let middle = Event::PointerButton {
            button: PointerButton::Middle,
            pointer: Point::new(10, 10),
        };
        assert!(cell.handle_event(&middle, &mut ctx));
        match bus.drain().as_slice() {
            [Event::CellInfoRequested { info, anchor }] => {
                assert_eq!(info.grid_pos, GridPos::new(2, 0));
                assert_eq!(*anchor, Point::new(25, 25));
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }
}
