//! The map: a fixed-size grid of cells plus the object selection and
//! movement state machine.

use serde::Serialize;
use thiserror::Error;

use crate::cell::{Cell, CellInfo, DrawItem, DrawLayer};
use crate::event::{Event, EventContext, ObjectRef};
use crate::objects::{MapObject, ObjectId};
use crate::resources::ResourceHandle;
use crate::spatial::{GridPos, Layout, Point};

#[derive(Debug, Error)]
pub enum GridError {
    #[error("cell {pos} is outside the {size_x}x{size_y} map")]
    OutOfBounds {
        pos: GridPos,
        size_x: i32,
        size_y: i32,
    },
    #[error("object {id} is not in cell {pos}")]
    ObjectNotFound { id: ObjectId, pos: GridPos },
    #[error("map size {size_x}x{size_y} is invalid")]
    InvalidSize { size_x: i32, size_y: i32 },
    #[error("cell list does not match a {size_x}x{size_y} map in row-major order")]
    CellLayout { size_x: i32, size_y: i32 },
}

/// Expected gameplay outcome when a move cannot be made; reported to the UI,
/// never raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
pub enum MoveRejection {
    #[error("no movement points left this turn")]
    NoMovementPoints,
    #[error("moving there costs {cost} movement points but only {available} are left")]
    InsufficientMovementPoints { available: u32, cost: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Selected(ObjectRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    NothingSelected,
    /// The selected object has no movement budget.
    Immovable,
    /// Target equals the current cell: accepted, nothing spent.
    Vacuous,
    Moved {
        from: GridPos,
        to: GridPos,
        cost: u32,
    },
    Rejected(MoveRejection),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapInfo {
    pub focused_cell: Option<CellInfo>,
}

#[derive(Debug, Clone)]
pub struct Grid {
    size_x: i32,
    size_y: i32,
    cells: Vec<Cell>,
    selection: Selection,
    next_object_id: u64,
}

impl Grid {
    /// Uniform map where every cell has the same terrain.
    pub fn new(
        size_x: i32,
        size_y: i32,
        terrain: &str,
        terrain_sprite: ResourceHandle,
    ) -> Result<Self, GridError> {
        let count = cell_count(size_x, size_y)?;
        let mut cells = Vec::with_capacity(count);
        for y in 0..size_y {
            for x in 0..size_x {
                cells.push(Cell::new(GridPos::new(x, y), terrain, terrain_sprite));
            }
        }
        Self::from_cells(size_x, size_y, cells)
    }

    /// Takes ownership of pre-built cells, which must be row-major.
    pub fn from_cells(size_x: i32, size_y: i32, cells: Vec<Cell>) -> Result<Self, GridError> {
        let count = cell_count(size_x, size_y)?;
        let layout_matches = cells.len() == count
            && cells
                .iter()
                .enumerate()
                .all(|(index, cell)| cell.grid_pos() == index_to_pos(index, size_x));
        if !layout_matches {
            return Err(GridError::CellLayout { size_x, size_y });
        }
        let mut grid = Self {
            size_x,
            size_y,
            cells,
            selection: Selection::None,
            next_object_id: 1,
        };
        grid.adopt_existing_objects();
        Ok(grid)
    }

    pub fn size(&self) -> (i32, i32) {
        (self.size_x, self.size_y)
    }

    /// Overall map size in cell units.
    pub fn logical_extent(&self) -> GridPos {
        GridPos::new(self.size_x, self.size_y)
    }

    /// Bottom-right corner of the last cell in screen units, ignoring scroll.
    pub fn pixel_extent(&self, layout: &Layout) -> Point {
        layout
            .cell_rect(
                GridPos::new(self.size_x - 1, self.size_y - 1),
                Point::default(),
            )
            .bottom_right()
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        (0..self.size_x).contains(&pos.x) && (0..self.size_y).contains(&pos.y)
    }

    fn index(&self, pos: GridPos) -> Result<usize, GridError> {
        if !self.in_bounds(pos) {
            return Err(GridError::OutOfBounds {
                pos,
                size_x: self.size_x,
                size_y: self.size_y,
            });
        }
        Ok((pos.y * self.size_x + pos.x) as usize)
    }

    pub fn get_cell(&self, pos: GridPos) -> Result<&Cell, GridError> {
        let index = self.index(pos)?;
        Ok(&self.cells[index])
    }

    pub(crate) fn get_cell_mut(&mut self, pos: GridPos) -> Result<&mut Cell, GridError> {
        let index = self.index(pos)?;
        Ok(&mut self.cells[index])
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Places a freshly built object on the map and gives it its identity.
    pub fn spawn(&mut self, pos: GridPos, mut object: MapObject) -> Result<ObjectId, GridError> {
        let index = self.index(pos)?;
        let id = self.allocate_id();
        object.assign_id(id);
        tracing::debug!(object = %id, name = object.name(), %pos, "object spawned");
        self.cells[index].add_object(object);
        Ok(id)
    }

    pub fn find_object(&self, id: ObjectId) -> Option<(GridPos, &MapObject)> {
        self.cells
            .iter()
            .find_map(|cell| cell.object(id).map(|object| (cell.grid_pos(), object)))
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn info(&self) -> MapInfo {
        MapInfo {
            focused_cell: self
                .cells
                .iter()
                .find(|cell| cell.is_focused())
                .map(Cell::info),
        }
    }

    /// Draw items ordered by layer, then by cell in row-major order.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        for layer in DrawLayer::ALL {
            for cell in &self.cells {
                cell.draw_items(layer, &mut items);
            }
        }
        items
    }

    pub fn snapshot(&self) -> Vec<CellInfo> {
        self.cells.iter().map(Cell::info).collect()
    }

    /// Offers the event to every cell, then applies the map-level
    /// interpretation. Returns whether the event was consumed.
    pub fn handle_event(
        &mut self,
        event: &Event,
        ctx: &mut EventContext<'_>,
    ) -> Result<bool, GridError> {
        for cell in &mut self.cells {
            if cell.handle_event(event, ctx) {
                return Ok(true);
            }
        }

        match event {
            Event::Select { object } => {
                self.select(*object, ctx)?;
                Ok(true)
            }
            Event::MoveRequest { target } => {
                self.move_selected(*target, ctx)?;
                Ok(true)
            }
            Event::EdgeScroll { .. } => Ok(true),
            _ => Ok(false),
        }
    }

    fn select(
        &mut self,
        object: Option<ObjectRef>,
        ctx: &mut EventContext<'_>,
    ) -> Result<(), GridError> {
        let Some(selected) = object else {
            if self.selection != Selection::None {
                tracing::debug!("selection cleared");
            }
            self.selection = Selection::None;
            return Ok(());
        };

        // A click can name an object that a move earlier in the same batch
        // already carried away; that select is dropped, not fatal.
        if !self.get_cell(selected.position)?.contains(selected.id) {
            tracing::warn!(
                object = %selected.id,
                pos = %selected.position,
                "stale select ignored"
            );
            return Ok(());
        }
        self.selection = Selection::Selected(selected);
        tracing::debug!(object = %selected.id, pos = %selected.position, "object selected");
        ctx.publish(Event::MapObjectSelected {
            object: selected.id,
            position: selected.position,
        });
        Ok(())
    }

    /// One step of the selected object toward `target`.
    pub fn move_selected(
        &mut self,
        target: GridPos,
        ctx: &mut EventContext<'_>,
    ) -> Result<MoveOutcome, GridError> {
        let Selection::Selected(selected) = self.selection else {
            return Ok(MoveOutcome::NothingSelected);
        };
        self.index(target)?;

        let origin = selected.position;
        let object = self
            .get_cell(origin)?
            .object(selected.id)
            .ok_or(GridError::ObjectNotFound {
                id: selected.id,
                pos: origin,
            })?;
        let Some(available) = object.movement().map(|budget| budget.current()) else {
            return Ok(MoveOutcome::Immovable);
        };

        let step = origin.step_toward(target);
        if step == (0, 0) {
            return Ok(MoveOutcome::Vacuous);
        }
        if available == 0 {
            return Ok(self.reject(selected.id, MoveRejection::NoMovementPoints, ctx));
        }

        let destination = origin.offset(step);
        let cost = self.get_cell(destination)?.stats().movement_cost();
        if available < cost {
            let reason = MoveRejection::InsufficientMovementPoints { available, cost };
            return Ok(self.reject(selected.id, reason, ctx));
        }

        let mut object = self.get_cell_mut(origin)?.remove_object(selected.id)?;
        if let Some(budget) = object.movement_mut() {
            budget.spend(cost);
        }
        self.get_cell_mut(destination)?.add_object(object);
        self.selection = Selection::Selected(ObjectRef {
            id: selected.id,
            position: destination,
        });
        tracing::debug!(
            object = %selected.id,
            from = %origin,
            to = %destination,
            cost,
            "object moved"
        );
        Ok(MoveOutcome::Moved {
            from: origin,
            to: destination,
            cost,
        })
    }

    fn reject(
        &self,
        object: ObjectId,
        reason: MoveRejection,
        ctx: &mut EventContext<'_>,
    ) -> MoveOutcome {
        tracing::warn!(object = %object, %reason, "move rejected");
        ctx.publish(Event::MoveRejected { object, reason });
        MoveOutcome::Rejected(reason)
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId::from_raw(self.next_object_id);
        self.next_object_id += 1;
        id
    }

    /// Objects already resident in handed-over cells get identities here.
    fn adopt_existing_objects(&mut self) {
        let mut next = self.next_object_id;
        for cell in &mut self.cells {
            for object in cell.objects_mut() {
                object.assign_id(ObjectId::from_raw(next));
                next += 1;
            }
        }
        self.next_object_id = next;
    }
}

/// Number of cells in a `size_x` by `size_y` map, rejecting empty and
/// overflowing sizes.
pub fn cell_count(size_x: i32, size_y: i32) -> Result<usize, GridError> {
    if size_x < 1 || size_y < 1 {
        return Err(GridError::InvalidSize { size_x, size_y });
    }
    size_x
        .checked_mul(size_y)
        .and_then(|count| usize::try_from(count).ok())
        .ok_or(GridError::InvalidSize { size_x, size_y })
}

fn index_to_pos(index: usize, size_x: i32) -> GridPos {
    GridPos::new(index as i32 % size_x, index as i32 / size_x)
}
