//! Map objects: everything that can occupy a cell.
//!
//! A single [`MapObject`] type carries optional capability blocks (cell
//! modifiers, a movement budget, growth state) instead of a class hierarchy.
//! The concrete kinds the map format knows about live in [`catalog`].

pub mod catalog;
pub mod growth;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{Event, EventContext};
use crate::resources::{ResourceHandle, ResourceResolver};

pub use growth::{GrowthStage, GrowthState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Generic,
    Static,
    Unit,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Generic => "Generic",
            ObjectKind::Static => "Static",
            ObjectKind::Unit => "Unit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    MovementCost,
}

impl ModifierKind {
    pub fn name(self) -> &'static str {
        match self {
            ModifierKind::MovementCost => "movement_cost",
        }
    }
}

/// Named contribution an object makes to the stats of its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub magnitude: i32,
}

impl Modifier {
    pub const fn movement_cost(magnitude: i32) -> Self {
        Self {
            kind: ModifierKind::MovementCost,
            magnitude,
        }
    }
}

/// Display-only snapshot of an object. Attributes are derived, never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub name: String,
    pub kind: ObjectKind,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("map object must have a non-empty name")]
    EmptyName,
    #[error("resource '{resource}' for '{object}' does not resolve")]
    UnresolvedResource { object: String, resource: String },
    #[error("growth density {0} exceeds 100")]
    InvalidDensity(u8),
    #[error("unit '{0}' must have at least one movement point")]
    ZeroMovementPoints(String),
}

/// Per-turn movement allowance of a movable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MovementBudget {
    max: u32,
    current: u32,
}

impl MovementBudget {
    pub fn new(max: u32) -> Self {
        Self { max, current: max }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.max;
    }

    pub(crate) fn spend(&mut self, cost: u32) {
        debug_assert!(cost <= self.current, "spending {cost} of {}", self.current);
        self.current = self.current.saturating_sub(cost);
    }
}

#[derive(Debug, Clone)]
enum Sprite {
    Fixed(ResourceHandle),
    Staged([ResourceHandle; 4]),
}

/// Which optional behaviours an object has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub modifiers: bool,
    pub movable: bool,
    pub growth: bool,
}

#[derive(Debug, Clone)]
pub struct MapObject {
    id: ObjectId,
    name: String,
    kind: ObjectKind,
    sprite: Sprite,
    modifiers: Vec<Modifier>,
    movement: Option<MovementBudget>,
    growth: Option<GrowthState>,
}

impl MapObject {
    fn base(
        name: &str,
        kind: ObjectKind,
        resource: &str,
        resolver: &dyn ResourceResolver,
    ) -> Result<Self, ObjectError> {
        let sprite = Sprite::Fixed(resolve(name, resource, resolver)?);
        Ok(Self {
            id: ObjectId::default(),
            name: name.to_string(),
            kind,
            sprite,
            modifiers: Vec::new(),
            movement: None,
            growth: None,
        })
    }

    pub fn generic(
        name: &str,
        resource: &str,
        resolver: &dyn ResourceResolver,
    ) -> Result<Self, ObjectError> {
        Self::base(name, ObjectKind::Generic, resource, resolver)
    }

    /// Pure scenery that does not affect its cell.
    pub fn scenery(
        name: &str,
        resource: &str,
        resolver: &dyn ResourceResolver,
    ) -> Result<Self, ObjectError> {
        Self::base(name, ObjectKind::Static, resource, resolver)
    }

    /// Static object contributing a fixed list of modifiers.
    pub fn modifier_holder(
        name: &str,
        resource: &str,
        modifiers: Vec<Modifier>,
        resolver: &dyn ResourceResolver,
    ) -> Result<Self, ObjectError> {
        let mut object = Self::base(name, ObjectKind::Static, resource, resolver)?;
        object.modifiers = modifiers;
        Ok(object)
    }

    /// Static modifier holder whose sprite follows its growth stage.
    /// Resources are looked up as `<resource_prefix>.<stage>`.
    pub fn growing(
        name: &str,
        resource_prefix: &str,
        modifiers: Vec<Modifier>,
        growth: GrowthState,
        resolver: &dyn ResourceResolver,
    ) -> Result<Self, ObjectError> {
        if name.is_empty() {
            return Err(ObjectError::EmptyName);
        }
        let mut handles = Vec::with_capacity(GrowthStage::ALL.len());
        for stage in GrowthStage::ALL {
            let resource = format!("{resource_prefix}.{}", stage.name());
            handles.push(resolve(name, &resource, resolver)?);
        }
        let staged = [handles[0], handles[1], handles[2], handles[3]];
        Ok(Self {
            id: ObjectId::default(),
            name: name.to_string(),
            kind: ObjectKind::Static,
            sprite: Sprite::Staged(staged),
            modifiers,
            movement: None,
            growth: Some(growth),
        })
    }

    pub fn unit(
        name: &str,
        resource: &str,
        max_movement_points: u32,
        resolver: &dyn ResourceResolver,
    ) -> Result<Self, ObjectError> {
        if max_movement_points == 0 {
            return Err(ObjectError::ZeroMovementPoints(name.to_string()));
        }
        let mut object = Self::base(name, ObjectKind::Unit, resource, resolver)?;
        object.movement = Some(MovementBudget::new(max_movement_points));
        Ok(object)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: ObjectId) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn is_static(&self) -> bool {
        self.kind == ObjectKind::Static
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            modifiers: !self.modifiers.is_empty(),
            movable: self.movement.is_some(),
            growth: self.growth.is_some(),
        }
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn movement(&self) -> Option<&MovementBudget> {
        self.movement.as_ref()
    }

    pub(crate) fn movement_mut(&mut self) -> Option<&mut MovementBudget> {
        self.movement.as_mut()
    }

    pub fn growth(&self) -> Option<&GrowthState> {
        self.growth.as_ref()
    }

    /// Drawable for the current state; growing objects follow their stage.
    pub fn sprite(&self) -> ResourceHandle {
        match (&self.sprite, &self.growth) {
            (Sprite::Staged(handles), Some(growth)) => handles[growth.stage() as usize],
            (Sprite::Staged(handles), None) => handles[0],
            (Sprite::Fixed(handle), _) => *handle,
        }
    }

    pub fn info(&self) -> ObjectInfo {
        let mut attributes = BTreeMap::new();
        if let Some(movement) = &self.movement {
            attributes.insert(
                "movement".to_string(),
                format!("{}/{}", movement.current(), movement.max()),
            );
        }
        if let Some(growth) = &self.growth {
            attributes.insert("density".to_string(), growth.density().to_string());
            attributes.insert("age".to_string(), growth.age().to_string());
            attributes.insert("stage".to_string(), growth.stage().name().to_string());
        }
        for modifier in &self.modifiers {
            attributes.insert(
                modifier.kind.name().to_string(),
                format!("{:+}", modifier.magnitude),
            );
        }
        ObjectInfo {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            attributes,
        }
    }

    /// Objects react to turn starts but never consume an event.
    pub fn handle_event(&mut self, event: &Event, ctx: &mut EventContext<'_>) -> bool {
        if let Event::TurnStart { turn } = event {
            if let Some(movement) = self.movement.as_mut() {
                movement.reset();
            }
            if let Some(growth) = self.growth.as_mut() {
                if growth.advance(turn, &mut *ctx.rng) {
                    tracing::trace!(
                        object = %self.id,
                        density = growth.density(),
                        "vegetation grew"
                    );
                }
            }
        }
        false
    }
}

fn resolve(
    object: &str,
    resource: &str,
    resolver: &dyn ResourceResolver,
) -> Result<ResourceHandle, ObjectError> {
    if object.is_empty() {
        return Err(ObjectError::EmptyName);
    }
    resolver
        .resolve(resource)
        .ok_or_else(|| ObjectError::UnresolvedResource {
            object: object.to_string(),
            resource: resource.to_string(),
        })
}
