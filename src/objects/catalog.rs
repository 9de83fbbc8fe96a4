//! Concrete map objects known to the map format.

use super::{GrowthState, MapObject, Modifier, ObjectError};
use crate::resources::ResourceResolver;

pub const TRIBE_MOVEMENT_POINTS: u32 = 5;

pub fn boulders(resolver: &dyn ResourceResolver) -> Result<MapObject, ObjectError> {
    MapObject::modifier_holder(
        "Boulders",
        "object.boulders",
        vec![Modifier::movement_cost(1)],
        resolver,
    )
}

pub fn forest(
    density: u8,
    age: u32,
    resolver: &dyn ResourceResolver,
) -> Result<MapObject, ObjectError> {
    let growth = GrowthState::new(density, age)?;
    MapObject::growing(
        "Forest",
        "object.forest",
        vec![Modifier::movement_cost(2)],
        growth,
        resolver,
    )
}

pub fn tribe(resolver: &dyn ResourceResolver) -> Result<MapObject, ObjectError> {
    MapObject::unit("Tribe", "unit.tribe", TRIBE_MOVEMENT_POINTS, resolver)
}
