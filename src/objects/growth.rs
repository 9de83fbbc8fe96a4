//! Age- and season-driven regrowth for vegetation.
//!
//! Only density and age are stored. The growth stage is always derived from
//! density, so the two can never disagree.

use rand::Rng;
use serde::Serialize;

use super::ObjectError;
use crate::turn::TurnInfo;

pub const MAX_DENSITY: u8 = 100;

/// Discrete band over density, four equal-width bands over 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GrowthStage {
    Seedling,
    Young,
    Mature,
    OldGrowth,
}

impl GrowthStage {
    pub const ALL: [GrowthStage; 4] = [
        GrowthStage::Seedling,
        GrowthStage::Young,
        GrowthStage::Mature,
        GrowthStage::OldGrowth,
    ];

    pub fn from_density(density: u8) -> Self {
        match density {
            0..=24 => GrowthStage::Seedling,
            25..=49 => GrowthStage::Young,
            50..=74 => GrowthStage::Mature,
            _ => GrowthStage::OldGrowth,
        }
    }

    /// Growth chance in percent. Young stands regrow fastest.
    pub fn base_chance(self) -> u32 {
        match self {
            GrowthStage::Seedling => 40,
            GrowthStage::Young => 20,
            GrowthStage::Mature => 10,
            GrowthStage::OldGrowth => 1,
        }
    }

    /// Age in turns at which the stage reaches its full base chance.
    /// Old growth has no ramp.
    pub fn max_age(self) -> Option<u32> {
        match self {
            GrowthStage::Seedling => Some(48),
            GrowthStage::Young => Some(96),
            GrowthStage::Mature => Some(192),
            GrowthStage::OldGrowth => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GrowthStage::Seedling => "seedling",
            GrowthStage::Young => "young",
            GrowthStage::Mature => "mature",
            GrowthStage::OldGrowth => "old_growth",
        }
    }
}

/// Percentage chance ramped by age: `base * min(age, max_age) / max_age`.
///
/// `age` counts turns since the object was placed and is never reset on a
/// stage change, so once an object is older than a stage's `max_age` it
/// enters that stage at the full base chance instead of ramping up again.
pub fn ramped_chance(base_chance: u32, age: u32, max_age: u32) -> u32 {
    if max_age == 0 {
        return base_chance;
    }
    base_chance * age.min(max_age) / max_age
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrowthState {
    density: u8,
    age: u32,
}

impl GrowthState {
    pub fn new(density: u8, age: u32) -> Result<Self, ObjectError> {
        if density > MAX_DENSITY {
            return Err(ObjectError::InvalidDensity(density));
        }
        Ok(Self { density, age })
    }

    pub fn density(&self) -> u8 {
        self.density
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn stage(&self) -> GrowthStage {
        GrowthStage::from_density(self.density)
    }

    pub fn is_saturated(&self) -> bool {
        self.density >= MAX_DENSITY
    }

    /// Applies one turn of growth. Returns true when density increased.
    pub fn advance<R: Rng + ?Sized>(&mut self, turn: &TurnInfo, rng: &mut R) -> bool {
        self.advance_with(turn, || rng.gen_range(1..=100))
    }

    /// Same as [`GrowthState::advance`] with the 1..=100 draw supplied by
    /// `roll`, which is only invoked when a draw is actually needed.
    pub fn advance_with(&mut self, turn: &TurnInfo, roll: impl FnOnce() -> u32) -> bool {
        self.age = self.age.saturating_add(1);

        if self.is_saturated() || !turn.season().is_growing() {
            return false;
        }

        let stage = self.stage();
        let roll = roll();
        let grows = match stage.max_age() {
            None => roll == stage.base_chance(),
            Some(max_age) => roll <= ramped_chance(stage.base_chance(), self.age, max_age),
        };

        if grows {
            self.density = (self.density + 1).min(MAX_DENSITY);
        }
        grows
    }
}
