//! Resource amounts and costs.
//!
//! All calculations use fixed-point math for deterministic simulation.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// A stockpiled resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    /// Metal.
    Metal,
    /// Crystal.
    Crystal,
    /// Deuterium.
    Deuterium,
}

impl ResourceKind {
    /// Every stockpiled resource, in display order.
    pub const ALL: [Self; 3] = [Self::Metal, Self::Crystal, Self::Deuterium];
}

/// One value per stockpiled resource: a stock, an hourly rate or a capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Metal.
    #[serde(with = "fixed_serde")]
    pub metal: Fixed,
    /// Crystal.
    #[serde(with = "fixed_serde")]
    pub crystal: Fixed,
    /// Deuterium.
    #[serde(with = "fixed_serde")]
    pub deuterium: Fixed,
}

impl Resources {
    /// All zero.
    pub const ZERO: Self = Self {
        metal: Fixed::ZERO,
        crystal: Fixed::ZERO,
        deuterium: Fixed::ZERO,
    };

    /// Create from whole amounts.
    #[must_use]
    pub fn new(metal: i32, crystal: i32, deuterium: i32) -> Self {
        Self {
            metal: Fixed::from_num(metal),
            crystal: Fixed::from_num(crystal),
            deuterium: Fixed::from_num(deuterium),
        }
    }

    /// Value for one resource.
    #[must_use]
    pub const fn get(&self, kind: ResourceKind) -> Fixed {
        match kind {
            ResourceKind::Metal => self.metal,
            ResourceKind::Crystal => self.crystal,
            ResourceKind::Deuterium => self.deuterium,
        }
    }

    /// Mutable value for one resource.
    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut Fixed {
        match kind {
            ResourceKind::Metal => &mut self.metal,
            ResourceKind::Crystal => &mut self.crystal,
            ResourceKind::Deuterium => &mut self.deuterium,
        }
    }

    /// Whether every amount covers the metal, crystal and deuterium of `cost`.
    #[must_use]
    pub fn covers(&self, cost: &ResourceCost) -> bool {
        self.metal >= cost.metal && self.crystal >= cost.crystal && self.deuterium >= cost.deuterium
    }

    /// Subtract the stockpiled part of `cost`, never going below zero.
    pub fn spend(&mut self, cost: &ResourceCost) {
        self.metal = (self.metal - cost.metal).max(Fixed::ZERO);
        self.crystal = (self.crystal - cost.crystal).max(Fixed::ZERO);
        self.deuterium = (self.deuterium - cost.deuterium).max(Fixed::ZERO);
    }
}

/// Price of a building level, a ship or a defense unit.
///
/// Energy is a requirement on the planet's spare energy, not a stock: paying a
/// cost never subtracts energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResourceCost {
    /// Metal.
    #[serde(with = "fixed_serde")]
    pub metal: Fixed,
    /// Crystal.
    #[serde(with = "fixed_serde")]
    pub crystal: Fixed,
    /// Deuterium.
    #[serde(with = "fixed_serde")]
    pub deuterium: Fixed,
    /// Spare energy required.
    #[serde(with = "fixed_serde")]
    pub energy: Fixed,
}

impl ResourceCost {
    /// Free.
    pub const ZERO: Self = Self {
        metal: Fixed::ZERO,
        crystal: Fixed::ZERO,
        deuterium: Fixed::ZERO,
        energy: Fixed::ZERO,
    };

    /// Create a cost from whole amounts.
    #[must_use]
    pub fn new(metal: i32, crystal: i32, deuterium: i32, energy: i32) -> Self {
        Self {
            metal: Fixed::from_num(metal),
            crystal: Fixed::from_num(crystal),
            deuterium: Fixed::from_num(deuterium),
            energy: Fixed::from_num(energy),
        }
    }

    /// The same cost with the energy requirement dropped.
    ///
    /// Ships and defense never reserve energy.
    #[must_use]
    pub const fn without_energy(self) -> Self {
        Self {
            energy: Fixed::ZERO,
            ..self
        }
    }

    /// Metal plus crystal, the "structural" weight used by duration formulas.
    #[must_use]
    pub fn structural(&self) -> Fixed {
        self.metal.saturating_add(self.crystal)
    }
}

impl Mul<u32> for ResourceCost {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self::Output {
        let q = i64::from(quantity);
        Self {
            metal: self.metal.saturating_mul_int(q),
            crystal: self.crystal.saturating_mul_int(q),
            deuterium: self.deuterium.saturating_mul_int(q),
            energy: self.energy.saturating_mul_int(q),
        }
    }
}

impl Add for ResourceCost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            metal: self.metal.saturating_add(rhs.metal),
            crystal: self.crystal.saturating_add(rhs.crystal),
            deuterium: self.deuterium.saturating_add(rhs.deuterium),
            energy: self.energy.saturating_add(rhs.energy),
        }
    }
}

impl AddAssign for ResourceCost {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for ResourceCost {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
