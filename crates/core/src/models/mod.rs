//! Normalized roster data model.

pub mod collections;
pub mod cost;
pub mod entity;
pub mod roster;
pub mod unit;

pub use collections::{OrderedMap, TagSet};
pub use cost::Cost;
pub use entity::{
    Entity, EntityKind, Explosion, Gear, Named, PsychicPower, Psyker, Upgrade, Weapon, WeaponKind,
    WoundTracker,
};
pub use roster::{Force, GameSystem, Roster};
pub use unit::{InvulnerableSave, Model, Unit, UnitRole};
