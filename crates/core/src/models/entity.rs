use std::fmt;

use serde::{Deserialize, Serialize};

use super::{collections::OrderedMap, cost::Cost, unit::Model};

/// Anything identified by its display name.
///
/// Names are unique within the game data for weapons, upgrades and powers, so
/// the name doubles as the identity used for de-duplication.
pub trait Named {
    fn name(&self) -> &str;

    fn same_identity(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.name() == other.name()
    }
}

/// A chosen option attached to a model: upgrades and weapons.
pub trait Gear: Named {
    fn count(&self) -> u32;
    fn cost(&self) -> &Cost;

    /// Label shown to players; weapons with several profiles use the
    /// enclosing selection's name here.
    fn selection_name(&self) -> &str {
        self.name()
    }

    /// `"[<count>x ]<selection name>[ <cost>]"`.
    fn label(&self) -> String {
        let mut label = self.selection_name().to_string();
        if self.count() > 1 {
            label = format!("{}x {label}", self.count());
        }
        if self.cost().has_values() {
            label = format!("{label} {}", self.cost());
        }
        label
    }
}

/// A non-weapon selection attached to a model or unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Upgrade {
    pub name: String,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub cost: Cost,
}

impl Upgrade {
    pub fn new(name: impl Into<String>, count: u32, cost: Cost) -> Self {
        Self {
            name: name.into(),
            count,
            cost,
        }
    }
}

impl Named for Upgrade {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Gear for Upgrade {
    fn count(&self) -> u32 {
        self.count
    }

    fn cost(&self) -> &Cost {
        &self.cost
    }
}

impl PartialEq for Upgrade {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl fmt::Display for Upgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A weapon profile, possibly one of several modes of one selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    /// Name of the upgrade selection the profile sits under, when that
    /// differs per mode (e.g. `"Plasma pistol"` for `"Plasma pistol - supercharge"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_name: Option<String>,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub cost: Cost,
    #[serde(default)]
    pub range: String,
    /// Comma-joined type tags such as `"Assault, Blast, Lethal Hits"`.
    #[serde(default, rename = "type")]
    pub weapon_type: String,
    #[serde(default)]
    pub attacks: String,
    #[serde(default)]
    pub skill: String,
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub ap: String,
    #[serde(default)]
    pub damage: String,
    #[serde(default)]
    pub abilities: String,
}

/// Sort bucket for weapons: plain profiles, then melee, then grenades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WeaponKind {
    Standard,
    Melee,
    Grenade,
}

impl Weapon {
    pub fn kind(&self) -> WeaponKind {
        if self.weapon_type.starts_with("Grenade") {
            WeaponKind::Grenade
        } else if self.weapon_type.starts_with("Melee") {
            WeaponKind::Melee
        } else {
            WeaponKind::Standard
        }
    }

    /// Append `tag` to the type tags unless it is already mentioned.
    pub fn add_type_tag(&mut self, tag: &str) {
        let current = self.weapon_type.trim();
        if current.is_empty() || current == "-" {
            self.weapon_type = tag.to_string();
        } else if !current.contains(tag) {
            self.weapon_type = format!("{current}, {tag}");
        }
    }
}

impl Named for Weapon {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Gear for Weapon {
    fn count(&self) -> u32 {
        self.count
    }

    fn cost(&self) -> &Cost {
        &self.cost
    }

    fn selection_name(&self) -> &str {
        self.selection_name.as_deref().unwrap_or(&self.name)
    }
}

impl PartialEq for Weapon {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl fmt::Display for Weapon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PsychicPower {
    pub name: String,
    #[serde(default)]
    pub manifest: String,
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Psyker {
    pub name: String,
    #[serde(default)]
    pub cast: String,
    #[serde(default)]
    pub deny: String,
    #[serde(default)]
    pub powers: String,
    #[serde(default)]
    pub other: String,
}

/// What happens when a model is destroyed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Explosion {
    pub name: String,
    #[serde(default)]
    pub dice_roll: String,
    #[serde(default)]
    pub distance: String,
    #[serde(default)]
    pub mortal_wounds: String,
}

/// Degrading characteristics by remaining wounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WoundTracker {
    pub name: String,
    #[serde(default)]
    pub table: OrderedMap,
}

macro_rules! named_by_field {
    ($($ty:ty),*) => {
        $(
            impl Named for $ty {
                fn name(&self) -> &str {
                    &self.name
                }
            }

            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    self.same_identity(other)
                }
            }
        )*
    };
}

named_by_field!(PsychicPower, Psyker, Explosion, WoundTracker);

/// The record a classified profile turns into.
#[derive(Debug, Clone)]
pub enum Entity {
    StatLine(Model),
    RangedWeapon(Weapon),
    MeleeWeapon(Weapon),
    WoundTracker(WoundTracker),
    PsychicPower(PsychicPower),
    Explosion(Explosion),
    Psyker(Psyker),
    /// Named rule text destined for the ability bucket `bucket`.
    Ability {
        bucket: String,
        entries: OrderedMap,
    },
}

/// Discriminant of [`Entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    StatLine,
    RangedWeapon,
    MeleeWeapon,
    WoundTracker,
    PsychicPower,
    Explosion,
    Psyker,
    Ability,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::StatLine(_) => EntityKind::StatLine,
            Entity::RangedWeapon(_) => EntityKind::RangedWeapon,
            Entity::MeleeWeapon(_) => EntityKind::MeleeWeapon,
            Entity::WoundTracker(_) => EntityKind::WoundTracker,
            Entity::PsychicPower(_) => EntityKind::PsychicPower,
            Entity::Explosion(_) => EntityKind::Explosion,
            Entity::Psyker(_) => EntityKind::Psyker,
            Entity::Ability { .. } => EntityKind::Ability,
        }
    }
}

fn one() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapon(name: &str, weapon_type: &str) -> Weapon {
        Weapon {
            name: name.to_string(),
            weapon_type: weapon_type.to_string(),
            count: 1,
            ..Weapon::default()
        }
    }

    #[test]
    fn weapons_compare_by_name_only() {
        let mut a = weapon("Bolt rifle", "Assault");
        let b = weapon("Bolt rifle", "Heavy");
        a.count = 3;
        assert_eq!(a, b);
        assert_ne!(a, weapon("Bolt pistol", "Assault"));
    }

    #[test]
    fn gear_label_includes_count_and_cost() {
        let mut plasma = weapon("Plasma pistol - supercharge", "Pistol");
        plasma.selection_name = Some("Plasma pistol".to_string());
        plasma.count = 2;
        plasma.cost = Cost::points(5.0);
        assert_eq!(plasma.to_string(), "2x Plasma pistol [5 pts]");

        let upgrade = Upgrade::new("Warlord", 1, Cost::default());
        assert_eq!(upgrade.to_string(), "Warlord");
    }

    #[test]
    fn type_tags_are_appended_once() {
        let mut gun = weapon("Frag cannon", "-");
        gun.add_type_tag("Blast");
        gun.add_type_tag("Blast");
        gun.add_type_tag("Torrent");
        assert_eq!(gun.weapon_type, "Blast, Torrent");
    }

    #[test]
    fn weapon_kind_follows_type_prefix() {
        assert_eq!(weapon("Frag grenades", "Grenade D6").kind(), WeaponKind::Grenade);
        assert_eq!(weapon("Chainsword", "Melee").kind(), WeaponKind::Melee);
        assert_eq!(weapon("Bolter", "Rapid Fire 1").kind(), WeaponKind::Standard);
    }
}
