use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    collections::{OrderedMap, TagSet},
    cost::Cost,
    entity::{Explosion, Gear, PsychicPower, Psyker, Upgrade, Weapon, WoundTracker},
};

/// Ability bucket holding a unit's general abilities.
pub const ABILITIES_BUCKET: &str = "Abilities";
/// Name of the pseudo-model collecting unit-level gear.
pub const UNIT_UPGRADES: &str = "Unit Upgrades";

/// Battlefield role derived from a unit's category tags.
///
/// Declaration order is the sort order used for units within a force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitRole {
    SupremeCommand,
    Hq,
    Character,
    Battleline,
    Troops,
    Elites,
    FastAttack,
    HeavySupport,
    Flyer,
    DedicatedTransport,
    Fortification,
    LordOfWar,
    Agent,
    NoForceOrgSlot,
    #[default]
    None,
}

impl UnitRole {
    pub fn label(self) -> &'static str {
        match self {
            UnitRole::SupremeCommand => "Supreme Command",
            UnitRole::Hq => "HQ",
            UnitRole::Character => "Character",
            UnitRole::Battleline => "Battleline",
            UnitRole::Troops => "Troops",
            UnitRole::Elites => "Elites",
            UnitRole::FastAttack => "Fast Attack",
            UnitRole::HeavySupport => "Heavy Support",
            UnitRole::Flyer => "Flyer",
            UnitRole::DedicatedTransport => "Dedicated Transport",
            UnitRole::Fortification => "Fortification",
            UnitRole::LordOfWar => "Lord of War",
            UnitRole::Agent => "Agent of the Imperium",
            UnitRole::NoForceOrgSlot => "No Force Org Slot",
            UnitRole::None => "None",
        }
    }
}

/// Invulnerable save inferred from ability prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvulnerableSave {
    /// Threshold such as `"4+"`.
    pub threshold: String,
    /// Restricted form (ranged attacks only, or no re-rolls).
    #[serde(default)]
    pub special: bool,
}

impl fmt::Display for InvulnerableSave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.special {
            write!(f, "{}*", self.threshold)
        } else {
            f.write_str(&self.threshold)
        }
    }
}

/// A concrete model loadout, or a canonical stat-line when held in
/// [`Unit::model_stats`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub cost: Cost,
    #[serde(default, rename = "move")]
    pub movement: String,
    #[serde(default)]
    pub weapon_skill: String,
    #[serde(default)]
    pub ballistic_skill: String,
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub toughness: String,
    #[serde(default)]
    pub wounds: String,
    #[serde(default)]
    pub attacks: String,
    #[serde(default)]
    pub leadership: String,
    #[serde(default)]
    pub save: String,
    #[serde(default)]
    pub objective_control: String,
    #[serde(default)]
    pub ranged_weapons: Vec<Weapon>,
    #[serde(default)]
    pub melee_weapons: Vec<Weapon>,
    #[serde(default)]
    pub upgrades: Vec<Upgrade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psyker: Option<Psyker>,
    #[serde(default)]
    pub psychic_powers: Vec<PsychicPower>,
    #[serde(default)]
    pub explosions: Vec<Explosion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invulnerable: Option<InvulnerableSave>,
    /// Set once gear counts and costs have been expressed per model.
    #[serde(default)]
    pub gear_scaled: bool,
}

impl Model {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
            ..Self::default()
        }
    }

    pub fn has_gear(&self) -> bool {
        !self.ranged_weapons.is_empty() || !self.melee_weapons.is_empty() || !self.upgrades.is_empty()
    }

    /// Weapons then upgrades, keeping the first entry per selection name.
    pub fn deduped_gear(&self) -> Vec<&dyn Gear> {
        let mut deduped: Vec<&dyn Gear> = Vec::new();
        let all = self
            .ranged_weapons
            .iter()
            .map(|weapon| weapon as &dyn Gear)
            .chain(self.melee_weapons.iter().map(|weapon| weapon as &dyn Gear))
            .chain(self.upgrades.iter().map(|upgrade| upgrade as &dyn Gear));
        for gear in all {
            if !deduped
                .iter()
                .any(|seen| seen.selection_name() == gear.selection_name())
            {
                deduped.push(gear);
            }
        }
        deduped
    }

    /// Model name followed by its rendered gear, e.g.
    /// `"Sergeant (Bolt rifle [2 pts], Chainsword)"`.
    ///
    /// Two models are merged by the normalizer exactly when these strings
    /// match.
    pub fn name_and_gear(&self) -> String {
        if !self.has_gear() {
            return self.name.clone();
        }
        let gear: Vec<String> = self.deduped_gear().iter().map(|gear| gear.label()).collect();
        format!("{} ({})", self.name, gear.join(", "))
    }
}

impl PartialEq for Model {
    /// Same name, count and gear lists. A model with a psyker block never
    /// compares equal since psychic loadouts are not compared.
    fn eq(&self, other: &Self) -> bool {
        if self.psyker.is_some() || other.psyker.is_some() {
            return false;
        }
        self.name == other.name
            && self.count == other.count
            && self.ranged_weapons == other.ranged_weapons
            && self.melee_weapons == other.melee_weapons
            && self.upgrades == other.upgrades
    }
}

/// One battlefield unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub role: UnitRole,
    #[serde(default)]
    pub factions: TagSet,
    #[serde(default)]
    pub keywords: TagSet,
    /// Ability buckets keyed by profile type, `"Abilities"` first when present.
    #[serde(default)]
    pub abilities: IndexMap<String, OrderedMap>,
    #[serde(default)]
    pub rules: OrderedMap,
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub model_stats: Vec<Model>,
    #[serde(default)]
    pub model_list: Vec<String>,
    #[serde(default)]
    pub ranged_weapons: Vec<Weapon>,
    #[serde(default)]
    pub melee_weapons: Vec<Weapon>,
    #[serde(default)]
    pub spells: Vec<PsychicPower>,
    #[serde(default)]
    pub psykers: Vec<Psyker>,
    #[serde(default)]
    pub explosions: Vec<Explosion>,
    #[serde(default)]
    pub wound_trackers: Vec<WoundTracker>,
    #[serde(default)]
    pub cost: Cost,
}

impl Unit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Ability bucket `bucket`, created empty on first use.
    pub fn ability_bucket(&mut self, bucket: &str) -> &mut OrderedMap {
        self.abilities.entry(bucket.to_string()).or_default()
    }

    /// The general `"Abilities"` bucket, if any ability landed there.
    pub fn general_abilities(&self) -> Option<&OrderedMap> {
        self.abilities.get(ABILITIES_BUCKET)
    }

    /// Unit name with non-zero bespoke costs, e.g. `"Cultists [2 Cabal Points]"`.
    pub fn name_with_extra_costs(&self) -> String {
        let extra = self.cost.extra_costs();
        if extra.is_empty() {
            self.name.clone()
        } else {
            format!("{} [{}]", self.name, extra.join(", "))
        }
    }

    /// Stat-line best matching a model name; see
    /// [`crate::parser::normalize::best_stat_line`].
    pub fn stat_line_for(&self, model_name: &str) -> Option<&Model> {
        crate::parser::normalize::best_stat_line(&self.model_stats, model_name)
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.role == other.role
            && self.models == other.models
            && self.model_stats == other.model_stats
    }
}
