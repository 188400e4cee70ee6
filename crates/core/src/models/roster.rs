use serde::{Deserialize, Serialize};

use super::{collections::OrderedMap, cost::Cost, unit::Unit, unit::UnitRole};

/// Name given to rosters that do not carry one.
pub const DEFAULT_ROSTER_NAME: &str = "40k Army Roster";
/// Faction label used until a detachment choice names one.
pub const UNKNOWN_FACTION: &str = "Unknown";

/// Game systems the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameSystem {
    NinthEdition,
    TenthEdition,
}

const NINTH_ROLES: &[(&str, UnitRole)] = &[
    ("Primarch | Daemon Primarch | Supreme Commander", UnitRole::SupremeCommand),
    ("HQ", UnitRole::Hq),
    ("Troops", UnitRole::Troops),
    ("Elites", UnitRole::Elites),
    ("Fast Attack", UnitRole::FastAttack),
    ("Heavy Support", UnitRole::HeavySupport),
    ("Flyer", UnitRole::Flyer),
    ("Dedicated Transport", UnitRole::DedicatedTransport),
    ("Fortification", UnitRole::Fortification),
    ("Lord of War", UnitRole::LordOfWar),
    ("Agent of the Imperium", UnitRole::Agent),
    ("No Force Org Slot", UnitRole::NoForceOrgSlot),
];

const TENTH_ROLES: &[(&str, UnitRole)] = &[
    ("Character", UnitRole::Character),
    ("Battleline", UnitRole::Battleline),
    ("Dedicated Transport", UnitRole::DedicatedTransport),
];

impl GameSystem {
    /// Map a document's `gameSystemName` to a known system.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier.trim() {
            "Warhammer 40,000 9th Edition" => Some(GameSystem::NinthEdition),
            "Warhammer 40,000 10th Edition" => Some(GameSystem::TenthEdition),
            _ => None,
        }
    }

    pub fn identifier(self) -> &'static str {
        match self {
            GameSystem::NinthEdition => "Warhammer 40,000 9th Edition",
            GameSystem::TenthEdition => "Warhammer 40,000 10th Edition",
        }
    }

    /// Role named by a category tag, matched by prefix against this
    /// system's vocabulary.
    pub fn role_for_category(self, category: &str) -> Option<UnitRole> {
        let vocabulary = match self {
            GameSystem::NinthEdition => NINTH_ROLES,
            GameSystem::TenthEdition => TENTH_ROLES,
        };
        let category = category.trim();
        vocabulary
            .iter()
            .find(|(label, _)| category.starts_with(label))
            .map(|(_, role)| *role)
    }
}

/// One faction's detachment within a roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Force {
    pub name: String,
    /// Catalogue path such as `"Imperium - Space Marines"`.
    pub catalog: String,
    pub faction: String,
    #[serde(default)]
    pub faction_rules: OrderedMap,
    #[serde(default)]
    pub rules: OrderedMap,
    #[serde(default)]
    pub configurations: Vec<String>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl Force {
    pub fn new(name: impl Into<String>, catalog: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog: catalog.into(),
            faction: UNKNOWN_FACTION.to_string(),
            faction_rules: OrderedMap::new(),
            rules: OrderedMap::new(),
            configurations: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Fold a later force of the same catalogue into this one. Rules only
    /// fill names this force does not define yet, and faction rules stay out
    /// of the force glossary.
    pub fn absorb(&mut self, other: Force) {
        for (name, text) in other.faction_rules.iter() {
            self.faction_rules.insert_missing(name, text);
        }
        for (name, text) in other.rules.iter() {
            self.rules.insert_missing(name, text);
        }
        let faction_rules = &self.faction_rules;
        self.rules.retain(|name, _| !faction_rules.contains_key(name));
        if self.faction == UNKNOWN_FACTION {
            self.faction = other.faction;
        }
        self.configurations.extend(other.configurations);
        self.units.extend(other.units);
        sort_units(&mut self.units);
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

/// Order units by role rank, then name.
pub fn sort_units(units: &mut [Unit]) {
    units.sort_by(|a, b| a.role.cmp(&b.role).then_with(|| a.name.cmp(&b.name)));
}

/// A fully parsed army list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub name: String,
    pub game_system: GameSystem,
    #[serde(default)]
    pub cost: Cost,
    #[serde(default)]
    pub forces: Vec<Force>,
}

impl Roster {
    pub fn new(name: impl Into<String>, game_system: GameSystem) -> Self {
        Self {
            name: name.into(),
            game_system,
            cost: Cost::default(),
            forces: Vec::new(),
        }
    }

    pub fn force_by_catalog_mut(&mut self, catalog: &str) -> Option<&mut Force> {
        self.forces.iter_mut().find(|force| force.catalog == catalog)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.forces.iter().flat_map(|force| force.units.iter())
    }
}
