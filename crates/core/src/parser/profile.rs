//! Profile classification and the builders turning profiles into entities.

use tracing::warn;

use crate::{
    document::{Element, Located},
    models::{
        cost::Cost, Entity, Explosion, Model, OrderedMap, PsychicPower, Psyker, Weapon,
        WoundTracker,
    },
};

/// Bucket name for general unit abilities.
pub const ABILITIES: &str = "Abilities";

/// A `profile` element together with the selection that owns it.
///
/// The owner is threaded down from the walk that found the profile, so
/// builders never look upwards through the tree.
#[derive(Debug, Clone, Copy)]
pub struct Profile<'a> {
    pub element: &'a Element,
    pub owner: &'a Element,
}

impl<'a> From<Located<'a>> for Profile<'a> {
    fn from(located: Located<'a>) -> Self {
        Self {
            element: located.element,
            owner: located.owner,
        }
    }
}

impl<'a> Profile<'a> {
    pub fn id(&self) -> usize {
        self.element.id()
    }

    pub fn name(&self) -> Option<&'a str> {
        self.element.attr("name")
    }

    pub fn type_name(&self) -> Option<&'a str> {
        self.element.attr("typeName")
    }

    pub fn kind(&self) -> Option<ProfileKind> {
        self.type_name().map(ProfileKind::classify)
    }

    /// Named characteristics as `(name, text)`, empty text included.
    pub fn characteristics(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.element
            .grouped("characteristics", "characteristic")
            .filter_map(|characteristic| {
                characteristic
                    .attr("name")
                    .map(|name| (name, characteristic.text()))
            })
    }

    fn filled_characteristics(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.characteristics().filter(|(_, text)| !text.is_empty())
    }
}

/// What a profile's declared type makes of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    StatLine,
    RangedWeapon,
    MeleeWeapon,
    /// Single weapon table, split into ranged and melee by its type.
    Weapon,
    WoundTracker,
    PsychicPower,
    Explosion,
    Psyker,
    Abilities,
    /// Any other type; kept as abilities in a bucket named after the type.
    Other,
}

impl ProfileKind {
    /// Exact type names first, then the substring families.
    pub fn classify(type_name: &str) -> Self {
        match type_name {
            "Unit" | "Model" => ProfileKind::StatLine,
            "Ranged Weapons" => ProfileKind::RangedWeapon,
            "Melee Weapons" => ProfileKind::MeleeWeapon,
            "Weapon" => ProfileKind::Weapon,
            "Psychic Power" => ProfileKind::PsychicPower,
            "Psyker" => ProfileKind::Psyker,
            ABILITIES => ProfileKind::Abilities,
            other if other.contains("Wound Track")
                || other.contains("Stat Damage")
                || other.ends_with(" Wounds") =>
            {
                ProfileKind::WoundTracker
            }
            other if other.contains("Explosion") => ProfileKind::Explosion,
            _ => ProfileKind::Other,
        }
    }

    pub fn is_weapon(self) -> bool {
        matches!(
            self,
            ProfileKind::RangedWeapon | ProfileKind::MeleeWeapon | ProfileKind::Weapon
        )
    }
}

/// Whether `selection` directly holds a profile of the given kind.
pub fn has_immediate_profile(selection: &Element, kind: ProfileKind) -> bool {
    selection
        .grouped("profiles", "profile")
        .filter_map(|profile| profile.attr("typeName"))
        .any(|type_name| ProfileKind::classify(type_name) == kind)
}

/// Build the entity a profile describes. Profiles without a name or a type
/// carry nothing renderable and yield `None`.
pub fn build_entity(profile: Profile<'_>) -> Option<Entity> {
    let name = profile.name()?;
    let type_name = profile.type_name()?;
    let entity = match ProfileKind::classify(type_name) {
        ProfileKind::StatLine => Entity::StatLine(build_stat_line(profile, name)),
        ProfileKind::RangedWeapon => Entity::RangedWeapon(build_weapon(profile, name)),
        ProfileKind::MeleeWeapon => Entity::MeleeWeapon(build_weapon(profile, name)),
        ProfileKind::Weapon => {
            let weapon = build_weapon(profile, name);
            if weapon.weapon_type.starts_with("Melee") {
                Entity::MeleeWeapon(weapon)
            } else {
                Entity::RangedWeapon(weapon)
            }
        }
        ProfileKind::WoundTracker => Entity::WoundTracker(build_wound_tracker(profile, name)),
        ProfileKind::PsychicPower => Entity::PsychicPower(build_psychic_power(profile, name)),
        ProfileKind::Explosion => Entity::Explosion(build_explosion(profile, name)),
        ProfileKind::Psyker => Entity::Psyker(build_psyker(profile, name)),
        ProfileKind::Abilities => Entity::Ability {
            bucket: ABILITIES.to_string(),
            entries: ability_entries(profile, name),
        },
        ProfileKind::Other => Entity::Ability {
            bucket: type_name.to_string(),
            entries: ability_entries(profile, name),
        },
    };
    Some(entity)
}

pub fn build_stat_line(profile: Profile<'_>, name: &str) -> Model {
    let mut model = Model::new(name, 0);
    for (characteristic, text) in profile.filled_characteristics() {
        let slot = match characteristic {
            "M" => &mut model.movement,
            "WS" => &mut model.weapon_skill,
            "BS" => &mut model.ballistic_skill,
            "S" => &mut model.strength,
            "T" => &mut model.toughness,
            "W" => &mut model.wounds,
            "A" => &mut model.attacks,
            "LD" | "Ld" => &mut model.leadership,
            "SV" | "Sv" | "Save" => &mut model.save,
            "OC" => &mut model.objective_control,
            _ => continue,
        };
        *slot = text.to_string();
    }
    model
}

/// Weapon profile. Its count is the owning selection's `number`, and an
/// upgrade-typed owner lends the weapon its name and cost.
pub fn build_weapon(profile: Profile<'_>, name: &str) -> Weapon {
    let mut weapon = Weapon {
        name: name.to_string(),
        count: selection_number(profile.owner),
        ..Weapon::default()
    };
    for (characteristic, text) in profile.filled_characteristics() {
        let slot = match characteristic {
            "Range" => &mut weapon.range,
            "Type" | "Keywords" => &mut weapon.weapon_type,
            "A" => &mut weapon.attacks,
            "BS" | "WS" => &mut weapon.skill,
            "S" => &mut weapon.strength,
            "AP" => &mut weapon.ap,
            "D" => &mut weapon.damage,
            "Abilities" => &mut weapon.abilities,
            _ => continue,
        };
        *slot = text.to_string();
    }
    if profile.owner.is_type("upgrade") {
        if let Some(selection) = profile.owner.attr("name") {
            if selection != name {
                weapon.selection_name = Some(selection.to_string());
            }
            weapon.cost = selection_cost(profile.owner);
        }
    }
    weapon
}

pub fn build_wound_tracker(profile: Profile<'_>, name: &str) -> WoundTracker {
    let table = profile
        .characteristics()
        .map(|(characteristic, text)| (characteristic, if text.is_empty() { "-" } else { text }))
        .collect();
    WoundTracker {
        name: name.to_string(),
        table,
    }
}

pub fn build_psychic_power(profile: Profile<'_>, name: &str) -> PsychicPower {
    let mut power = PsychicPower {
        name: name.to_string(),
        ..PsychicPower::default()
    };
    for (characteristic, text) in profile.filled_characteristics() {
        match characteristic {
            "Range" => power.range = text.to_string(),
            "Warp Charge" => power.manifest = text.to_string(),
            "Details" => power.details = text.to_string(),
            _ => {}
        }
    }
    power
}

pub fn build_explosion(profile: Profile<'_>, name: &str) -> Explosion {
    let mut explosion = Explosion {
        name: name.to_string(),
        ..Explosion::default()
    };
    for (characteristic, text) in profile.filled_characteristics() {
        match characteristic {
            "Dice Roll" => explosion.dice_roll = text.to_string(),
            "Distance" => explosion.distance = text.to_string(),
            "Mortal Wounds" => explosion.mortal_wounds = text.to_string(),
            _ => {}
        }
    }
    explosion
}

pub fn build_psyker(profile: Profile<'_>, name: &str) -> Psyker {
    let mut psyker = Psyker {
        name: name.to_string(),
        ..Psyker::default()
    };
    for (characteristic, text) in profile.filled_characteristics() {
        match characteristic {
            "Cast" => psyker.cast = text.to_string(),
            "Deny" => psyker.deny = text.to_string(),
            "Powers Known" => psyker.powers = text.to_string(),
            "Other" => psyker.other = text.to_string(),
            _ => {}
        }
    }
    psyker
}

/// Ability text keyed by profile name, or by `"<profile> - <characteristic>"`
/// when the profile has several characteristics.
pub fn ability_entries(profile: Profile<'_>, name: &str) -> OrderedMap {
    let multi_row = profile.characteristics().count() > 1;
    profile
        .filled_characteristics()
        .map(|(characteristic, text)| {
            let key = if multi_row {
                format!("{name} - {characteristic}")
            } else {
                name.to_string()
            };
            (key, text)
        })
        .collect()
}

/// Copy a `rule` element's description into `glossary`.
pub fn extract_rule(rule: &Element, glossary: &mut OrderedMap) {
    let Some(name) = rule.attr("name") else {
        return;
    };
    if let Some(description) = rule.child("description").map(Element::text) {
        if !description.is_empty() {
            glossary.insert(name, description);
        }
    }
}

/// `number` attribute of a selection, 1 when absent or unreadable.
pub fn selection_number(selection: &Element) -> u32 {
    selection
        .attr("number")
        .and_then(|number| number.trim().parse().ok())
        .unwrap_or(1)
}

/// Sum of a selection's own `costs > cost` entries.
pub fn selection_cost(selection: &Element) -> Cost {
    selection.grouped("costs", "cost").map(parse_cost).sum()
}

/// One `cost` element. Unknown cost names are kept; unreadable values are
/// logged and counted as zero.
pub fn parse_cost(cost: &Element) -> Cost {
    let (Some(name), Some(value)) = (cost.attr("name"), cost.attr("value")) else {
        return Cost::default();
    };
    match value.trim().parse::<f64>() {
        Ok(value) => Cost::from_entry(name, value),
        Err(_) => {
            warn!("Skipping unreadable cost {name}={value}");
            Cost::default()
        }
    }
}
