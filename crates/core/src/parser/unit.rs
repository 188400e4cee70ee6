//! Walks one unit selection into a [`Unit`].

use std::collections::HashSet;

use tracing::debug;

use crate::{
    document::Element,
    models::{unit::UNIT_UPGRADES, Entity, GameSystem, Model, Unit, Upgrade},
};

use super::{
    normalize::normalize_unit,
    profile::{
        build_entity, build_stat_line, extract_rule, has_immediate_profile, parse_cost,
        selection_cost, selection_number, Profile, ProfileKind,
    },
};

const FACTION_PREFIX: &str = "Faction: ";
const UNKNOWN_MODEL: &str = "Unknown Model";

/// Build and normalize the unit rooted at `root`. Unnamed selections yield
/// `None`.
pub fn parse_unit(root: &Element, system: GameSystem) -> Option<Unit> {
    let Some(name) = root.attr("name") else {
        debug!("dropping unnamed unit selection");
        return None;
    };
    let mut unit = Unit::new(name);
    unit.notes = root
        .child("customNotes")
        .map(|notes| notes.text().trim().to_string())
        .filter(|notes| !notes.is_empty());
    read_categories(root, system, &mut unit);

    let profiles: Vec<Profile<'_>> = root
        .find_grouped("profiles", "profile")
        .into_iter()
        .map(Profile::from)
        .collect();
    let mut seen = HashSet::new();

    for profile in &profiles {
        if profile.kind() != Some(ProfileKind::StatLine) {
            continue;
        }
        seen.insert(profile.id());
        if let Some(name) = profile.name() {
            unit.model_stats.push(build_stat_line(*profile, name));
        }
    }

    let model_selections = find_model_selections(root);
    for selection in &model_selections {
        let mut model = Model::new(
            selection.attr("name").unwrap_or(UNKNOWN_MODEL),
            selection_number(selection),
        );
        model.cost = selection_cost(selection);
        for located in selection.find_grouped("profiles", "profile") {
            let profile = Profile::from(located);
            if seen.insert(profile.id()) {
                attach_profile(profile, &mut model, &mut unit);
            }
        }
        model.upgrades.extend(model_upgrades(selection));
        unit.models.push(model);
    }

    let leftovers: Vec<Profile<'_>> = profiles
        .iter()
        .filter(|profile| !seen.contains(&profile.id()))
        .copied()
        .collect();
    if !leftovers.is_empty() {
        let mut upgrades_model = Model::new(UNIT_UPGRADES, 1);
        for profile in leftovers {
            attach_profile(profile, &mut upgrades_model, &mut unit);
        }
        unit.spells.append(&mut upgrades_model.psychic_powers);
        unit.explosions.append(&mut upgrades_model.explosions);
        unit.psykers.extend(upgrades_model.psyker.take());

        let root_is_model = model_selections.iter().any(|model| model.id() == root.id());
        if !root_is_model {
            let model_ids: HashSet<usize> = model_selections.iter().map(|model| model.id()).collect();
            upgrades_model.upgrades.extend(
                root.grouped("selections", "selection")
                    .filter(|selection| !model_ids.contains(&selection.id()))
                    .filter_map(unit_level_upgrade),
            );
        }
        if upgrades_model.has_gear() {
            unit.models.push(upgrades_model);
        }
    }

    unit.cost = root
        .find_grouped("costs", "cost")
        .into_iter()
        .map(|located| parse_cost(located.element))
        .sum();

    for located in root.find_grouped("rules", "rule") {
        if !located.owner.is_type("upgrade") {
            extract_rule(located.element, &mut unit.rules);
        }
    }

    normalize_unit(&mut unit);
    debug!(
        "parsed unit {} ({} models, {} stat-lines)",
        unit.name,
        unit.models.len(),
        unit.model_stats.len()
    );
    Some(unit)
}

/// Faction keywords, general keywords and the role from the unit's own
/// categories.
fn read_categories(root: &Element, system: GameSystem, unit: &mut Unit) {
    for category in root.grouped("categories", "category") {
        let Some(name) = category.attr("name") else {
            continue;
        };
        if let Some(index) = name.rfind(FACTION_PREFIX) {
            unit.factions.insert(&name[index + FACTION_PREFIX.len()..]);
            continue;
        }
        let role = system.role_for_category(name);
        if let Some(role) = role {
            unit.role = role;
        }
        if role.is_none() || system == GameSystem::TenthEdition {
            unit.keywords.insert(name);
        }
    }
}

/// Selections that describe concrete models of the unit.
fn find_model_selections(root: &Element) -> Vec<&Element> {
    if root.is_type("model") {
        return vec![root];
    }
    let immediate: Vec<&Element> = root
        .grouped("selections", "selection")
        .filter(|selection| {
            selection.is_type("model") || has_immediate_profile(selection, ProfileKind::StatLine)
        })
        .collect();
    if !immediate.is_empty() {
        return immediate;
    }
    let nested: Vec<&Element> = root
        .find_grouped("selections", "selection")
        .into_iter()
        .map(|located| located.element)
        .filter(|selection| selection.is_type("model"))
        .collect();
    if !nested.is_empty() {
        return nested;
    }
    if has_immediate_profile(root, ProfileKind::StatLine) {
        return vec![root];
    }
    Vec::new()
}

fn attach_profile(profile: Profile<'_>, model: &mut Model, unit: &mut Unit) {
    let Some(entity) = build_entity(profile) else {
        return;
    };
    match entity {
        Entity::StatLine(_) => {}
        Entity::RangedWeapon(weapon) => model.ranged_weapons.push(weapon),
        Entity::MeleeWeapon(weapon) => model.melee_weapons.push(weapon),
        Entity::WoundTracker(tracker) => unit.wound_trackers.push(tracker),
        Entity::PsychicPower(power) => model.psychic_powers.push(power),
        Entity::Explosion(explosion) => model.explosions.push(explosion),
        Entity::Psyker(psyker) => model.psyker = Some(psyker),
        Entity::Ability { bucket, entries } => unit.ability_bucket(&bucket).extend_from(&entries),
    }
}

/// Non-weapon upgrades chosen anywhere below a model selection.
///
/// Folder selections, which only group further upgrades and carry no
/// ability of their own, are skipped since their children are listed
/// individually.
fn model_upgrades(selection: &Element) -> Vec<Upgrade> {
    selection
        .find_grouped("selections", "selection")
        .into_iter()
        .map(|located| located.element)
        .filter(|upgrade| upgrade.is_type("upgrade"))
        .filter(|upgrade| {
            let is_folder = upgrade.any_grouped("selections", "selection", |nested| {
                nested.is_type("upgrade")
            });
            !is_folder || has_immediate_profile(upgrade, ProfileKind::Abilities)
        })
        .filter(|upgrade| !has_immediate_weapon(upgrade))
        .filter_map(|upgrade| {
            upgrade
                .attr("name")
                .map(|name| Upgrade::new(name, selection_number(upgrade), selection_cost(upgrade)))
        })
        .collect()
}

/// An upgrade chosen for the unit as a whole rather than for one model.
fn unit_level_upgrade(selection: &Element) -> Option<Upgrade> {
    if !selection.is_type("upgrade") {
        return None;
    }
    let carries_weapon = selection
        .find_grouped("profiles", "profile")
        .iter()
        .filter_map(|located| located.element.attr("typeName"))
        .any(|type_name| ProfileKind::classify(type_name).is_weapon());
    if carries_weapon {
        return None;
    }
    let name = selection.attr("name")?;
    Some(Upgrade::new(
        name,
        selection_number(selection),
        selection_cost(selection),
    ))
}

fn has_immediate_weapon(selection: &Element) -> bool {
    selection
        .grouped("profiles", "profile")
        .filter_map(|profile| profile.attr("typeName"))
        .any(|type_name| ProfileKind::classify(type_name).is_weapon())
}
