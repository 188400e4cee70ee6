//! Unit normalization: merging equal siblings, per-model gear, flattened
//! weapon lists and the deterministic sort orders.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{
    cost::Cost, unit::UNIT_UPGRADES, Gear, Model, Named, Unit, Upgrade, Weapon,
};

static LEADING_INT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(-?\d+)").expect("failed to compile leading integer regex"));

/// Gear whose count and cost fold together when merged.
trait Stackable: Gear {
    fn stack(&mut self, other: &Self);
    fn scale_down(&mut self, models: u32);
}

macro_rules! stackable {
    ($($ty:ty),*) => {
        $(
            impl Stackable for $ty {
                fn stack(&mut self, other: &Self) {
                    self.count += other.count;
                    self.cost += &other.cost;
                }

                fn scale_down(&mut self, models: u32) {
                    self.count /= models;
                    self.cost.divide_points(models);
                }
            }
        )*
    };
}

stackable!(Upgrade, Weapon);

/// Normalize a freshly built unit. Applying it again is a no-op.
pub fn normalize_unit(unit: &mut Unit) {
    for model in &mut unit.models {
        normalize_model(model);
    }

    unit.models.sort_by(compare_models);
    unit.models.dedup_by(|later, kept| {
        if later.name_and_gear() != kept.name_and_gear() {
            return false;
        }
        kept.count += later.count;
        kept.cost += &later.cost;
        true
    });

    unit.model_stats.sort_by(stat_line_order);
    unit.model_stats.dedup();

    unit.model_list = unit.models.iter().map(model_label).collect();
    unit.ranged_weapons = flatten(unit.models.iter().flat_map(|model| &model.ranged_weapons));
    unit.melee_weapons = flatten(unit.models.iter().flat_map(|model| &model.melee_weapons));

    for model in &unit.models {
        push_missing(&mut unit.spells, &model.psychic_powers);
        push_missing(&mut unit.explosions, &model.explosions);
        if let Some(psyker) = &model.psyker {
            push_missing(&mut unit.psykers, std::slice::from_ref(psyker));
        }
    }
}

/// Sort and merge a model's gear, then express it per model when the
/// totals divide evenly by the model count.
fn normalize_model(model: &mut Model) {
    model.ranged_weapons.sort_by(compare_weapons);
    model.melee_weapons.sort_by(compare_weapons);
    model.upgrades.sort_by(|a, b| a.name.cmp(&b.name));

    merge_adjacent(&mut model.ranged_weapons);
    merge_adjacent(&mut model.melee_weapons);
    merge_adjacent(&mut model.upgrades);

    if model.gear_scaled || model.count == 0 {
        return;
    }
    let models = model.count;
    scale_per_model(&mut model.ranged_weapons, models);
    scale_per_model(&mut model.melee_weapons, models);
    scale_per_model(&mut model.upgrades, models);
    model.gear_scaled = true;
}

fn merge_adjacent<G: Stackable>(gear: &mut Vec<G>) {
    gear.dedup_by(|later, kept| {
        if later.name() != kept.name() {
            return false;
        }
        kept.stack(later);
        true
    });
}

fn scale_per_model<G: Stackable>(gear: &mut [G], models: u32) {
    for item in gear.iter_mut().filter(|item| item.count() % models == 0) {
        item.scale_down(models);
    }
}

fn model_label(model: &Model) -> String {
    if model.count > 1 {
        format!("{}x {}", model.count, model.name_and_gear())
    } else {
        model.name_and_gear()
    }
}

fn flatten<'a>(weapons: impl Iterator<Item = &'a Weapon>) -> Vec<Weapon> {
    let mut flat: Vec<Weapon> = weapons.cloned().collect();
    flat.sort_by(compare_weapons);
    flat.dedup_by(|later, kept| later.name == kept.name);
    flat
}

fn push_missing<T: Named + Clone>(target: &mut Vec<T>, items: &[T]) {
    for item in items {
        if !target.iter().any(|existing| existing.name() == item.name()) {
            target.push(item.clone());
        }
    }
}

/// Grenades after melee after everything else, then by name.
pub fn compare_weapons(a: &Weapon, b: &Weapon) -> Ordering {
    a.kind()
        .cmp(&b.kind())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

/// By name with `"Unit Upgrades"` last; same-named models by rendered gear.
pub fn compare_models(a: &Model, b: &Model) -> Ordering {
    if a.name == b.name {
        return a.name_and_gear().cmp(&b.name_and_gear());
    }
    match (a.name == UNIT_UPGRADES, b.name == UNIT_UPGRADES) {
        (true, _) => Ordering::Greater,
        (_, true) => Ordering::Less,
        _ => a.name.cmp(&b.name),
    }
}

/// Most prominent stat-line first: wounds, leadership and move descending,
/// then longer names first so `"Intercessor Sergeant"` precedes
/// `"Intercessor"`.
pub fn stat_line_order(a: &Model, b: &Model) -> Ordering {
    leading_int(&b.wounds)
        .cmp(&leading_int(&a.wounds))
        .then_with(|| leading_int(&b.leadership).cmp(&leading_int(&a.leadership)))
        .then_with(|| leading_int(&b.movement).cmp(&leading_int(&a.movement)))
        .then_with(|| b.name.len().cmp(&a.name.len()))
        .then_with(|| a.name.cmp(&b.name))
}

fn leading_int(value: &str) -> i64 {
    LEADING_INT_RE
        .captures(value)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(-1)
}

/// Stat-line to show for a model entry, matched by name.
///
/// Returns the first stat-line, in [`stat_line_order`], whose name occurs
/// case-insensitively inside `model_name`. The source data has no explicit
/// link between models and stat-lines, so this is a textual guess:
///
/// * When one stat-line name is a prefix of another (`"Intercessor"` and
///   `"Intercessor Sergeant"`), the longer name wins only because of the
///   name-length tie-break; a higher-wound shorter name still sorts first.
/// * Two stat-lines whose names both occur in `model_name` resolve to the
///   more prominent one, which may be the wrong profile.
/// * A model whose name contains no stat-line name yields `None`.
pub fn best_stat_line<'a>(stat_lines: &'a [Model], model_name: &str) -> Option<&'a Model> {
    let model_name = model_name.to_lowercase();
    let mut ordered: Vec<&Model> = stat_lines.iter().collect();
    ordered.sort_by(|a, b| stat_line_order(a, b));
    ordered
        .into_iter()
        .find(|stats| model_name.contains(&stats.name.to_lowercase()))
}

/// Total cost of every model in a unit.
pub fn models_cost(unit: &Unit) -> Cost {
    unit.models.iter().map(|model| model.cost.clone()).sum()
}
