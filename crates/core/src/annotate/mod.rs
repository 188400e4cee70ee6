//! Free-text rule annotation.
//!
//! Weapon ability prose is rewritten into type tags using a data-driven
//! phrase table, and invulnerable saves are inferred from unit ability prose.
//! Both tables ship with the crate as JSON and can be replaced from disk.

pub mod invulnerable;
pub mod weapon_rules;

use std::{fs, path::Path, sync::Arc};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::{
    error::{Result, RosterError},
    models::{Force, Model, Weapon},
};

pub use invulnerable::{InvulnerablePhrases, InvulnerableTable};
pub use weapon_rules::{WeaponRule, WeaponRuleTable};

const BUILTIN_WEAPON_RULES: &str = include_str!("../../data/weapon_abilities.json");
const BUILTIN_INVULNERABLE: &str = include_str!("../../data/invulnerable_saves.json");

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("failed to compile whitespace regex"));

static BUILTIN_TABLES: Lazy<Arc<RuleTables>> = Lazy::new(|| {
    Arc::new(
        RuleTables::from_json(BUILTIN_WEAPON_RULES, BUILTIN_INVULNERABLE)
            .expect("bundled rule tables are valid"),
    )
});

/// Comparison form of a phrase: typographic apostrophes folded, lower-cased,
/// whitespace collapsed, trailing punctuation dropped.
pub fn canonical(text: &str) -> String {
    let folded = text.replace(['\u{2018}', '\u{2019}'], "'").to_lowercase();
    let collapsed = WHITESPACE_RE.replace_all(folded.trim(), " ");
    collapsed
        .trim_end_matches(['.', ',', ';', ':', '!'])
        .trim_end()
        .to_string()
}

/// Both phrase tables, loaded once and shared between parses.
#[derive(Debug, Clone)]
pub struct RuleTables {
    pub weapon_rules: WeaponRuleTable,
    pub invulnerable: InvulnerableTable,
}

impl RuleTables {
    /// The tables bundled with the crate.
    pub fn builtin() -> Arc<RuleTables> {
        Arc::clone(&BUILTIN_TABLES)
    }

    pub fn from_json(weapon_rules: &str, invulnerable: &str) -> Result<Self> {
        let weapon_rules = serde_json::from_str(weapon_rules)
            .map_err(|err| RosterError::Tables(format!("weapon rules: {err}")))?;
        let phrases: InvulnerablePhrases = serde_json::from_str(invulnerable)
            .map_err(|err| RosterError::Tables(format!("invulnerable phrases: {err}")))?;
        Ok(Self {
            weapon_rules,
            invulnerable: InvulnerableTable::expand(&phrases),
        })
    }

    /// Bundled tables with either half replaced by a file on disk.
    pub fn load(
        weapon_rules_path: Option<&Path>,
        invulnerable_path: Option<&Path>,
    ) -> Result<Arc<Self>> {
        if weapon_rules_path.is_none() && invulnerable_path.is_none() {
            return Ok(Self::builtin());
        }
        let weapon_rules = read_table(weapon_rules_path, BUILTIN_WEAPON_RULES)?;
        let invulnerable = read_table(invulnerable_path, BUILTIN_INVULNERABLE)?;
        Ok(Arc::new(Self::from_json(&weapon_rules, &invulnerable)?))
    }
}

fn read_table(path: Option<&Path>, fallback: &str) -> Result<String> {
    match path {
        Some(path) => {
            debug!("loading rule table {}", path.display());
            Ok(fs::read_to_string(path)?)
        }
        None => Ok(fallback.to_string()),
    }
}

/// Tag weapon abilities and infer invulnerable saves for every unit of a
/// force. Running it again on its own output changes nothing.
pub fn annotate_force(force: &mut Force, tables: &RuleTables) {
    for unit in &mut force.units {
        let weapons = unit
            .models
            .iter_mut()
            .flat_map(model_weapons)
            .chain(unit.ranged_weapons.iter_mut())
            .chain(unit.melee_weapons.iter_mut());
        for weapon in weapons {
            tables.weapon_rules.apply(weapon, &mut force.rules);
        }
        tables.invulnerable.apply_to_unit(unit);
    }
}

fn model_weapons(model: &mut Model) -> impl Iterator<Item = &mut Weapon> {
    model
        .ranged_weapons
        .iter_mut()
        .chain(model.melee_weapons.iter_mut())
}
