use std::collections::HashMap;

use serde::Deserialize;

use crate::models::{unit::ABILITIES_BUCKET, InvulnerableSave, OrderedMap, Unit};

use super::canonical;

const THRESHOLD_PLACEHOLDER: &str = "{n}";

/// Phrase templates as stored on disk, with `{n}` standing for a threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct InvulnerablePhrases {
    pub thresholds: Vec<String>,
    #[serde(default)]
    pub plain: Vec<String>,
    /// Phrasings restricted to ranged attacks or forbidding re-rolls.
    #[serde(default)]
    pub special: Vec<String>,
}

/// Expanded lookup from canonical ability text to the save it grants.
#[derive(Debug, Clone, Default)]
pub struct InvulnerableTable {
    phrases: HashMap<String, InvulnerableSave>,
    thresholds: Vec<String>,
}

fn lookup_form(text: &str) -> String {
    canonical(text).replace('.', "")
}

impl InvulnerableTable {
    pub fn expand(source: &InvulnerablePhrases) -> Self {
        let mut phrases = HashMap::new();
        for threshold in &source.thresholds {
            let groups = [(&source.plain, false), (&source.special, true)];
            for (templates, special) in groups {
                for template in templates {
                    let phrase = template.replace(THRESHOLD_PLACEHOLDER, threshold);
                    phrases.insert(
                        lookup_form(&phrase),
                        InvulnerableSave {
                            threshold: threshold.clone(),
                            special,
                        },
                    );
                }
            }
        }
        Self {
            phrases,
            thresholds: source.thresholds.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Save described by one ability entry.
    ///
    /// A bare threshold such as `"4+"` counts only when the ability name
    /// mentions an invulnerable save.
    pub fn lookup(&self, name: &str, description: &str) -> Option<InvulnerableSave> {
        let text = lookup_form(description);
        if self.thresholds.iter().any(|threshold| *threshold == text) {
            return name
                .to_lowercase()
                .contains("invulnerable save")
                .then(|| InvulnerableSave {
                    threshold: text,
                    special: false,
                });
        }
        self.phrases.get(&text).cloned()
    }

    /// First save granted to the model or unit called `subject`.
    ///
    /// Ability names qualified as `"<ability>: <scope>"` only apply when the
    /// scope appears in `subject`, compared case-insensitively.
    pub fn infer(&self, abilities: &OrderedMap, subject: &str) -> Option<InvulnerableSave> {
        let subject = subject.trim().to_lowercase();
        abilities
            .iter()
            .filter(|(name, _)| in_scope(name, &subject))
            .find_map(|(name, description)| self.lookup(name, description))
    }

    /// Record inferred saves on the unit's stat-lines, then drop the plain
    /// phrasings from the general abilities. Restricted phrasings stay as
    /// prose since the marker alone does not explain the restriction.
    pub fn apply_to_unit(&self, unit: &mut Unit) {
        let Some(abilities) = unit.general_abilities() else {
            return;
        };
        let inferred: Vec<Option<InvulnerableSave>> = unit
            .model_stats
            .iter()
            .map(|stats| self.infer(abilities, &stats.name))
            .collect();
        for (stats, save) in unit.model_stats.iter_mut().zip(inferred) {
            if save.is_some() {
                stats.invulnerable = save;
            }
        }

        let abilities = unit.ability_bucket(ABILITIES_BUCKET);
        abilities.retain(|name, description| {
            !matches!(self.lookup(name, description), Some(save) if !save.special)
        });
    }
}

fn in_scope(ability_name: &str, subject: &str) -> bool {
    match ability_name.split_once(':') {
        Some((_, scope)) => subject.contains(&scope.trim().to_lowercase()),
        None => true,
    }
}
