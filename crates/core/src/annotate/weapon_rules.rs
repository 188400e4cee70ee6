use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::models::{OrderedMap, Weapon};

use super::canonical;

static SPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]{2,}").expect("failed to compile space run regex"));

/// One canonical weapon rule and the phrasings that mean it.
///
/// Phrases ending in `.` are full sentences and are found anywhere in the
/// ability text. Other phrases are keywords and must make up a whole
/// sentence, so `"Blast"` never fires on `"Blast weapons are fun."`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeaponRule {
    /// Type tag appended to matching weapons, e.g. `"Torrent"`.
    pub tag: String,
    pub phrases: Vec<String>,
    /// Rule text registered once in the force glossary under `tag`.
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeaponRuleFile {
    rules: Vec<WeaponRule>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: WeaponRule,
    keywords: HashSet<String>,
    sentences: Vec<Regex>,
}

impl CompiledRule {
    fn compile(rule: WeaponRule) -> Result<Self, regex::Error> {
        let mut keywords = HashSet::new();
        let mut sentences = Vec::new();
        for phrase in &rule.phrases {
            if phrase.trim_end().ends_with('.') {
                sentences.push(sentence_pattern(phrase)?);
            } else {
                keywords.insert(canonical(phrase));
            }
        }
        Ok(Self {
            rule,
            keywords,
            sentences,
        })
    }

    /// Remove every phrase of this rule. `None` when nothing matched, in
    /// which case the caller keeps the text untouched.
    fn strip(&self, text: &str) -> Option<String> {
        let mut matched = false;
        let mut rest = text.to_string();
        for pattern in &self.sentences {
            if pattern.is_match(&rest) {
                rest = pattern.replace_all(&rest, "").into_owned();
                matched = true;
            }
        }
        let kept: String = rest
            .split_inclusive(['.', '\n'])
            .filter(|sentence| {
                let hit = self.keywords.contains(&canonical(sentence));
                matched |= hit;
                !hit
            })
            .collect();
        matched.then(|| SPACE_RUN_RE.replace_all(kept.trim(), " ").into_owned())
    }
}

/// Case-insensitive pattern for a table sentence, tolerant of whitespace
/// runs, typographic apostrophes and the closing punctuation.
fn sentence_pattern(phrase: &str) -> Result<Regex, regex::Error> {
    let words: Vec<String> = phrase
        .trim()
        .trim_end_matches(['.', ',', ';', ':', '!'])
        .split_whitespace()
        .map(|word| regex::escape(word).replace('\'', "['\u{2018}\u{2019}]"))
        .collect();
    Regex::new(&format!(r"(?i){}[.,;:!]?", words.join(r"\s+")))
}

/// Ordered phrase table rewriting weapon ability prose into type tags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "WeaponRuleFile")]
pub struct WeaponRuleTable {
    rules: Vec<CompiledRule>,
}

impl TryFrom<WeaponRuleFile> for WeaponRuleTable {
    type Error = regex::Error;

    fn try_from(file: WeaponRuleFile) -> Result<Self, Self::Error> {
        let rules = file
            .rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<Result<_, _>>()?;
        Ok(Self { rules })
    }
}

impl WeaponRuleTable {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &WeaponRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    /// Strip recognised sentences from the weapon's abilities, tag the
    /// weapon, and register rule text in `glossary`.
    pub fn apply(&self, weapon: &mut Weapon, glossary: &mut OrderedMap) {
        for compiled in &self.rules {
            let Some(rest) = compiled.strip(&weapon.abilities) else {
                continue;
            };
            weapon.abilities = rest;
            weapon.add_type_tag(&compiled.rule.tag);
            if let Some(description) = &compiled.rule.description {
                glossary.insert(compiled.rule.tag.as_str(), description.as_str());
            }
        }
    }
}
