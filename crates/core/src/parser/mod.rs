//! Roster assembly: from a document tree to a normalized [`Roster`].

pub mod force;
pub mod normalize;
pub mod profile;
pub mod unit;

use std::{path::Path, sync::Arc};

use tracing::info;

use crate::{
    annotate::RuleTables,
    config::{ParseOptions, ScribeConfig},
    document::{decode_container, parse_xml, read_container, Element},
    error::{Result, RosterError},
    models::{roster::DEFAULT_ROSTER_NAME, GameSystem, Roster},
};

use force::{parse_force, ForceContext};
use profile::selection_cost;

/// Parses roster documents with one set of options and phrase tables.
///
/// Parsing is synchronous and deterministic; one parser can be reused for
/// any number of documents.
#[derive(Debug, Clone)]
pub struct RosterParser {
    options: ParseOptions,
    tables: Arc<RuleTables>,
}

impl Default for RosterParser {
    fn default() -> Self {
        Self::new(ParseOptions::default(), RuleTables::builtin())
    }
}

impl RosterParser {
    pub fn new(options: ParseOptions, tables: Arc<RuleTables>) -> Self {
        Self { options, tables }
    }

    /// Parser configured from settings, loading any replacement tables.
    pub fn from_config(config: &ScribeConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.parse_options(), config.rule_tables()?))
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a `.ros` or `.rosz` file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Roster> {
        let xml = read_container(path)?;
        self.parse_str(&xml)
    }

    /// Parse raw container bytes, zipped or not.
    pub fn parse_bytes(&self, bytes: Vec<u8>) -> Result<Roster> {
        let xml = decode_container(bytes)?;
        self.parse_str(&xml)
    }

    pub fn parse_str(&self, xml: &str) -> Result<Roster> {
        let document = parse_xml(xml)?;
        self.parse_document(&document)
    }

    /// Assemble a roster from a parsed document.
    ///
    /// The game system is checked before any force is looked at; an
    /// unsupported system yields no roster at all.
    pub fn parse_document(&self, document: &Element) -> Result<Roster> {
        let root = if document.name() == "roster" {
            document
        } else {
            document.find_first("roster").ok_or(RosterError::MissingRoster)?
        };

        let identifier = root.attr("gameSystemName").unwrap_or_default();
        let system = GameSystem::from_identifier(identifier)
            .ok_or_else(|| RosterError::UnsupportedGameType(identifier.to_string()))?;

        let mut roster = Roster::new(root.attr("name").unwrap_or(DEFAULT_ROSTER_NAME), system);
        roster.cost = selection_cost(root);

        let context = ForceContext {
            options: &self.options,
            tables: &self.tables,
            system,
        };
        for element in root.grouped("forces", "force") {
            let catalog = element.attr("catalogueName").unwrap_or_default();
            let repeated = roster.forces.iter().any(|force| force.catalog == catalog);
            let Some(force) = parse_force(element, !repeated, &context) else {
                continue;
            };
            match roster.force_by_catalog_mut(&force.catalog) {
                Some(first) => first.absorb(force),
                None => roster.forces.push(force),
            }
        }

        info!(
            "parsed roster {} ({}): {} forces, {} units, {}",
            roster.name,
            system.identifier(),
            roster.forces.len(),
            roster.units().count(),
            roster.cost
        );
        Ok(roster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UnitRole, Weapon};
    use anyhow::{anyhow, Result};
    use std::io::Write;

    pub(crate) const TENTH_ROSTER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<roster id="r1" name="Tactical Test" gameSystemName="Warhammer 40,000 10th Edition" xmlns="http://www.battlescribe.net/schema/rosterSchema">
  <costs>
    <cost name="pts" value="2.0"/>
    <cost name="CP" value="0"/>
  </costs>
  <forces>
    <force id="f1" name="Army Roster" catalogueName="Imperium - Space Marines">
      <rules>
        <rule name="Oath of Moment"><description>Re-roll hits.</description></rule>
      </rules>
      <selections>
        <selection name="Tactical Squad" type="unit">
          <categories>
            <category name="Battleline"/>
            <category name="Faction: Adeptus Astartes"/>
          </categories>
          <profiles>
            <profile name="Invulnerable Save" typeName="Abilities">
              <characteristics>
                <characteristic name="Description">This model has a 4+ invulnerable save against ranged attacks.</characteristic>
              </characteristics>
            </profile>
          </profiles>
          <selections>
            <selection name="Sergeant" type="model" number="1">
              <profiles>
                <profile name="Sergeant" typeName="Unit">
                  <characteristics>
                    <characteristic name="M">6"</characteristic>
                    <characteristic name="T">4</characteristic>
                    <characteristic name="SV">3+</characteristic>
                    <characteristic name="W">2</characteristic>
                    <characteristic name="A">3</characteristic>
                  </characteristics>
                </profile>
              </profiles>
              <selections>
                <selection name="Bolt rifle" type="upgrade" number="1">
                  <profiles>
                    <profile name="Bolt rifle" typeName="Ranged Weapons">
                      <characteristics>
                        <characteristic name="Range">24"</characteristic>
                        <characteristic name="Type">Rapid Fire 1</characteristic>
                        <characteristic name="S">4</characteristic>
                        <characteristic name="AP">-1</characteristic>
                        <characteristic name="D">1</characteristic>
                      </characteristics>
                    </profile>
                  </profiles>
                  <costs><cost name="pts" value="2"/></costs>
                </selection>
              </selections>
            </selection>
          </selections>
        </selection>
      </selections>
    </force>
  </forces>
</roster>"#;

    #[test]
    fn end_to_end_tactical_squad() -> Result<()> {
        let roster = RosterParser::default().parse_str(TENTH_ROSTER)?;

        assert_eq!(roster.name, "Tactical Test");
        assert_eq!(roster.game_system, GameSystem::TenthEdition);
        assert_eq!(roster.cost.points, 2.0);
        assert_eq!(roster.forces.len(), 1);

        let force = &roster.forces[0];
        assert!(force.rules.contains_key("Oath of Moment"));
        let unit = &force.units[0];
        assert_eq!(unit.name, "Tactical Squad");
        assert_eq!(unit.role, UnitRole::Battleline);
        assert_eq!(unit.models.len(), 1);
        let sergeant = &unit.models[0];
        assert_eq!((sergeant.name.as_str(), sergeant.count), ("Sergeant", 1));
        let rifle: &Weapon = &sergeant.ranged_weapons[0];
        assert_eq!(sergeant.ranged_weapons.len(), 1);
        assert_eq!(rifle.name, "Bolt rifle");
        assert_eq!(rifle.range, "24\"");
        assert_eq!(rifle.cost.points, 2.0);
        assert_eq!(unit.ranged_weapons.len(), 1);

        let save = unit.model_stats[0].invulnerable.as_ref().map(ToString::to_string);
        assert_eq!(save.as_deref(), Some("4+*"));
        assert!(unit
            .general_abilities()
            .is_some_and(|abilities| abilities.contains_key("Invulnerable Save")));
        Ok(())
    }

    #[test]
    fn unsupported_game_type_builds_nothing() {
        let xml = TENTH_ROSTER.replace("Warhammer 40,000 10th Edition", "Age of Sigmar 4.0");
        let error = RosterParser::default().parse_str(&xml);
        assert!(matches!(
            error,
            Err(RosterError::UnsupportedGameType(ref name)) if name == "Age of Sigmar 4.0"
        ));

        let unnamed = TENTH_ROSTER.replace(r#"gameSystemName="Warhammer 40,000 10th Edition""#, "");
        assert!(matches!(
            RosterParser::default().parse_str(&unnamed),
            Err(RosterError::UnsupportedGameType(_))
        ));
    }

    #[test]
    fn non_roster_documents_are_rejected() {
        assert!(matches!(
            RosterParser::default().parse_str("<catalogue name=\"x\"/>"),
            Err(RosterError::MissingRoster)
        ));
        assert!(matches!(
            RosterParser::default().parse_str("<roster><forces>"),
            Err(RosterError::Xml { .. })
        ));
    }

    #[test]
    fn missing_roster_name_uses_default() -> Result<()> {
        let xml = TENTH_ROSTER.replace(r#"name="Tactical Test" "#, "");
        let roster = RosterParser::default().parse_str(&xml)?;
        assert_eq!(roster.name, DEFAULT_ROSTER_NAME);
        Ok(())
    }

    #[test]
    fn repeated_catalogues_merge_into_first_force() -> Result<()> {
        let second_force = r#"
    <force id="f2" name="Allies" catalogueName="Imperium - Space Marines">
      <rules>
        <rule name="Oath of Moment"><description>Changed.</description></rule>
      </rules>
      <selections>
        <selection name="Captain" type="model">
          <categories><category name="Character"/></categories>
          <profiles>
            <profile name="Captain" typeName="Unit">
              <characteristics><characteristic name="W">5</characteristic></characteristics>
            </profile>
          </profiles>
          <rules><rule name="Leader"><description>Leads.</description></rule></rules>
        </selection>
      </selections>
    </force>
  </forces>"#;
        let xml = TENTH_ROSTER.replace("  </forces>", second_force);
        let roster = RosterParser::default().parse_str(&xml)?;

        assert_eq!(roster.forces.len(), 1);
        let force = &roster.forces[0];
        assert_eq!(force.rules.get("Oath of Moment"), Some("Re-roll hits."));
        assert!(force.rules.contains_key("Leader"));
        let names: Vec<_> = force.units.iter().map(|unit| unit.name.as_str()).collect();
        assert_eq!(names, vec!["Captain", "Tactical Squad"]);
        Ok(())
    }

    #[test]
    fn ninth_edition_generic_weapons_split_by_type() -> Result<()> {
        let xml = r#"<roster name="Waaagh" gameSystemName="Warhammer 40,000 9th Edition">
  <forces>
    <force name="Patrol Detachment" catalogueName="Xenos - Orks">
      <selections>
        <selection name="Warboss" type="model" number="1">
          <categories><category name="HQ"/></categories>
          <profiles>
            <profile name="Warboss" typeName="Unit">
              <characteristics>
                <characteristic name="M">5"</characteristic>
                <characteristic name="W">6</characteristic>
                <characteristic name="Ld">8</characteristic>
                <characteristic name="Save">4+</characteristic>
              </characteristics>
            </profile>
          </profiles>
          <selections>
            <selection name="Power klaw" type="upgrade" number="1">
              <profiles>
                <profile name="Power klaw" typeName="Weapon">
                  <characteristics>
                    <characteristic name="Range">Melee</characteristic>
                    <characteristic name="Type">Melee</characteristic>
                    <characteristic name="S">x2</characteristic>
                  </characteristics>
                </profile>
              </profiles>
            </selection>
            <selection name="Kustom shoota" type="upgrade" number="1">
              <profiles>
                <profile name="Kustom shoota" typeName="Weapon">
                  <characteristics>
                    <characteristic name="Type">Assault 4</characteristic>
                  </characteristics>
                </profile>
              </profiles>
            </selection>
          </selections>
        </selection>
      </selections>
    </force>
  </forces>
</roster>"#;
        let roster = RosterParser::default().parse_str(xml)?;
        let unit = roster.units().next().ok_or_else(|| anyhow!("no unit"))?;
        assert_eq!(roster.game_system, GameSystem::NinthEdition);
        assert_eq!(unit.role, UnitRole::Hq);
        assert_eq!(unit.melee_weapons.len(), 1);
        assert_eq!(unit.melee_weapons[0].name, "Power klaw");
        assert_eq!(unit.ranged_weapons[0].name, "Kustom shoota");
        assert_eq!(unit.model_stats[0].save, "4+");
        Ok(())
    }

    #[test]
    fn zipped_and_plain_containers_parse_alike() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let plain = dir.path().join("army.ros");
        std::fs::write(&plain, TENTH_ROSTER)?;

        let zipped = dir.path().join("army.rosz");
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&zipped)?);
        writer.start_file("army.ros", zip::write::SimpleFileOptions::default())?;
        writer.write_all(TENTH_ROSTER.as_bytes())?;
        writer.finish()?;

        let parser = RosterParser::default();
        assert_eq!(parser.parse_file(&plain)?, parser.parse_file(&zipped)?);
        Ok(())
    }
}
