//! Walks one `force` element: configuration lines, detachment choices and
//! units.

use tracing::{debug, warn};

use crate::{
    annotate::{annotate_force, RuleTables},
    config::ParseOptions,
    document::Element,
    models::{
        roster::{sort_units, UNKNOWN_FACTION},
        Force, GameSystem, OrderedMap,
    },
};

use super::{
    profile::{ability_entries, extract_rule, selection_cost, Profile, ProfileKind},
    unit::parse_unit,
};

const CONFIGURATION_CATEGORY: &str = "Configuration";

/// Everything a force walk needs besides the element itself.
pub struct ForceContext<'a> {
    pub options: &'a ParseOptions,
    pub tables: &'a RuleTables,
    pub system: GameSystem,
}

/// Build the force described by `root`. Forces missing a name or catalogue
/// yield `None`.
///
/// `include_force_rules` is false for repeated catalogues, whose
/// force-level rules are already known.
pub fn parse_force(
    root: &Element,
    include_force_rules: bool,
    context: &ForceContext<'_>,
) -> Option<Force> {
    let (Some(name), Some(catalog)) = (root.attr("name"), root.attr("catalogueName")) else {
        warn!("Skipping force without name or catalogue");
        return None;
    };
    let mut force = Force::new(name, catalog);

    if include_force_rules {
        for rule in root.grouped("rules", "rule") {
            extract_rule(rule, &mut force.rules);
        }
    }

    for selection in root.grouped("selections", "selection") {
        route_selection(selection, &mut force, context);
    }

    let faction_rules = force.faction_rules.clone();
    force.rules.retain(|name, _| !faction_rules.contains_key(name));
    sort_units(&mut force.units);
    annotate_force(&mut force, context.tables);

    debug!(
        "parsed force {} ({}): {} units, faction {}",
        force.name,
        force.catalog,
        force.units.len(),
        force.faction
    );
    Some(force)
}

fn route_selection(selection: &Element, force: &mut Force, context: &ForceContext<'_>) {
    let Some(name) = selection.attr("name") else {
        return;
    };
    let options = context.options;

    if options.is_ignored(name) {
        debug!("ignoring selection {name}");
    } else if options.is_configuration(name) {
        force.configurations.push(configuration_line(selection, name));
    } else if is_unit_selection(selection) {
        if let Some(unit) = parse_unit(selection, context.system) {
            force.rules.extend_from(&unit.rules);
            force.units.push(unit);
        }
    } else if selection.is_type("upgrade") {
        debug!("treating {name} as a detachment choice");
        extract_rules(selection, &mut force.rules, options);
        force.configurations.push(configuration_line(selection, name));
        for located in selection.find_grouped("selections", "selection") {
            let choice = located.element;
            let Some(choice_name) = choice.attr("name") else {
                continue;
            };
            if !choice.is_type("upgrade") {
                continue;
            }
            if force.faction == UNKNOWN_FACTION {
                force.faction = choice_name.to_string();
            }
            extract_rules(choice, &mut force.faction_rules, options);
        }
    } else {
        warn!("Skipping unexpected selection {name}");
    }
}

fn is_unit_selection(selection: &Element) -> bool {
    selection.any_grouped("profiles", "profile", |profile| {
        profile
            .attr("typeName")
            .is_some_and(|type_name| ProfileKind::classify(type_name) == ProfileKind::StatLine)
    })
}

/// Rule text from a detachment choice: configured profile types plus rule
/// descriptions anywhere below it.
fn extract_rules(root: &Element, glossary: &mut OrderedMap, options: &ParseOptions) {
    for located in root.find_grouped("profiles", "profile") {
        let profile = Profile::from(located);
        let (Some(name), Some(type_name)) = (profile.name(), profile.type_name()) else {
            continue;
        };
        if options.is_rule_profile(type_name) {
            glossary.extend_from(&ability_entries(profile, name));
        }
    }
    for located in root.find_grouped("rules", "rule") {
        extract_rule(located.element, glossary);
    }
}

/// `"[<category> - ]<name>[: <choices>][ <cost>]"`.
fn configuration_line(selection: &Element, name: &str) -> String {
    let category = selection
        .find_first("category")
        .and_then(|category| category.attr("name"));
    let mut cost = selection_cost(selection);
    let mut details = Vec::new();
    for located in selection.find_grouped("selections", "selection") {
        cost += selection_cost(located.element);
        if let Some(detail) = located.element.attr("name") {
            details.push(detail);
        }
    }

    let mut line = match category {
        Some(category) if category != CONFIGURATION_CATEGORY => format!("{category} - {name}"),
        _ => name.to_string(),
    };
    if !details.is_empty() {
        line = format!("{line}: {}", details.join(", "));
    }
    if cost.has_values() {
        line = format!("{line} {cost}");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_xml;
    use anyhow::{anyhow, Result};

    fn context<'a>(options: &'a ParseOptions, tables: &'a RuleTables) -> ForceContext<'a> {
        ForceContext {
            options,
            tables,
            system: GameSystem::TenthEdition,
        }
    }

    const FORCE: &str = r#"
        <force name="Army Roster" catalogueName="Imperium - Space Marines">
          <rules>
            <rule name="Oath of Moment"><description>Re-roll hits.</description></rule>
            <rule name="Angels of Death"><description>Several rules.</description></rule>
          </rules>
          <selections>
            <selection name="Battle Size" type="upgrade">
              <categories><category name="Configuration"/></categories>
              <selections>
                <selection name="Strike Force (2000 Point limit)" type="upgrade"/>
              </selections>
            </selection>
            <selection name="Detachment Command Cost" type="upgrade">
              <costs><cost name="CP" value="-3"/></costs>
            </selection>
            <selection name="Detachment" type="upgrade">
              <categories><category name="Configuration"/></categories>
              <selections>
                <selection name="Gladius Task Force" type="upgrade">
                  <rules>
                    <rule name="Combat Doctrines"><description>Pick one.</description></rule>
                  </rules>
                </selection>
                <selection name="Ironstorm Spearhead" type="upgrade"/>
              </selections>
            </selection>
            <selection name="Show/Hide Options" type="upgrade-folder"/>
            <selection name="Rhino" type="model">
              <categories><category name="Dedicated Transport"/></categories>
              <profiles>
                <profile name="Rhino" typeName="Unit">
                  <characteristics><characteristic name="W">10</characteristic></characteristics>
                </profile>
                <profile name="Storm bolter" typeName="Ranged Weapons">
                  <characteristics>
                    <characteristic name="Range">24&quot;</characteristic>
                    <characteristic name="Abilities">Blast.</characteristic>
                  </characteristics>
                </profile>
              </profiles>
              <rules>
                <rule name="Firing Deck"><description>Shoot out.</description></rule>
              </rules>
              <costs><cost name="pts" value="75"/></costs>
            </selection>
            <selection name="Captain" type="model">
              <categories><category name="Character"/></categories>
              <profiles>
                <profile name="Captain" typeName="Unit">
                  <characteristics><characteristic name="W">5</characteristic></characteristics>
                </profile>
              </profiles>
              <rules>
                <rule name="Combat Doctrines"><description>Pick one.</description></rule>
              </rules>
            </selection>
          </selections>
        </force>"#;

    #[test]
    fn routes_configuration_detachment_and_units() -> Result<()> {
        let root = parse_xml(FORCE)?;
        let options = ParseOptions::default();
        let tables = RuleTables::builtin();
        let force =
            parse_force(&root, true, &context(&options, &tables)).ok_or_else(|| anyhow!("no force"))?;

        assert_eq!(force.catalog, "Imperium - Space Marines");
        assert_eq!(force.faction, "Gladius Task Force");
        assert_eq!(
            force.configurations,
            vec![
                "Battle Size: Strike Force (2000 Point limit)".to_string(),
                "Detachment: Gladius Task Force, Ironstorm Spearhead".to_string(),
            ]
        );
        assert!(force.faction_rules.contains_key("Combat Doctrines"));
        assert!(!force.rules.contains_key("Combat Doctrines"));
        assert!(force.rules.contains_key("Oath of Moment"));
        assert!(force.rules.contains_key("Firing Deck"));
        assert!(force.rules.contains_key("Blast"));

        let names: Vec<_> = force.units.iter().map(|unit| unit.name.as_str()).collect();
        assert_eq!(names, vec!["Captain", "Rhino"]);
        let bolter = &force.units[1].ranged_weapons[0];
        assert_eq!(bolter.weapon_type, "Blast");
        assert!(bolter.abilities.is_empty());
        Ok(())
    }

    #[test]
    fn repeated_catalogues_skip_force_rules() -> Result<()> {
        let root = parse_xml(FORCE)?;
        let options = ParseOptions::default();
        let tables = RuleTables::builtin();
        let force =
            parse_force(&root, false, &context(&options, &tables)).ok_or_else(|| anyhow!("no force"))?;
        assert!(!force.rules.contains_key("Oath of Moment"));
        assert!(force.rules.contains_key("Firing Deck"));
        Ok(())
    }

    #[test]
    fn configuration_lines_carry_category_and_cost() -> Result<()> {
        let root = parse_xml(
            r#"<selection name="Warlord" type="upgrade">
                 <categories><category name="Command"/></categories>
                 <selections>
                   <selection name="Relic">
                     <costs><cost name="CP" value="1"/></costs>
                   </selection>
                 </selections>
                 <costs><cost name="pts" value="10"/></costs>
               </selection>"#,
        )?;
        assert_eq!(
            configuration_line(&root, "Warlord"),
            "Command - Warlord: Relic [10 pts / 1 CP]"
        );
        Ok(())
    }

    #[test]
    fn forces_need_name_and_catalogue() -> Result<()> {
        let root = parse_xml(r#"<force name="Army Roster"/>"#)?;
        let options = ParseOptions::default();
        let tables = RuleTables::builtin();
        assert!(parse_force(&root, true, &context(&options, &tables)).is_none());
        Ok(())
    }
}
