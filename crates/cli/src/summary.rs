//! Plain-text roster overview for the `summary` command.

use std::fmt::Write;

use scribe_core::{Model, Roster, Unit};

/// Render a roster as an indented outline.
pub fn render(roster: &Roster) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) {}",
        roster.name,
        roster.game_system.identifier(),
        roster.cost
    );
    for force in &roster.forces {
        let _ = writeln!(out, "  {} - {} [{}]", force.name, force.catalog, force.faction);
        for line in &force.configurations {
            let _ = writeln!(out, "    * {line}");
        }
        for unit in &force.units {
            render_unit(&mut out, unit);
        }
        if !force.rules.is_empty() {
            let names: Vec<&str> = force.rules.keys().collect();
            let _ = writeln!(out, "    Rules: {}", names.join(", "));
        }
    }
    out
}

fn render_unit(out: &mut String, unit: &Unit) {
    let _ = writeln!(
        out,
        "    {}: {} {}",
        unit.role.label(),
        unit.name_with_extra_costs(),
        unit.cost
    );
    for (line, model) in unit.model_list.iter().zip(&unit.models) {
        let _ = writeln!(out, "      {line}");
        if let Some(stats) = unit.stat_line_for(&model.name) {
            let _ = writeln!(out, "        {}", stat_summary(stats));
        }
    }
}

fn stat_summary(stats: &Model) -> String {
    let fields = [
        ("M", &stats.movement),
        ("WS", &stats.weapon_skill),
        ("BS", &stats.ballistic_skill),
        ("S", &stats.strength),
        ("T", &stats.toughness),
        ("W", &stats.wounds),
        ("A", &stats.attacks),
        ("Ld", &stats.leadership),
        ("Sv", &stats.save),
        ("OC", &stats.objective_control),
    ];
    let mut parts: Vec<String> = fields
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("{label} {value}"))
        .collect();
    if let Some(save) = &stats.invulnerable {
        parts.push(format!("Inv {save}"));
    }
    format!("{}: {}", stats.name, parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::RosterParser;

    const ROSTER: &str = r#"<roster name="Patrol" gameSystemName="Warhammer 40,000 10th Edition">
  <costs><cost name="pts" value="90"/></costs>
  <forces>
    <force name="Army Roster" catalogueName="Imperium - Adepta Sororitas">
      <selections>
        <selection name="Battle Size" type="upgrade">
          <selections><selection name="Incursion" type="upgrade"/></selections>
        </selection>
        <selection name="Canoness" type="model" number="1">
          <categories><category name="Character"/></categories>
          <profiles>
            <profile name="Canoness" typeName="Unit">
              <characteristics>
                <characteristic name="M">6"</characteristic>
                <characteristic name="T">3</characteristic>
                <characteristic name="SV">3+</characteristic>
                <characteristic name="W">4</characteristic>
              </characteristics>
            </profile>
            <profile name="Invulnerable Save" typeName="Abilities">
              <characteristics>
                <characteristic name="Description">4+</characteristic>
              </characteristics>
            </profile>
          </profiles>
          <costs><cost name="pts" value="90"/></costs>
        </selection>
      </selections>
    </force>
  </forces>
</roster>"#;

    #[test]
    fn outlines_forces_units_and_stats() -> anyhow::Result<()> {
        let roster = RosterParser::default().parse_str(ROSTER)?;
        let text = render(&roster);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Patrol (Warhammer 40,000 10th Edition) [90 pts]");
        assert_eq!(lines[1], "  Army Roster - Imperium - Adepta Sororitas [Unknown]");
        assert_eq!(lines[2], "    * Battle Size: Incursion");
        assert_eq!(lines[3], "    Character: Canoness [90 pts]");
        assert_eq!(lines[4], "      Canoness");
        assert_eq!(lines[5], "        Canoness: M 6\" T 3 W 4 Sv 3+ Inv 4+");
        Ok(())
    }
}
