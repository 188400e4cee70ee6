//! JSON interchange envelope for parsed rosters.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Roster;

/// Version written into every envelope produced by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// A parsed roster plus the metadata needed to read it back later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterDocument {
    /// Envelope layout version.
    pub format_version: u32,
    /// When the roster was parsed.
    pub generated_at: DateTime<Utc>,
    /// The normalized roster.
    pub roster: Roster,
}

impl RosterDocument {
    /// Wrap a freshly parsed roster.
    pub fn new(roster: Roster) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generated_at: Utc::now(),
            roster,
        }
    }

    /// Serialize to JSON, pretty-printed on request.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.context("failed to serialize roster document")
    }

    /// Decode a document, rejecting envelopes newer than this crate writes.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Self =
            serde_json::from_str(json).context("failed to parse roster document")?;
        anyhow::ensure!(
            document.format_version <= FORMAT_VERSION,
            "unsupported roster document version {}",
            document.format_version
        );
        Ok(document)
    }

    /// Load a document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read roster document {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("failed to load roster document {}", path.display()))
    }

    /// Persist the document, creating parent directories if needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory {}", parent.display())
            })?;
        }

        let serialized = self.to_json(true)?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write roster document {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RosterParser;

    const ROSTER: &str = r#"<roster name="Round Trip" gameSystemName="Warhammer 40,000 10th Edition">
  <costs><cost name="pts" value="95"/><cost name="Cabal Points" value="2"/></costs>
  <forces>
    <force name="Army Roster" catalogueName="Chaos - Chaos Space Marines">
      <rules><rule name="Dark Pacts"><description>Pick one.</description></rule></rules>
      <selections>
        <selection name="Cultist Mob" type="unit">
          <categories><category name="Battleline"/><category name="Faction: Heretic Astartes"/></categories>
          <customNotes>Painted red</customNotes>
          <selections>
            <selection name="Cultist" type="model" number="10">
              <profiles>
                <profile name="Cultist" typeName="Unit">
                  <characteristics>
                    <characteristic name="M">6"</characteristic>
                    <characteristic name="W">1</characteristic>
                  </characteristics>
                </profile>
              </profiles>
              <selections>
                <selection name="Autogun" type="upgrade" number="10">
                  <profiles>
                    <profile name="Autogun" typeName="Ranged Weapons">
                      <characteristics>
                        <characteristic name="Range">24"</characteristic>
                        <characteristic name="Keywords">Rapid Fire 1</characteristic>
                        <characteristic name="Abilities">Ignores Cover.</characteristic>
                      </characteristics>
                    </profile>
                  </profiles>
                </selection>
              </selections>
              <costs><cost name="pts" value="50"/><cost name="Cabal Points" value="2"/></costs>
            </selection>
          </selections>
        </selection>
      </selections>
    </force>
  </forces>
</roster>"#;

    #[test]
    fn saved_documents_load_back_equal() -> anyhow::Result<()> {
        let roster = RosterParser::default().parse_str(ROSTER)?;
        let document = RosterDocument::new(roster);

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out").join("roster.json");
        document.save(&path)?;
        let loaded = RosterDocument::load(&path)?;

        assert_eq!(loaded, document);
        let unit = &loaded.roster.forces[0].units[0];
        assert_eq!(unit.notes.as_deref(), Some("Painted red"));
        assert_eq!(unit.name_with_extra_costs(), "Cultist Mob [2 Cabal Points]");
        Ok(())
    }

    #[test]
    fn compact_json_round_trips() -> anyhow::Result<()> {
        let document = RosterDocument::new(RosterParser::default().parse_str(ROSTER)?);
        let json = document.to_json(false)?;
        assert!(!json.contains('\n'));
        assert_eq!(RosterDocument::from_json(&json)?, document);
        Ok(())
    }

    #[test]
    fn newer_versions_are_rejected() -> anyhow::Result<()> {
        let mut document = RosterDocument::new(RosterParser::default().parse_str(ROSTER)?);
        document.format_version = FORMAT_VERSION + 1;
        let json = document.to_json(false)?;
        assert!(RosterDocument::from_json(&json).is_err());
        Ok(())
    }

    #[test]
    fn missing_files_report_their_path() {
        let error = RosterDocument::load("/nonexistent/roster.json")
            .err()
            .map(|error| error.to_string());
        assert!(error.is_some_and(|message| message.contains("/nonexistent/roster.json")));
    }
}
