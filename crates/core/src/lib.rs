#![warn(clippy::all, missing_docs)]

//! Roster parsing and normalization for BattleScribe army lists.
//!
//! This crate reads `.ros`/`.rosz` roster documents, walks their selection
//! trees into a normalized [`Roster`] model, annotates weapon rules and
//! invulnerable saves from free-text prose, and persists the result as a
//! JSON interchange document. Frontends such as the `scribe` binary only
//! glue these pieces together.

#[allow(missing_docs)]
pub mod annotate;
pub mod config;
pub mod document;
pub mod error;
pub mod interchange;
#[allow(missing_docs)]
pub mod models;
#[allow(missing_docs)]
pub mod parser;

pub use annotate::RuleTables;
pub use config::{ParseOptions, ScribeConfig};
pub use document::{discover_rosters, expand_inputs, Element};
pub use error::{Result, RosterError};
pub use interchange::RosterDocument;
pub use models::{Cost, Force, GameSystem, Model, Roster, Unit, UnitRole, Weapon};
pub use parser::RosterParser;
