use std::{
    collections::BTreeMap,
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
};

use serde::{Deserialize, Serialize};

/// Cost entry name used for points.
pub const POINTS: &str = "pts";
/// Cost entry name used for command points.
pub const COMMAND_POINTS: &str = "CP";

/// Named numeric costs attached to rosters, units and selections.
///
/// Points and command points are first-class; every other cost type a
/// catalogue defines is kept under its (trimmed) name in `other`, so no value
/// is ever dropped during aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub command_points: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, f64>,
}

impl Cost {
    /// A cost carrying only points.
    pub fn points(points: f64) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Build a cost from one `name`/`value` cost entry.
    pub fn from_entry(name: &str, value: f64) -> Self {
        let mut cost = Self::default();
        match name.trim() {
            POINTS => cost.points = value,
            COMMAND_POINTS => cost.command_points = value,
            other => cost.add_named(other, value),
        }
        cost
    }

    /// Add `value` to the named cost `name`, creating it when unseen.
    pub fn add_named(&mut self, name: &str, value: f64) {
        *self.other.entry(name.trim().to_string()).or_insert(0.0) += value;
    }

    /// Whether points or command points are non-zero.
    ///
    /// Only decides whether a cost suffix is rendered; aggregation never
    /// consults it.
    pub fn has_values(&self) -> bool {
        self.points != 0.0 || self.command_points != 0.0
    }

    /// Non-zero named costs rendered as `"<value> <name>"`.
    pub fn extra_costs(&self) -> Vec<String> {
        self.other
            .iter()
            .filter(|(_, value)| **value != 0.0)
            .map(|(name, value)| format!("{value} {name}"))
            .collect()
    }

    /// Divide the point cost, used when expressing per-model gear costs.
    pub(crate) fn divide_points(&mut self, divisor: u32) {
        if divisor > 0 {
            self.points /= f64::from(divisor);
        }
    }
}

impl AddAssign<&Cost> for Cost {
    fn add_assign(&mut self, other: &Cost) {
        self.points += other.points;
        self.command_points += other.command_points;
        for (name, value) in &other.other {
            *self.other.entry(name.clone()).or_insert(0.0) += value;
        }
    }
}

impl AddAssign for Cost {
    fn add_assign(&mut self, other: Cost) {
        *self += &other;
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(mut self, other: Cost) -> Cost {
        self += &other;
        self
    }
}

impl<'a> Add<&'a Cost> for &'a Cost {
    type Output = Cost;

    fn add(self, other: &'a Cost) -> Cost {
        let mut sum = self.clone();
        sum += other;
        sum
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Self {
        iter.fold(Cost::default(), |total, cost| total + cost)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut values = Vec::new();
        if self.points != 0.0 {
            values.push(format!("{} pts", self.points));
        }
        if self.command_points != 0.0 {
            values.push(format!("{} CP", self.command_points));
        }
        write!(f, "[{}]", values.join(" / "))
    }
}
