use crate::models::{Scenario, ValueFact, ValueSpace};

/// The physical fact table behind a value space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Collection {
    pub(crate) table: &'static str,
    pub(crate) scenario_id: Option<i64>,
}

pub(crate) const LIVE_TABLE: &str = "monthly_values";
pub(crate) const SCENARIO_TABLE: &str = "scenario_values";

/// Reads and writes for a space go to exactly one collection; a scenario
/// never falls through to live data.
pub(crate) fn collection(space: ValueSpace) -> Collection {
    match space {
        ValueSpace::Live => Collection {
            table: LIVE_TABLE,
            scenario_id: None,
        },
        ValueSpace::Scenario(id) => Collection {
            table: SCENARIO_TABLE,
            scenario_id: Some(id),
        },
    }
}

/// The year and value space a planning session is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PlanScope {
    pub(crate) year: i32,
    pub(crate) space: ValueSpace,
}

impl PlanScope {
    pub(crate) fn live(year: i32) -> Self {
        Self {
            year,
            space: ValueSpace::Live,
        }
    }

    pub(crate) fn contains(&self, fact: &ValueFact) -> bool {
        fact.year == self.year && fact.space == self.space
    }
}

impl std::fmt::Display for PlanScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.year, self.space)
    }
}

/// Resolve a user-supplied space name. `None`, empty, or "live" select live
/// data; anything else must name a scenario of the given year.
pub(crate) fn resolve_space(
    scenarios: &[Scenario],
    year: i32,
    name: Option<&str>,
) -> Result<ValueSpace, String> {
    let name = match name.map(str::trim) {
        None | Some("") => return Ok(ValueSpace::Live),
        Some(n) if n.eq_ignore_ascii_case("live") => return Ok(ValueSpace::Live),
        Some(n) => n,
    };
    scenarios
        .iter()
        .filter(|s| s.year == year)
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .map(Scenario::space)
        .ok_or_else(|| format!("No scenario '{name}' for {year}"))
}

/// Display label for a space, using the scenario name when known.
pub(crate) fn space_label(scenarios: &[Scenario], space: ValueSpace) -> String {
    match space {
        ValueSpace::Live => "Live".into(),
        ValueSpace::Scenario(id) => Scenario::find_by_id(scenarios, id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("Scenario #{id}")),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::Month;

    fn scenario(id: i64, name: &str, year: i32) -> Scenario {
        Scenario {
            id,
            name: name.into(),
            year,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_collection_per_space() {
        assert_eq!(collection(ValueSpace::Live).table, LIVE_TABLE);
        assert_eq!(collection(ValueSpace::Live).scenario_id, None);
        let c = collection(ValueSpace::Scenario(3));
        assert_eq!(c.table, SCENARIO_TABLE);
        assert_eq!(c.scenario_id, Some(3));
    }

    #[test]
    fn test_resolve_live_aliases() {
        let s = vec![scenario(1, "Raise", 2025)];
        assert_eq!(resolve_space(&s, 2025, None), Ok(ValueSpace::Live));
        assert_eq!(resolve_space(&s, 2025, Some("")), Ok(ValueSpace::Live));
        assert_eq!(resolve_space(&s, 2025, Some("LIVE")), Ok(ValueSpace::Live));
    }

    #[test]
    fn test_resolve_scenario_scoped_to_year() {
        let s = vec![scenario(1, "Raise", 2025), scenario(2, "Raise", 2026)];
        assert_eq!(
            resolve_space(&s, 2026, Some("raise")),
            Ok(ValueSpace::Scenario(2))
        );
        assert!(resolve_space(&s, 2027, Some("Raise")).is_err());
    }

    #[test]
    fn test_scope_contains() {
        let scope = PlanScope {
            year: 2025,
            space: ValueSpace::Scenario(1),
        };
        let m = Month::new(1).unwrap();
        assert!(scope.contains(&ValueFact::new(ValueSpace::Scenario(1), 1, 2025, m, dec!(1))));
        assert!(!scope.contains(&ValueFact::new(ValueSpace::Live, 1, 2025, m, dec!(1))));
        assert!(!scope.contains(&ValueFact::new(ValueSpace::Scenario(1), 1, 2024, m, dec!(1))));
    }

    #[test]
    fn test_space_label() {
        let s = vec![scenario(1, "Raise", 2025)];
        assert_eq!(space_label(&s, ValueSpace::Live), "Live");
        assert_eq!(space_label(&s, ValueSpace::Scenario(1)), "Raise");
        assert_eq!(space_label(&s, ValueSpace::Scenario(9)), "Scenario #9");
    }
}
