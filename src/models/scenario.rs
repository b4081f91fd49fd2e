use chrono::Local;

use super::ValueSpace;

/// A named what-if copy of one year's values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scenario {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) year: i32,
    pub(crate) created_at: String,
}

impl Scenario {
    pub(crate) fn space(&self) -> ValueSpace {
        ValueSpace::Scenario(self.id)
    }

    pub(crate) fn find_by_name<'a>(scenarios: &'a [Scenario], name: &str) -> Option<&'a Scenario> {
        let lower = name.trim().to_lowercase();
        scenarios.iter().find(|s| s.name.to_lowercase() == lower)
    }

    pub(crate) fn find_by_id(scenarios: &[Scenario], id: i64) -> Option<&Scenario> {
        scenarios.iter().find(|s| s.id == id)
    }

    pub(crate) fn timestamp_now() -> String {
        Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.year)
    }
}
