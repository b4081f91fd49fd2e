use std::fmt;

/// Whether a category holds money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary bucket a category rolls into. Derived from the category's
/// current kind and fixed flag every time it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Bucket {
    Income,
    FixedExpense,
    VariableExpense,
}

impl Bucket {
    pub(crate) fn all() -> &'static [Bucket] {
        &[Self::Income, Self::FixedExpense, Self::VariableExpense]
    }

    /// Parse the user-facing class names used by the CLI and command bar.
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" | "i" => Some(Self::Income),
            "fixed" | "f" => Some(Self::FixedExpense),
            "variable" | "var" | "v" => Some(Self::VariableExpense),
            _ => None,
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::FixedExpense => "Fixed expenses",
            Self::VariableExpense => "Variable expenses",
        }
    }

    pub(crate) fn kind(&self) -> CategoryKind {
        match self {
            Self::Income => CategoryKind::Income,
            Self::FixedExpense | Self::VariableExpense => CategoryKind::Expense,
        }
    }

    pub(crate) fn is_fixed(&self) -> bool {
        matches!(self, Self::FixedExpense)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Category {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) kind: CategoryKind,
    /// Only meaningful for expenses.
    pub(crate) is_fixed: bool,
    pub(crate) display_order: i32,
}

impl Category {
    pub(crate) fn bucket(&self) -> Bucket {
        match self.kind {
            CategoryKind::Income => Bucket::Income,
            CategoryKind::Expense if self.is_fixed => Bucket::FixedExpense,
            CategoryKind::Expense => Bucket::VariableExpense,
        }
    }

    /// Find a category by name (case-insensitive) in a slice.
    pub(crate) fn find_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
        let lower = name.trim().to_lowercase();
        categories.iter().find(|c| c.name.to_lowercase() == lower)
    }

    /// Find a category by ID in a slice.
    pub(crate) fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == id)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Writable attributes of a category, used for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategoryFields {
    pub(crate) name: String,
    pub(crate) kind: CategoryKind,
    pub(crate) is_fixed: bool,
    pub(crate) display_order: i32,
}

impl CategoryFields {
    pub(crate) fn new(name: impl Into<String>, bucket: Bucket) -> Self {
        Self {
            name: name.into(),
            kind: bucket.kind(),
            is_fixed: bucket.is_fixed(),
            display_order: 0,
        }
    }

    pub(crate) fn with_order(mut self, display_order: i32) -> Self {
        self.display_order = display_order;
        self
    }
}

impl From<&Category> for CategoryFields {
    fn from(cat: &Category) -> Self {
        Self {
            name: cat.name.clone(),
            kind: cat.kind,
            is_fixed: cat.is_fixed,
            display_order: cat.display_order,
        }
    }
}
