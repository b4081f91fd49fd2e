mod category;
mod fact;
mod scenario;

pub(crate) use category::{Bucket, Category, CategoryFields, CategoryKind};
pub(crate) use fact::{FactKey, Month, ValueFact, ValueSpace};
pub(crate) use scenario::Scenario;
