pub mod controller;
pub mod entity;
pub mod filter;
pub mod form;
pub mod source;

#[cfg(test)]
pub mod testing;

pub use controller::{Modal, Phase, ScreenController};
pub use entity::{any_contains, Entity, EntityForm};
pub use filter::{passes_select_guard, ConditionSpec, FilterTemplate, ParamKind};
pub use source::{AccountSource, OrderPlacement, TableSource};
