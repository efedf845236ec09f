mod collection;
mod data_store;
mod list;

pub use data_store::{DataStore, ReferenceState, reference_key, sort_ids};
pub use list::ListState;
