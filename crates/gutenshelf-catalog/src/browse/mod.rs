//! Search/list view state and its async driver.

pub mod controller;
pub mod state;

pub use controller::BrowseController;
pub use state::{BrowseState, FetchTicket, Phase};
