pub mod book;
pub mod catalog;
pub mod search;

pub use book::*;
pub use catalog::*;
pub use search::*;
