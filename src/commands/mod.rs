pub mod list;
pub mod merge;
pub mod open;
pub mod show;
pub mod transition;
