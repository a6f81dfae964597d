pub mod config;
pub mod game;
pub mod rect;
pub mod roster;
pub mod stat_record;
pub mod template;
