// attrfind/src/commands/mod.rs

pub mod compile;
pub mod inspect;
pub mod list;
pub mod run;
pub mod score;
