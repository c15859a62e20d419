/// Pure game rules: catalog, unlock/score rules, proximity, timers, placement.
/// Nothing in here touches the terminal, audio, or the filesystem.

pub mod animal;
pub mod placement;
pub mod proximity;
pub mod rules;
pub mod timer;
