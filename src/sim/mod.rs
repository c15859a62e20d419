pub mod event;
pub mod host;
pub mod ledger;
pub mod round;
pub mod world;
