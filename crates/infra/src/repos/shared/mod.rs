pub mod persisted;
