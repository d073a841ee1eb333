pub mod bundles;
pub mod contexts;
pub mod core;
pub mod personalities;
pub mod resolve;
pub mod roster;
