pub mod bans;
pub mod charts;
pub mod derive;
pub mod status;
