#[macro_use]
extern crate serde_derive;

#[macro_use]
pub mod errors;
pub mod builder;
pub mod config;
pub mod console;
pub mod depend;
pub mod package;
pub mod part;
