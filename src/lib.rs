#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod content;
pub mod dashboard;
pub mod dom;
pub mod hydrate;
pub mod page;
pub mod site;
pub mod storage;
pub mod timers;
