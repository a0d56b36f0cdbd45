#![allow(non_snake_case)]

// Crate where serde_yaml code for the 'tasks' crate is monomorphized,
// because this is a huge compile time sink.
//
// NOTE: Please make sure to use the YamlRead trait!
//       DO NOT USE serde_yaml::from_{reader,value,etc.} OUTSIDE THIS CRATE
//       or else you defeat the entire reason for its existence.

#[macro_use] extern crate asgrid_config_utils;
#[macro_use] extern crate log;

pub use asgrid_config_utils::YamlRead;

mod config;
mod validation;

pub use crate::config::*;
