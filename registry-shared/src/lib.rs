#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]

//! Wire models and client configuration shared by the registry client
//! library and the command-line front end.

pub mod config;
pub mod models;
