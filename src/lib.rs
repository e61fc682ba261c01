//! Client for the BotArcApi, covering API versions 3, 4 and 5.
//!
//! * [`v3`], [`v4`] and [`v5`] expose the endpoints of each version
//! * [`batch`] builds and correlates the composed `v4/batch` operations
//! * [`gateway`] issues single requests and unwraps response envelopes
//! * [`protocol`] holds the wire types
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

pub mod batch;
pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod http;
pub mod protocol;
pub mod v3;
pub mod v4;
pub mod v5;
