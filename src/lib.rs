// SPDX-License-Identifier: MIT
#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use infrastructure::network;
pub use services::redeemer;
