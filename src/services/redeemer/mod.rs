// SPDX-License-Identifier: MIT

pub mod allowance;
pub mod capability;
pub mod driver;
pub mod engine;
