// SPDX-License-Identifier: MIT

pub mod retry;
pub mod units;
