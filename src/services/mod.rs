// SPDX-License-Identifier: MIT

pub mod redeemer;
