// SPDX-License-Identifier: MIT

pub mod contracts;
pub mod network;
