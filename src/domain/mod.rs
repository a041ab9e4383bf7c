// SPDX-License-Identifier: MIT

pub mod error;
