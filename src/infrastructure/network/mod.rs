// SPDX-License-Identifier: MIT

pub mod gas;
pub mod nonce;
pub mod provider;
pub mod submitter;
