#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod oauth;
pub mod quiz;
pub mod session;
pub mod user;
