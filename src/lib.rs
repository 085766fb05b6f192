#![doc = include_str!("RUSTDOC.md")]

pub mod adwords;
pub mod platform;
