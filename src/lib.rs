#![doc = include_str!("../README.md")]
// #![deny(unsafe_code)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod bytes;
#[cfg(feature = "write")]
pub mod graph;
pub mod metadata;
