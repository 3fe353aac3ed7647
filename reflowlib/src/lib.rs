#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
mod client;
#[cfg(feature = "alloc")]
pub use client::*;

pub mod protocol;

mod status;
pub use status::*;

#[cfg(feature = "alloc")]
mod window;
#[cfg(feature = "alloc")]
pub use window::*;
