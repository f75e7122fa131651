//! Register definitions for the SX127x radio
//! Generated from the SX1276/77/78/79 datasheet, rev. 7

mod common;
mod fsk;
mod lora;

pub use common::*;
pub use fsk::*;
pub use lora::*;
