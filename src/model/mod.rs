pub mod city;
pub mod common;
pub mod dto;
pub mod mapping;

pub use city::*;
pub use common::*;
pub use dto::*;
