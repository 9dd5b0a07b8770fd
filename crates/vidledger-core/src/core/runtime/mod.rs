pub(crate) mod process;

mod facade;

pub use facade::*;
