mod hosts;
mod scripts;

pub use hosts::*;
pub use scripts::*;
