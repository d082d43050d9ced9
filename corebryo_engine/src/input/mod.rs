//! Input module - platform events resolved into per-frame actions and axes.

mod input_state;

pub use input_state::*;

#[cfg(test)]
#[path = "input_state_tests.rs"]
mod tests;
