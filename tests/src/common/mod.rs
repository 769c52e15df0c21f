// Shared by every test target; each target uses a different subset.
#![allow(dead_code, unused_imports)]

pub mod constants;
pub mod helpers;
pub mod node_mock;

pub use constants::*;
pub use helpers::*;
pub use node_mock::*;
