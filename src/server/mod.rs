//! TCP front door: binds the listen address and hands each accepted socket
//! to its own connection task.

pub mod listener;
