//! Binary-level specs: each scenario shells out to the real `sv`/`svd`
//! binaries against an isolated state directory, exercising the Unix
//! socket protocol end to end instead of calling `dispatch::handle`
//! in-process.

mod prelude;

mod checkpoint;
mod cli;
mod daemon;
mod events;
mod health;
mod ports;
mod session;
mod spawn;
