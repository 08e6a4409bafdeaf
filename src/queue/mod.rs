//! # Colas de trabajo
//! src/queue/mod.rs
//!
//! Cola FIFO acotada y thread-safe que conecta al dispatcher (productor)
//! con el pool de workers (consumidores).

pub mod bounded;

pub use bounded::BoundedQueue;
