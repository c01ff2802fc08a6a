//! # Transport Layer
//!
//! The flow abstraction matchers read from.
//!
//! A [`Flow`] wraps any async byte source together with its local endpoint,
//! so matchers can ask for the transport kind without touching the socket,
//! and records consumed bytes so a rejected flow can be replayed to the next
//! matcher or handler.
//!
//! ## Sources
//! - **UDP**: one received datagram (`Flow::from_datagram`)
//! - **TCP**: an accepted stream (`Flow::from_tcp`)
//! - **Unix**: an accepted Unix-domain stream (`Flow::from_unix`, unix only)
//! - **Anything else**: `Flow::new` over any `AsyncRead`

pub mod flow;

pub use flow::{Flow, LocalAddr};
