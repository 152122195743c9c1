//! Primitive facades exposed by [`Tally`](crate::Tally).

mod counter;

pub use counter::Counter;
