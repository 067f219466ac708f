//! Activity signal sources.
//!
//! The detector only ever sees one integer sample per tick. The synthetic
//! uniform source stands in for a real sensor feed; anything implementing
//! [`SignalSource`] can replace it.

pub mod traffic;

pub use traffic::UniformActivity;

pub trait SignalSource: Send {
    fn name(&self) -> &str;
    /// Next activity sample, in `0..=99`.
    fn next_sample(&mut self) -> u8;
}
