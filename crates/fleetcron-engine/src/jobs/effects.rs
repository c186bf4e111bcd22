//! Outbound calls the concrete jobs make into the fleet application.
//!
//! The engine only cares whether these resolve or fail; what "optimize" or
//! "finalize" means lives on the other side.

use async_trait::async_trait;

use crate::error::EffectError;

#[async_trait]
pub trait TripOptimizer: Send + Sync {
    /// Re-plan scheduled trips.
    async fn optimize_trips(&self) -> Result<(), EffectError>;
}

#[async_trait]
pub trait ReminderDispatcher: Send + Sync {
    /// Notify passengers of tomorrow's departures. Returns the number of
    /// reminders sent.
    async fn send_trip_reminders(&self) -> Result<usize, EffectError>;
}

#[async_trait]
pub trait TripFinalizer: Send + Sync {
    /// Lock in trips departing within `lead_hours`. Returns the number of
    /// trips finalized.
    async fn finalize_trips(&self, lead_hours: u32) -> Result<usize, EffectError>;
}
