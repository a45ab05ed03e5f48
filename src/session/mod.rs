/// Synchronous refresh drivers.
pub mod driver;
/// The stimulus engine and its frame procedure.
pub mod engine;
/// Display refresh scheduling.
pub mod refresh;
