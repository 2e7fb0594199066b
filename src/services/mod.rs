//! Clients for the non-exchange upstream services.
//!
//! Each client wraps one upstream HTTP API (or, for fitness, a directory of
//! exported files) and returns plain serde types. Routes compose these; no
//! client knows about the HTTP surface.

pub mod coding;
pub mod fitness;
pub mod rank;
pub mod sheets;
pub mod todos;

pub use coding::CodingClient;
pub use fitness::FitnessStore;
pub use rank::RankClient;
pub use sheets::SheetsClient;
pub use todos::TodosClient;
