// handlers/mod.rs - two security tiers
//
// Public (no session) → Protected (session + role, /api/*)

pub mod protected;
pub mod public;
