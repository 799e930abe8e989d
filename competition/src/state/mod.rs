//! Run state for a competition and the slot table that scopes it

pub mod run_state;
pub mod slots;

pub use run_state::RunState;
pub use slots::RunStateSlots;
