//! Hook for the per-company AI decision step.

use crate::company::Company;

/// States the built-in thinker cycles through.
pub const AI_THINK_STATES: u8 = 10;

/// Runs one AI step for one company. Called for at most one company per
/// tick, chosen round-robin by the tick counter.
pub trait AiThinker {
    fn think(&mut self, company: &mut Company);
}

/// Thinker that only walks the state cursor. Route planning and vehicle
/// purchasing live outside this workspace.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleThinker;

impl AiThinker for IdleThinker {
    fn think(&mut self, company: &mut Company) {
        company.think_state = (company.think_state + 1) % AI_THINK_STATES;
    }
}
