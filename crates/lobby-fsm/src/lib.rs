pub mod states;
pub mod transitions;

pub use states::State;
pub use transitions::{apply, whitelisted_target, Trigger, TransitionError};
