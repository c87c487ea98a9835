use std::sync::Arc;

use crate::{Message, Result, TimeAdjustment};

use super::{Action, CallOptions, advance_time, call, call_with, execute_command, record_event};

/// A named, ordered sequence of actions that establishes a starting state.
///
/// Scenarios are immutable. Each chaining method returns a new scenario, so a
/// common prefix can be shared between tests without the branches affecting
/// each other.
///
/// ```rust,ignore
/// let opened = Scenario::new("an open account").execute_command(OpenAccount { id: "A1".into() });
/// let funded = opened.execute_command(Deposit { id: "A1".into(), amount: 100 });
///
/// Test::begin(BankApp).given(&funded).expect(
///     execute_command(Withdraw { id: "A1".into(), amount: 50 }),
///     to_record_event(Withdrawn { id: "A1".into(), amount: 50 }),
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Scenario {
    caption: Arc<str>,
    actions: Arc<[Action]>,
}

impl Scenario {
    /// # Panics
    ///
    /// Panics if `caption` is empty.
    pub fn new(caption: &str) -> Self {
        if caption.is_empty() {
            panic!("Scenario::new(): caption must not be empty");
        }
        Self {
            caption: caption.into(),
            actions: Vec::new().into(),
        }
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// A new scenario with `action` appended.
    pub fn then(&self, action: Action) -> Self {
        let mut actions = self.actions.to_vec();
        actions.push(action);
        Self {
            caption: self.caption.clone(),
            actions: actions.into(),
        }
    }

    #[track_caller]
    pub fn execute_command<M: Message>(&self, command: M) -> Self {
        self.then(execute_command(command))
    }

    #[track_caller]
    pub fn record_event<M: Message>(&self, event: M) -> Self {
        self.then(record_event(event))
    }

    #[track_caller]
    pub fn advance_time(&self, adjustment: impl TimeAdjustment + 'static) -> Self {
        self.then(advance_time(adjustment))
    }

    #[track_caller]
    pub fn call(&self, func: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.then(call(func))
    }

    #[track_caller]
    pub fn call_with(&self, options: CallOptions, func: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.then(call_with(options, func))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{CmdA, EvtA};

    #[test]
    fn chaining_does_not_alias() {
        let base = Scenario::new("base").execute_command(CmdA { value: 1 });
        let left = base.record_event(EvtA { value: 2 });
        let right = base.execute_command(CmdA { value: 3 });

        assert_eq!(base.actions().len(), 1);
        assert_eq!(left.actions()[1].caption(), "recording a 'EvtA' event");
        assert_eq!(right.actions()[1].caption(), "executing a 'CmdA' command");
        assert_eq!(right.caption(), "base");
    }

    #[test]
    fn actions_remember_where_they_were_added() {
        let scenario = Scenario::new("located").execute_command(CmdA { value: 1 });
        assert!(scenario.actions()[0].location().file().ends_with("scenario.rs"));
    }
}
