use std::collections::HashMap;

use serde::Serialize;
use testkit::*;

// Commands
#[derive(Debug, PartialEq, Serialize)]
struct OpenAccount {
    id: String,
}

impl Message for OpenAccount {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::new("account ID must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Serialize)]
struct Deposit {
    id: String,
    amount: u64,
}

impl Message for Deposit {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.amount == 0 {
            return Err(ValidationError::new("amount must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Serialize)]
struct Withdraw {
    id: String,
    amount: u64,
}

impl Message for Withdraw {}

// Events
#[derive(Debug, PartialEq, Serialize)]
struct AccountOpened {
    id: String,
}

impl Message for AccountOpened {}

#[derive(Debug, PartialEq, Serialize)]
struct Deposited {
    id: String,
    amount: u64,
}

impl Message for Deposited {}

#[derive(Debug, PartialEq, Serialize)]
struct Withdrawn {
    id: String,
    amount: u64,
}

impl Message for Withdrawn {}

#[derive(Debug, PartialEq, Serialize)]
struct WithdrawalDeclined {
    id: String,
    amount: u64,
    reason: String,
}

impl Message for WithdrawalDeclined {}

/// Keeps a balance per account and enforces that balances never go negative.
#[derive(Default)]
struct Account {
    balances: HashMap<String, u64>,
}

impl Handler for Account {
    fn configure(&self, c: &mut HandlerConfigurer) {
        c.identity("account")
            .handles_command::<OpenAccount>()
            .handles_command::<Deposit>()
            .handles_command::<Withdraw>()
            .records_event::<AccountOpened>()
            .records_event::<Deposited>()
            .records_event::<Withdrawn>()
            .records_event::<WithdrawalDeclined>();
    }

    fn handle(&mut self, scope: &mut HandlerScope<'_>, message: &dyn AnyMessage) -> Result {
        if let Some(cmd) = message.downcast_ref::<OpenAccount>() {
            if !self.balances.contains_key(&cmd.id) {
                self.balances.insert(cmd.id.clone(), 0);
                scope.record_event(AccountOpened { id: cmd.id.clone() });
            }
        } else if let Some(cmd) = message.downcast_ref::<Deposit>() {
            if let Some(balance) = self.balances.get_mut(&cmd.id) {
                *balance += cmd.amount;
                scope.record_event(Deposited {
                    id: cmd.id.clone(),
                    amount: cmd.amount,
                });
            }
        } else if let Some(cmd) = message.downcast_ref::<Withdraw>() {
            let Some(balance) = self.balances.get_mut(&cmd.id) else {
                return Ok(());
            };
            if *balance < cmd.amount {
                scope.record_event(WithdrawalDeclined {
                    id: cmd.id.clone(),
                    amount: cmd.amount,
                    reason: "insufficient funds".into(),
                });
            } else {
                *balance -= cmd.amount;
                scope.record_event(Withdrawn {
                    id: cmd.id.clone(),
                    amount: cmd.amount,
                });
            }
        }
        Ok(())
    }
}

struct Bank;

impl Application for Bank {
    fn configure(&self, c: &mut ApplicationConfigurer) {
        c.identity("bank").register_aggregate(Account::default());
    }
}

fn main() {
    let opened = Scenario::new("an open account").execute_command(OpenAccount { id: "A1".into() });
    let funded = opened.execute_command(Deposit {
        id: "A1".into(),
        amount: 100,
    });

    Test::begin(Bank).given(&funded).expect(
        execute_command(Withdraw {
            id: "A1".into(),
            amount: 30,
        }),
        all_of([
            to_record_event(Withdrawn {
                id: "A1".into(),
                amount: 30,
            }),
            not(to_record_event_of_type::<WithdrawalDeclined>()),
        ]),
    );

    Test::begin(Bank).given(&funded).expect(
        execute_command(Withdraw {
            id: "A1".into(),
            amount: 500,
        }),
        to_record_event_matching("a withdrawal declined for lack of funds", |e: &WithdrawalDeclined| {
            if e.reason == "insufficient funds" {
                Ok(())
            } else {
                Err(MatchError::mismatch(format!("declined because of {}", e.reason)))
            }
        }),
    );

    // Commands executed from user code go through the test's executor.
    let mut test = Test::begin(Bank);
    test.given(&opened);
    let executor = test.command_executor();
    test.expect(
        call(move || {
            for amount in [10, 20, 30] {
                executor.execute_command(Deposit {
                    id: "A1".into(),
                    amount,
                })?;
            }
            Ok(())
        }),
        repeat("three deposits", 3, |i| {
            to_record_event(Deposited {
                id: "A1".into(),
                amount: (i as u64 + 1) * 10,
            })
        }),
    );

    Test::begin(Bank).given(&opened).expect(
        execute_command(OpenAccount { id: "A1".into() }),
        satisfy("record nothing when the account is already open", |t| {
            let recorded = t
                .facts()
                .iter()
                .filter(|f| matches!(f, Fact::EventRecordedByAggregate { .. }))
                .count();
            if recorded != 0 {
                t.error(format_args!("recorded {recorded} events"));
            }
        }),
    );
}
