use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use serde::Serialize;
use testkit::*;

#[derive(Debug, PartialEq, Serialize)]
struct ReminderRequested {
    id: String,
    text: String,
    due_in_minutes: i64,
}

impl Message for ReminderRequested {}

#[derive(Debug, PartialEq, Serialize)]
struct ReminderDue {
    id: String,
    text: String,
}

impl Message for ReminderDue {}

#[derive(Debug, PartialEq, Serialize)]
struct SendReminder {
    id: String,
    text: String,
}

impl Message for SendReminder {}

#[derive(Debug, PartialEq, Serialize)]
struct ReminderSent {
    id: String,
}

impl Message for ReminderSent {}

/// Waits until each requested reminder is due, then asks for it to be sent.
struct Reminders;

impl Handler for Reminders {
    fn configure(&self, c: &mut HandlerConfigurer) {
        c.identity("reminders")
            .handles_event::<ReminderRequested>()
            .schedules_timeout::<ReminderDue>()
            .executes_command::<SendReminder>();
    }

    fn handle(&mut self, scope: &mut HandlerScope<'_>, message: &dyn AnyMessage) -> Result {
        if let Some(e) = message.downcast_ref::<ReminderRequested>() {
            let at = scope.now() + TimeDelta::minutes(e.due_in_minutes);
            scope.schedule_timeout(
                ReminderDue {
                    id: e.id.clone(),
                    text: e.text.clone(),
                },
                at,
            );
        } else if let Some(t) = message.downcast_ref::<ReminderDue>() {
            scope.log(format!("reminder {} is due", t.id));
            scope.execute_command(SendReminder {
                id: t.id.clone(),
                text: t.text.clone(),
            });
        }
        Ok(())
    }
}

/// Delivers reminders. Disabled by default like every integration.
struct Mailer;

impl Handler for Mailer {
    fn configure(&self, c: &mut HandlerConfigurer) {
        c.identity("mailer")
            .handles_command::<SendReminder>()
            .records_event::<ReminderSent>();
    }

    fn handle(&mut self, scope: &mut HandlerScope<'_>, message: &dyn AnyMessage) -> Result {
        if let Some(cmd) = message.downcast_ref::<SendReminder>() {
            scope.record_event(ReminderSent { id: cmd.id.clone() });
        }
        Ok(())
    }
}

struct ReminderApp;

impl Application for ReminderApp {
    fn configure(&self, c: &mut ApplicationConfigurer) {
        c.identity("reminder-app")
            .register_process(Reminders)
            .register_integration(Mailer);
    }
}

fn main() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let config = TestConfig::default()
        .with_start_time(start)
        .with_observer(observers::Tracer);

    let mut test = Test::begin_with(Arc::new(StdT::new()), ReminderApp, config);

    test.expect(
        record_event(ReminderRequested {
            id: "R1".into(),
            text: "stand-up".into(),
            due_in_minutes: 15,
        }),
        all_of([
            to_schedule_timeout(ReminderDue {
                id: "R1".into(),
                text: "stand-up".into(),
            }),
            not(to_execute_command_of_type::<SendReminder>()),
        ]),
    )
    .expect(
        advance_time(by_duration(TimeDelta::minutes(10))),
        none_of([to_execute_command_of_type::<SendReminder>()]),
    )
    .expect(
        advance_time(by_duration(TimeDelta::minutes(5))),
        to_execute_command(SendReminder {
            id: "R1".into(),
            text: "stand-up".into(),
        }),
    );

    // With the mailer enabled the reminder is actually sent.
    test.enable_handler_type(HandlerType::Integration)
        .prepare([record_event(ReminderRequested {
            id: "R2".into(),
            text: "lunch".into(),
            due_in_minutes: 120,
        })])
        .expect(
            advance_time(to_time(start + TimeDelta::hours(3))),
            all_of([
                to_execute_command_of_type::<SendReminder>(),
                to_record_event(ReminderSent { id: "R2".into() }),
            ]),
        );
}
