//! Console rendering of engine events.
//!
//! Pure formatting: nothing here touches the lock or the record. The binary
//! subscribes to the engine's event streams and prints what these functions
//! return.

use crate::events::{AttitudeSnapshot, ReadEvent, ReadOutcome, SystemEvent};
use colored::Colorize;

const RULE: &str = "*****************************************************************";

/// Renders one reader cycle: counter, record or notice, elapsed run time.
pub fn render_read(event: &ReadEvent) -> String {
    let mut out = format!("\n{} {}", "Read Count:".bold(), event.count);
    match &event.outcome {
        ReadOutcome::Snapshot(snapshot) => {
            out.push('\n');
            out.push_str(&render_snapshot(snapshot));
        }
        ReadOutcome::NoData => {
            out.push_str(&format!(
                "\n{} at {:.2}s",
                "No new data available".yellow(),
                event.elapsed_s
            ));
        }
        ReadOutcome::Failed(e) => {
            out.push_str(&format!("\n{} {}", "Read skipped:".red(), e));
        }
    }
    out.push_str(&format!(
        "\n{} {:.2}s",
        "Current Time:".bold(),
        event.elapsed_s
    ));
    out
}

/// Renders the six fields with the sample timestamp and its age.
pub fn render_snapshot(snapshot: &AttitudeSnapshot) -> String {
    let a = &snapshot.record.attitude;
    let rows = [
        ("Latitude:", a.latitude),
        ("Longitude:", a.longitude),
        ("Altitude:", a.altitude),
        ("Roll:", a.roll),
        ("Pitch:", a.pitch),
        ("Yaw:", a.yaw),
    ];

    let mut out = format!("{}\n", RULE.dimmed());
    for (label, value) in rows {
        out.push_str(&format!("\t{:<12}{:.4}\n", label.cyan(), value));
    }
    out.push_str(&format!(
        "\t{:<12}{:.2}ms (age {:.2}ms)\n",
        "Timestamp:".cyan(),
        snapshot.sample_ms,
        snapshot.staleness_ms
    ));
    out.push_str(&RULE.dimmed().to_string());
    out
}

/// Renders a lifecycle event as a single line.
pub fn render_system(event: &SystemEvent) -> String {
    match event {
        SystemEvent::EngineStarted { .. } => {
            format!("{} writer and reader running", "[SYSTEM]".blue())
        }
        SystemEvent::TerminationSignalled {
            elapsed_s,
            interrupted,
        } => {
            let why = if *interrupted { "interrupted" } else { "run complete" };
            format!(
                "{} {} at {:.2}s, stopping tasks",
                "[SYSTEM]".blue(),
                why,
                elapsed_s
            )
        }
        SystemEvent::TaskExited {
            role,
            cycles,
            exit_latency,
        } => format!(
            "{} {} exited after {} cycles ({:.0}ms after signal)",
            "[SYSTEM]".blue(),
            role,
            cycles,
            exit_latency.as_secs_f64() * 1_000.0
        ),
        SystemEvent::EngineShutdown { total_s } => {
            format!("{} shut down after {:.2}s", "[SYSTEM]".blue(), total_s)
        }
    }
}

/// Renders the final line of a run.
pub fn render_total(total_s: f64) -> String {
    format!("{} {:.2}s", "Total Time:".bold(), total_s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TaskRole;
    use crate::error::AcquireError;
    use crate::record::{Attitude, AttitudeRecord};
    use std::time::{Duration, Instant};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn snapshot_lists_every_field() {
        plain();
        let record = AttitudeRecord {
            attitude: Attitude::from_index(2),
            sample_time: Instant::now(),
            sequence: 13,
            index: 2,
        };
        let event = ReadEvent {
            count: 3,
            outcome: ReadOutcome::Snapshot(AttitudeSnapshot {
                record,
                sample_ms: 12_000.5,
                staleness_ms: 250.25,
            }),
            elapsed_s: 12.25,
        };
        let text = render_read(&event);
        assert!(text.contains("Read Count: 3"));
        assert!(text.contains("Latitude:"));
        assert!(text.contains("0.0200"));
        assert!(text.contains("Longitude:"));
        assert!(text.contains("0.4000"));
        assert!(text.contains("Yaw:"));
        assert!(text.contains("12000.50ms"));
        assert!(text.contains("age 250.25ms"));
        assert!(text.contains("Current Time: 12.25s"));
    }

    #[test]
    fn timeout_is_a_notice_not_an_error() {
        plain();
        let event = ReadEvent {
            count: 0,
            outcome: ReadOutcome::NoData,
            elapsed_s: 4.5,
        };
        let text = render_read(&event);
        assert!(text.contains("No new data available at 4.50s"));
        assert!(!text.contains("Latitude"));
    }

    #[test]
    fn failure_names_the_error() {
        plain();
        let event = ReadEvent {
            count: 1,
            outcome: ReadOutcome::Failed(AcquireError::LockFailure {
                reason: "boom".into(),
            }),
            elapsed_s: 1.0,
        };
        assert!(render_read(&event).contains("lock failure: boom"));
    }

    #[test]
    fn system_and_total_lines() {
        plain();
        let exited = SystemEvent::TaskExited {
            role: TaskRole::Writer,
            cycles: 180,
            exit_latency: Duration::from_millis(420),
        };
        assert!(render_system(&exited)
            .contains("writer exited after 180 cycles (420ms after signal)"));
        assert_eq!(render_total(180.004), "Total Time: 180.00s");
    }

    #[test]
    fn snapshot_block_is_framed_by_rules() {
        plain();
        let snapshot = AttitudeSnapshot {
            record: AttitudeRecord::initial(Instant::now()),
            sample_ms: 0.0,
            staleness_ms: 0.0,
        };
        let text = render_snapshot(&snapshot);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], RULE);
        assert!(lines[7].contains("Timestamp:"));
        assert_eq!(lines[8], RULE);
    }
}
