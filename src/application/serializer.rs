//! Text exposition rendering for unit states.
//!
//! Output is one `# TYPE` header followed by one gauge line per unit, in
//! unit-name order:
//!
//! ```text
//! # TYPE service_state gauge
//! service_state{service="a.service"} 1
//! ```

use crate::domain::unit_state::{Snapshot, UnitState};
use std::fmt::Write;

pub const METRIC_NAME: &str = "service_state";

/// Render every unit in the snapshot
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = header();
    for unit in snapshot.values() {
        push_line(&mut out, unit);
    }
    out
}

/// Render a payload holding only `unit`
pub fn render_unit(unit: &UnitState) -> String {
    let mut out = header();
    push_line(&mut out, unit);
    out
}

fn header() -> String {
    format!("# TYPE {METRIC_NAME} gauge\n")
}

fn push_line(out: &mut String, unit: &UnitState) {
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "{METRIC_NAME}{{service=\"{}\"}} {}",
        escape_label_value(&unit.unit_name),
        unit.active_state.gauge_value()
    );
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}
