//! Renders [`TraceEvent`]s as the line-oriented text format of spec
//! Section 6. Exact wording is not a wire contract — only the engine's
//! semantic events are — but this is the shape the CLI actually prints.

use std::io::{self, Write};

use repcrec_core::{TraceEvent, TraceSink};

/// A [`TraceSink`] that writes human-readable lines to any [`Write`].
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    /// Wrap a writer (e.g. `io::stdout()`) as a trace sink.
    pub fn new(out: W) -> Self {
        TextSink { out }
    }

    fn write_line(&mut self, line: &str) {
        if let Err(err) = writeln!(self.out, "{line}") {
            // A closed stdout pipe is the only realistic cause; there is
            // nowhere left to report the write failure to.
            let _ = io::stderr().write_all(format!("repcrec: trace write failed: {err}\n").as_bytes());
        }
    }
}

impl<W: Write> TraceSink for TextSink<W> {
    fn emit(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::Dump { sites } => {
                for (site, vars) in sites {
                    let values: Vec<String> = vars.iter().map(|(v, val)| format!("{v}: {val}")).collect();
                    self.write_line(&format!("site {site} - {}", values.join(", ")));
                }
            }
            other => {
                if let Some(line) = render(&other) {
                    self.write_line(&line);
                }
            }
        }
    }
}

fn render(event: &TraceEvent) -> Option<String> {
    match event {
        TraceEvent::Begin { tid, start_time } => Some(format!("begin({tid}) at time {start_time}")),
        TraceEvent::ReadOk { var, value, .. } => Some(format!("{var}: {value}")),
        TraceEvent::ReadBlocked { tid, var } => Some(format!("{tid} waits for {var}")),
        TraceEvent::ReadUnblocked { var, value, .. } => Some(format!("{var}: {value}")),
        TraceEvent::WriteBuffered { tid, var, value } => Some(format!("W({tid}, {var}, {value}) buffered")),
        TraceEvent::EndRequested { tid, at } => Some(format!("end({tid}) at time {at}")),
        TraceEvent::Committed { tid, .. } => Some(format!("{tid} commits")),
        TraceEvent::Aborted { tid, reason } => Some(format!("{tid} aborts: {reason}")),
        TraceEvent::SiteFailed { site, .. } => Some(format!("Site {site} fails")),
        TraceEvent::SiteRecovered { site, .. } => Some(format!("Site {site} recovers")),
        TraceEvent::UsageError { message } => Some(format!("error: {message}")),
        TraceEvent::Dump { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repcrec_core::{AbortReason, SiteId, Time, TxnId, VarId};

    fn rendered(event: TraceEvent) -> String {
        let mut buf = Vec::new();
        TextSink::new(&mut buf).emit(event);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn renders_begin_and_commit_lines() {
        assert_eq!(
            rendered(TraceEvent::Begin {
                tid: TxnId::new(1),
                start_time: Time::new(3)
            }),
            "begin(T1) at time 3\n"
        );
        assert_eq!(
            rendered(TraceEvent::Committed {
                tid: TxnId::new(1),
                commit_time: Time::new(4)
            }),
            "T1 commits\n"
        );
    }

    #[test]
    fn renders_abort_with_reason() {
        assert_eq!(
            rendered(TraceEvent::Aborted {
                tid: TxnId::new(2),
                reason: AbortReason::SsiCycle
            }),
            "T2 aborts: SSI cycle detected\n"
        );
    }

    #[test]
    fn renders_dump_as_one_line_per_site() {
        let x1 = VarId::new(1).unwrap();
        let x2 = VarId::new(2).unwrap();
        let event = TraceEvent::Dump {
            sites: vec![
                (SiteId::new(1).unwrap(), vec![(x1, 10), (x2, 20)]),
                (SiteId::new(2).unwrap(), vec![(x2, 20)]),
            ],
        };
        assert_eq!(rendered(event), "site 1 - x1: 10, x2: 20\nsite 2 - x2: 20\n");
    }
}
