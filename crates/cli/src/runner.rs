//! The batch runner: splits file input into `// Test` blocks and runs
//! each against a fresh [`Engine`], or runs one engine over a raw stream
//! with no block splitting (spec Section 6's two CLI modes).

use std::io::Write;

use repcrec_concurrency::Engine;
use repcrec_core::{TraceEvent, TraceSink};

use crate::format::TextSink;
use crate::script::{parse_line, Command};

/// One named, contiguous run of script lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The block's name, taken from its `// Test ...` marker line, or
    /// `"Test"` if no marker preceded it.
    pub name: String,
    /// The block's lines, including the marker line itself (which parses
    /// as a no-op comment).
    pub lines: Vec<String>,
}

/// Split file contents into named blocks on lines beginning `// Test`.
pub fn split_into_blocks(contents: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current_name = "Test".to_string();
    let mut current_lines: Vec<String> = Vec::new();

    for line in contents.lines() {
        let stripped = line.trim();
        if stripped.starts_with("// Test") {
            if !current_lines.is_empty() {
                blocks.push(Block {
                    name: std::mem::take(&mut current_name),
                    lines: std::mem::take(&mut current_lines),
                });
            }
            current_name = stripped.trim_start_matches('/').trim().to_string();
        }
        current_lines.push(line.to_string());
    }
    if !current_lines.is_empty() {
        blocks.push(Block {
            name: current_name,
            lines: current_lines,
        });
    }
    blocks
}

fn dispatch(engine: &mut Engine, cmd: Command, sink: &mut dyn TraceSink) {
    let result = match cmd {
        Command::Begin(tid) => {
            engine.begin(tid, sink);
            Ok(())
        }
        Command::Read(tid, var) => engine.read(tid, var, sink),
        Command::Write(tid, var, value) => engine.write(tid, var, value, sink),
        Command::End(tid) => engine.end(tid, sink),
        Command::Fail(site) => {
            engine.fail(site, sink);
            Ok(())
        }
        Command::Recover(site) => {
            engine.recover(site, sink);
            Ok(())
        }
        Command::Dump => {
            engine.dump(sink);
            Ok(())
        }
    };
    if let Err(err) = result {
        sink.emit(TraceEvent::UsageError { message: err.to_string() });
    }
}

fn run_lines(lines: impl Iterator<Item = impl AsRef<str>>, sink: &mut dyn TraceSink) {
    let mut engine = Engine::new();
    for line in lines {
        match parse_line(line.as_ref()) {
            None => {}
            Some(Ok(cmd)) => dispatch(&mut engine, cmd, sink),
            Some(Err(err)) => sink.emit(TraceEvent::UsageError { message: err.to_string() }),
        }
    }
}

/// Run one block against a fresh engine, printing its header line and
/// trace to `out`.
pub fn run_block(block: &Block, out: &mut dyn Write) {
    let _ = writeln!(out);
    let _ = writeln!(out, "===== Running {} =====", block.name);
    let mut sink = TextSink::new(&mut *out);
    run_lines(block.lines.iter(), &mut sink);
}

/// File mode: split into blocks and run each in turn.
pub fn run_file(contents: &str, out: &mut dyn Write) {
    for block in split_into_blocks(contents) {
        run_block(&block, out);
    }
}

/// Stdin mode: one engine over the whole stream, no block splitting and
/// no header lines.
pub fn run_stream(contents: &str, out: &mut dyn Write) {
    let mut sink = TextSink::new(out);
    run_lines(contents.lines(), &mut sink);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_test_markers_and_keeps_the_marker_line() {
        let input = "begin(T1)\n// Test second\nend(T1)\n";
        let blocks = split_into_blocks(input);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "Test");
        assert_eq!(blocks[0].lines, vec!["begin(T1)".to_string()]);
        assert_eq!(blocks[1].name, "Test second");
        assert_eq!(blocks[1].lines, vec!["// Test second".to_string(), "end(T1)".to_string()]);
    }

    #[test]
    fn a_file_with_no_markers_is_a_single_default_named_block() {
        let input = "begin(T1)\nend(T1)\n";
        let blocks = split_into_blocks(input);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "Test");
    }

    #[test]
    fn run_file_resets_state_between_blocks() {
        let input = "begin(T1)\nW(T1,x2,999)\nend(T1)\n// Test two\ndump()\n";
        let mut buf = Vec::new();
        run_file(input, &mut buf);
        let text = String::from_utf8(buf).unwrap();
        // The second block's dump must show x2's genesis value (20), not
        // the first block's committed write (999) -- a fresh engine.
        assert!(text.contains("x2: 20"));
        assert!(!text.contains("x2: 999"));
    }

    #[test]
    fn run_stream_does_not_print_block_headers() {
        let mut buf = Vec::new();
        run_stream("begin(T1)\nend(T1)\n", &mut buf);
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("====="));
    }

    #[test]
    fn malformed_lines_are_reported_but_do_not_stop_the_run() {
        let mut buf = Vec::new();
        run_stream("W(T1, x2)\nbegin(T1)\nend(T1)\n", &mut buf);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("error:"));
        assert!(text.contains("T1 commits"));
    }
}
