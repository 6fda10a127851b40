//! Tokenizes one line of input into a [`Command`] (spec Section 6's input
//! grammar). Comment stripping and the decision of whether a line
//! advances the clock both happen here; block splitting on `// Test`
//! lines is the runner's job, since it needs to see the unstripped line.

use repcrec_core::{Error, Result, SiteId, TxnId, VarId};

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `begin(T<k>)`
    Begin(TxnId),
    /// `R(T<k>, x<j>)`
    Read(TxnId, VarId),
    /// `W(T<k>, x<j>, <int>)`
    Write(TxnId, VarId, i64),
    /// `end(T<k>)`
    End(TxnId),
    /// `fail(<site>)`
    Fail(SiteId),
    /// `recover(<site>)`
    Recover(SiteId),
    /// `dump()`
    Dump,
}

/// Strip a trailing `//` comment from a line.
pub fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse one already comment-stripped, non-blank line into a [`Command`].
///
/// Returns `None` if the line, once stripped and trimmed, does not begin
/// with one of the seven command tokens — such lines are ignored without
/// advancing the clock. Returns `Some(Err(..))` if the line clearly
/// intends to be a command but is malformed.
pub fn parse_line(raw: &str) -> Option<Result<Command>> {
    let line = strip_comment(raw).trim();
    if line.is_empty() {
        return None;
    }
    let (keyword, rest) = split_keyword(line);
    match keyword {
        "begin" => Some(parse_begin(rest)),
        "R" => Some(parse_read(rest)),
        "W" => Some(parse_write(rest)),
        "end" => Some(parse_end(rest)),
        "fail" => Some(parse_fail(rest)),
        "recover" => Some(parse_recover(rest)),
        "dump" => Some(parse_dump(rest)),
        _ => None,
    }
}

fn split_keyword(line: &str) -> (&str, &str) {
    match line.find('(') {
        Some(idx) => (line[..idx].trim(), &line[idx..]),
        None => (line, ""),
    }
}

fn malformed(line: &str) -> Error {
    Error::MalformedCommand(line.to_string())
}

fn parse_args(rest: &str) -> Result<Vec<String>> {
    let rest = rest.trim();
    let inner = rest
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| malformed(rest))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(inner.split(',').map(|p| p.trim().to_string()).collect())
}

fn parse_txn(s: &str) -> Result<TxnId> {
    let digits = s.strip_prefix('T').ok_or_else(|| malformed(s))?;
    let k: u64 = digits.parse().map_err(|_| malformed(s))?;
    Ok(TxnId::new(k))
}

fn parse_var(s: &str) -> Result<VarId> {
    let digits = s.strip_prefix('x').ok_or_else(|| malformed(s))?;
    let j: u8 = digits.parse().map_err(|_| malformed(s))?;
    VarId::new(j)
}

fn parse_site(s: &str) -> Result<SiteId> {
    let n: u8 = s.parse().map_err(|_| malformed(s))?;
    SiteId::new(n)
}

fn parse_int(s: &str) -> Result<i64> {
    s.parse().map_err(|_| malformed(s))
}

fn parse_begin(rest: &str) -> Result<Command> {
    let args = parse_args(rest)?;
    let tid = args.first().ok_or_else(|| malformed(rest))?;
    Ok(Command::Begin(parse_txn(tid)?))
}

fn parse_read(rest: &str) -> Result<Command> {
    let args = parse_args(rest)?;
    if args.len() != 2 {
        return Err(malformed(rest));
    }
    Ok(Command::Read(parse_txn(&args[0])?, parse_var(&args[1])?))
}

fn parse_write(rest: &str) -> Result<Command> {
    let args = parse_args(rest)?;
    if args.len() != 3 {
        return Err(malformed(rest));
    }
    Ok(Command::Write(parse_txn(&args[0])?, parse_var(&args[1])?, parse_int(&args[2])?))
}

fn parse_end(rest: &str) -> Result<Command> {
    let args = parse_args(rest)?;
    let tid = args.first().ok_or_else(|| malformed(rest))?;
    Ok(Command::End(parse_txn(tid)?))
}

fn parse_fail(rest: &str) -> Result<Command> {
    let args = parse_args(rest)?;
    let site = args.first().ok_or_else(|| malformed(rest))?;
    Ok(Command::Fail(parse_site(site)?))
}

fn parse_recover(rest: &str) -> Result<Command> {
    let args = parse_args(rest)?;
    let site = args.first().ok_or_else(|| malformed(rest))?;
    Ok(Command::Recover(parse_site(site)?))
}

fn parse_dump(rest: &str) -> Result<Command> {
    let args = parse_args(rest)?;
    if !args.is_empty() {
        return Err(malformed(rest));
    }
    Ok(Command::Dump)
}
