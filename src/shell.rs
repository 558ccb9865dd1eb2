// SPDX: CC0-1.0

use crate::{
    eval::Program,
    lex::SubStr,
    render::{DrawCommand, Frame},
    GraphError,
};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Plot,
    Remove,
    Clear,
    List,
    Eval,
    Roots,
    Area,
    Pan,
    Zoom,
    Reset,
    Resize,
    Color,
    Width,
    Render,
    PrintProg,
    Export,
    Settings,
    SetWin,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::Plot,
            Self::Remove,
            Self::Clear,
            Self::List,
            Self::Eval,
            Self::Roots,
            Self::Area,
            Self::Pan,
            Self::Zoom,
            Self::Reset,
            Self::Resize,
            Self::Color,
            Self::Width,
            Self::Render,
            Self::PrintProg,
            Self::Export,
            Self::Settings,
            Self::SetWin,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::Plot => "add a curve y = f(x)",
            Self::Remove => "remove a curve by index",
            Self::Clear => "remove every curve",
            Self::List => "list curves with their colours and widths",
            Self::Eval => "evaluate a curve at some x",
            Self::Roots => "find roots of a curve on an interval",
            Self::Area => "integrate a curve over an interval",
            Self::Pan => "shift the view by a pixel delta",
            Self::Zoom => "zoom about the centre (in, out, or a factor)",
            Self::Reset => "restore default scale and offset",
            Self::Resize => "change the surface size and device pixel ratio",
            Self::Color => "set the colour of the last curve (or of an index)",
            Self::Width => "set the line width of the last curve (or of an index)",
            Self::Render => "paint the pending frame and summarize it",
            Self::PrintProg => "print program compiled from an expression (for debugging)",
            Self::Export => "save the current view as a png",
            Self::Settings => "print current settings",
            Self::SetWin => "set window parameters",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Plot => "plot",
            Self::Remove => "remove",
            Self::Clear => "clear",
            Self::List => "list",
            Self::Eval => "eval",
            Self::Roots => "roots",
            Self::Area => "area",
            Self::Pan => "pan",
            Self::Zoom => "zoom",
            Self::Reset => "reset",
            Self::Resize => "resize",
            Self::Color => "color",
            Self::Width => "width",
            Self::Render => "render",
            Self::PrintProg => "prog",
            Self::Export => "export",
            Self::Settings => "settings",
            Self::SetWin => "window",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for c in Self::exhaustive() {
            if s == c.name() {
                return Ok(*c);
            }
        }
        Err(())
    }
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        "^".repeat(span.len().max(1))
    )?;
    Ok(())
}

pub fn dump_program<W: Write>(
    mut out: W,
    prog: &Program,
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    if prog.ops().len() == 0 {
        writeln!(out, "  (empty)")?;
    }
    for op in prog.ops() {
        writeln!(out, "  {op}")?;
    }
    Ok(())
}

/// Print a library error; compile errors get a caret line and a note.
pub fn report<W: Write>(mut out: W, err: &GraphError) -> io::Result<()> {
    if let GraphError::Compile(compile) = err {
        writeln!(out)?;
        underline(&mut out, &compile.loc)?;
        writeln!(out, "compile error: {compile}")?;
        if let Some(note) = compile.note() {
            writeln!(out, "note: {note}")?;
        }
        return Ok(());
    }
    writeln!(out, "error: {err}")?;
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        writeln!(out, "  caused by: {inner}")?;
        source = inner.source();
    }
    Ok(())
}

/// One line per kind of draw command.
pub fn summarize_frame<W: Write>(mut out: W, frame: &Frame) -> io::Result<()> {
    let (mut polylines, mut points, mut circles, mut texts) = (0, 0, 0, 0);
    for command in &frame.commands {
        match command {
            DrawCommand::Clear(_) => {}
            DrawCommand::Polyline { points: p, .. } => {
                polylines += 1;
                points += p.len();
            }
            DrawCommand::Circle { .. } => circles += 1,
            DrawCommand::Text { .. } => texts += 1,
        }
    }
    writeln!(out, "frame {}x{}:", frame.width, frame.height)?;
    writeln!(out, "  {polylines} polylines ({points} points)")?;
    writeln!(out, "  {circles} markers")?;
    writeln!(out, "  {texts} labels")?;
    Ok(())
}

pub fn no_curves<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, r#"error: no curves are plotted, try "plot""#)
}
