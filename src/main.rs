// SPDX: CC0-1.0

use anyhow::Context;
use chrono::Local;
use grapher::{
    roots,
    shell::{self, Command},
    Color, GraphError, Interpreter, Method, Number, Settings, Surface,
};
use std::{
    io::{stderr, stdout, BufWriter, Write},
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GRAPHER_LOG";
const INITIAL_SIZE: [Number; 2] = [800.0, 600.0];

fn main() -> ExitCode {
    init_tracing();
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(stderr)
        .init();
}

fn try_main() -> anyhow::Result<()> {
    let [width, height] = INITIAL_SIZE;
    let mut surface = Surface::new(width, height, Settings::default());

    let mut stdout = BufWriter::new(stdout());
    loop {
        writeln!(
            stdout,
            "{n} curve(s), scale {scale} px/unit",
            n = surface.graph().len(),
            scale = surface.viewport().scale()
        )?;

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::Plot => plot(&mut stdout, &mut surface)?,

                Command::Remove => {
                    if let Some(index) = read_index(&mut stdout, &surface)? {
                        match surface.remove_curve(index) {
                            Ok(()) => writeln!(stdout, "removed curve {index}")?,
                            Err(err) => shell::report(&mut stdout, &err)?,
                        }
                    }
                }

                Command::Clear => {
                    surface.clear();
                    writeln!(stdout, "cleared all curves")?;
                }

                Command::List => {
                    if surface.graph().is_empty() {
                        shell::no_curves(&mut stdout)?;
                    }
                    for (i, curve) in surface.graph().curves().iter().enumerate() {
                        writeln!(stdout, "[{i}] {curve}")?;
                    }
                }

                Command::Eval => eval(&mut stdout, &surface)?,

                Command::Roots => find_roots(&mut stdout, &surface)?,

                Command::Area => area(&mut stdout, &surface)?,

                Command::Pan => {
                    let Ok(Some(dx)) = shell::read_fromstr::<_, Number>(&mut stdout, "?dx (pixels) = ", false)? else {
                        continue;
                    };
                    let Ok(Some(dy)) = shell::read_fromstr::<_, Number>(&mut stdout, "?dy (pixels) = ", false)? else {
                        continue;
                    };
                    surface.pan(dx, dy);
                }

                Command::Zoom => zoom(&mut stdout, &mut surface)?,

                Command::Reset => {
                    surface.reset_view();
                    writeln!(stdout, "view reset")?;
                }

                Command::Resize => resize(&mut stdout, &mut surface)?,

                Command::Color => {
                    let Some(target) = read_target(&mut stdout, &surface)? else {
                        continue;
                    };
                    if let Ok(Some(color)) = shell::read_fromstr::<_, Color>(&mut stdout, "?colour = ", false)? {
                        let res = match target {
                            Some(index) => surface.set_color(index, color),
                            None => surface.set_last_color(color),
                        };
                        if let Err(err) = res {
                            shell::report(&mut stdout, &err)?;
                        }
                    }
                }

                Command::Width => {
                    let Some(target) = read_target(&mut stdout, &surface)? else {
                        continue;
                    };
                    if let Ok(Some(width)) = shell::read_fromstr::<_, f32>(&mut stdout, "?width (pixels) = ", false)? {
                        let res = match target {
                            Some(index) => surface.set_line_width(index, width),
                            None => surface.set_last_line_width(width),
                        };
                        if let Err(err) = res {
                            shell::report(&mut stdout, &err)?;
                        }
                    }
                }

                Command::Render => {
                    if let Some(frame) = surface.tick() {
                        shell::summarize_frame(&mut stdout, frame)?;
                    } else {
                        writeln!(stdout, "nothing changed since the last paint")?;
                    }
                }

                Command::PrintProg => {
                    let expr = shell::input(&mut stdout, "y = ")?;
                    match Interpreter::new().compile_program(&expr) {
                        Ok(prog) => shell::dump_program(&mut stdout, &prog, format_args!("program"))?,
                        Err(err) => shell::report(&mut stdout, &GraphError::from(err))?,
                    }
                }

                Command::Export => export(&mut stdout, &surface)?,

                Command::Settings => {
                    writeln!(stdout, "{:#}", surface.settings())?;
                }

                Command::SetWin => set_win(&mut stdout, &mut surface)?,
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn plot<W: Write>(mut out: W, surface: &mut Surface) -> anyhow::Result<()> {
    let input = shell::input(&mut out, "y = ")?;
    if input.is_empty() {
        return Ok(());
    }
    match surface.add_curve(&input) {
        Ok(index) => writeln!(out, "added curve {index}")?,
        Err(err) => shell::report(&mut out, &err)?,
    }
    Ok(())
}

/// Prompt for a curve index. `None` means the caller should give up.
fn read_index<W: Write>(mut out: W, surface: &Surface) -> anyhow::Result<Option<usize>> {
    if surface.graph().is_empty() {
        shell::no_curves(&mut out)?;
        return Ok(None);
    }
    let last = surface.graph().len() - 1;
    match shell::read_fromstr::<_, usize>(&mut out, format_args!("?index (0 to {last}) = "), false)? {
        Ok(index) => Ok(index),
        Err(_) => Ok(None),
    }
}

/// Like [`read_index`], but blank targets the most recent curve:
/// `Some(None)` is "last curve", outer `None` is "give up".
fn read_target<W: Write>(mut out: W, surface: &Surface) -> anyhow::Result<Option<Option<usize>>> {
    if surface.graph().is_empty() {
        shell::no_curves(&mut out)?;
        return Ok(None);
    }
    match shell::read_fromstr::<_, usize>(&mut out, "?index (blank for last curve) = ", true)? {
        Ok(index) => Ok(Some(index)),
        Err(_) => Ok(None),
    }
}

/// Prompt for an interval, defaulting to the visible x range.
fn read_interval<W: Write>(mut out: W, surface: &Surface) -> anyhow::Result<Option<[Number; 2]>> {
    let visible = surface.viewport().x_range();
    let mut bounds = [visible.start, visible.end];
    writeln!(out, "note: leave blank to use the visible range")?;
    let [lo, hi] = &mut bounds;
    for (name, dst) in [("from", lo), ("to", hi)] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(None),
        }
    }
    Ok(Some(bounds))
}

fn eval<W: Write>(mut out: W, surface: &Surface) -> anyhow::Result<()> {
    let Some(index) = read_index(&mut out, surface)? else {
        return Ok(());
    };
    let Ok(Some(x)) = shell::read_fromstr::<_, Number>(&mut out, "?x = ", false)? else {
        return Ok(());
    };
    match surface.evaluate_curve(index, x) {
        Ok(Some(y)) => writeln!(out, "f({x}) = {y}")?,
        Ok(None) => writeln!(out, "f({x}) is undefined")?,
        Err(err) => shell::report(&mut out, &err)?,
    }
    Ok(())
}

fn find_roots<W: Write>(mut out: W, surface: &Surface) -> anyhow::Result<()> {
    let Some(index) = read_index(&mut out, surface)? else {
        return Ok(());
    };
    let Some([from, to]) = read_interval(&mut out, surface)? else {
        return Ok(());
    };
    match surface.find_roots(index, from..to) {
        Ok(found) if found.is_empty() => {
            writeln!(out, "no sign changes found on [{from}, {to}]")?;
            writeln!(
                out,
                "note: roots where the curve only touches zero are not detected"
            )?;
        }
        Ok(found) => {
            writeln!(
                out,
                "{n} root(s) on [{from}, {to}] ({steps} scan steps):",
                n = found.len(),
                steps = roots::DEFAULT_STEPS
            )?;
            for x in found {
                writeln!(out, "  x = {x}")?;
            }
        }
        Err(err) => shell::report(&mut out, &err)?,
    }
    Ok(())
}

fn area<W: Write>(mut out: W, surface: &Surface) -> anyhow::Result<()> {
    let Some(index) = read_index(&mut out, surface)? else {
        return Ok(());
    };
    let Some([from, to]) = read_interval(&mut out, surface)? else {
        return Ok(());
    };
    let method = match shell::read_fromstr::<_, Method>(
        &mut out,
        format_args!("?method (is {}) = ", Method::default()),
        true,
    )? {
        Ok(method) => method.unwrap_or_default(),
        Err(_) => return Ok(()),
    };
    match surface.integrate(index, from, to, method) {
        Ok(q) => writeln!(out, "integral over [{from}, {to}] ({method}) = {q}")?,
        Err(err) => shell::report(&mut out, &err)?,
    }
    Ok(())
}

fn zoom<W: Write>(mut out: W, surface: &mut Surface) -> anyhow::Result<()> {
    let how = shell::input(&mut out, "?in, out or factor = ")?;
    let changed = match how.as_str() {
        "" => return Ok(()),
        "in" => surface.zoom_in(),
        "out" => surface.zoom_out(),
        factor => match factor.parse::<Number>() {
            Ok(factor) => surface.zoom(factor),
            Err(err) => {
                writeln!(out, "parse error: {err}")?;
                return Ok(());
            }
        },
    };
    if !changed {
        writeln!(out, "error: zoom factor must be a positive number")?;
    }
    Ok(())
}

fn resize<W: Write>(mut out: W, surface: &mut Surface) -> anyhow::Result<()> {
    let mut size = [
        surface.viewport().width(),
        surface.viewport().height(),
        surface.pixel_ratio(),
    ];
    let [width, height, ratio] = &mut size;
    for (name, dst) in [("width", width), ("height", height), ("pixel ratio", ratio)] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }
    surface.resize(size[0], size[1], size[2]);
    Ok(())
}

fn export<W: Write>(mut out: W, surface: &Surface) -> anyhow::Result<()> {
    let path = surface.export_filename(Local::now());
    surface
        .export_png(&path)
        .with_context(|| format!("failed to export to {path}"))?;
    writeln!(out, "saved {path}")?;
    Ok(())
}

fn set_win<W: Write>(mut out: W, surface: &mut Surface) -> anyhow::Result<()> {
    let mut vp = *surface.viewport();
    writeln!(out, "win = {vp:#}")?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    let mut scale = vp.scale();
    let mut offset = vp.offset();
    for (name, dst) in [
        ("scale", &mut scale),
        ("offset x", &mut offset.x),
        ("offset y", &mut offset.y),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    if !vp.set_scale(scale) {
        writeln!(out, "error: scale must be a positive number")?;
        return Ok(());
    }
    vp.set_offset(offset);
    surface.set_viewport(vp);
    Ok(())
}
