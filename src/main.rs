mod config;
mod control;
mod fireworks;
mod render;

use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, terminal,
};
use fireworks::effects::ALL_EFFECTS;
use fireworks::show::show_names;
use fireworks::{FireworkShow, Mode, PerformanceTier, ShowOptions, SoundSink, TICK, Viewport};
use render::{Canvas, ColorMode, RenderMode};
use std::io::{self, BufWriter, Write};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "skyburst", about = "Terminal fireworks show")]
struct Cli {
    /// Scheduler mode: random launches or scripted choreography
    #[arg(value_enum)]
    mode: Option<Mode>,

    /// Start a scripted show immediately (index, see --list-shows)
    #[arg(short, long)]
    show: Option<usize>,

    /// Render mode
    #[arg(short, long, value_enum)]
    render: Option<RenderMode>,

    /// Color mode
    #[arg(short, long, value_enum)]
    color: Option<ColorMode>,

    /// Target FPS (1-120)
    #[arg(short, long)]
    fps: Option<u32>,

    /// Particle density tier
    #[arg(short, long, value_enum)]
    tier: Option<PerformanceTier>,

    /// Particle draw size (1-5)
    #[arg(long)]
    size: Option<f64>,

    /// Base particle count (10-100)
    #[arg(long)]
    count: Option<usize>,

    /// Explosion height as a fraction of the viewport (0.3-0.8)
    #[arg(long)]
    height: Option<f64>,

    /// Horizontal launch spread fraction (0.2-0.6)
    #[arg(long)]
    spread: Option<f64>,

    /// Explosion velocity multiplier (0.5-2)
    #[arg(long)]
    speed: Option<f64>,

    /// Seconds between random-mode launch opportunities (0.1-1)
    #[arg(long)]
    delay: Option<f64>,

    /// Ring the terminal bell on detonations
    #[arg(long)]
    bell: bool,

    /// Hide the status bar
    #[arg(long)]
    clean: bool,

    /// List explosion effects and exit
    #[arg(long)]
    list_effects: bool,

    /// List scripted shows and exit
    #[arg(long)]
    list_shows: bool,

    /// Watch a file for JSON control messages
    #[arg(long)]
    control: Option<std::path::PathBuf>,

    /// Read JSON control messages from stdin
    #[arg(long)]
    stdin_control: bool,

    /// Print the config file path and exit
    #[arg(long)]
    show_config: bool,

    /// Write a commented config template and exit
    #[arg(long)]
    init_config: bool,
}

/// BEL on detonation. Volume is ignored; failures too.
struct TerminalBell {
    enabled: bool,
}

impl SoundSink for TerminalBell {
    fn explosion(&mut self, _volume: f64) {
        if self.enabled {
            let mut out = io::stdout();
            let _ = out.write_all(b"\x07");
        }
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    if cli.list_effects {
        println!("Explosion effects:");
        for effect in ALL_EFFECTS {
            println!("  {}", effect.name());
        }
        return Ok(());
    }

    if cli.list_shows {
        println!("Scripted shows:");
        for (i, name) in show_names().enumerate() {
            println!("  {} {}", i, name);
        }
        return Ok(());
    }

    if cli.show_config {
        match config::config_path() {
            Some(path) => {
                let status = if path.exists() { "" } else { " (not created)" };
                println!("{}{}", path.display(), status);
            }
            None => println!("No config directory available on this platform"),
        }
        return Ok(());
    }

    if cli.init_config {
        let Some(path) = config::config_path() else {
            eprintln!("No config directory available on this platform");
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if path.exists() {
            eprintln!("Refusing to overwrite {}", path.display());
            return Ok(());
        }
        std::fs::write(&path, config::default_config_string())?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let cfg = config::load_config();
    let fps = cli.fps.or(cfg.fps).unwrap_or(60).clamp(1, 120);
    let frame_dur = Duration::from_secs_f64(1.0 / fps as f64);

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

    let mut writer = BufWriter::with_capacity(256 * 1024, stdout);
    let result = run_loop(&mut writer, &cli, &cfg, frame_dur);

    execute!(writer, cursor::Show, terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    result
}

fn run_loop(
    stdout: &mut BufWriter<io::Stdout>,
    cli: &Cli,
    cfg: &config::Config,
    frame_dur: Duration,
) -> io::Result<()> {
    let (mut cols, mut rows) = terminal::size()?;

    let mut render_mode = cli
        .render
        .or(cfg.render.map(Into::into))
        .unwrap_or(RenderMode::Braille);
    let mut color_mode = cli
        .color
        .or(cfg.color.map(Into::into))
        .unwrap_or(ColorMode::TrueColor);
    let mut hide_status = cli.clean || cfg.clean.unwrap_or(false);

    let mut options = ShowOptions::default();
    if let Some(v) = cli.size.or(cfg.size) {
        options.set_particle_size(v);
    }
    if let Some(v) = cli.count.or(cfg.count) {
        options.set_particle_count(v);
    }
    if let Some(v) = cli.height.or(cfg.height) {
        options.set_height(v);
    }
    if let Some(v) = cli.spread.or(cfg.spread) {
        options.set_spread(v);
    }
    if let Some(v) = cli.speed.or(cfg.speed) {
        options.set_speed(v);
    }
    if let Some(v) = cli.delay.or(cfg.delay) {
        options.set_delay(v);
    }

    let tier = cli
        .tier
        .or(cfg.tier.map(Into::into))
        .unwrap_or(PerformanceTier::High);
    let mode = cli
        .mode
        .or(cfg.mode.map(Into::into))
        .unwrap_or(Mode::Random);

    let mut show = FireworkShow::new(mode, options, tier);
    let mut show_index = 0usize;
    if let Some(idx) = cli.show.or(cfg.show) {
        show_index = idx;
        show.play_show(idx);
    }

    let mut bell = TerminalBell {
        enabled: cli.bell || cfg.bell.unwrap_or(false),
    };

    let control_rx = if cli.stdin_control {
        Some(control::spawn_reader(control::ControlSource::Stdin))
    } else {
        cli.control
            .clone()
            .map(|p| control::spawn_reader(control::ControlSource::File(p)))
    };

    let display_rows = |rows: u16, hide: bool| -> usize {
        if hide {
            rows as usize
        } else {
            (rows as usize).saturating_sub(1)
        }
    };

    let mut canvas = Canvas::new(
        cols as usize,
        display_rows(rows, hide_status),
        render_mode,
        color_mode,
    );

    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f64;
    let mut frame_count: u64 = 0;
    let mut actual_fps: f64 = 0.0;
    let mut fps_update = Instant::now();
    let mut rebuild_canvas = false;

    loop {
        // Input (non-blocking)
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Resize(w, h) => {
                    if w >= 10 && h >= 5 {
                        cols = w;
                        rows = h;
                        rebuild_canvas = true;
                    }
                }
                Event::Key(KeyEvent { code, .. }) => match code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('m') => show.toggle_mode(),
                    KeyCode::Right | KeyCode::Char('n') => {
                        show_index = (show_index + 1) % show_names().count();
                        show.stop_show();
                        show.play_show(show_index);
                    }
                    KeyCode::Left | KeyCode::Char('p') => {
                        let total = show_names().count();
                        show_index = (show_index + total - 1) % total;
                        show.stop_show();
                        show.play_show(show_index);
                    }
                    KeyCode::Char('r') => {
                        render_mode = render_mode.next();
                        rebuild_canvas = true;
                    }
                    KeyCode::Char('c') => {
                        color_mode = color_mode.next();
                        rebuild_canvas = true;
                    }
                    KeyCode::Char('t') => {
                        show.tier = show.tier.next();
                    }
                    KeyCode::Char('b') => {
                        bell.enabled = !bell.enabled;
                    }
                    KeyCode::Char('h') => {
                        hide_status = !hide_status;
                        rebuild_canvas = true;
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // Live control messages, applied between frames
        if let Some(ref rx) = control_rx {
            while let Ok(params) = rx.try_recv() {
                apply_control(&mut show, &mut bell, params);
            }
        }

        if rebuild_canvas && cols >= 10 && rows >= 5 {
            let (settled_cols, settled_rows) = terminal::size()?;
            if settled_cols >= 10 && settled_rows >= 5 {
                cols = settled_cols;
                rows = settled_rows;
            }
            canvas = Canvas::new(
                cols as usize,
                display_rows(rows, hide_status),
                render_mode,
                color_mode,
            );
            write!(stdout, "\x1b[2J\x1b[H")?;
            stdout.flush()?;
            rebuild_canvas = false;
        }

        // Fixed-timestep simulation: the frame rate may wobble, the
        // simulation always steps in TICK increments.
        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f64();
        last_frame = now;
        accumulator = (accumulator + dt).min(0.25);
        let view = Viewport::new(canvas.width, canvas.height);
        while accumulator >= TICK {
            show.tick(view, &mut bell);
            accumulator -= TICK;
        }

        canvas.clear();
        show.render(&mut canvas);
        let frame = canvas.render();

        // Skip the frame if the terminal resized mid-build.
        let (check_cols, check_rows) = terminal::size()?;
        if check_cols != cols || check_rows != rows {
            cols = check_cols;
            rows = check_rows;
            rebuild_canvas = true;
            std::thread::sleep(Duration::from_millis(50));
            continue;
        }

        stdout.write_all(b"\x1b[H")?;
        stdout.write_all(frame.as_bytes())?;

        frame_count += 1;
        if fps_update.elapsed() >= Duration::from_secs(1) {
            actual_fps = frame_count as f64 / fps_update.elapsed().as_secs_f64();
            frame_count = 0;
            fps_update = Instant::now();
        }
        if !hide_status {
            let playing = if show.is_playing() {
                format!(" [{}]", show.current_show_name())
            } else {
                String::new()
            };
            let status = format!(
                " {}{} | {} | {} | {} | {:.0} fps | {} live | [m] mode  [←/→] show  [r/c/t] render/color/tier  [b] bell  [h] hide  [q] quit ",
                show.mode().name(),
                playing,
                show.tier.name(),
                render_mode.name(),
                color_mode.name(),
                actual_fps,
                show.rocket_count(),
            );
            let w = cols as usize;
            let truncated: String = status.chars().take(w).collect();
            let padded = format!("{:<width$}", truncated, width = w);
            write!(stdout, "\x1b[{};1H\x1b[7m{}\x1b[0m", rows, padded)?;
        }

        stdout.flush()?;

        let elapsed = last_frame.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

fn apply_control(show: &mut FireworkShow, bell: &mut TerminalBell, params: control::ControlParams) {
    if let Some(mode) = params.mode.as_deref() {
        match mode {
            "random" => show.set_mode(Mode::Random),
            "choreography" => show.set_mode(Mode::Choreography),
            _ => {}
        }
    }
    if let Some(tier) = params.tier.as_deref() {
        match tier {
            "high" => show.tier = PerformanceTier::High,
            "medium" => show.tier = PerformanceTier::Medium,
            "low" => show.tier = PerformanceTier::Low,
            _ => {}
        }
    }
    if let Some(idx) = params.show {
        show.stop_show();
        show.play_show(idx);
    }
    if let Some(v) = params.bell {
        bell.enabled = v;
    }
    if let Some(v) = params.size {
        show.options.set_particle_size(v);
    }
    if let Some(v) = params.count {
        show.options.set_particle_count(v);
    }
    if let Some(v) = params.height {
        show.options.set_height(v);
    }
    if let Some(v) = params.spread {
        show.options.set_spread(v);
    }
    if let Some(v) = params.speed {
        show.options.set_speed(v);
    }
    if let Some(v) = params.delay {
        show.options.set_delay(v);
    }
}
