//! Command line front end: loads a JSON scene, plays frames against the
//! software backend and reports what each frame did.
//!
//! ```bash
//! folio play scene.json --until 5
//! folio pick scene.json 120 40
//! ```

use clap::{Parser, Subcommand};
use folio::layout::{MarqueeMode, PickResult};
use folio::render::SoftwareBackend;
use folio::types::{EventCategory, Rect};
use folio::{FolioError, FrameConfig, FrameDriver, FrameReport, Scene};
use itertools::Itertools;
use std::path::PathBuf;

// Long sessions allocate many small meshes and text pieces.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Lay out, draw and pick a JSON scene")]
struct Cli {
    /// Driver configuration (JSON). Defaults apply for missing fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pass timings and cache behaviour after every frame
    #[arg(long, global = true)]
    profile: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run frames at the scheduled refresh deadlines
    Play {
        scene: PathBuf,

        /// Stop once the next deadline lies past this time, in seconds
        #[arg(long, default_value = "0")]
        until: f64,

        /// Upper bound on the number of frames
        #[arg(long, default_value = "100")]
        frames: usize,

        /// Event categories to post before the first frame
        #[arg(long, value_delimiter = ',')]
        events: Vec<u32>,
    },

    /// Report what lies under a point, or inside a rectangle
    Pick {
        scene: PathBuf,
        x: f32,
        y: f32,

        /// Pick a rectangle of this width and height instead of a point
        #[arg(long, num_args = 2)]
        rect: Option<Vec<f32>>,
    },
}

fn load(cli: &Cli, scene: &PathBuf) -> Result<FrameDriver, FolioError> {
    let mut config = match &cli.config {
        Some(path) => FrameConfig::from_file(path)?,
        None => FrameConfig::default(),
    };
    config.profiling |= cli.profile;

    let (mut driver, _sender) = FrameDriver::new(SoftwareBackend::default(), config);
    let scene = Scene::from_file(scene)?;
    let page = driver.config().page.clone();
    scene.build(driver.tree_mut(), &page)?;
    Ok(driver)
}

fn print_report(report: &FrameReport) {
    let next = if report.schedule.next_refresh.is_finite() {
        format!("{:.3}s", report.schedule.next_refresh)
    } else {
        "idle".to_string()
    };
    println!(
        "frame {:>3} t={:<7.3} refreshed={} drawn={} submitted={} faults={} next={} wakes-on=[{}]",
        report.frame,
        report.time,
        report.refreshed,
        report.draw.visited,
        report.draw.submitted,
        report.draw.faults,
        next,
        report.schedule.immediate.iter().join(",")
    );
}

fn describe(hit: &PickResult) -> String {
    let mut text = format!("{:?} key={:?} category={:?}", hit.drawable, hit.key, hit.category);
    if let Some(index) = hit.char_index {
        text.push_str(&format!(" char={}", index));
    }
    if let Some(corner) = hit.corner {
        text.push_str(&format!(" corner={:?}", corner));
    }
    text
}

fn run(cli: &Cli) -> Result<(), FolioError> {
    match &cli.command {
        Commands::Play {
            scene,
            until,
            frames,
            events,
        } => {
            let mut driver = load(cli, scene)?;
            for &category in events {
                driver.post(EventCategory(category));
            }
            let reports = driver.play(*until, *frames)?;
            for report in &reports {
                print_report(report);
            }
            println!("{} commands in the last frame", driver.backend().commands().len());
        }
        Commands::Pick { scene, x, y, rect } => {
            let mut driver = load(cli, scene)?;
            driver.frame(0.0)?;
            match rect.as_deref() {
                Some(&[width, height]) => {
                    let touched = driver.marquee(Rect::new(*x, *y, width, height), MarqueeMode::Replace)?;
                    println!("{} drawables inside the rectangle", touched);
                    let keys = driver.display().selection.keys().map(|k| format!("{:?}", k)).join(" ");
                    println!("selected: {}", keys);
                }
                _ => match driver.click(*x, *y, false)? {
                    Some(hit) => println!("{}", describe(&hit)),
                    None => println!("nothing at ({}, {})", x, y),
                },
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
