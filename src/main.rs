use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use palmburst::prelude::*;
use palmburst::{ConfigError, SetupError};

/// Open your palm at the camera and watch the sparkles fall.
#[derive(Parser, Debug)]
#[command(name = "palmburst", version, about)]
struct Args {
    /// TOML session configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run N ticks without a window instead of opening the overlay
    #[arg(long, value_name = "TICKS")]
    headless: Option<u64>,

    /// Write the last headless frame to this PNG
    #[arg(long, requires = "headless")]
    snapshot: Option<PathBuf>,

    /// Seed particle randomness
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(args: &Args) -> Result<SessionConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let frame_rate = config.frame_rate;
    let manager = LifecycleManager::new(config);

    let loader = DemoLoader::new();
    let camera = DemoCamera::default();
    let mount = manager.mount(
        &loader,
        &camera,
        |size| ImageSurface::new(size.x, size.y),
        SystemClock,
    );
    let mut session = match pollster::block_on(mount) {
        Ok(session) => session,
        Err(SetupError::Canceled) => return ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(ticks) = args.headless else {
        return match run_overlay(manager, session) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{}", e);
                ExitCode::FAILURE
            }
        };
    };

    let mut render_loop = RenderLoop::new();
    let mut scheduler = FixedRateScheduler::new(frame_rate).with_frame_limit(ticks);
    let rendered = render_loop.run(&mut session, &mut scheduler);
    log::info!(
        "headless run: {} frames rendered, {} waves, {} particles alive",
        rendered,
        render_loop.spawn_count(),
        session.particles().len()
    );

    let mut status = ExitCode::SUCCESS;
    if let Some(path) = &args.snapshot {
        let image = match session.last_frame() {
            Some(frame) => session.surface().composite_over(&frame.image),
            None => session.surface().image().clone(),
        };
        match image.save(path) {
            Ok(()) => log::info!("wrote {}", path.display()),
            Err(e) => {
                log::error!("failed to write {}: {}", path.display(), e);
                status = ExitCode::FAILURE;
            }
        }
    }
    manager.unmount(&mut session);
    status
}
