//! Load a facility design and drive it against the in-memory host.
//!
//! Usage: `headless <design.json> [config.json]`
//! Frames to render come from `FACILITY_FRAMES` (default 120, 60 fps).

use std::env;
use std::fs;
use std::process::ExitCode;
use std::rc::Rc;

use facility::{SceneConfig, SceneSession};
use foundation::time::Time;
use gpu::RecordingFactory;
use layers::RecordingMap;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const FRAME_STEP_S: f64 = 1.0 / 60.0;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let Some(design_path) = args.next() else {
        error!("usage: headless <design.json> [config.json]");
        return ExitCode::FAILURE;
    };

    let config = match args.next() {
        Some(path) => match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|s| SceneConfig::from_json_str(&s).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(err) => {
                error!("could not load config {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => SceneConfig::default(),
    };
    let frames = env_var_usize("FACILITY_FRAMES", 120);

    let payload = match fs::read_to_string(&design_path) {
        Ok(payload) => payload,
        Err(err) => {
            error!("could not read {design_path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let factory = RecordingFactory::new();
    let log = factory.log();
    let mut map = RecordingMap::default();
    let mut session = SceneSession::new(config, Rc::new(factory));

    let report = match session.build_from_str(&mut map, &payload) {
        Ok(report) => report,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    for issue in &report.issues {
        info!("issue: {issue}");
    }
    info!("{}", report.notice);

    let drawn = map.run(Time(0.0), FRAME_STEP_S, frames);
    info!(
        frames = drawn,
        embedded_frames = log.borrow().frames,
        resources = map.resource_count(),
        "animation finished"
    );

    session.clear(&mut map);
    info!(resources = map.resource_count(), "scene cleared");
    ExitCode::SUCCESS
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
