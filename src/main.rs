use anyhow::{bail, Context, Result};
use clap::Parser;
use exosky_map::app::{Notice, StarMapApp};
use exosky_map::cli::CliArgs;
use exosky_map::client::transport::ReqwestTransport;
use exosky_map::config::MapConfig;
use exosky_map::frame::{Flow, FrameLoop, FrameTime, IntervalClock};
use exosky_map::scene::scene::HeadlessRenderer;
use log::{error, info, warn};

const VIEWPORT: (u32, u32) = (1280, 720);
/// Seconds of frames to wait for outstanding requests.
const REQUEST_BUDGET_SECS: u64 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let mut config = MapConfig::default();
    config
        .apply_cli_overrides(&args)
        .context("invalid configuration")?;

    let transport = ReqwestTransport::new().context("failed to build HTTP client")?;
    let mut app = StarMapApp::new(
        HeadlessRenderer::default(),
        transport,
        &config,
        VIEWPORT.0,
        VIEWPORT.1,
    );

    info!("querying {} for stars around {:?}", config.backend_url, args.planet);
    app.request_stars(&args.planet);
    if let Some(message) = args.chat_message() {
        app.send_chat(&message);
    }
    if !app.is_busy() {
        report(&mut app);
        bail!("nothing to request");
    }

    let budget = u64::from(config.frame_rate) * REQUEST_BUDGET_SECS;
    let mut clock = IntervalClock::new(config.frame_rate);
    let (frame_loop, _stop) = FrameLoop::new(|frame: FrameTime| {
        app.tick();
        if !app.is_busy() {
            Flow::Stop
        } else if frame.index >= budget {
            warn!("requests still pending after {REQUEST_BUDGET_SECS}s, giving up");
            Flow::Stop
        } else {
            Flow::Continue
        }
    });
    let frames = frame_loop.run(&mut clock).await;
    app.shutdown();

    info!(
        "{} stars rendered after {frames} frames ({} host planet entries)",
        app.scene().len(),
        app.planets().len()
    );
    for line in app.transcript().lines() {
        info!("{line}");
    }
    report(&mut app);
    Ok(())
}

fn report(app: &mut StarMapApp<HeadlessRenderer, ReqwestTransport>) {
    for notice in app.take_notices() {
        match notice {
            Notice::Validation(msg) => warn!("{msg}"),
            Notice::Error(msg) => error!("{msg}"),
        }
    }
}
