//! Interactive command line demo of the playback session.
//!
//! Drives a [`PlaybackSession`] over a simulated engine from stdin and
//! prints every delegate callback as a JSON-tagged event line.

use std::io::{self, BufRead, Write as _};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use iris_core::{BroadcastStateFilter, PlayerEvent};
use iris_native::sim::{PlaybackScript, SimulatedPlaybackEngine};
use iris_player::{PlaybackSession, PlayerDelegate};

/// Prints each callback as one JSON line, tagged as a [`PlayerEvent`].
struct JsonPrinter;

impl JsonPrinter {
    fn emit(&self, event: PlayerEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("event {line}"),
            Err(e) => eprintln!("unserializable event: {e}"),
        }
    }
}

impl PlayerDelegate for JsonPrinter {
    fn video_load_fail(&self) {
        self.emit(PlayerEvent::LoadFailed);
    }

    fn playback_started(&self) {
        self.emit(PlayerEvent::Started);
    }

    fn playback_paused(&self) {
        self.emit(PlayerEvent::Paused);
    }

    fn playback_stopped(&self) {
        self.emit(PlayerEvent::Stopped);
    }

    fn playback_completed(&self) {
        self.emit(PlayerEvent::Completed);
    }

    fn duration_known(&self, duration: f64) {
        self.emit(PlayerEvent::DurationKnown(duration));
    }

    fn current_viewer_count_updated(&self, viewers: u32) {
        self.emit(PlayerEvent::CurrentViewerCount(viewers));
    }

    fn total_viewer_count_updated(&self, viewers: u32) {
        self.emit(PlayerEvent::TotalViewerCount(viewers));
    }
}

const HELP: &str = "\
commands:
  play <uri>         load and play a broadcast resource
  pause              pause playback (stops live playback)
  resume             resume paused archived playback
  stop               stop playback
  seek <seconds>     seek within the seekable range
  volume <0..1>      set playback volume
  timeshift on|off   request seek support for live playback
  status             print session state
  help               this text
  quit               exit";

const DEMO_URI: &str = "https://cdn.example.com/broadcasts/demo?da_signature=demo";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("starting player demo");

    let script = PlaybackScript {
        live: true,
        seekable_window: 120.0,
        position_step: 0.5,
        tick: Duration::from_millis(500),
        ..PlaybackScript::default()
    };
    let engine = SimulatedPlaybackEngine::with_script(script);

    let printer: Arc<dyn PlayerDelegate> = Arc::new(JsonPrinter);
    let session = PlaybackSession::new(engine, Arc::downgrade(&printer));
    session.set_application_id("demo-application-id");
    session.set_required_state(BroadcastStateFilter::Any);

    println!("{HELP}");
    println!("demo resource: {DEMO_URI}");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let rest = words.collect::<Vec<_>>().join(" ");

        let outcome = match command {
            "play" => {
                let uri = if rest.is_empty() { DEMO_URI } else { &rest };
                session.play_video(uri).map_err(Into::into)
            }
            "pause" => {
                session.pause_video();
                Ok(())
            }
            "resume" => {
                session.resume();
                Ok(())
            }
            "stop" => {
                session.stop_video();
                Ok(())
            }
            "seek" => rest
                .parse::<f64>()
                .context("seek takes a position in seconds")
                .and_then(|t| session.seek_to(t).map_err(Into::into)),
            "volume" => rest
                .parse::<f32>()
                .context("volume takes a number in 0..1")
                .map(|v| session.set_volume(v)),
            "timeshift" => session
                .set_timeshift_enabled(rest == "on")
                .map_err(Into::into),
            "status" => {
                println!(
                    "status={} live={} position={:.1} duration={} volume={:.2}",
                    session.status().name(),
                    session.is_live(),
                    session.position(),
                    session
                        .duration()
                        .map_or_else(|| "-".to_string(), |d| format!("{d:.1}")),
                    session.volume(),
                );
                Ok(())
            }
            "help" => {
                println!("{HELP}");
                Ok(())
            }
            "quit" | "exit" => break,
            other => Err(anyhow::anyhow!("unknown command {other:?}, try help")),
        };

        if let Err(e) = outcome {
            eprintln!("error: {e:#}");
        }
        io::stdout().flush().ok();
    }

    info!("shutting down");
    Ok(())
}
