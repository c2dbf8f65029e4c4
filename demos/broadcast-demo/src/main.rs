//! Interactive command line demo of the broadcast session.
//!
//! Drives a [`BroadcastSession`] over a simulated engine from stdin and
//! prints every delegate callback as a JSON-tagged event line.

use std::io::{self, BufRead, Write as _};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use iris_broadcast::{BroadcastDelegate, BroadcastSession};
use iris_core::{BroadcastConfig, BroadcastEvent, ErrorCode, Snapshot, TalkbackState};
use iris_native::sim::{BroadcastScript, SimulatedBroadcastEngine};

/// Prints each callback as one JSON line, tagged as a [`BroadcastEvent`].
struct JsonPrinter;

impl JsonPrinter {
    fn emit(&self, event: BroadcastEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("event {line}"),
            Err(e) => eprintln!("unserializable event: {e}"),
        }
    }
}

impl BroadcastDelegate for JsonPrinter {
    fn broadcast_started(&self) {
        self.emit(BroadcastEvent::Started);
    }

    fn broadcast_stopped(&self) {
        self.emit(BroadcastEvent::Stopped);
    }

    fn error(&self, code: ErrorCode, message: &str) {
        self.emit(BroadcastEvent::Error {
            code,
            message: message.to_string(),
        });
    }

    fn uplink_test_complete(&self, speed_bytes_per_sec: f32, should_broadcast: bool) {
        self.emit(BroadcastEvent::UplinkTestComplete {
            speed_bytes_per_sec,
            should_broadcast,
        });
    }

    fn hide_settings_view(&self) {
        self.emit(BroadcastEvent::HideSettingsView);
    }

    fn chat_message_received(&self, message: &str) {
        self.emit(BroadcastEvent::ChatMessage(message.to_string()));
    }

    fn recording_complete(&self, filename: &Path) {
        self.emit(BroadcastEvent::RecordingComplete(filename.to_path_buf()));
    }

    fn health_updated(&self, health: u8) {
        self.emit(BroadcastEvent::HealthUpdated(health));
    }

    fn current_viewer_count_updated(&self, viewers: u32) {
        self.emit(BroadcastEvent::CurrentViewerCount(viewers));
    }

    fn total_viewer_count_updated(&self, viewers: u32) {
        self.emit(BroadcastEvent::TotalViewerCount(viewers));
    }

    fn talkback_request(&self, request: &str, caller: &str, talkback_id: i32) {
        self.emit(BroadcastEvent::TalkbackRequest {
            request: request.to_string(),
            caller: caller.to_string(),
            talkback_id,
        });
    }

    fn talkback_state_changed(&self, state: TalkbackState) {
        self.emit(BroadcastEvent::TalkbackStateChanged(state));
    }

    fn broadcast_id_received(&self, broadcast_id: &str) {
        self.emit(BroadcastEvent::BroadcastIdReceived(broadcast_id.to_string()));
    }

    fn snapshot_taken(&self, snapshot: Snapshot) {
        self.emit(BroadcastEvent::SnapshotTaken(snapshot));
    }
}

const HELP: &str = "\
commands:
  start              connect and go live
  stop               stop broadcasting
  linktest           run an uplink test
  snapshot           request a camera snapshot
  swap               toggle between cameras
  torch on|off       toggle the LED torch
  zoom <level>       set zoom, clamped to the device range
  title <text>       update the broadcast title
  accept <id>        accept a talkback request
  decline <id>       decline a talkback request
  end                end the ongoing talkback
  status             print session state
  help               this text
  quit               exit";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("starting broadcast demo");

    let script = BroadcastScript {
        talkback_request: Some(("join the show".to_string(), "studio".to_string(), 1)),
        health_ticks: 5,
        tick: Duration::from_millis(500),
        ..BroadcastScript::default()
    };
    let engine = SimulatedBroadcastEngine::with_script(script);

    let printer: Arc<dyn BroadcastDelegate> = Arc::new(JsonPrinter);
    let session = BroadcastSession::new(engine, Arc::downgrade(&printer));

    session
        .configure(BroadcastConfig {
            application_id: "demo-application-id".to_string(),
            title: "broadcast demo".to_string(),
            author: "demo".to_string(),
            talkback: true,
            ..BroadcastConfig::default()
        })
        .context("configuring the session")?;
    session.start_capture().context("starting capture")?;

    println!("{HELP}");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let rest = words.collect::<Vec<_>>().join(" ");

        let outcome = match command {
            "start" => session.start_broadcasting().map_err(Into::into),
            "stop" => {
                session.stop_broadcasting();
                Ok(())
            }
            "linktest" => session.start_linktest().map_err(Into::into),
            "snapshot" => {
                session.take_snapshot();
                Ok(())
            }
            "swap" => {
                session.swap_camera();
                Ok(())
            }
            "torch" => {
                session.set_torch(rest == "on");
                Ok(())
            }
            "zoom" => rest
                .parse::<f32>()
                .context("zoom takes a number")
                .map(|level| session.set_zoom(level)),
            "title" => {
                session.set_title(&rest);
                Ok(())
            }
            "accept" => rest
                .parse::<i32>()
                .context("accept takes a talkback id")
                .map(|id| session.accept_talkback_request(id)),
            "decline" => rest
                .parse::<i32>()
                .context("decline takes a talkback id")
                .map(|id| session.decline_talkback_request(id)),
            "end" => {
                session.end_talkback();
                Ok(())
            }
            "status" => {
                println!(
                    "phase={} can_start={} health={} talkback={} zoom={:.1} id={}",
                    session.phase().name(),
                    session.can_start(),
                    session.health(),
                    session.talkback_state().name(),
                    session.zoom(),
                    session.broadcast_id().as_deref().unwrap_or("-"),
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
