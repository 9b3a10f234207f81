//! Multi-target manager against a simulated host
//!
//! Run with: cargo run --example simulated_host
//!
//! The simulated host runs each output on its own thread, the way a real
//! streaming application would: it announces `starting`/`start`, counts
//! frames at ~30 fps, and answers a forced stop with `stopping`/`stop`.
//! Endpoints containing "unreachable" fail with a connect error, and
//! endpoints containing "flaky" drop once and reconnect.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use multi_rtmp::host::{
    dispatch_signal, ConfigStore, EncoderRef, HostOutput, HostService, MemoryConfigStore,
    OutputEventHandler, OutputHost, PrimaryEncoders, ServiceSettings,
};
use multi_rtmp::{ManagerConfig, ManagerEvent, OutputManager, TargetRecord};

/// Settings shared between a service and the output it is bound to
type SharedSettings = Arc<Mutex<Option<ServiceSettings>>>;

struct SimService {
    settings: SharedSettings,
}

impl HostService for SimService {
    fn update(&mut self, settings: &ServiceSettings) {
        *self.settings.lock().unwrap() = Some(settings.clone());
    }
}

struct SimOutput {
    id: u64,
    settings: SharedSettings,
    handler: Option<Arc<dyn OutputEventHandler>>,
    frames: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
}

impl HostOutput for SimOutput {
    fn set_service(&mut self, _service: &dyn HostService) {
        // Settings are shared through `settings`, wired up by SimHost
    }

    fn connect_events(&mut self, handler: Arc<dyn OutputEventHandler>) {
        self.handler = Some(handler);
    }

    fn set_encoders(&mut self, encoders: PrimaryEncoders) {
        tracing::debug!(output = self.id, video = %encoders.video, audio = %encoders.audio, "Encoders bound");
    }

    fn start(&mut self) -> bool {
        let Some(handler) = self.handler.clone() else {
            return false;
        };
        let endpoint = self
            .settings
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.server.clone())
            .unwrap_or_default();

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let frames = self.frames.clone();

        thread::spawn(move || {
            let emit = |name: &str, code: i64| {
                dispatch_signal(handler.as_ref(), name, code);
            };

            emit("starting", 0);
            thread::sleep(Duration::from_millis(300));

            if endpoint.contains("unreachable") {
                running.store(false, Ordering::SeqCst);
                emit("stop", -2);
                return;
            }
            emit("start", 0);

            let mut ticks = 0u64;
            while running.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(33));
                frames.fetch_add(1, Ordering::SeqCst);
                ticks += 1;

                if endpoint.contains("flaky") && ticks == 60 {
                    emit("reconnect", 0);
                    thread::sleep(Duration::from_millis(500));
                    emit("reconnect_success", 0);
                }
            }

            emit("stopping", 0);
            thread::sleep(Duration::from_millis(100));
            emit("deactivate", 0);
            emit("stop", 0);
        });
        true
    }

    fn force_stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn total_frames(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct SimHost {
    next_id: AtomicU64,
    // The most recently created service; the next output binds to it
    pending: Mutex<Option<SharedSettings>>,
}

impl OutputHost for SimHost {
    fn create_output(&self, _kind: &str, _name: &str) -> Result<Box<dyn HostOutput>, String> {
        let settings = self
            .pending
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| "create the service first".to_string())?;
        Ok(Box::new(SimOutput {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            settings,
            handler: None,
            frames: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
        }))
    }

    fn create_service(&self, _kind: &str, _name: &str) -> Result<Box<dyn HostService>, String> {
        let settings: SharedSettings = Arc::default();
        *self.pending.lock().unwrap() = Some(settings.clone());
        Ok(Box::new(SimService { settings }))
    }

    fn primary_encoders(&self) -> Option<PrimaryEncoders> {
        Some(PrimaryEncoders {
            video: EncoderRef(100),
            audio: EncoderRef(200),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("multi_rtmp=info".parse()?)
                .add_directive("simulated_host=info".parse()?),
        )
        .init();

    let config_store = Arc::new(MemoryConfigStore::new());
    let (handle, task) = OutputManager::spawn(
        Arc::new(SimHost::default()),
        config_store.clone(),
        ManagerConfig::default(),
    );

    let mut events = handle.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ManagerEvent::SessionChanged(s) => {
                    println!("[{}] {:<10} {:<12} {}", s.id, s.record.name, s.state, s.status)
                }
                ManagerEvent::Telemetry { session, fps } => println!("[{}] {} FPS", session, fps),
                ManagerEvent::StreamFailed { session, error } => {
                    println!("[{}] ! {}", session, error)
                }
                _ => {}
            }
        }
    });

    let targets = [
        TargetRecord::new("Primary", "rtmp://ingest.example/live", "key-a"),
        TargetRecord::new("Flaky", "rtmp://flaky.example/live", "key-b"),
        TargetRecord::new("Offline", "rtmp://unreachable.example/live", "key-c"),
    ];
    let mut ids = Vec::new();
    for target in targets {
        let id = handle.add(target).await?;
        handle.start(id).await?;
        ids.push(id);
    }

    tokio::time::sleep(Duration::from_secs(5)).await;

    for id in &ids {
        handle.stop(*id).await?;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    for snapshot in handle.enumerate().await? {
        println!(
            "{} -> {} ({})",
            snapshot.record.display_name(),
            snapshot.state,
            if snapshot.status.is_empty() { "ok" } else { snapshot.status.as_str() }
        );
    }

    handle.shutdown().await?;
    task.await?;
    println!(
        "Saved {} bytes of target configuration",
        config_store
            .get_string("obs-multi-rtmp", "targets")
            .map_or(0, |s| s.len())
    );
    Ok(())
}
