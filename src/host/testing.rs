//! In-process host used by unit tests

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use super::{
    dispatch_signal, HostOutput, HostService, OutputEventHandler, OutputHost, PrimaryEncoders,
    EncoderRef, ServiceSettings,
};

/// Observable state of one fake output
#[derive(Default)]
pub(crate) struct FakeOutput {
    handler: Mutex<Option<Arc<dyn OutputEventHandler>>>,
    pub encoders: Mutex<Option<PrimaryEncoders>>,
    pub service_bound: AtomicBool,
    pub starts: AtomicUsize,
    pub force_stops: AtomicUsize,
    pub active: AtomicBool,
    pub frames: AtomicU64,
    pub released: AtomicBool,
}

impl FakeOutput {
    /// Fire a named signal on a separate thread, the way a real host does
    pub fn fire(&self, name: &'static str, code: i64) {
        if name == "stop" {
            self.active.store(false, Ordering::SeqCst);
        }
        let handler = self.handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            thread::spawn(move || {
                dispatch_signal(handler.as_ref(), name, code);
            })
            .join()
            .unwrap();
        }
    }

    pub fn set_frames(&self, frames: u64) {
        self.frames.store(frames, Ordering::SeqCst);
    }
}

/// Observable state of one fake service
#[derive(Default)]
pub(crate) struct FakeService {
    pub settings: Mutex<Vec<ServiceSettings>>,
    pub released: AtomicBool,
}

#[derive(Default)]
struct Shared {
    primary: Mutex<Option<PrimaryEncoders>>,
    outputs: Mutex<Vec<Arc<FakeOutput>>>,
    services: Mutex<Vec<Arc<FakeService>>>,
    refuse_start: AtomicBool,
    fail_create: AtomicBool,
}

/// Fake [`OutputHost`]
#[derive(Clone, Default)]
pub(crate) struct FakeHost {
    shared: Arc<Shared>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host with an active primary output
    pub fn with_primary() -> Self {
        let host = Self::new();
        host.set_primary(true);
        host
    }

    pub fn set_primary(&self, active: bool) {
        *self.shared.primary.lock().unwrap() = active.then_some(PrimaryEncoders {
            video: EncoderRef(1),
            audio: EncoderRef(2),
        });
    }

    pub fn refuse_start(&self, refuse: bool) {
        self.shared.refuse_start.store(refuse, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.shared.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Outputs in creation order
    pub fn outputs(&self) -> Vec<Arc<FakeOutput>> {
        self.shared.outputs.lock().unwrap().clone()
    }

    pub fn output(&self, index: usize) -> Arc<FakeOutput> {
        self.outputs()[index].clone()
    }

    pub fn services(&self) -> Vec<Arc<FakeService>> {
        self.shared.services.lock().unwrap().clone()
    }
}

struct OutputHandle {
    state: Arc<FakeOutput>,
    refuse_start: bool,
}

impl HostOutput for OutputHandle {
    fn set_service(&mut self, _service: &dyn HostService) {
        self.state.service_bound.store(true, Ordering::SeqCst);
    }

    fn connect_events(&mut self, handler: Arc<dyn OutputEventHandler>) {
        *self.state.handler.lock().unwrap() = Some(handler);
    }

    fn set_encoders(&mut self, encoders: PrimaryEncoders) {
        *self.state.encoders.lock().unwrap() = Some(encoders);
    }

    fn start(&mut self) -> bool {
        self.state.starts.fetch_add(1, Ordering::SeqCst);
        if self.refuse_start {
            return false;
        }
        self.state.active.store(true, Ordering::SeqCst);
        true
    }

    fn force_stop(&mut self) {
        self.state.force_stops.fetch_add(1, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    fn total_frames(&self) -> u64 {
        self.state.frames.load(Ordering::SeqCst)
    }
}

impl Drop for OutputHandle {
    fn drop(&mut self) {
        self.state.released.store(true, Ordering::SeqCst);
    }
}

struct ServiceHandle {
    state: Arc<FakeService>,
}

impl HostService for ServiceHandle {
    fn update(&mut self, settings: &ServiceSettings) {
        self.state.settings.lock().unwrap().push(settings.clone());
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.state.released.store(true, Ordering::SeqCst);
    }
}

impl OutputHost for FakeHost {
    fn create_output(&self, kind: &str, _name: &str) -> Result<Box<dyn HostOutput>, String> {
        if self.shared.fail_create.load(Ordering::SeqCst) {
            return Err(format!("cannot create {}", kind));
        }
        let state = Arc::new(FakeOutput::default());
        self.shared.outputs.lock().unwrap().push(state.clone());
        Ok(Box::new(OutputHandle {
            state,
            refuse_start: self.shared.refuse_start.load(Ordering::SeqCst),
        }))
    }

    fn create_service(&self, kind: &str, _name: &str) -> Result<Box<dyn HostService>, String> {
        if self.shared.fail_create.load(Ordering::SeqCst) {
            return Err(format!("cannot create {}", kind));
        }
        let state = Arc::new(FakeService::default());
        self.shared.services.lock().unwrap().push(state.clone());
        Ok(Box::new(ServiceHandle { state }))
    }

    fn primary_encoders(&self) -> Option<PrimaryEncoders> {
        *self.shared.primary.lock().unwrap()
    }
}
