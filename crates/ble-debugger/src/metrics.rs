use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

#[derive(Clone)]
pub struct MetricsHub {
    pub registry: Registry,
    pub requests_started: IntCounter,
    pub requests_resolved: IntCounter,
    pub requests_rejected: IntCounter,
    pub frames_decoded: IntCounter,
    pub frames_unknown: IntCounter,
    pub frames_malformed: IntCounter,
    pub events_emitted: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, String> {
    let c = IntCounter::new(name, help).map_err(|e| format!("metrics init error: {e}"))?;
    registry
        .register(Box::new(c.clone()))
        .map_err(|e| format!("metrics register error: {e}"))?;
    Ok(c)
}

impl MetricsHub {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        Ok(Self {
            requests_started: counter(
                &registry,
                "btdbg_requests_started",
                "Device requests seen by the interceptor",
            )?,
            requests_resolved: counter(
                &registry,
                "btdbg_requests_resolved",
                "Device requests that resolved with a device",
            )?,
            requests_rejected: counter(
                &registry,
                "btdbg_requests_rejected",
                "Device requests that failed",
            )?,
            frames_decoded: counter(
                &registry,
                "btdbg_frames_decoded",
                "Frames decoded to a known command",
            )?,
            frames_unknown: counter(
                &registry,
                "btdbg_frames_unknown",
                "Frames whose opcode no table knows",
            )?,
            frames_malformed: counter(
                &registry,
                "btdbg_frames_malformed",
                "Frames too short to decode",
            )?,
            events_emitted: counter(
                &registry,
                "btdbg_events_emitted",
                "Log events delivered to subscribers",
            )?,
            registry,
        })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
