use std::any::Any;
use std::sync::{Arc, Mutex};

use strata_plugin_api::{
    ActivationListener, BoxError, Component, HostContext, ServiceResolver, SymbolTable,
    STRATA_PLUGIN_API_VERSION,
};

use crate::bundle::StaticBundleLoader;
use crate::host::{HostEnv, PluginHost};
use crate::manifest::PackageManifest;

pub(crate) struct Tagged {
    pub(crate) tag: String,
}

impl Component for Tagged {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn tagged_v1(_: &dyn ServiceResolver) -> Result<Arc<dyn Component>, BoxError> {
    Ok(Arc::new(Tagged { tag: "v1".into() }))
}

pub(crate) fn tagged_v2(_: &dyn ServiceResolver) -> Result<Arc<dyn Component>, BoxError> {
    Ok(Arc::new(Tagged { tag: "v2".into() }))
}

pub(crate) fn failing_ctor(_: &dyn ServiceResolver) -> Result<Arc<dyn Component>, BoxError> {
    Err("constructor rejected".into())
}

pub(crate) fn tag_of(instance: &Arc<dyn Component>) -> String {
    instance
        .as_any()
        .downcast_ref::<Tagged>()
        .map(|t| t.tag.clone())
        .unwrap_or_else(|| "untagged".into())
}

pub(crate) struct NoServices;

impl ServiceResolver for NoServices {
    fn service(&self, _name: &str) -> Option<Arc<dyn Component>> {
        None
    }
}

pub(crate) type EventLog = Mutex<Vec<String>>;

pub(crate) fn event_ctx() -> HostContext {
    HostContext::new(EventLog::new(Vec::new()))
}

pub(crate) fn events_in(ctx: &HostContext) -> Vec<String> {
    ctx.get::<EventLog>()
        .and_then(|log| log.lock().ok().map(|v| v.clone()))
        .unwrap_or_default()
}

fn push_event(ctx: &HostContext, event: &str) {
    if let Some(log) = ctx.get::<EventLog>() {
        if let Ok(mut events) = log.lock() {
            events.push(event.to_string());
        }
    }
}

struct RecordingListener;

impl ActivationListener for RecordingListener {
    fn on_prepared(&self, ctx: &HostContext) -> Result<(), BoxError> {
        push_event(ctx, "prepared");
        Ok(())
    }

    fn on_switched(&self, ctx: &HostContext) -> Result<(), BoxError> {
        push_event(ctx, "switched");
        Ok(())
    }
}

pub(crate) fn recording_listener() -> Arc<dyn ActivationListener> {
    Arc::new(RecordingListener)
}

struct RejectingListener;

impl ActivationListener for RejectingListener {
    fn on_prepared(&self, _ctx: &HostContext) -> Result<(), BoxError> {
        Err("listener rejected".into())
    }

    fn on_switched(&self, _ctx: &HostContext) -> Result<(), BoxError> {
        Ok(())
    }
}

pub(crate) fn rejecting_listener() -> Arc<dyn ActivationListener> {
    Arc::new(RejectingListener)
}

pub(crate) fn manifest(code: &str) -> PackageManifest {
    PackageManifest {
        code: code.to_string(),
        api_version: STRATA_PLUGIN_API_VERSION,
        name: None,
        library: None,
        entry_symbol: None,
        components: Default::default(),
        listener: None,
        wiring: false,
        identity: Default::default(),
    }
}

pub(crate) fn host_with(packages: Vec<(PackageManifest, fn() -> SymbolTable)>) -> PluginHost {
    let mut loader = StaticBundleLoader::new();
    for (manifest, build) in packages {
        loader.register(manifest, build);
    }
    PluginHost::new(HostEnv::new(Arc::new(loader)))
}
