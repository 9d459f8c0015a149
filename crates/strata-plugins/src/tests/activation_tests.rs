use strata_plugin_api::{HostContext, SymbolTable};

use super::{ActivationOptions, ActivationState};
use crate::error::Error;
use crate::testsupport::{
    event_ctx, events_in, failing_ctor, host_with, manifest, rejecting_listener,
    recording_listener, tagged_v1,
};
use crate::types::{CapabilityKind, IdentityKind};

fn dual_partner_table() -> SymbolTable {
    let mut table = SymbolTable::new();
    table.component("demo.p.A", tagged_v1);
    table.component("demo.p.B", tagged_v1);
    table.component("demo.e.X", tagged_v1);
    table
}

fn listener_pack_table() -> SymbolTable {
    let mut table = SymbolTable::new();
    table.component("demo.ext", tagged_v1);
    table.listener("demo.Listener", recording_listener);
    table
}

fn rejecting_pack_table() -> SymbolTable {
    let mut table = SymbolTable::new();
    table.component("demo.ext", tagged_v1);
    table.listener("demo.Reject", rejecting_listener);
    table
}

fn mixed_health_table() -> SymbolTable {
    let mut table = SymbolTable::new();
    table.component("demo.ok", tagged_v1);
    table.component("demo.bad", failing_ctor);
    table
}

fn partner_options() -> ActivationOptions {
    ActivationOptions {
        use_container: false,
        identity_kind: IdentityKind::Partner,
        host_ctx: HostContext::default(),
    }
}

#[test]
fn two_partner_classes_abort_commit_atomically() {
    let mut dual = manifest("dual");
    dual.components.partner = vec!["demo.p.A".into(), "demo.p.B".into()];
    dual.components.extension = vec!["demo.e.X".into()];
    let host = host_with(vec![(dual, dual_partner_table)]);
    let registry = host.registry();

    let err = host
        .load_package("dual", &partner_options())
        .err()
        .expect("must fail");
    assert!(matches!(err, Error::Configuration { .. }));
    // Nothing from the package leaks through, the extension included.
    assert!(registry.lookup(CapabilityKind::Extension).is_empty());
    assert_eq!(registry.size(), 0);
    assert!(host.activation("dual").is_none());
}

#[test]
fn single_partner_package_commits() {
    let mut single = manifest("single");
    single.components.partner = vec!["demo.p.A".into()];
    single.components.extension = vec!["demo.e.X".into()];
    let host = host_with(vec![(single, dual_partner_table)]);

    let handle = host
        .load_package("single", &partner_options())
        .expect("activate");
    assert_eq!(handle.code(), "single");
    assert_eq!(handle.state(), ActivationState::Active);
    assert!(host.registry().lookup_one(CapabilityKind::Partner).is_some());
    assert_eq!(host.registry().lookup(CapabilityKind::Extension).len(), 1);
}

#[test]
fn hooks_run_in_order_on_the_driving_thread() {
    let mut pack = manifest("hooked");
    pack.components.extension = vec!["demo.ext".into()];
    pack.listener = Some("demo.Listener".into());
    let host = host_with(vec![(pack, listener_pack_table)]);

    let options = ActivationOptions {
        host_ctx: event_ctx(),
        ..ActivationOptions::default()
    };
    host.load_package("hooked", &options).expect("activate");
    assert_eq!(events_in(&options.host_ctx), ["prepared", "switched"]);
}

#[test]
fn package_without_listener_skips_hooks() {
    let mut pack = manifest("plain");
    pack.components.extension = vec!["demo.ext".into()];
    let host = host_with(vec![(pack, listener_pack_table)]);

    let options = ActivationOptions {
        host_ctx: event_ctx(),
        ..ActivationOptions::default()
    };
    let handle = host.load_package("plain", &options).expect("activate");
    assert_eq!(handle.state(), ActivationState::Active);
    assert!(events_in(&options.host_ctx).is_empty());
}

#[test]
fn failing_on_prepared_hook_fails_activation_with_no_registry_effect() {
    let mut pack = manifest("rejected");
    pack.components.extension = vec!["demo.ext".into()];
    pack.listener = Some("demo.Reject".into());
    let host = host_with(vec![(pack, rejecting_pack_table)]);
    let registry = host.registry();

    let err = host
        .load_package("rejected", &ActivationOptions::default())
        .err()
        .expect("must fail");
    assert!(matches!(err, Error::ListenerHook { hook: "on_prepared", .. }));
    assert_eq!(registry.size(), 0);
    assert!(host.activation("rejected").is_none());
}

#[test]
fn missing_wiring_descriptor_leaves_registry_unchanged() {
    let mut settled = manifest("settled");
    settled.components.extension = vec!["demo.ext".into()];
    let mut billing = manifest("billing");
    billing.components.extension = vec!["demo.ext".into()];
    let host = host_with(vec![
        (settled, listener_pack_table),
        (billing, listener_pack_table),
    ]);
    let registry = host.registry();
    host.load_package("settled", &ActivationOptions::default())
        .expect("baseline activation");
    let before = registry.entries(CapabilityKind::Extension);

    let options = ActivationOptions {
        use_container: true,
        ..ActivationOptions::default()
    };
    let err = host
        .load_package("billing", &options)
        .err()
        .expect("must fail");
    assert!(matches!(err, Error::Wiring { .. }));

    let after = registry.entries(CapabilityKind::Extension);
    assert_eq!(registry.size(), 1);
    assert_eq!(before.len(), after.len());
    assert_eq!(before[0].code, after[0].code);
    assert!(std::sync::Arc::ptr_eq(&before[0].instance, &after[0].instance));
}

#[test]
fn declared_component_without_symbol_is_a_package_load_error() {
    let mut pack = manifest("broken");
    pack.components.extension = vec!["demo.ghost".into()];
    let host = host_with(vec![(pack, listener_pack_table)]);

    let err = host
        .load_package("broken", &ActivationOptions::default())
        .err()
        .expect("must fail");
    assert!(matches!(err, Error::PackageLoad { .. }));
    assert_eq!(host.registry().size(), 0);
}

#[test]
fn one_failing_constructor_aborts_the_whole_batch() {
    let mut pack = manifest("mixed");
    pack.components.extension = vec!["demo.ok".into(), "demo.bad".into()];
    let host = host_with(vec![(pack, mixed_health_table)]);
    let registry = host.registry();

    let err = host
        .load_package("mixed", &ActivationOptions::default())
        .err()
        .expect("must fail");
    assert!(matches!(err, Error::Configuration { .. }));
    // `demo.ok` resolved first, but the batch never reached the registry.
    assert!(registry.lookup(CapabilityKind::Extension).is_empty());
}
