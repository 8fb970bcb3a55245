use span_instrument::{
    install_backend, on_enter, on_exit, traced, AmbientContext, AttributeValue, CallOutcome,
    CompletedOperation, Invocation, MethodMeta, NameCache, OperationRecord, PropagationContext,
    SpanKind, SpanStatus, TargetSelector, TracingBackend, TypeDescriptor, Visibility,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, OnceLock};

/// Backend that records every start/end for verification. Suppresses nested
/// duplicate wrapping: a unit only starts under a root ambient context.
struct RecordingBackend {
    starts: Mutex<Vec<(String, PropagationContext)>>,
    ends: Mutex<Vec<CompletedOperation>>,
}

impl RecordingBackend {
    fn new() -> Self {
        Self {
            starts: Mutex::new(Vec::new()),
            ends: Mutex::new(Vec::new()),
        }
    }

    fn starts_named(&self, name: &str) -> Vec<(String, PropagationContext)> {
        self.starts
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .cloned()
            .collect()
    }

    fn ends_named(&self, name: &str) -> Vec<CompletedOperation> {
        self.ends
            .lock()
            .unwrap()
            .iter()
            .filter(|span| span.name == name)
            .cloned()
            .collect()
    }
}

impl TracingBackend for RecordingBackend {
    fn should_start(&self, parent: &PropagationContext, _invocation: &Invocation) -> bool {
        parent.is_root()
    }

    fn start(
        &self,
        parent: &PropagationContext,
        _invocation: &Invocation,
        name: String,
        kind: SpanKind,
    ) -> OperationRecord {
        self.starts.lock().unwrap().push((name.clone(), *parent));
        OperationRecord::begin(*parent, name, kind)
    }

    fn end(&self, record: OperationRecord, _invocation: &Invocation, outcome: CallOutcome) {
        self.ends.lock().unwrap().push(record.complete(&outcome));
    }
}

/// Installs the recording backend exactly once for the whole test binary.
/// Every test goes through this before touching the advice, so the lazily
/// constructed instrumenter binds to it.
fn recorder() -> &'static Arc<RecordingBackend> {
    static RECORDER: OnceLock<Arc<RecordingBackend>> = OnceLock::new();
    RECORDER.get_or_init(|| {
        let backend = Arc::new(RecordingBackend::new());
        install_backend(backend.clone()).expect("first install");
        backend
    })
}

/// Marker-based selector: stereotype-annotated types, public methods only.
struct MarkerSelector {
    markers: Vec<String>,
}

impl TargetSelector for MarkerSelector {
    fn matches_type(&self, candidate: &TypeDescriptor) -> bool {
        self.markers.iter().any(|m| candidate.has_marker(m))
    }

    fn matches_method(&self, _owner: &TypeDescriptor, method: &MethodMeta) -> bool {
        method.is_public()
    }
}

fn stereotype_selector() -> MarkerSelector {
    MarkerSelector {
        markers: vec!["Service".to_string(), "Component".to_string()],
    }
}

fn service(module: &str, name: &str) -> Arc<TypeDescriptor> {
    Arc::new(TypeDescriptor::named(module, name).with_markers(["Service"]))
}

#[test]
fn scenario_a_normal_return_records_one_span() {
    let backend = recorder();
    let selector = stereotype_selector();

    let owner = service("app::orders", "OrderService");
    let place = MethodMeta::new("place", Visibility::Public);
    assert!(selector.matches_type(&owner));
    assert!(selector.matches_method(&owner, &place));

    let invocation = Invocation::new(Arc::clone(&owner), place.name());
    let guard = on_enter(&invocation);
    assert!(guard.is_started());
    let confirmation: i64 = 42; // the wrapped call's return value
    on_exit(
        guard,
        &invocation,
        CallOutcome::Success(Some(AttributeValue::Int(confirmation))),
    );

    assert_eq!(backend.starts_named("OrderService.place").len(), 1);
    let ends = backend.ends_named("OrderService.place");
    assert_eq!(ends.len(), 1);
    let span = &ends[0];
    assert_eq!(span.kind, SpanKind::Internal);
    assert_eq!(span.status, SpanStatus::Ok);
    assert_eq!(span.parent_span_id, 0);
    assert_eq!(
        span.attributes.get("call.result"),
        Some(&AttributeValue::Int(42))
    );
    assert!(AmbientContext::current().is_root());
}

#[test]
fn scenario_b_panic_is_recorded_and_propagates_unchanged() {
    let backend = recorder();
    let owner = service("app::shipping", "ShipmentService");
    let invocation = Invocation::new(owner, "dispatch");

    let result = catch_unwind(AssertUnwindSafe(|| {
        traced(&invocation, || -> u32 { panic!("no capacity") })
    }));

    let payload = result.expect_err("the wrapped call's panic must reach the caller");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"no capacity"));

    assert_eq!(backend.starts_named("ShipmentService.dispatch").len(), 1);
    let ends = backend.ends_named("ShipmentService.dispatch");
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].status, SpanStatus::Error);
    assert_eq!(
        ends[0].attributes.get("error.message"),
        Some(&AttributeValue::String("no capacity".to_string()))
    );
    assert!(AmbientContext::current().is_root());
}

#[test]
fn scenario_c_nested_call_is_skipped_but_still_runs() {
    let backend = recorder();
    let owner = service("app::billing", "BillingService");
    let invoice = Invocation::new(Arc::clone(&owner), "invoice");
    let settle = Invocation::new(owner, "settle");

    let mut inner_ran = false;
    traced(&invoice, || {
        let during_outer = AmbientContext::current();
        assert!(!during_outer.is_root());

        let settled = traced(&settle, || {
            inner_ran = true;
            // The skipped advice left the outer unit ambient.
            assert_eq!(AmbientContext::current(), during_outer);
            7_u32
        });
        assert_eq!(settled, 7);
        assert_eq!(AmbientContext::current(), during_outer);
    });

    assert!(inner_ran);
    assert_eq!(backend.starts_named("BillingService.invoice").len(), 1);
    assert_eq!(backend.ends_named("BillingService.invoice").len(), 1);
    assert!(backend.starts_named("BillingService.settle").is_empty());
    assert!(backend.ends_named("BillingService.settle").is_empty());
    assert!(AmbientContext::current().is_root());
}

#[test]
fn scenario_d_transient_type_is_reclaimable() {
    let cache = NameCache::new();
    let transient = Arc::new(
        TypeDescriptor::named("app::jobs", "RetryJob").with_markers(["Component"]),
    );
    let liveness = Arc::downgrade(&transient);

    assert_eq!(cache.name_for(&transient, "run"), "RetryJob.run");
    drop(transient);

    // The cache holds only a weak reference; no eviction code has run yet.
    assert!(liveness.upgrade().is_none());
    assert_eq!(cache.live_owners(), 0);

    // Inserting the next owner sweeps the dead entry.
    let next = service("app::jobs", "CleanupJob");
    cache.name_for(&next, "run");
    assert_eq!(cache.tracked_owners(), 1);
}

#[test]
fn concurrent_traced_calls_each_record_once() {
    let backend = recorder();
    let owner = service("app::parallel", "ParallelService");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let owner = Arc::clone(&owner);
        handles.push(std::thread::spawn(move || {
            let invocation = Invocation::new(owner, "work");
            traced(&invocation, || ());
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let ends = backend.ends_named("ParallelService.work");
    assert_eq!(ends.len(), 8);
    for span in &ends {
        assert_eq!(span.kind, SpanKind::Internal);
        assert_eq!(span.status, SpanStatus::Ok);
        assert_eq!(span.parent_span_id, 0);
        assert_ne!(span.span_id, 0);
    }
}

#[test]
fn selector_rejects_unmarked_types_and_private_methods() {
    let selector = stereotype_selector();

    let plain = TypeDescriptor::named("app::util", "Formatter");
    assert!(!selector.matches_type(&plain));

    let marked = service("app::orders", "OrderService");
    let helper = MethodMeta::new("validate", Visibility::Private);
    assert!(!selector.matches_method(&marked, &helper));
}

#[test]
fn second_backend_install_is_rejected() {
    recorder();
    let result = install_backend(Arc::new(span_instrument::NoopBackend));
    assert!(result.is_err());
}
