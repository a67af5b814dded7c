use super::*;
use crate::model::{DatasetSpec, FieldSpec};
use dynaset_primitives::Kind;
use std::sync::{
    OnceLock,
    atomic::{AtomicUsize, Ordering},
};

fn contacts() -> Arc<Dictionary> {
    Arc::new(Dictionary::new(
        0,
        DatasetSpec::new("contacts", "contacts")
            .with_field(FieldSpec::of_kind("id", Kind::Int64))
            .with_field(FieldSpec::of_kind("name", Kind::String))
            .with_primary("id")
            .with_display("name.common_name")
            .extendable(),
    ))
}

fn cities(domain_id: i64) -> Arc<Dictionary> {
    Arc::new(Dictionary::new(
        domain_id,
        DatasetSpec::new("cities", "dictionaries/cities")
            .with_field(FieldSpec::of_kind("id", Kind::Int64))
            .with_primary("id"),
    ))
}

///
/// Backend
///
/// In-memory resolver standing in for an external store.
///

#[derive(Default)]
struct Backend {
    registry: OnceLock<WeakRegistry>,
    extensions: Mutex<HashMap<(i64, String), DatasetSpec>>,
    dictionaries: Mutex<HashMap<(i64, String), Arc<Dictionary>>>,
    calls: AtomicUsize,
    fail: std::sync::atomic::AtomicBool,
}

impl Backend {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TypeResolver for Backend {
    fn resolve_dictionary(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Dictionary>>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::resolver("backend offline"));
        }

        Ok(self
            .dictionaries
            .lock()
            .get(&(domain_id, path.to_string()))
            .cloned())
    }

    fn resolve_extension(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Extension>>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let spec = self
            .extensions
            .lock()
            .get(&(domain_id, path.to_string()))
            .cloned();
        let Some(registry) = self.registry.get() else {
            return Ok(None);
        };
        let lookup: Arc<dyn DictionaryLookup> = Arc::new(registry.clone());

        Ok(spec.map(|spec| Arc::new(Extension::with_lookup(domain_id, spec, lookup))))
    }
}

fn with_backend() -> (Registry, Arc<Backend>) {
    let backend = Arc::new(Backend::default());
    let registry = Registry::new().with_resolver(Arc::clone(&backend) as Arc<dyn TypeResolver>);
    let _ = backend.registry.set(registry.downgrade());

    (registry, backend)
}

#[test]
fn keys_are_lowercased_deduplicated_and_non_empty() {
    let same = Descriptor::from(Dictionary::new(0, DatasetSpec::new("Cities", "CITIES")));
    let blank = Descriptor::from(Dictionary::new(0, DatasetSpec::new("", "a/b")));

    assert_eq!(index_keys(&same), ["cities"]);
    assert_eq!(index_keys(&blank), ["a/b"]);
    assert_eq!(index_keys(&cities(0).into()), ["cities", "dictionaries/cities"]);
}

#[test]
fn registered_descriptors_are_found_by_either_key() {
    let registry = Registry::new();
    registry.register(cities(0)).unwrap();

    assert!(registry.lookup(0, "Cities").is_some());
    assert!(registry.lookup(0, "dictionaries/cities").is_some());
    assert!(registry.lookup(1, "cities").is_none());
}

#[test]
fn domains_are_created_on_register_and_dropped_when_empty() {
    let registry = Registry::new();
    assert_eq!(registry.domain_count(), 1);

    let local = Descriptor::from(cities(4));
    registry.register(local.clone()).unwrap();
    assert_eq!(registry.domain_count(), 2);

    assert!(registry.unregister(&local));
    assert_eq!(registry.domain_count(), 1);
    assert!(registry.lookup(4, "cities").is_none());
}

#[test]
fn global_descriptors_cannot_be_unregistered() {
    let registry = Registry::new();
    let global = Descriptor::from(cities(0));
    registry.register(global.clone()).unwrap();

    assert!(!registry.unregister(&global));
    assert!(!registry.invalidate(0, "cities"));
    assert!(registry.lookup(0, "cities").is_some());
    assert_eq!(registry.get_dictionary(0, "cities").unwrap().unwrap().name(), "cities");
}

#[test]
fn invalidate_drops_domain_entries() {
    let registry = Registry::new();
    registry.register(cities(2)).unwrap();

    assert!(registry.invalidate(2, "dictionaries/cities"));
    assert!(registry.lookup(2, "cities").is_none());
    assert!(!registry.invalidate(2, "cities"));
}

#[test]
fn conflicting_registration_is_rejected_and_counted() {
    let registry = Registry::new();
    registry.register(cities(0)).unwrap();
    registry.register(contacts()).unwrap();

    let overlap = Dictionary::new(0, DatasetSpec::new("contacts", "dictionaries/cities"));
    let err = registry.register(overlap).unwrap_err();

    assert_eq!(err.class(), ErrorClass::Conflict);
    assert_eq!(Error::from(err).class, ErrorClass::Conflict);
    assert_eq!(registry.metrics().conflicts, 1);
    assert_eq!(registry.lookup(0, "contacts").unwrap().path(), "contacts");
}

#[test]
fn dictionary_lookup_falls_back_to_global() {
    let registry = Registry::new();
    registry.register(cities(0)).unwrap();

    let found = registry.get_dictionary(9, "CITIES").unwrap().unwrap();
    assert_eq!(found.domain_id(), 0);
    assert_eq!(registry.get_dictionary(-3, "cities").unwrap().unwrap().domain_id(), 0);
    assert!(registry.get_dictionary(9, "").unwrap().is_none());
    assert_eq!(registry.metrics().hits, 2);
}

#[test]
fn domain_dictionary_shadows_global() {
    let registry = Registry::new();
    registry.register(cities(0)).unwrap();
    registry.register(cities(5)).unwrap();

    assert_eq!(registry.get_dictionary(5, "cities").unwrap().unwrap().domain_id(), 5);
    assert_eq!(registry.get_dictionary(6, "cities").unwrap().unwrap().domain_id(), 0);
}

#[test]
fn resolved_domain_dictionaries_are_cached() {
    let (registry, backend) = with_backend();
    backend
        .dictionaries
        .lock()
        .insert((3, "cities".into()), cities(3));

    assert!(registry.get_dictionary(3, "Cities").unwrap().is_some());
    assert!(registry.get_dictionary(3, "cities").unwrap().is_some());
    assert_eq!(backend.calls(), 1);
    assert!(registry.lookup(3, "cities").is_some());
}

#[test]
fn resolved_global_dictionaries_are_not_cached_under_a_domain() {
    let (registry, backend) = with_backend();
    backend
        .dictionaries
        .lock()
        .insert((3, "cities".into()), cities(0));

    assert_eq!(
        registry.get_dictionary(3, "cities").unwrap().unwrap().domain_id(),
        0
    );
    assert!(registry.lookup(3, "cities").is_none());
    assert!(registry.lookup(0, "cities").is_none());

    registry.get_dictionary(3, "cities").unwrap();
    assert_eq!(backend.calls(), 2);
}

#[test]
fn mismatched_domains_are_discarded() {
    let (registry, backend) = with_backend();
    backend
        .dictionaries
        .lock()
        .insert((3, "cities".into()), cities(8));

    assert!(registry.get_dictionary(3, "cities").unwrap().is_none());
    assert!(registry.lookup(8, "cities").is_none());
    assert_eq!(registry.metrics().discarded, 1);
}

#[test]
fn resolver_is_not_consulted_for_the_global_domain() {
    let (registry, backend) = with_backend();

    assert!(registry.get_dictionary(0, "cities").unwrap().is_none());
    assert!(registry.get_extension(0, "contacts").unwrap().is_none());
    assert_eq!(backend.calls(), 0);
}

#[test]
fn resolver_errors_propagate() {
    let (registry, backend) = with_backend();
    backend.fail.store(true, Ordering::SeqCst);

    let err = registry.get_dictionary(3, "cities").unwrap_err();
    assert_eq!(err.class(), ErrorClass::Resolver);

    let err = Error::from(err);
    assert_eq!(err.origin, crate::error::ErrorOrigin::Resolver);
    assert_eq!(registry.metrics().resolver_errors, 1);
}

#[test]
fn extension_scenario_for_contacts() {
    let (registry, backend) = with_backend();
    registry.register(contacts()).unwrap();

    assert!(registry.get_extension(7, "contacts").unwrap().is_none());

    backend.extensions.lock().insert(
        (7, "contacts".into()),
        DatasetSpec::new("contacts", "").with_field(FieldSpec::of_kind("vip", Kind::Bool)),
    );

    let ext = registry.get_extension(7, "contacts").unwrap().unwrap();
    let names: Vec<_> = ext.fields().iter().map(|f| f.name().to_string()).collect();
    assert_eq!(names, ["id", "vip"]);
    assert_eq!(ext.public_view().fields.len(), 1);
    assert_eq!(ext.export().primary, "id");
    assert_eq!(ext.validate(), Ok(()));

    let again = registry.get_extension(7, "extensions/contacts").unwrap().unwrap();
    assert!(Arc::ptr_eq(&ext, &again));
    assert_eq!(backend.calls(), 2);
}

#[test]
fn extensions_reporting_another_domain_are_discarded() {
    let wrong = Arc::new(Extension::from_base(
        8,
        contacts(),
        DatasetSpec::new("contacts", ""),
    ));
    let registry = Registry::new().with_resolver(Arc::new(Fixed(wrong)));

    assert!(registry.get_extension(7, "contacts").unwrap().is_none());
    assert!(registry.lookup(8, "contacts").is_none());
    assert_eq!(registry.metrics().discarded, 1);
}

struct Fixed(Arc<Extension>);

impl TypeResolver for Fixed {
    fn resolve_dictionary(&self, _: i64, _: &str) -> Result<Option<Arc<Dictionary>>, Error> {
        Ok(None)
    }

    fn resolve_extension(&self, _: i64, _: &str) -> Result<Option<Arc<Extension>>, Error> {
        Ok(Some(Arc::clone(&self.0)))
    }
}

#[test]
fn with_resolver_shares_domains() {
    let base = Registry::new();
    let resolver: Arc<dyn TypeResolver> = Arc::new(Backend::default());

    let chained = base.with_resolver(Arc::clone(&resolver));
    chained.register(cities(0)).unwrap();
    assert!(base.lookup(0, "cities").is_some());
    assert!(!base.has_resolver());
    assert!(chained.has_resolver());

    let same = chained.with_resolver(Arc::clone(&resolver));
    assert!(Arc::ptr_eq(
        same.resolver.as_ref().unwrap(),
        chained.resolver.as_ref().unwrap()
    ));

    let other = chained.with_resolver(Arc::new(Backend::default()));
    assert!(!Arc::ptr_eq(
        other.resolver.as_ref().unwrap(),
        chained.resolver.as_ref().unwrap()
    ));
}

#[test]
fn for_each_global_dictionary_skips_other_domains() {
    let registry = Registry::new();
    registry.register(cities(0)).unwrap();
    registry.register(contacts()).unwrap();
    registry.register(cities(3)).unwrap();

    let mut seen = Vec::new();
    registry.for_each_global_dictionary(|dictionary| {
        seen.push(dictionary.name().to_string());
        true
    });

    assert_eq!(seen, ["cities", "contacts"]);
}

#[test]
fn weak_handles_stop_resolving_once_dropped() {
    let registry = Registry::new();
    registry.register(cities(0)).unwrap();
    let weak = registry.downgrade();

    assert!(weak.lookup_dictionary(0, "cities").unwrap().is_some());
    drop(registry);
    assert!(weak.upgrade().is_none());
    assert!(weak.lookup_dictionary(0, "cities").unwrap().is_none());
}

#[test]
fn configured_capacity_bounds_each_domain() {
    let registry = Registry::with_config(RegistryConfig {
        domain_capacity: 1,
        global_capacity: 2,
    });
    registry.register(cities(4)).unwrap();
    registry
        .register(Dictionary::new(4, DatasetSpec::new("towns", "towns")))
        .unwrap();

    assert!(registry.lookup(4, "cities").is_none());
    assert!(registry.lookup(4, "towns").is_some());
    assert_eq!(registry.config().domain_capacity, 1);
    assert_eq!(registry.clone().config().global_capacity, 2);
}

#[test]
fn events_reach_an_installed_sink() {
    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl MetricsSink for Counting {
        fn record(&self, _: RegistryEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let sink = Arc::new(Counting::default());
    let registry = Registry::new().with_sink(Arc::clone(&sink) as Arc<dyn MetricsSink>);
    registry.register(cities(0)).unwrap();
    registry.get_dictionary(0, "cities").unwrap();

    assert_eq!(sink.0.load(Ordering::SeqCst), 2);
    assert_eq!(registry.metrics().registered, 1);
}
