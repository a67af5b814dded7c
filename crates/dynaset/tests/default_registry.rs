//! The process-wide registry is shared by every test in this binary, so
//! each test works on its own dataset names.

use dynaset::{
    core::{model::DatasetError, registry::RegistryError, types::TypeError},
    prelude::*,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

fn global_dictionary(name: &str) -> Dictionary {
    Dictionary::new(
        0,
        DatasetSpec::new(name, format!("dictionaries/{name}"))
            .with_field(FieldSpec::of_kind("id", Kind::Int64))
            .with_field(FieldSpec::of_kind("label", Kind::String))
            .with_primary("id")
            .with_display("label")
            .extendable(),
    )
}

#[test]
fn version_matches_the_package() {
    assert_eq!(dynaset::VERSION, env!("CARGO_PKG_VERSION"));
}

#[test]
fn extensions_resolve_their_base_through_the_default_registry() {
    dynaset::register(global_dictionary("ledgers")).unwrap();

    let ext = Arc::new(Extension::new(
        3,
        DatasetSpec::new("ledgers", "").with_field(FieldSpec::of_kind("memo", Kind::String)),
    ));
    assert!(ext.is_resolved());
    assert_eq!(ext.path(), "extensions/ledgers");
    assert_eq!(ext.validate(), Ok(()));

    dynaset::register(Arc::clone(&ext)).unwrap();
    let found = dynaset::get_extension(3, "ledgers").unwrap().unwrap();
    assert!(Arc::ptr_eq(&found, &ext));

    assert!(dynaset::unregister(&Descriptor::from(ext)));
    assert!(dynaset::get_extension(3, "ledgers").unwrap().is_none());
}

#[test]
fn extension_resolves_once_its_base_appears() {
    let ext = Extension::new(
        4,
        DatasetSpec::new("journals", "").with_field(FieldSpec::of_kind("memo", Kind::String)),
    );
    assert!(!ext.is_resolved());
    assert_eq!(
        ext.base_dictionary().unwrap_err(),
        DatasetError::BaseNotFound {
            path: "extensions/journals".into()
        }
    );
    assert_eq!(ext.fields().len(), 1);

    dynaset::register(global_dictionary("journals")).unwrap();

    assert_eq!(ext.base_dictionary().unwrap().name(), "journals");
    assert!(ext.last_failure().is_none());
    assert_eq!(ext.fields().names(), ["id", "memo"]);
}

#[test]
fn non_extendable_bases_are_refused() {
    let fixed = Dictionary::new(
        0,
        DatasetSpec::new("units", "dictionaries/units")
            .with_field(FieldSpec::of_kind("id", Kind::Int32))
            .with_primary("id"),
    );
    dynaset::register(fixed).unwrap();

    let ext = Extension::new(5, DatasetSpec::new("units", ""));
    assert!(matches!(
        ext.validate(),
        Err(DatasetError::BaseNotExtendable { .. })
    ));
}

#[test]
fn global_dictionaries_stay_registered() {
    let dictionary = Descriptor::from(global_dictionary("regions"));
    dynaset::register(dictionary.clone()).unwrap();

    assert!(!dynaset::unregister(&dictionary));
    assert!(dynaset::get_dictionary(11, "dictionaries/regions").unwrap().is_some());
}

#[test]
fn lookups_resolve_through_the_default_registry() {
    dynaset::register(global_dictionary("currencies")).unwrap();

    let accounts = Dictionary::new(
        0,
        DatasetSpec::new("accounts", "dictionaries/accounts")
            .with_field(FieldSpec::of_kind("id", Kind::Int64))
            .with_field(FieldSpec::new(
                "currency",
                TypeSpec::lookup("dictionaries/currencies"),
            ))
            .with_primary("id"),
    );
    assert_eq!(accounts.validate(), Ok(()));

    let record = Record::new(accounts);
    record
        .set_by_name("currency", serde_json::json!({"id": "978", "name": "EUR"}))
        .unwrap();
    assert_eq!(
        record.get_by_name("currency").unwrap(),
        Value::Lookup(Lookup::new("978").with_name("EUR"))
    );

    let err = record.set_by_name("currency", "euro").unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conversion);
}

#[test]
fn unresolved_lookups_fail_validation() {
    let orders = Dictionary::new(
        0,
        DatasetSpec::new("orders", "dictionaries/orders")
            .with_field(FieldSpec::of_kind("id", Kind::Int64))
            .with_field(FieldSpec::new("vendor", TypeSpec::lookup("dictionaries/vendors")))
            .with_primary("id"),
    );

    let Err(DatasetError::Invalid { issues, .. }) = orders.validate() else {
        panic!("lookup target should be missing");
    };
    let unresolved = TypeError::LookupUnresolved {
        path: "dictionaries/vendors".into(),
    };
    assert_eq!(issues["vendor"].len(), 1);
    assert!(issues["vendor"][0].ends_with(&unresolved.to_string()));
}

struct Tenants {
    calls: AtomicUsize,
}

impl TypeResolver for Tenants {
    fn resolve_dictionary(
        &self,
        domain_id: i64,
        path: &str,
    ) -> Result<Option<Arc<Dictionary>>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if path != "dictionaries/stages" {
            return Ok(None);
        }

        Ok(Some(Arc::new(Dictionary::new(
            domain_id,
            DatasetSpec::new("stages", path)
                .with_field(FieldSpec::of_kind("id", Kind::Uint32))
                .with_primary("id"),
        ))))
    }

    fn resolve_extension(&self, _: i64, _: &str) -> Result<Option<Arc<Extension>>, Error> {
        Err(Error::resolver("extensions are not served here"))
    }
}

#[test]
fn resolver_backed_registry_shares_the_default_domains() {
    let tenants = Arc::new(Tenants {
        calls: AtomicUsize::new(0),
    });
    let registry = dynaset::with_resolver(Arc::clone(&tenants) as Arc<dyn TypeResolver>);

    let stages = registry.get_dictionary(21, "dictionaries/stages").unwrap().unwrap();
    assert_eq!(stages.domain_id(), 21);
    assert!(dynaset::registry().lookup(21, "stages").is_some());

    registry.get_dictionary(21, "stages").unwrap();
    assert_eq!(tenants.calls.load(Ordering::SeqCst), 1);

    let err = registry.get_extension(21, "stages").unwrap_err();
    assert!(matches!(err, RegistryError::Resolver(_)));
    assert_eq!(Error::from(err).class, ErrorClass::Resolver);
}
