use crate::{
    model::{DatasetDescriptor, Dictionary, DictionaryLookup, LookupSpec},
    registry,
    types::{Type, TypeContext, TypeError, text_input},
    value::{Input, Lookup, Source, Value, WireMap, WireValue},
};
use dynaset_primitives::Kind;
use std::{
    fmt,
    sync::{Arc, OnceLock},
};

///
/// LookupTarget
///
/// Identity of a referenced dictionary: its path and primary field type.
///

#[derive(Debug)]
pub struct LookupTarget {
    pub path: String,
    pub primary: String,
    pub id_type: Type,
}

///
/// LookupType
///
/// Reference to a row of another dictionary. The dictionary is resolved
/// on first use and memoized once found.
///

#[derive(Clone)]
pub struct LookupType {
    path: String,
    domain_id: i64,
    target: Arc<OnceLock<Arc<LookupTarget>>>,
    resolver: Option<Arc<dyn DictionaryLookup>>,
}

impl LookupType {
    /// Lookup resolved through `resolver`, or the default registry when absent.
    pub fn new(
        domain_id: i64,
        path: impl Into<String>,
        resolver: Option<Arc<dyn DictionaryLookup>>,
    ) -> Self {
        Self {
            path: path.into().trim().to_string(),
            domain_id,
            target: Arc::default(),
            resolver,
        }
    }

    /// Lookup bound to an already resolved dictionary.
    #[must_use]
    pub fn bound(dictionary: &Dictionary) -> Self {
        let ty = Self::new(dictionary.domain_id(), dictionary.path(), None);
        if let Some(primary) = dictionary.primary_field() {
            let _ = ty.target.set(Arc::new(LookupTarget {
                path: dictionary.path().to_string(),
                primary: primary.name().to_string(),
                id_type: primary.ty().clone(),
            }));
        }

        ty
    }

    pub(crate) fn from_context(spec: Option<&LookupSpec>, ctx: &TypeContext) -> Self {
        let path = spec.map(|s| s.path.as_str()).unwrap_or_default();
        let ty = Self::new(ctx.domain_id, path, ctx.lookup.clone());

        // A dictionary referencing itself resolves against its own primary field.
        if let Some(primary) = &ctx.owner_primary
            && !ty.path.is_empty()
            && ty.path.eq_ignore_ascii_case(&ctx.owner_path)
            && primary.resolved_kind() != Kind::Lookup
        {
            let _ = ty.target.set(Arc::new(LookupTarget {
                path: ctx.owner_path.clone(),
                primary: primary.id.clone(),
                id_type: Type::from_field(primary, &TypeContext::default()),
            }));
        }

        ty
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    /// Resolve the referenced dictionary, memoizing the first success.
    pub fn resolve(&self) -> Result<Arc<LookupTarget>, TypeError> {
        if let Some(target) = self.target.get() {
            return Ok(Arc::clone(target));
        }
        if self.path.is_empty() {
            return Err(TypeError::descriptor(Kind::Lookup, "lookup( path: ! ) required"));
        }

        let found = match &self.resolver {
            Some(resolver) => resolver.lookup_dictionary(self.domain_id, &self.path),
            None => registry::global().lookup_dictionary(self.domain_id, &self.path),
        };
        let dictionary = match found {
            Ok(Some(dictionary)) => dictionary,
            Ok(None) => return Err(self.unresolved()),
            Err(err) => {
                tracing::warn!(path = %self.path, error = %err, "lookup target resolution failed");
                return Err(self.unresolved());
            }
        };
        let Some(primary) = dictionary.primary_field() else {
            return Err(TypeError::descriptor(
                Kind::Lookup,
                format!("lookup( path: {:?} ) has no primary field", self.path),
            ));
        };

        let target = Arc::new(LookupTarget {
            path: dictionary.path().to_string(),
            primary: primary.name().to_string(),
            id_type: primary.ty().clone(),
        });

        Ok(Arc::clone(self.target.get_or_init(|| target)))
    }

    fn unresolved(&self) -> TypeError {
        TypeError::LookupUnresolved {
            path: self.path.clone(),
        }
    }

    pub(crate) fn validate_descriptor(&self) -> Result<(), TypeError> {
        let target = self.resolve()?;

        target.id_type.validate_descriptor()
    }

    /// Decode a lookup id with the referenced primary field type.
    pub fn typed_id(&self, lookup: &Lookup) -> Result<Value, TypeError> {
        let target = self.resolve()?;

        let typed = target
            .id_type
            .decode(Source::from(lookup.id.as_str()))
            .map_err(|cause| TypeError::LookupId {
                id: lookup.id.clone(),
                cause: Box::new(cause),
            })?;
        if typed.is_null() {
            return Err(id_required());
        }

        Ok(typed)
    }

    pub(crate) fn decode(&self, input: Input) -> Result<Value, TypeError> {
        let lookup = match input {
            Input::Null => return Ok(Value::Null),
            Input::Value(Value::Lookup(v)) => Lookup {
                id: v.id.trim().to_string(),
                ..v
            },
            Input::Value(Value::Text(s)) => match text_input(&s) {
                None => return Ok(Value::Null),
                Some(id) => Lookup::new(id),
            },
            Input::Value(Value::Int(v)) => Lookup::new(v.to_string()),
            Input::Value(Value::Uint(v)) => Lookup::new(v.to_string()),
            Input::Value(Value::Float(v)) => Lookup::new(v.to_string()),
            Input::Struct(map) => from_struct(map)?,
            Input::Value(v) => return Err(TypeError::convert(v.label(), Kind::Lookup)),
            Input::List(_) => {
                return Err(TypeError::UnsupportedTag {
                    tag: "list",
                    kind: Kind::Lookup,
                });
            }
        };

        if lookup.is_empty() {
            return Ok(Value::Null);
        }
        self.check(&lookup)?;

        Ok(Value::Lookup(lookup))
    }

    fn check(&self, lookup: &Lookup) -> Result<(), TypeError> {
        if lookup.id.trim().is_empty() {
            return Err(id_required());
        }

        self.typed_id(lookup).map(|_| ())
    }

    pub(crate) fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match value {
            Value::Null => Ok(()),
            Value::Lookup(v) if v.is_empty() => Ok(()),
            Value::Lookup(v) => self.check(v),
            other => Err(TypeError::convert(other.label(), Kind::Lookup)),
        }
    }
}

impl fmt::Debug for LookupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupType")
            .field("path", &self.path)
            .field("domain_id", &self.domain_id)
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}

fn id_required() -> TypeError {
    TypeError::violation("type.lookup.id.required", "lookup( id: ! ); required")
}

fn from_struct(map: WireMap) -> Result<Lookup, TypeError> {
    let mut lookup = Lookup::default();

    for (key, value) in map {
        let member = match value {
            WireValue::Null => String::new(),
            WireValue::String(s) => s.trim().to_string(),
            WireValue::Number(n) => n.to_string(),
            WireValue::Bool(b) => b.to_string(),
            WireValue::Array(_) | WireValue::Object(_) => {
                return Err(TypeError::parse(&key, Kind::Lookup));
            }
        };

        match key.to_ascii_lowercase().as_str() {
            "id" => lookup.id = member,
            "name" => lookup.name = member,
            "type" => lookup.type_path = member,
            _ => return Err(TypeError::parse(&key, Kind::Lookup)),
        }
    }

    Ok(lookup)
}
