use crate::{
    model::FieldSpec,
    types::{Type, TypeContext},
};
use dynaset_primitives::Kind;
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
};

static NEXT_FIELDS_ID: AtomicU64 = AtomicU64::new(1);

///
/// Field
///
/// One named slot of a dataset, derived from a field definition at a
/// given version of its owning collection.
///

pub struct Field {
    owner: u64,
    version: u32,
    num: usize,
    spec: FieldSpec,
    primary: bool,
    display: bool,
    ctx: Arc<TypeContext>,
    kind: OnceLock<Kind>,
    ty: OnceLock<Type>,
}

impl Field {
    /// 1-based position within the owning collection.
    #[must_use]
    pub const fn num(&self) -> usize {
        self.num
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.spec.title
    }

    #[must_use]
    pub fn usage(&self) -> &str {
        &self.spec.usage
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        *self.kind.get_or_init(|| self.spec.resolved_kind())
    }

    /// Value type, built on first use.
    #[must_use]
    pub fn ty(&self) -> &Type {
        self.ty.get_or_init(|| Type::from_field(&self.spec, &self.ctx))
    }

    #[must_use]
    pub const fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.primary
    }

    #[must_use]
    pub const fn is_display(&self) -> bool {
        self.display
    }

    #[must_use]
    pub const fn is_readonly(&self) -> bool {
        self.spec.readonly
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.spec.required
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.spec.disabled
    }

    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.spec.hidden
    }

    pub(crate) const fn owner(&self) -> u64 {
        self.owner
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("num", &self.num)
            .field("name", &self.spec.id)
            .field("kind", &self.kind())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

///
/// FieldKeys
///
/// Names of the primary and display fields. The display name may be a
/// dotted path whose head names a field.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct FieldKeys {
    pub(crate) primary: String,
    pub(crate) display: String,
}

impl FieldKeys {
    fn is_primary(&self, name: &str) -> bool {
        !self.primary.is_empty() && eq_fold(name, &self.primary)
    }

    fn is_display(&self, name: &str) -> bool {
        !self.display.is_empty() && eq_fold(name, display_head(&self.display))
    }
}

/// Leading segment of a display path (`name.common_name` → `name`).
pub(crate) fn display_head(display: &str) -> &str {
    display.split('.').next().unwrap_or(display)
}

pub(crate) fn eq_fold(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

///
/// Fields
///
/// Ordered field definitions plus derived `Field` wrappers. Replacing the
/// definitions advances the version; wrappers and name index entries
/// built at an older version are rebuilt one at a time on access.
///

pub struct Fields {
    id: u64,
    state: RwLock<FieldsState>,
}

struct FieldsState {
    version: u32,
    defs: Vec<FieldSpec>,
    keys: FieldKeys,
    ctx: Arc<TypeContext>,
    slots: Vec<Option<Arc<Field>>>,
    index: HashMap<String, usize>,
}

impl FieldsState {
    fn is_fresh(&self, slot: usize) -> Option<&Arc<Field>> {
        self.slots
            .get(slot)
            .and_then(Option::as_ref)
            .filter(|field| field.version == self.version)
    }

    // Caller guarantees `slot < defs.len()`.
    fn field_at(&mut self, owner: u64, slot: usize) -> Arc<Field> {
        if let Some(field) = self.is_fresh(slot) {
            return Arc::clone(field);
        }

        if let Some(stale) = self.slots[slot].take() {
            let key = stale.name().to_lowercase();
            if self.index.get(&key) == Some(&slot) {
                self.index.remove(&key);
            }
        }

        let spec = self.defs[slot].clone();
        let field = Arc::new(Field {
            owner,
            version: self.version,
            num: slot + 1,
            primary: self.keys.is_primary(&spec.id),
            display: self.keys.is_display(&spec.id),
            spec,
            ctx: Arc::clone(&self.ctx),
            kind: OnceLock::new(),
            ty: OnceLock::new(),
        });

        self.index
            .entry(field.name().to_lowercase())
            .or_insert(slot);
        self.slots[slot] = Some(Arc::clone(&field));

        field
    }
}

impl Fields {
    pub(crate) fn new(defs: Vec<FieldSpec>, keys: FieldKeys, ctx: TypeContext) -> Self {
        let slots = vec![None; defs.len()];

        Self {
            id: NEXT_FIELDS_ID.fetch_add(1, Ordering::Relaxed),
            state: RwLock::new(FieldsState {
                version: 1,
                defs,
                keys,
                ctx: Arc::new(ctx),
                slots,
                index: HashMap::new(),
            }),
        }
    }

    /// Replace the definitions and advance the version.
    pub(crate) fn reset(&self, defs: Vec<FieldSpec>, keys: FieldKeys, ctx: TypeContext) {
        let mut state = self.state.write();

        state.version = state.version.wrapping_add(1).max(1);
        state.slots.resize(defs.len(), None);
        state.defs = defs;
        state.keys = keys;
        state.ctx = Arc::new(ctx);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.state.read().version
    }

    /// Field at 0-based position `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<Arc<Field>> {
        {
            let state = self.state.read();
            if i >= state.defs.len() {
                return None;
            }
            if let Some(field) = state.is_fresh(i) {
                return Some(Arc::clone(field));
            }
        }

        let mut state = self.state.write();
        if i >= state.defs.len() {
            return None;
        }

        Some(state.field_at(self.id, i))
    }

    /// Case-insensitive lookup by field name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Arc<Field>> {
        let key = name.to_lowercase();
        {
            let state = self.state.read();
            if let Some(&slot) = state.index.get(&key)
                && let Some(field) = state.is_fresh(slot)
                && field.name().to_lowercase() == key
            {
                return Some(Arc::clone(field));
            }
        }

        let mut state = self.state.write();
        let found = state
            .defs
            .iter()
            .position(|def| def.id.to_lowercase() == key);

        match found {
            Some(slot) => {
                let field = state.field_at(self.id, slot);
                state.index.insert(key, slot);
                Some(field)
            }
            None => {
                state.index.remove(&key);
                None
            }
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name(name).is_some()
    }

    /// Fields in order. The length is fixed when iteration starts.
    pub fn iter(&self) -> impl Iterator<Item = Arc<Field>> + '_ {
        (0..self.len()).map_while(|i| self.get(i))
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.state.read().defs.iter().map(|d| d.id.clone()).collect()
    }

    /// Current field definitions.
    #[must_use]
    pub fn specs(&self) -> Vec<FieldSpec> {
        self.state.read().defs.clone()
    }

    #[must_use]
    pub fn primary_name(&self) -> String {
        self.state.read().keys.primary.clone()
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        self.state.read().keys.display.clone()
    }

    /// Whether `field` is the current wrapper at its claimed position.
    #[must_use]
    pub fn owns(&self, field: &Arc<Field>) -> bool {
        field.owner() == self.id
            && field
                .num()
                .checked_sub(1)
                .and_then(|slot| self.get(slot))
                .is_some_and(|current| Arc::ptr_eq(&current, field))
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();

        f.debug_struct("Fields")
            .field("version", &state.version)
            .field("len", &state.defs.len())
            .finish_non_exhaustive()
    }
}

///
/// TESTS
///
