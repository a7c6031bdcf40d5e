//! Context: the explicit registry of dialect schemas.
//!
//! A `Context` maps qualified names to type schemas, operation schemas and
//! structural categories. It is populated during an initialization phase
//! (which needs `&mut Context`) and then shared read-only (`&Context`) with
//! every builder, parser and pass. There is no global instance.

use std::collections::{HashMap, HashSet};

use crate::error::{IrError, IrResult};
use crate::schema::{CategoryRule, OpSchema, RegionContent};
use crate::symbol::{QualifiedName, Symbol};
use crate::types::{Attribute, DataType, RawParam, TypeSchema};

/// A bundle of registrations, loaded with [`Context::load_dialect`].
pub trait Dialect {
    /// Dialect prefix shared by every name it registers.
    const NAME: &'static str;

    fn register(ctx: &mut Context) -> IrResult<()>;
}

/// Registry of types, categories and operation schemas.
#[derive(Clone, Debug, Default)]
pub struct Context {
    types: HashMap<QualifiedName, TypeSchema>,
    categories: HashMap<QualifiedName, CategoryRule>,
    ops: HashMap<QualifiedName, OpSchema>,
    dialects: HashSet<Symbol>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a dialect's registrations.
    ///
    /// Either every registration of the dialect lands or none does.
    pub fn load_dialect<D: Dialect>(&mut self) -> IrResult<()> {
        let name = Symbol::new(D::NAME);
        if self.dialects.contains(&name) {
            return Err(IrError::duplicate_registration(format!("dialect {name}")));
        }
        let mut staged = self.clone();
        D::register(&mut staged)?;
        staged.dialects.insert(name);
        *self = staged;
        tracing::debug!(dialect = D::NAME, "loaded dialect");
        Ok(())
    }

    pub fn has_dialect(&self, name: &str) -> bool {
        self.dialects.iter().any(|d| *d == name)
    }

    /// Whether any table already holds `name`.
    pub fn contains(&self, name: QualifiedName) -> bool {
        self.types.contains_key(&name)
            || self.categories.contains_key(&name)
            || self.ops.contains_key(&name)
    }

    fn ensure_unused(&self, name: QualifiedName) -> IrResult<()> {
        ensure_ident(name.dialect(), || name.to_string())?;
        ensure_ident(name.name(), || name.to_string())?;
        if self.contains(name) {
            return Err(IrError::duplicate_registration(name));
        }
        Ok(())
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub fn register_type(&mut self, schema: TypeSchema) -> IrResult<()> {
        let name = schema.name();
        self.ensure_unused(name)?;
        for (i, (key, _)) in schema.params().iter().enumerate() {
            ensure_ident(*key, || format!("parameter `{key}` of !{name}"))?;
            if schema.params()[..i].iter().any(|(k, _)| k == key) {
                return Err(IrError::duplicate_registration(format!(
                    "parameter `{key}` of !{name}"
                )));
            }
        }
        tracing::debug!(%name, params = schema.params().len(), "registered type");
        self.types.insert(name, schema);
        Ok(())
    }

    pub fn lookup_type(&self, name: QualifiedName) -> IrResult<&TypeSchema> {
        self.types
            .get(&name)
            .ok_or_else(|| IrError::unknown_identifier(format!("!{name}")))
    }

    /// Instantiate a registered type tag from raw parameter values.
    pub fn make_type<K: Into<Symbol>>(
        &self,
        name: QualifiedName,
        params: impl IntoIterator<Item = (K, RawParam)>,
    ) -> IrResult<DataType> {
        self.lookup_type(name)?.instantiate(params)
    }

    /// Like [`Context::make_type`], wrapped as a type attribute.
    pub fn make_attribute<K: Into<Symbol>>(
        &self,
        name: QualifiedName,
        params: impl IntoIterator<Item = (K, RawParam)>,
    ) -> IrResult<Attribute> {
        self.make_type(name, params).map(Attribute::Type)
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// Register a structural category.
    ///
    /// Every category in `may_contain` must already be registered, except
    /// the category itself.
    pub fn register_category(&mut self, rule: CategoryRule) -> IrResult<()> {
        let name = rule.name();
        self.ensure_unused(name)?;
        for &allowed in rule.allowed() {
            if allowed != name {
                self.lookup_category(allowed)?;
            }
        }
        tracing::debug!(%name, "registered category");
        self.categories.insert(name, rule);
        Ok(())
    }

    pub fn lookup_category(&self, name: QualifiedName) -> IrResult<&CategoryRule> {
        self.categories
            .get(&name)
            .ok_or_else(|| IrError::unknown_identifier(format!("category {name}")))
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Register an operation schema.
    ///
    /// The op's category and every category named by its region slots must
    /// be registered, and each slot may only accept categories that the op's
    /// own category is allowed to contain. Op kinds listed by
    /// [`RegionContent::Ops`] may be registered later; they are resolved
    /// when the op is built.
    pub fn register_op(&mut self, schema: OpSchema) -> IrResult<()> {
        let name = schema.name();
        self.ensure_unused(name)?;

        let attrs = schema.attrs();
        for (i, slot) in attrs.iter().enumerate() {
            if attrs[..i].iter().any(|s| s.name == slot.name) {
                return Err(IrError::duplicate_registration(format!(
                    "attribute `{}` of {name}",
                    slot.name
                )));
            }
        }

        let rule = match schema.structural_category() {
            Some(category) => Some(self.lookup_category(category)?),
            None => None,
        };
        for slot in schema.regions() {
            let RegionContent::Categories(accepted) = &slot.content else {
                continue;
            };
            for &category in accepted {
                self.lookup_category(category)?;
                if let Some(rule) = rule
                    && !rule.allows(category)
                {
                    return Err(IrError::structural_violation(
                        name,
                        slot.name,
                        format!("category {} may not contain {category}", rule.name()),
                    ));
                }
            }
        }

        tracing::debug!(
            %name,
            attrs = attrs.len(),
            regions = schema.regions().len(),
            "registered op"
        );
        self.ops.insert(name, schema);
        Ok(())
    }

    pub fn lookup_op(&self, name: QualifiedName) -> IrResult<&OpSchema> {
        self.ops
            .get(&name)
            .ok_or_else(|| IrError::unknown_identifier(name))
    }

    /// Registered operation schemas, sorted by name.
    pub fn op_schemas(&self) -> Vec<&OpSchema> {
        let mut schemas: Vec<_> = self.ops.values().collect();
        schemas.sort_by_cached_key(|s| s.name().to_string());
        schemas
    }

    /// Registered type schemas, sorted by name.
    pub fn type_schemas(&self) -> Vec<&TypeSchema> {
        let mut schemas: Vec<_> = self.types.values().collect();
        schemas.sort_by_cached_key(|s| s.name().to_string());
        schemas
    }
}

/// Registered names are printed bare, so each part must be an identifier.
fn ensure_ident(part: Symbol, describe: impl FnOnce() -> String) -> IrResult<()> {
    if part.is_ident() {
        Ok(())
    } else {
        Err(IrError::unknown_identifier(format!(
            "{} (`{part}` is not an identifier)",
            describe()
        )))
    }
}
