//! Validated construction of operations.
//!
//! [`Context::build`] is the only way to obtain an [`Operation`]. It checks an
//! [`OperationState`] against the registered [`OpSchema`] in a fixed order:
//! kind, attributes, operands, results, regions. The first failure is
//! returned and nothing partially built escapes.

use smallvec::SmallVec;

use crate::context::Context;
use crate::error::{IrError, IrResult};
use crate::ir::{Operation, OperationState, Region, Value};
use crate::schema::{AttrConstraint, BlockCount, OpSchema, RegionContent, TypeConstraint};
use crate::symbol::{QualifiedName, Symbol};
use crate::types::{Attribute, DataType, is_valid_integer};

impl Context {
    /// Validate `state` against its registered schema and build the node.
    ///
    /// Attributes of the result are stored in schema declaration order.
    pub fn build(&self, state: OperationState) -> IrResult<Operation> {
        let kind = state.kind;
        self.build_inner(state)
            .inspect_err(|err| tracing::trace!(%kind, %err, "build failed"))
    }

    fn build_inner(&self, state: OperationState) -> IrResult<Operation> {
        let OperationState {
            kind,
            attributes,
            operands,
            results,
            regions,
        } = state;

        let schema = self.lookup_op(kind)?;
        let order = self.check_attributes(schema, &attributes)?;
        self.check_operands(schema, &operands)?;
        self.check_results(schema, &results)?;
        self.check_regions(schema, &regions)?;

        let mut slots: Vec<Option<(Symbol, Attribute)>> =
            attributes.into_iter().map(Some).collect();
        let attributes = order.iter().filter_map(|&i| slots[i].take()).collect();

        Ok(Operation::from_parts(
            kind, attributes, operands, results, regions,
        ))
    }

    /// Re-check a single built node (not its descendants) against its schema.
    pub(crate) fn check_operation(&self, op: &Operation) -> IrResult<()> {
        let schema = self.lookup_op(op.kind())?;
        let order = self.check_attributes(schema, op.attributes())?;
        if order.iter().enumerate().any(|(slot, &i)| slot != i) {
            return Err(IrError::structural_violation(
                op.kind(),
                "attributes",
                "attributes are not in declaration order",
            ));
        }
        self.check_operands(schema, op.operands())?;
        self.check_results(schema, op.results())?;
        self.check_regions(schema, op.regions())
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Match supplied attributes to the schema's slots.
    ///
    /// Returns, for each declared slot, the index of the supplied attribute
    /// that fills it.
    fn check_attributes(
        &self,
        schema: &OpSchema,
        attributes: &[(Symbol, Attribute)],
    ) -> IrResult<SmallVec<[usize; 4]>> {
        let kind = schema.name();
        let slots = schema.attrs();
        let mut filled: SmallVec<[Option<usize>; 4]> = slots.iter().map(|_| None).collect();

        for (i, (key, _)) in attributes.iter().enumerate() {
            let slot = slots
                .iter()
                .position(|s| s.name == *key)
                .ok_or_else(|| IrError::unexpected_attribute(kind, key))?;
            if filled[slot].replace(i).is_some() {
                return Err(IrError::unexpected_attribute(kind, key));
            }
        }

        let mut order = SmallVec::with_capacity(slots.len());
        for (slot, index) in slots.iter().zip(filled) {
            let index = index.ok_or_else(|| IrError::missing_attribute(kind, slot.name))?;
            let subject = format!("attribute `{}` of {kind}", slot.name);
            self.check_attr(&subject, &slot.constraint, &attributes[index].1)?;
            order.push(index);
        }
        Ok(order)
    }

    fn check_attr(
        &self,
        subject: &str,
        constraint: &AttrConstraint,
        attr: &Attribute,
    ) -> IrResult<()> {
        let mismatch = || IrError::type_mismatch(subject, constraint, attr.describe());
        check_integer(subject, attr)?;
        match (constraint, attr) {
            (AttrConstraint::Any, _) => self.check_registered(subject, attr),
            (AttrConstraint::Integer, Attribute::Integer { .. }) => Ok(()),
            (AttrConstraint::IntegerOfWidth(w), Attribute::Integer { width, .. }) if w == width => {
                Ok(())
            }
            (AttrConstraint::String, Attribute::String(_)) => Ok(()),
            (AttrConstraint::Type(tc), Attribute::Type(ty)) => self.check_type(subject, tc, ty),
            (AttrConstraint::ArrayOf(inner), Attribute::Array(items)) => items
                .iter()
                .try_for_each(|item| self.check_attr(subject, inner, item)),
            _ => Err(mismatch()),
        }
    }

    /// Every type nested inside an unconstrained attribute must be registered.
    fn check_registered(&self, subject: &str, attr: &Attribute) -> IrResult<()> {
        match attr {
            Attribute::Type(ty) => self.lookup_type(ty.name())?.check(ty),
            Attribute::Array(items) => items.iter().try_for_each(|a| {
                check_integer(subject, a)?;
                self.check_registered(subject, a)
            }),
            Attribute::Integer { .. } | Attribute::String(_) => Ok(()),
        }
    }

    fn check_type(
        &self,
        subject: &str,
        constraint: &TypeConstraint,
        ty: &DataType,
    ) -> IrResult<()> {
        self.lookup_type(ty.name())?.check(ty)?;
        match constraint {
            TypeConstraint::Exact(name) if !ty.is(*name) => {
                Err(IrError::type_mismatch(subject, constraint, ty))
            }
            TypeConstraint::Dialect(dialect) if ty.name().dialect() != *dialect => {
                Err(IrError::type_mismatch(subject, constraint, ty))
            }
            _ => Ok(()),
        }
    }

    // ========================================================================
    // Operands and results
    // ========================================================================

    fn check_operands(&self, schema: &OpSchema, operands: &[Value]) -> IrResult<()> {
        let kind = schema.name();
        let slots = schema.operands();
        if slots.len() != operands.len() {
            return Err(IrError::arity(kind, "operands", slots.len(), operands.len()));
        }
        for (slot, value) in slots.iter().zip(operands) {
            let subject = format!("operand `{}` of {kind}", slot.name);
            self.check_type(&subject, &slot.ty, value.ty())?;
        }
        Ok(())
    }

    fn check_results(&self, schema: &OpSchema, results: &[DataType]) -> IrResult<()> {
        let expected = schema.num_results();
        if expected != results.len() {
            return Err(IrError::arity(schema.name(), "results", expected, results.len()));
        }
        results
            .iter()
            .try_for_each(|ty| self.lookup_type(ty.name())?.check(ty))
    }

    // ========================================================================
    // Regions
    // ========================================================================

    fn check_regions(&self, schema: &OpSchema, regions: &[Region]) -> IrResult<()> {
        let kind = schema.name();
        let slots = schema.regions();
        if slots.len() != regions.len() {
            return Err(IrError::arity(kind, "regions", slots.len(), regions.len()));
        }

        let rule = match schema.structural_category() {
            Some(category) => Some(self.lookup_category(category)?),
            None => None,
        };

        for (slot, region) in slots.iter().zip(regions) {
            let blocks = region.blocks().len();
            if slot.blocks == BlockCount::Single && blocks != 1 {
                return Err(IrError::arity(
                    format_args!("{kind} region `{}`", slot.name),
                    "blocks",
                    1,
                    blocks,
                ));
            }

            for child in region.ops() {
                let child_schema = self.lookup_op(child.kind())?;
                let child_category = child_schema.structural_category();
                let violation =
                    |msg: String| Err(IrError::structural_violation(kind, slot.name, msg));

                if let (Some(rule), Some(category)) = (rule, child_category)
                    && !rule.allows(category)
                {
                    return violation(format!(
                        "{} (category {category}) may not appear inside category {}",
                        child.kind(),
                        rule.name()
                    ));
                }

                let accepted = match &slot.content {
                    RegionContent::Any => true,
                    RegionContent::Categories(names) => {
                        child_category.is_some_and(|c| names.contains(&c))
                    }
                    RegionContent::Ops(names) => names.contains(&child.kind()),
                };
                if !accepted {
                    return violation(format!(
                        "expected {}, found {}{}",
                        slot.content,
                        child.kind(),
                        describe_category(child_category)
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Integer attributes need a width in 1..=64 that holds their value.
fn check_integer(subject: &str, attr: &Attribute) -> IrResult<()> {
    match attr {
        Attribute::Integer { value, width } if !is_valid_integer(*value, *width) => Err(
            IrError::type_mismatch(subject, "integer of width 1..=64", attr.describe()),
        ),
        _ => Ok(()),
    }
}

fn describe_category(category: Option<QualifiedName>) -> String {
    match category {
        Some(category) => format!(" (category {category})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IrErrorKind;
    use crate::ir::Block;
    use crate::schema::{CategoryRule, RegionSlot};
    use crate::types::{ParamKind, RawParam, TypeSchema};

    fn q(name: &'static str) -> QualifiedName {
        QualifiedName::from_static("toy", name)
    }

    /// A small dialect: `toy.num` and `toy.add` are values, `toy.block` holds
    /// statements, `toy.decl` is the only thing allowed in a `toy.module`.
    fn toy_context() -> Context {
        let mut ctx = Context::new();
        ctx.register_type(TypeSchema::new(q("i")).param("bits", ParamKind::Int(8)))
            .unwrap();
        ctx.register_type(TypeSchema::new(q("f"))).unwrap();
        ctx.register_category(CategoryRule::new(q("value")).may_contain([q("value")]))
            .unwrap();
        ctx.register_category(CategoryRule::new(q("stmt")).may_contain([q("stmt"), q("value")]))
            .unwrap();
        ctx.register_op(
            OpSchema::new(q("num"))
                .category(q("value"))
                .attr("value", AttrConstraint::Integer)
                .attr("ty", AttrConstraint::Type(TypeConstraint::Exact(q("i")))),
        )
        .unwrap();
        ctx.register_op(
            OpSchema::new(q("widen"))
                .category(q("value"))
                .operand("input", TypeConstraint::Exact(q("i")))
                .results(1),
        )
        .unwrap();
        ctx.register_op(
            OpSchema::new(q("add"))
                .category(q("value"))
                .region(RegionSlot::single("lhs").categories([q("value")]))
                .region(RegionSlot::single("rhs").categories([q("value")])),
        )
        .unwrap();
        ctx.register_op(
            OpSchema::new(q("eval"))
                .category(q("stmt"))
                .region(RegionSlot::single("body").categories([q("value")])),
        )
        .unwrap();
        ctx.register_op(
            OpSchema::new(q("decl"))
                .category(q("stmt"))
                .attr("name", AttrConstraint::String),
        )
        .unwrap();
        ctx.register_op(
            OpSchema::new(q("module"))
                .category(q("stmt"))
                .attr("tags", AttrConstraint::ArrayOf(Box::new(AttrConstraint::String)))
                .region(RegionSlot::multi("decls").ops([q("decl")])),
        )
        .unwrap();
        ctx
    }

    fn i8_ty(ctx: &Context) -> DataType {
        ctx.make_type(q("i"), [("bits", RawParam::Int(8))]).unwrap()
    }

    fn num(ctx: &Context, value: i64) -> Operation {
        ctx.build(
            OperationState::new(q("num"))
                .attr("ty", i8_ty(ctx))
                .attr("value", value),
        )
        .unwrap()
    }

    #[test]
    fn attributes_are_stored_in_declaration_order() {
        let ctx = toy_context();
        let op = num(&ctx, 3);
        let keys: Vec<_> = op.attributes().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["value", "ty"]);
        assert_eq!(op.attr("value").and_then(Attribute::as_int), Some(3));
        assert!(op.regions().is_empty());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let ctx = toy_context();
        let err = ctx.build(OperationState::new(q("mul"))).unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::UnknownIdentifier(_)));
    }

    #[test]
    fn attribute_errors() {
        let ctx = toy_context();

        let err = ctx
            .build(OperationState::new(q("num")).attr("value", 1i64))
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::MissingAttribute { .. }));

        let err = ctx
            .build(
                OperationState::new(q("num"))
                    .attr("value", 1i64)
                    .attr("ty", i8_ty(&ctx))
                    .attr("extra", "x"),
            )
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::UnexpectedAttribute { .. }));

        let err = ctx
            .build(
                OperationState::new(q("num"))
                    .attr("value", "one")
                    .attr("ty", i8_ty(&ctx)),
            )
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }));

        let err = ctx
            .build(
                OperationState::new(q("module"))
                    .attr("tags", vec![Attribute::from("a"), Attribute::from(1i64)])
                    .region(Region::empty()),
            )
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn region_arity_is_exact() {
        let ctx = toy_context();
        let err = ctx
            .build(OperationState::new(q("add")).region(Region::single([num(&ctx, 1)])))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Arity error on toy.add: expected 2 regions, found 1"
        );

        let two_blocks = Region::new([Block::new([num(&ctx, 1)]), Block::new([num(&ctx, 2)])]);
        let err = ctx
            .build(
                OperationState::new(q("add"))
                    .region(two_blocks)
                    .region(Region::single([num(&ctx, 3)])),
            )
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            IrErrorKind::ArityError { what: "blocks", found: 2, .. }
        ));
    }

    #[test]
    fn operand_and_result_arity_is_exact() {
        let ctx = toy_context();
        let f = ctx
            .make_type(q("f"), std::iter::empty::<(Symbol, RawParam)>())
            .unwrap();
        let input = Value::new("x", i8_ty(&ctx));

        let op = ctx
            .build(
                OperationState::new(q("widen"))
                    .operand(input.clone())
                    .result(f.clone()),
            )
            .unwrap();
        assert_eq!(op.operands().len(), 1);
        assert_eq!(op.results(), [f.clone()]);

        let err = ctx
            .build(OperationState::new(q("widen")).result(f.clone()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Arity error on toy.widen: expected 1 operands, found 0"
        );

        let err = ctx
            .build(
                OperationState::new(q("widen"))
                    .operands([input.clone(), input.clone()])
                    .result(f.clone()),
            )
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            IrErrorKind::ArityError { what: "operands", found: 2, .. }
        ));

        let err = ctx
            .build(OperationState::new(q("widen")).operand(input.clone()))
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            IrErrorKind::ArityError { what: "results", found: 0, .. }
        ));

        let err = ctx
            .build(
                OperationState::new(q("widen"))
                    .operand(input)
                    .results([f.clone(), f.clone()]),
            )
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            IrErrorKind::ArityError { what: "results", found: 2, .. }
        ));
    }

    #[test]
    fn operand_type_is_checked() {
        let ctx = toy_context();
        let f = ctx
            .make_type(q("f"), std::iter::empty::<(Symbol, RawParam)>())
            .unwrap();
        let err = ctx
            .build(
                OperationState::new(q("widen"))
                    .operand(Value::new("x", f.clone()))
                    .result(f),
            )
            .unwrap_err();
        match err.kind() {
            IrErrorKind::TypeMismatch { subject, .. } => {
                assert_eq!(subject, "operand `input` of toy.widen");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_region_is_not_padded() {
        let ctx = toy_context();
        let err = ctx
            .build(OperationState::new(q("eval")).region(Region::empty()))
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            IrErrorKind::ArityError { what: "blocks", expected, found: 0, .. } if expected == "1"
        ));

        let op = ctx
            .build(OperationState::new(q("eval")).region(Block::default().into()))
            .unwrap();
        assert_eq!(op.regions()[0].blocks().len(), 1);
    }

    #[test]
    fn integer_attributes_need_a_printable_width() {
        let ctx = toy_context();
        for (value, width) in [(1, 0), (1, 65), (1, 128), (256, 8)] {
            let err = ctx
                .build(
                    OperationState::new(q("num"))
                        .attr("value", Attribute::Integer { value, width })
                        .attr("ty", i8_ty(&ctx)),
                )
                .unwrap_err();
            assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }), "{err}");
        }

        let err = ctx
            .build(
                OperationState::new(q("module"))
                    .attr("tags", vec![Attribute::Integer { value: 1, width: 99 }])
                    .region(Region::empty()),
            )
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::TypeMismatch { .. }), "{err}");
    }

    #[test]
    fn region_content_is_checked() {
        let ctx = toy_context();
        let decl = ctx
            .build(OperationState::new(q("decl")).attr("name", "x"))
            .unwrap();

        let err = ctx
            .build(
                OperationState::new(q("add"))
                    .region(Region::single([decl.clone()]))
                    .region(Region::single([num(&ctx, 1)])),
            )
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::StructuralViolation { .. }));

        let module = ctx
            .build(
                OperationState::new(q("module"))
                    .attr("tags", Vec::<Attribute>::new())
                    .region(Region::new([Block::new([decl.clone()]), Block::new([decl])])),
            )
            .unwrap();
        assert_eq!(module.regions()[0].blocks().len(), 2);

        let err = ctx
            .build(
                OperationState::new(q("module"))
                    .attr("tags", Vec::<Attribute>::new())
                    .region(Region::single([num(&ctx, 1)])),
            )
            .unwrap_err();
        assert!(matches!(err.kind(), IrErrorKind::StructuralViolation { .. }));
    }

    #[test]
    fn rebuild_from_decomposed_node() {
        let ctx = toy_context();
        let mut state = OperationState::from(num(&ctx, 1));
        state.attributes[0].1 = Attribute::from(7i64);
        let op = ctx.build(state).unwrap();
        assert_eq!(op.attr("value").and_then(Attribute::as_int), Some(7));
        assert!(ctx.check_operation(&op).is_ok());
    }
}
