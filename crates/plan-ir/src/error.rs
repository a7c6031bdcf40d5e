//! Error types for registration, construction and parsing.

use derive_more::{Display, From};

pub type IrResult<T> = Result<T, IrError>;

#[derive(Clone, Display, Debug, From, PartialEq)]
#[display("{kind}")]
pub struct IrError {
    #[from]
    kind: Box<IrErrorKind>,
}

impl<E> From<E> for IrError
where
    IrErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        IrError {
            kind: Box::new(IrErrorKind::from(error)),
        }
    }
}

impl IrError {
    pub fn kind(&self) -> &IrErrorKind {
        &self.kind
    }

    pub fn duplicate_registration(name: impl std::fmt::Display) -> Self {
        IrErrorKind::DuplicateRegistration(name.to_string()).into()
    }

    pub fn unknown_identifier(name: impl std::fmt::Display) -> Self {
        IrErrorKind::UnknownIdentifier(name.to_string()).into()
    }

    pub fn type_mismatch(
        subject: impl std::fmt::Display,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        IrErrorKind::TypeMismatch {
            subject: subject.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
        .into()
    }

    pub fn missing_attribute(owner: impl std::fmt::Display, attr: impl std::fmt::Display) -> Self {
        IrErrorKind::MissingAttribute {
            owner: owner.to_string(),
            attr: attr.to_string(),
        }
        .into()
    }

    pub fn unexpected_attribute(
        owner: impl std::fmt::Display,
        attr: impl std::fmt::Display,
    ) -> Self {
        IrErrorKind::UnexpectedAttribute {
            owner: owner.to_string(),
            attr: attr.to_string(),
        }
        .into()
    }

    pub fn arity(
        op: impl std::fmt::Display,
        what: &'static str,
        expected: impl std::fmt::Display,
        found: usize,
    ) -> Self {
        IrErrorKind::ArityError {
            op: op.to_string(),
            what,
            expected: expected.to_string(),
            found,
        }
        .into()
    }

    pub fn structural_violation(
        op: impl std::fmt::Display,
        slot: impl std::fmt::Display,
        msg: impl std::fmt::Display,
    ) -> Self {
        IrErrorKind::StructuralViolation {
            op: op.to_string(),
            slot: slot.to_string(),
            message: msg.to_string(),
        }
        .into()
    }

    pub fn malformed_text(offset: usize, msg: impl std::fmt::Display) -> Self {
        IrErrorKind::MalformedText {
            offset,
            message: msg.to_string(),
        }
        .into()
    }
}

#[derive(Clone, Display, Debug, PartialEq)]
pub enum IrErrorKind {
    #[display("Duplicate registration: {_0}")]
    DuplicateRegistration(String),

    #[display("Unknown identifier: {_0}")]
    UnknownIdentifier(String),

    #[display("Type mismatch for {subject}: expected {expected}, found {found}")]
    TypeMismatch {
        subject: String,
        expected: String,
        found: String,
    },

    #[display("Missing attribute `{attr}` on {owner}")]
    MissingAttribute { owner: String, attr: String },

    #[display("Unexpected attribute `{attr}` on {owner}")]
    UnexpectedAttribute { owner: String, attr: String },

    #[display("Arity error on {op}: expected {expected} {what}, found {found}")]
    ArityError {
        op: String,
        what: &'static str,
        expected: String,
        found: usize,
    },

    #[display("Structural violation in {op} region `{slot}`: {message}")]
    StructuralViolation {
        op: String,
        slot: String,
        message: String,
    },

    #[display("Malformed text at offset {offset}: {message}")]
    MalformedText { offset: usize, message: String },
}

impl std::error::Error for IrError {}

/// Error when viewing an [`crate::Operation`] through a typed dialect wrapper.
#[derive(Clone, Display, Debug, PartialEq, Eq)]
pub enum ConversionError {
    /// Operation kind doesn't match the wrapper.
    #[display("expected {expected}, found {actual}")]
    WrongOperation {
        expected: &'static str,
        actual: String,
    },
    /// Missing required attribute.
    #[display("missing attribute `{_0}`")]
    MissingAttribute(&'static str),
    /// Attribute has wrong type.
    #[display("attribute `{_0}` has the wrong type")]
    WrongAttributeType(&'static str),
    /// Missing region.
    #[display("missing region `{_0}`")]
    MissingRegion(&'static str),
}

impl std::error::Error for ConversionError {}
