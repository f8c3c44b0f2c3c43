//! Stable diagnostic codes.
//!
//! Codes are grouped by the pass that produces them: E30xx name resolution,
//! E31xx types, E32xx constants, E33xx traits, E34xx control flow, E35xx
//! dependency cycles. Warnings use the W9xxx range. Each code carries its
//! severity prefix explicitly rather than inferring it from the number, so
//! renumbering can never silently change how a code renders. Codes are
//! append-only; a published code keeps its number forever.

use std::fmt;

/// A stable diagnostic code: severity prefix, number, and a short name.
///
/// # Examples
///
/// ```
/// use rxc_util::diagnostic::codes;
///
/// assert_eq!(format!("{}", codes::TYPE_MISMATCH), "E3101");
/// assert_eq!(codes::TYPE_MISMATCH.name, "type_mismatch");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DiagnosticCode {
    /// Severity prefix rendered before the number (`"E"` or `"W"`).
    pub prefix: &'static str,
    /// Numeric code, unique across the compiler.
    pub code: u16,
    /// Short snake_case name for documentation lookup.
    pub name: &'static str,
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.prefix, self.code)
    }
}

const fn error(code: u16, name: &'static str) -> DiagnosticCode {
    DiagnosticCode {
        prefix: "E",
        code,
        name,
    }
}

const fn warning(code: u16, name: &'static str) -> DiagnosticCode {
    DiagnosticCode {
        prefix: "W",
        code,
        name,
    }
}

// Name resolution
pub const UNDEFINED_NAME: DiagnosticCode = error(3001, "undefined_name");
pub const DUPLICATE_DEFINITION: DiagnosticCode = error(3002, "duplicate_definition");
pub const NOT_A_TYPE: DiagnosticCode = error(3003, "not_a_type");
pub const NO_ASSOCIATED_ITEM: DiagnosticCode = error(3004, "no_associated_item");
pub const SELF_OUTSIDE_IMPL: DiagnosticCode = error(3005, "self_outside_impl");
pub const INVALID_PATH: DiagnosticCode = error(3006, "invalid_path");

// Type checking
pub const TYPE_MISMATCH: DiagnosticCode = error(3101, "type_mismatch");
pub const WRONG_ARG_COUNT: DiagnosticCode = error(3102, "wrong_arg_count");
pub const NOT_CALLABLE: DiagnosticCode = error(3103, "not_callable");
pub const NOT_INDEXABLE: DiagnosticCode = error(3104, "not_indexable");
pub const UNKNOWN_FIELD: DiagnosticCode = error(3105, "unknown_field");
pub const METHOD_NOT_FOUND: DiagnosticCode = error(3106, "method_not_found");
pub const NOT_A_PLACE: DiagnosticCode = error(3107, "not_a_place");
pub const NOT_MUTABLE: DiagnosticCode = error(3108, "not_mutable");
pub const INVALID_OPERAND: DiagnosticCode = error(3109, "invalid_operand");
pub const INVALID_CAST: DiagnosticCode = error(3110, "invalid_cast");
pub const MISSING_FIELD: DiagnosticCode = error(3111, "missing_field");
pub const REPEATED_FIELD: DiagnosticCode = error(3112, "repeated_field");
pub const REFUTABLE_PATTERN: DiagnosticCode = error(3113, "refutable_pattern");

// Constant evaluation
pub const NOT_CONST: DiagnosticCode = error(3201, "not_const_evaluable");
pub const DIVISION_BY_ZERO: DiagnosticCode = error(3202, "division_by_zero");
pub const NEGATIVE_LENGTH: DiagnosticCode = error(3203, "negative_array_length");
pub const CONST_OVERFLOW: DiagnosticCode = error(3204, "const_overflow");

// Trait validation
pub const MISSING_TRAIT_ITEM: DiagnosticCode = error(3301, "missing_trait_item");
pub const TRAIT_SIGNATURE_MISMATCH: DiagnosticCode = error(3302, "trait_signature_mismatch");
pub const TRAIT_ITEM_KIND_MISMATCH: DiagnosticCode = error(3303, "trait_item_kind_mismatch");

// Control flow
pub const BREAK_OUTSIDE_LOOP: DiagnosticCode = error(3401, "break_outside_loop");
pub const CONTINUE_OUTSIDE_LOOP: DiagnosticCode = error(3402, "continue_outside_loop");
pub const RETURN_OUTSIDE_FUNCTION: DiagnosticCode = error(3403, "return_outside_function");

// Dependency cycles
pub const CIRCULAR_TYPE: DiagnosticCode = error(3501, "circular_type");
pub const CIRCULAR_CONSTANT: DiagnosticCode = error(3502, "circular_constant");

// Warnings
pub const UNREACHABLE_STATEMENT: DiagnosticCode = warning(9001, "unreachable_statement");
