// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

use crate::diagnostics::Cause;

/// Reasons a `for_each` value cannot be used to expand instances.
///
/// The `Display` text is the detail of the corresponding diagnostic. None of
/// the messages ever includes the offending value itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForEachError {
    #[error("Sensitive values, or values derived from sensitive values, cannot be used as for_each arguments. If used, the sensitive value could be exposed as a resource instance key.")]
    SensitiveValueForbidden,

    #[error("The given \"for_each\" argument value is unsuitable: the given \"for_each\" argument value is null. A map, or set of strings is allowed.")]
    NullValueForbidden,

    #[error("The given \"for_each\" argument value is unsuitable: the \"for_each\" argument must be a map, or set of strings, and you have provided a value of type {ty}.")]
    WrongContainerKind { ty: String },

    /// Resource expansion of a map (or any non-set value) that is not known.
    #[error("The \"for_each\" map includes keys derived from resource attributes that cannot be determined until apply, and so the full set of keys that will identify the instances of this resource cannot be determined.\n\nWhen working with unknown values in for_each, it's better to define the map keys statically in your configuration and place apply-time results only in the map values.\n\nAlternatively, you could use the -target planning option to first apply only the resources that the for_each value depends on, and then apply a second time to fully converge.")]
    UnknownMapKeys,

    /// Resource expansion of a set that is unknown or holds unknown elements.
    #[error("The \"for_each\" set includes values derived from resource attributes that cannot be determined until apply, and so the full set of keys that will identify the instances of this resource cannot be determined.\n\nWhen working with unknown values in for_each, it's better to use a map value where the keys are defined statically in your configuration and where only the values contain apply-time results.\n\nAlternatively, you could use the -target planning option to first apply only the resources that the for_each value depends on, and then apply a second time to fully converge.")]
    UnknownSetValues,

    /// Import expansion of a value that is not known to its full depth.
    #[error("The \"for_each\" expression includes values derived from other resource attributes that cannot be determined until apply, and so the full set of values that might be used to import this resource cannot be determined.")]
    PartiallyUnknownForbidden,

    #[error("The given \"for_each\" argument value is unsuitable: \"for_each\" supports maps and sets of strings, but you have provided a set containing type {ty}.")]
    SetElementWrongType { ty: String },

    #[error("The given \"for_each\" argument value is unsuitable: \"for_each\" sets must not contain null values.")]
    SetElementNull,
}

impl ForEachError {
    pub fn summary(&self) -> &'static str {
        match self {
            ForEachError::SetElementWrongType { .. } | ForEachError::SetElementNull => {
                "Invalid for_each set argument"
            }
            _ => "Invalid for_each argument",
        }
    }

    /// Whether retrying after more values become known could help.
    pub fn cause(&self) -> Option<Cause> {
        match self {
            ForEachError::SensitiveValueForbidden => Some(Cause::Sensitive),
            ForEachError::UnknownMapKeys
            | ForEachError::UnknownSetValues
            | ForEachError::PartiallyUnknownForbidden => Some(Cause::Unknown),
            _ => None,
        }
    }

    /// Stable identifier of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ForEachError::SensitiveValueForbidden => "SensitiveValueForbidden",
            ForEachError::NullValueForbidden => "NullValueForbidden",
            ForEachError::WrongContainerKind { .. } => "WrongContainerKind",
            ForEachError::UnknownMapKeys | ForEachError::UnknownSetValues => {
                "UnknownValueForbidden"
            }
            ForEachError::PartiallyUnknownForbidden => "PartiallyUnknownForbidden",
            ForEachError::SetElementWrongType { .. } => "SetElementWrongType",
            ForEachError::SetElementNull => "SetElementNull",
        }
    }
}
