// In: src/bridge/stateless_api.rs

use arrow::array::{Array, ArrayRef};

use crate::bridge::arrow_impl;
use crate::cast::{downcast_array, soft_convert, CastContext, DowncastTarget, SoftConvertOptions};
use crate::error::CastError;
use crate::inference::{infer_kind, InferredKind};
use crate::types::TypedArray;

/// Soft-converts a column whose values arrive untyped (e.g. Utf8 read from CSV).
///
/// The column is imported as an `object` array, classified with `soft_convert`, and
/// handed back as an Arrow column of whatever dtype the classifier settled on.
pub fn soft_convert_arrow_column(
    array: &dyn Array,
    opts: SoftConvertOptions,
    ctx: &CastContext,
) -> Result<ArrayRef, CastError> {
    // 1. Marshal the column into the engine's representation.
    let values = arrow_impl::typed_array_from_arrow(array, ctx)?;

    // 2. Run the classifier.
    let converted = soft_convert(&values, opts, ctx)?;

    // 3. Back to Arrow.
    arrow_impl::typed_array_to_arrow(&converted)
}

/// Narrows a computed column back towards `target`, keeping the original when the
/// narrowing would lose information.
pub fn downcast_arrow_column(
    array: &dyn Array,
    target: &DowncastTarget,
    ctx: &CastContext,
) -> Result<ArrayRef, CastError> {
    let values = arrow_impl::typed_array_from_arrow(array, ctx)?;
    let narrowed: TypedArray = downcast_array(values, target, ctx);
    arrow_impl::typed_array_to_arrow(&narrowed)
}

/// Classifies the values of a column without converting it.
pub fn infer_arrow_column(array: &dyn Array, ctx: &CastContext) -> Result<InferredKind, CastError> {
    let values = arrow_impl::typed_array_from_arrow(array, ctx)?;
    Ok(infer_kind(&values.to_values()))
}
