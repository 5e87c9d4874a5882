//! Column statistics shared by the profile and the missing-data analysis,
//! computed on polars chunked arrays.

use crate::error::Result;
use polars::prelude::*;

/// Pearson correlation over rows where both sides are present; `None` with
/// fewer than two such rows or when either side has no variance
pub fn pearson(xs: &Float64Chunked, ys: &Float64Chunked) -> Result<Option<f64>> {
    let both = &xs.is_not_null() & &ys.is_not_null();
    let xs = xs.filter(&both)?;
    let ys = ys.filter(&both)?;
    if xs.len() < 2 {
        return Ok(None);
    }
    let (Some(mx), Some(my)) = (xs.mean(), ys.mean()) else {
        return Ok(None);
    };

    let dx = &xs - mx;
    let dy = &ys - my;
    let cov = (&dx * &dy).sum().unwrap_or(0.0);
    let vx = (&dx * &dx).sum().unwrap_or(0.0);
    let vy = (&dy * &dy).sum().unwrap_or(0.0);
    if vx == 0.0 || vy == 0.0 {
        return Ok(None);
    }
    Ok(Some(cov / (vx.sqrt() * vy.sqrt())))
}

/// 1.0 where the value is missing, 0.0 where present
pub fn nullity_indicator(series: &Series) -> Result<Float64Chunked> {
    let indicator = series.is_null().into_series().cast(&DataType::Float64)?;
    Ok(indicator.f64()?.clone())
}

/// Euclidean distance between two 0/1 presence vectors
pub fn nullity_distance(a: &BooleanChunked, b: &BooleanChunked) -> f64 {
    ((a ^ b).num_trues() as f64).sqrt()
}

/// Numeric view of a column, if it holds numbers
pub fn as_float(series: &Series) -> Result<Option<Float64Chunked>> {
    if !matches!(series.dtype(), DataType::Int64 | DataType::Float64) {
        return Ok(None);
    }
    let floats = series.cast(&DataType::Float64)?;
    Ok(Some(floats.f64()?.clone()))
}
