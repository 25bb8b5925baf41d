//! Result aggregation: merging per-participant measurements at the root
//!
//! After all rounds complete, only the initiator of each pair holds a
//! non-empty local mapping. For the full-mesh scheme every participant
//! ships its partial mapping to the root, which merges them as a
//! disjoint union; for the star scheme the root initiated every round
//! and already owns everything, so no gather is needed. A pair appearing
//! twice, or missing from the merged mapping, indicates a protocol bug
//! and is fatal.

use crate::comm::GroupComm;
use crate::error::{AppError, Result};
use crate::fit;
use crate::models::{Measurement, ResultSet, Sample, SampleMatrix};
use crate::types::{Pair, PairScheme, RunMode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// Merge partial mappings into one; the union must be disjoint.
pub fn merge_partials<V>(parts: Vec<HashMap<Pair, V>>) -> Result<HashMap<Pair, V>> {
    let mut merged = HashMap::new();
    for part in parts {
        for (pair, value) in part {
            if merged.insert(pair, value).is_some() {
                return Err(AppError::aggregation(format!(
                    "pair {} appears in more than one partial mapping",
                    pair
                )));
            }
        }
    }
    Ok(merged)
}

/// Verify the merged mapping covers exactly the enumerated pairs.
pub fn check_complete<V>(merged: &HashMap<Pair, V>, expected: &[Pair]) -> Result<()> {
    for pair in expected {
        if !merged.contains_key(pair) {
            return Err(AppError::aggregation(format!(
                "pair {} is missing from the merged results",
                pair
            )));
        }
    }
    if merged.len() != expected.len() {
        return Err(AppError::aggregation(format!(
            "merged results hold {} pairs, schedule has {}",
            merged.len(),
            expected.len()
        )));
    }
    Ok(())
}

/// Gather every participant's partial mapping at `root` and merge.
///
/// Returns `Some(merged)` on the root, `None` elsewhere. With the star
/// scheme callers skip this entirely; the root's local mapping is
/// already the whole result.
pub async fn gather_partials<V>(
    comm: &dyn GroupComm,
    root: usize,
    local: &HashMap<Pair, V>,
) -> Result<Option<HashMap<Pair, V>>>
where
    V: Serialize + DeserializeOwned,
{
    let encoded = bincode::serialize(local)?;
    let gathered = comm.gather(root, encoded).await?;

    match gathered {
        None => Ok(None),
        Some(payloads) => {
            let mut parts = Vec::with_capacity(payloads.len());
            for payload in payloads {
                let part: HashMap<Pair, V> = bincode::deserialize(&payload)?;
                parts.push(part);
            }
            Ok(Some(merge_partials(parts)?))
        }
    }
}

/// Fit merged two-point samples into the final result set, in
/// enumeration order.
pub fn build_result_set(
    run_id: String,
    scheme: PairScheme,
    group_size: usize,
    pairs: &[Pair],
    samples: &HashMap<Pair, Sample>,
    small_bytes: usize,
    large_bytes: usize,
) -> Result<ResultSet> {
    check_complete(samples, pairs)?;

    let measurements: Vec<Measurement> = pairs
        .iter()
        .map(|pair| fit::two_point(samples[pair], small_bytes, large_bytes))
        .collect();

    Ok(ResultSet::new(
        run_id,
        RunMode::TwoPoint,
        scheme,
        group_size,
        pairs.to_vec(),
        measurements,
    ))
}

/// Fit merged sample matrices into the final result set plus the three
/// per-pair tendency fits, in enumeration order. The summary measurement
/// is the mean fit.
pub fn build_result_set_multi(
    run_id: String,
    scheme: PairScheme,
    group_size: usize,
    pairs: &[Pair],
    matrices: &HashMap<Pair, SampleMatrix>,
) -> Result<(ResultSet, Vec<(Pair, fit::MultiFit)>)> {
    check_complete(matrices, pairs)?;

    let mut measurements = Vec::with_capacity(pairs.len());
    let mut fits = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let multi = fit::fit_matrix(&matrices[pair])?;
        measurements.push(multi.summary());
        fits.push((*pair, multi));
    }

    let result_set = ResultSet::new(
        run_id,
        RunMode::MultiSize,
        scheme,
        group_size,
        pairs.to_vec(),
        measurements,
    );
    Ok((result_set, fits))
}
