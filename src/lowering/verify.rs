//! Equivalence check between a model and its refinement.

use crate::config::Config;
use crate::core::error::{ForestError, Result};
use crate::core::types::Real;
use crate::graph::model::Model;
use crate::graph::port::Value;
use log::{info, warn};
use ndarray::{ArrayView2, Axis};
use std::fmt;

/// How far one named output of the refined model strays from the original.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputComparison {
    /// Output name
    pub name: String,
    /// Largest absolute difference over all real elements and inputs
    pub max_abs_error: Real,
    /// Number of boolean elements that differ, over all inputs
    pub boolean_mismatches: usize,
}

/// Result of [`verify_refinement`].
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceReport {
    /// Number of input rows evaluated
    pub inputs_checked: usize,
    /// Tolerance applied to real outputs
    pub tolerance: Real,
    /// One entry per named output of the original model
    pub outputs: Vec<OutputComparison>,
}

impl EquivalenceReport {
    /// True if every real output is within tolerance and every boolean matches.
    pub fn is_equivalent(&self) -> bool {
        self.outputs
            .iter()
            .all(|o| o.max_abs_error <= self.tolerance && o.boolean_mismatches == 0)
    }

    /// Comparison for the output called `name`.
    pub fn output(&self, name: &str) -> Option<&OutputComparison> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

impl fmt::Display for EquivalenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} inputs, tolerance {}: {}",
            self.inputs_checked,
            self.tolerance,
            if self.is_equivalent() { "equivalent" } else { "NOT equivalent" }
        )?;
        for output in &self.outputs {
            writeln!(
                f,
                "  {}: max abs error {:e}, boolean mismatches {}",
                output.name, output.max_abs_error, output.boolean_mismatches
            )?;
        }
        Ok(())
    }
}

/// Absolute difference of two reals. Two NaNs agree; NaN against a number
/// is an infinite error.
fn real_error(expected: Real, actual: Real) -> Real {
    match (expected.is_nan(), actual.is_nan()) {
        (true, true) => 0.0,
        (false, false) => (expected - actual).abs(),
        _ => Real::INFINITY,
    }
}

/// Evaluates `original` and `refined` on every row of `inputs` and compares
/// each named output of `original` with the output of the same name in
/// `refined`. Reals are compared against `config.equivalence_tolerance`,
/// booleans exactly.
pub fn verify_refinement(
    original: &Model,
    refined: &Model,
    inputs: ArrayView2<'_, Real>,
    config: &Config,
) -> Result<EquivalenceReport> {
    let mut outputs: Vec<OutputComparison> = original
        .outputs()
        .map(|(name, _)| OutputComparison {
            name: name.to_string(),
            max_abs_error: 0.0,
            boolean_mismatches: 0,
        })
        .collect();

    for row in inputs.axis_iter(Axis(0)) {
        let row = row.to_vec();
        let original_values = original.evaluate(&row)?;
        let refined_values = refined.evaluate(&row)?;

        for comparison in outputs.iter_mut() {
            let name = comparison.name.as_str();
            let missing = || ForestError::structural_mismatch(format!("model has no output '{}'", name));
            let expected = original_values.values(original.output(name).ok_or_else(missing)?)?;
            let actual = refined_values.values(refined.output(name).ok_or_else(missing)?)?;
            if expected.len() != actual.len() {
                return Err(ForestError::dimension_mismatch(
                    format!("{} elements in output '{}'", expected.len(), name),
                    actual.len().to_string(),
                ));
            }

            for (e, a) in expected.iter().zip(&actual) {
                match (e, a) {
                    (Value::Real(e), Value::Real(a)) => {
                        comparison.max_abs_error = comparison.max_abs_error.max(real_error(*e, *a));
                    }
                    (Value::Boolean(e), Value::Boolean(a)) => {
                        if e != a {
                            comparison.boolean_mismatches += 1;
                        }
                    }
                    _ => {
                        return Err(ForestError::structural_mismatch(format!(
                            "output '{}' changed element type",
                            name
                        )))
                    }
                }
            }
        }
    }

    let report = EquivalenceReport {
        inputs_checked: inputs.nrows(),
        tolerance: config.equivalence_tolerance,
        outputs,
    };
    if report.is_equivalent() {
        info!("Refinement verified on {} inputs", report.inputs_checked);
    } else {
        warn!("Refinement is not equivalent:\n{}", report);
    }
    Ok(report)
}
