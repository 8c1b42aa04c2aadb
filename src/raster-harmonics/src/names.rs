//! Band names shared by every stage of the harmonic pipeline.
//!
//! All names are derived from a mode index or a regressor name, so the
//! basis, the regression and the phase/amplitude stages agree on them.

pub const CONSTANT: &str = "constant";
pub const TIME: &str = "t";

pub const COEF_SUFFIX: &str = "_coef";

pub fn cos(mode: usize) -> String {
    format!("cos_{}", mode)
}

pub fn sin(mode: usize) -> String {
    format!("sin_{}", mode)
}

pub fn phase(mode: usize) -> String {
    format!("phase_{}", mode)
}

pub fn amplitude(mode: usize) -> String {
    format!("amp_{}", mode)
}

/// Name of the regression coefficient band for an independent variable.
pub fn coefficient(independent: &str) -> String {
    format!("{}{}", independent, COEF_SUFFIX)
}

/// `cos_1..cos_modes` (or any other prefix) in increasing mode order.
pub fn per_mode(prefix: &str, modes: usize) -> Vec<String> {
    (1..=modes).map(|k| format!("{}_{}", prefix, k)).collect()
}

/// Every band name the pipeline writes for `modes` harmonics: the
/// regressors, their coefficients, then phase and amplitude per mode.
pub fn generated(modes: usize) -> Vec<String> {
    let mut regressors = vec![CONSTANT.to_string(), TIME.to_string()];
    regressors.extend(per_mode("cos", modes));
    regressors.extend(per_mode("sin", modes));
    let coefficients: Vec<String> = regressors.iter().map(|r| coefficient(r)).collect();
    regressors
        .into_iter()
        .chain(coefficients)
        .chain((1..=modes).flat_map(|k| [phase(k), amplitude(k)]))
        .collect()
}
