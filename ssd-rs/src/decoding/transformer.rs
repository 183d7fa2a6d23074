use super::ssd::Ssd;
use crate::error::Result;
use crate::signal::traits::{BandPassFilter, PsdEstimator};
use ndarray::{ArrayD, ArrayViewD};
use serde_json::Value;

/// Estimator surface a pipeline layer drives: fit, project, and configure through JSON.
pub trait Transformer {
    /// Learn from `x`.
    fn fit(&mut self, x: ArrayViewD<'_, f64>) -> Result<&mut Self>;

    /// Project `x` with the learned state.
    fn transform(&self, x: ArrayViewD<'_, f64>) -> Result<ArrayD<f64>>;

    /// [`Transformer::fit`] then [`Transformer::transform`] on the same data.
    fn fit_transform(&mut self, x: ArrayViewD<'_, f64>) -> Result<ArrayD<f64>> {
        self.fit(x.view())?;
        self.transform(x)
    }

    /// Current configuration.
    fn get_params(&self) -> Result<Value>;

    /// Update the configuration keys present in `params`.
    fn set_params(&mut self, params: &Value) -> Result<&mut Self>;
}

impl<B: BandPassFilter, P: PsdEstimator> Transformer for Ssd<B, P> {
    fn fit(&mut self, x: ArrayViewD<'_, f64>) -> Result<&mut Self> {
        Ssd::fit(self, &x)
    }

    fn transform(&self, x: ArrayViewD<'_, f64>) -> Result<ArrayD<f64>> {
        Ssd::transform(self, &x)
    }

    fn get_params(&self) -> Result<Value> {
        Ssd::get_params(self)
    }

    fn set_params(&mut self, params: &Value) -> Result<&mut Self> {
        Ssd::set_params(self, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoding::params::SsdConfig;
    use crate::decoding::testing::{noise_band, signal_band, simulate, SFREQ};
    use crate::info::SsdInfo;
    use serde_json::json;

    /// Configure, fit and project without knowing the concrete estimator.
    fn run_pipeline<T: Transformer>(estimator: &mut T, x: ArrayViewD<'_, f64>) -> Result<ArrayD<f64>> {
        estimator.set_params(&json!({"n_components": 2}))?;
        estimator.fit_transform(x)
    }

    #[test]
    fn ssd_is_driven_through_the_trait() {
        let x = simulate(6, 5000, &[2.0], 11).x.into_dyn();
        let config = SsdConfig::new(SsdInfo::Sfreq(SFREQ), signal_band(), noise_band());
        let mut ssd = Ssd::new(config).expect("config");
        let out = run_pipeline(&mut ssd, x.view()).expect("pipeline");
        assert_eq!(out.shape(), &[2, 5000]);
        assert_eq!(Transformer::get_params(&ssd).expect("params")["n_components"], json!(2));
        assert_eq!(out, Ssd::transform(&ssd, &x).expect("transform"));
    }
}
