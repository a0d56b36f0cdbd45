/* ************************************************************************ **
** This file is part of asgrid, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of asgrid is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

//! All of the post-processing that occurs after config merging is written here.

use crate::config::*;
use asgrid_subspace::{ConfigurationError, Method, Strategy};
use failure::Error;

impl Settings {
    pub fn validate(self) -> Result<ValidatedSettings, Error> {
        check_range("points", self.min_points, self.max_points, self.num_steps)?;
        if self.uses_data() {
            check_range("data points", self.min_data_points, self.max_data_points, self.num_data_steps)?;
        }
        if self.num_threads == 0 {
            return Err(ConfigurationError("num-threads must be at least 1".into()).into());
        }
        check_method(&self)?;

        if self.nboot > 0 && !self.method.is_classical() {
            debug!("nboot is only used by the classical methods");
        }
        if !self.do_response && !self.do_integral {
            warn!("both do-response and do-integral are off; only the surrogates are built");
        }
        Ok(ValidatedSettings(self))
    }
}

fn check_range(what: &str, min: usize, max: usize, steps: usize) -> Result<(), ConfigurationError> {
    if min == 0 {
        return Err(ConfigurationError(format!("the minimum number of {} must be positive", what)));
    }
    if min > max {
        return Err(ConfigurationError(format!(
            "the minimum number of {} ({}) exceeds the maximum ({})", what, min, max,
        )));
    }
    if steps == 0 {
        return Err(ConfigurationError(format!("need at least one step of {}", what)));
    }
    Ok(())
}

fn check_method(settings: &Settings) -> Result<(), ConfigurationError> {
    match settings.method {
        Method::AsSgpp | Method::Sgpp => {
            let degree = settings.grid_type.effective_degree(settings.degree)?;
            if degree != settings.degree {
                warn!(
                    "grid type '{}' ignores the requested degree {} and uses {}",
                    settings.grid_type, settings.degree, degree,
                );
            }
            // datadrivenR only builds reduced surfaces
            let (what, strategy) = match settings.method {
                Method::AsSgpp => ("asm-type", settings.asm_type),
                _ => ("response-type", settings.response_type),
            };
            if strategy == Strategy::DataDrivenR {
                return Err(ConfigurationError(format!(
                    "method '{}' does not support {} '{}'", settings.method, what, strategy,
                )));
            }
        },
        Method::As | Method::Ols | Method::Qphd => match settings.response_type {
            Strategy::Regular | Strategy::Data => {},
            other => return Err(ConfigurationError(format!(
                "method '{}' supports the response types 'regular' and 'data', not '{}'",
                settings.method, other,
            ))),
        },
        Method::Halton => {},
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(settings: Settings) -> Result<ValidatedSettings, Error> {
        settings.validate()
    }

    fn is_config_error(result: Result<ValidatedSettings, Error>) -> bool {
        match result {
            Ok(_) => false,
            Err(e) => e.downcast_ref::<ConfigurationError>().is_some(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(check(Settings::default()).is_ok());
    }

    #[test]
    fn ranges() {
        assert!(is_config_error(check(Settings { min_points: 200, ..Default::default() })));
        assert!(is_config_error(check(Settings { num_steps: 0, ..Default::default() })));
        assert!(is_config_error(check(Settings { min_points: 0, ..Default::default() })));

        // the data range only matters to data strategies
        let bad_data = Settings { min_data_points: 10, max_data_points: 1, ..Default::default() };
        assert!(check(bad_data.clone()).is_ok());
        let with_data = Settings { asm_type: Strategy::Data, response_type: Strategy::Data, ..bad_data };
        assert!(is_config_error(check(with_data)));
    }

    #[test]
    fn even_bspline_degree() {
        assert!(is_config_error(check(Settings { degree: 2, ..Default::default() })));
        // ignored by the classical methods, where it is a polynomial degree
        let ols = Settings {
            degree: 2, method: Method::Ols, response_type: Strategy::Regular, ..Default::default()
        };
        assert!(check(ols).is_ok());
    }

    #[test]
    fn strategy_compatibility() {
        let classical = Settings { method: Method::As, response_type: Strategy::DataR, ..Default::default() };
        assert!(is_config_error(check(classical)));

        let halton = Settings { method: Method::Halton, response_type: Strategy::DataR, ..Default::default() };
        assert!(!halton.uses_data());
        assert!(check(halton).is_ok());

        let recognition_from_data = Settings { asm_type: Strategy::DataR, ..Default::default() };
        assert!(recognition_from_data.uses_data());
        assert!(check(recognition_from_data).is_ok());
    }

    #[test]
    fn data_driven_is_only_for_reduced_surfaces() {
        let reduced = Settings { response_type: Strategy::DataDrivenR, ..Default::default() };
        assert!(check(reduced).is_ok());

        let recognition = Settings { asm_type: Strategy::DataDrivenR, ..Default::default() };
        assert!(is_config_error(check(recognition)));
        let full = Settings { method: Method::Sgpp, response_type: Strategy::DataDrivenR, ..Default::default() };
        assert!(is_config_error(check(full)));
        let classical = Settings { method: Method::Qphd, response_type: Strategy::DataDrivenR, ..Default::default() };
        assert!(is_config_error(check(classical)));

        // skipping both outputs is allowed
        let quiet = Settings { do_response: false, do_integral: false, ..Default::default() };
        assert!(check(quiet).is_ok());
    }
}
