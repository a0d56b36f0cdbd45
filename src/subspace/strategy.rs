//! The string tags that select methods and strategies, parsed once into enums.

use crate::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $Enum:ident ($what:expr) {
            $( $(#[$vmeta:meta])* $Variant:ident = $name:expr, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum $Enum {
            $( $(#[$vmeta])* $Variant, )+
        }

        impl $Enum {
            pub const ALL: &'static [$Enum] = &[$($Enum::$Variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $( $Enum::$Variant => $name, )+
                }
            }
        }

        impl fmt::Display for $Enum {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $Enum {
            type Err = ConfigurationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $Enum::ALL.iter().cloned()
                    .find(|x| x.name() == s)
                    .ok_or_else(|| {
                        let names: Vec<_> = $Enum::ALL.iter().map(|x| x.name()).collect();
                        ConfigurationError(format!(
                            "unsupported {} '{}' (expected one of: {})", $what, s, names.join(", "),
                        ))
                    })
            }
        }

        impl TryFrom<String> for $Enum {
            type Error = ConfigurationError;
            fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
        }

        impl From<$Enum> for String {
            fn from(x: $Enum) -> String { x.name().to_string() }
        }
    };
}

string_enum! {
    /// Top-level experiment method.
    pub enum Method ("method") {
        /// Sparse-grid active subspace: recognition, reduced surface, integration.
        AsSgpp = "asSGpp",
        /// Full-dimensional sparse-grid surrogate.
        Sgpp = "SGpp",
        /// Classical method with exact gradients.
        As = "AS",
        /// Classical method with a linear fit.
        Ols = "OLS",
        /// Classical method with a quadratic fit.
        Qphd = "QPHD",
        /// Quasi-Monte-Carlo baseline.
        Halton = "Halton",
    }
}

impl Method {
    pub fn is_classical(self) -> bool {
        match self {
            Method::As | Method::Ols | Method::Qphd => true,
            _ => false,
        }
    }
}

string_enum! {
    /// How a surrogate is built.
    pub enum Strategy ("strategy") {
        /// Surplus-adaptive refinement against the objective.
        Adaptive = "adaptive",
        /// A single regular grid, sized from the budget.
        Regular = "regular",
        /// Surplus-adaptive regression against a dataset.
        Data = "data",
        /// Regular-grid regression against a dataset.
        DataR = "dataR",
        /// Like `dataR`, with the penalty scaled by the number of samples.
        /// Only for reduced surfaces.
        DataDrivenR = "datadrivenR",
    }
}

impl Strategy {
    pub fn uses_data(self) -> bool {
        match self {
            Strategy::Data | Strategy::DataR | Strategy::DataDrivenR => true,
            _ => false,
        }
    }
}

string_enum! {
    /// How a reduced surrogate is integrated.
    pub enum IntegralType ("integral type") {
        MonteCarlo = "MC",
        Histogram = "Hist",
        Spline = "Spline",
        ApproximateSpline = "appSpline",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!("asSGpp".parse::<Method>().unwrap(), Method::AsSgpp);
        assert_eq!("dataR".parse::<Strategy>().unwrap(), Strategy::DataR);
        assert_eq!("datadrivenR".parse::<Strategy>().unwrap(), Strategy::DataDrivenR);
        assert!(Strategy::DataDrivenR.uses_data());
        assert_eq!("appSpline".parse::<IntegralType>().unwrap(), IntegralType::ApproximateSpline);
        assert_eq!(IntegralType::MonteCarlo.to_string(), "MC");
    }

    #[test]
    fn unsupported_strings_are_configuration_errors() {
        let err: failure::Error = "datadriven".parse::<Strategy>().unwrap_err().into();
        assert!(err.downcast_ref::<ConfigurationError>().is_some());
        assert!(err.to_string().contains("datadriven"));
        assert!("Cont".parse::<IntegralType>().is_err());
        assert!("sgpp".parse::<Method>().is_err());
    }

    #[test]
    fn serde_uses_the_tags() {
        let json = serde_json::to_string(&Method::Qphd).unwrap();
        assert_eq!(json, "\"QPHD\"");
        let parsed: Strategy = serde_json::from_str("\"regular\"").unwrap();
        assert_eq!(parsed, Strategy::Regular);
        assert!(serde_json::from_str::<Strategy>("\"sideways\"").is_err());
    }
}
