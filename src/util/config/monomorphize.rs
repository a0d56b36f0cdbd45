#![allow(non_snake_case)]

use failure::Error;

use std::io::Read;

/// Reads YAML into a config type, warning about keys that nothing consumed.
///
/// All of the expensive serde codegen happens in the crate that invokes
/// `derive_yaml_read!`, so downstream crates only pay for a trait call.
pub trait YamlRead: for <'de> serde::Deserialize<'de> {
    fn from_reader(mut r: impl Read) -> Result<Self, Error>
    { YamlRead::from_dyn_reader(&mut r) }

    fn from_dyn_reader(r: &mut dyn Read) -> Result<Self, Error> {
        let mut s = String::new();
        r.read_to_string(&mut s)?;
        YamlRead::from_str(&s)
    }

    fn from_str(s: &str) -> Result<Self, Error> {
        let value = value_from_str(s)?;

        match Self::__serde_ignored__from_value(value) {
            Ok(out) => Ok(out),
            Err(_) => {
                // Errors that pass through serde_ignored and a yaml Value lose their
                // line information, so produce the error again from the text.
                Self::__serde_yaml__from_str(s)?;
                Err(failure::format_err!("config was rejected, but only when read through serde_ignored"))
            },
        }
    }

    fn from_value(value: serde_yaml::Value) -> Result<Self, Error>
    { Self::__serde_ignored__from_value(value) }

    #[doc(hidden)]
    fn __serde_ignored__from_value(value: serde_yaml::Value) -> Result<Self, Error>;
    #[doc(hidden)]
    fn __serde_yaml__from_str(s: &str) -> Result<Self, Error>;
}

#[macro_export]
macro_rules! derive_yaml_read {
    ($Type:ty) => {
        const _: () = {
            use std::result::Result;
            use std::convert::Into;
            use $crate::reexports::serde_yaml;
            use $crate::reexports::serde_ignored;
            use $crate::reexports::failure::Error;
            use $crate::reexports::log::warn;

            impl $crate::YamlRead for $Type {
                fn __serde_ignored__from_value(value: serde_yaml::Value) -> Result<$Type, Error> {
                    serde_ignored::deserialize(
                        value,
                        |path| warn!("Unused config item (possible typo?): {}", path),
                    ).map_err(Into::into)
                }

                fn __serde_yaml__from_str(s: &str) -> Result<$Type, Error> {
                    serde_yaml::from_str(s)
                        .map_err(Into::into)
                }
            }
        };
    };
}

derive_yaml_read!{serde_yaml::Value}

fn value_from_str(s: &str) -> Result<serde_yaml::Value, Error>
{ serde_yaml::from_str(s).map_err(Into::into) }

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "kebab-case")]
    struct Knobs {
        num_refine: usize,
        #[serde(default)]
        degree: u32,
    }
    derive_yaml_read!{Knobs}

    #[test]
    fn unknown_keys_are_tolerated() {
        let knobs = Knobs::from_str("num-refine: 3\nnum-refien: 4\n").unwrap();
        assert_eq!(knobs, Knobs { num_refine: 3, degree: 0 });
    }

    #[test]
    fn type_errors_come_from_the_text() {
        let err = Knobs::from_str("num-refine: [1]\n").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
