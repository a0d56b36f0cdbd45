use crate::FailResult;

use asgrid_tasks_config::YamlRead;

use serde::Serialize;
use serde_yaml::{Value, Mapping};
use std::path::PathBuf;

/// A list of config yamls that can be merged into a single effective config.
///
/// Can be serialized to a file that shows all of the configs in detail.
#[derive(Serialize)]
#[derive(Debug, Clone)]
pub struct ConfigSources(Vec<Config>);

// entry in input-config-sources.yaml
#[derive(Serialize)]
#[derive(Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Config {
    source: ConfigSource,
    yaml: Value,
}

#[derive(Serialize)]
#[derive(Debug, Clone)]
#[serde(rename_all = "kebab-case")]
enum ConfigSource {
    File(PathBuf),
    Argument,
}

impl Config {
    /// May do path resolution and file IO
    pub(crate) fn resolve_from_arg(s: &str) -> FailResult<Config>
    { resolve_from_arg::resolve_from_arg(s) }
}

mod resolve_from_arg {
    use super::*;

    pub(crate) fn resolve_from_arg(s: &str) -> FailResult<Config> {
        // NOTE: no mechanism is provided for escaping a path containing ':'.
        match s.find(':') {
            Some(colon) => lit_from_arg(&s[..colon], &s[colon + 1..]),
            None => read_file_from_arg(s),
        }
    }

    fn lit_from_arg(path: &str, yaml: &str) -> FailResult<Config> {
        let path: Vec<_> = match path {
            "" => vec![],
            path => path.split('.').collect(),
        };
        let value: Value = YamlRead::from_str(yaml)?;
        let yaml = make_nested_mapping(&path, value);
        let source = ConfigSource::Argument;

        Ok(Config { yaml, source })
    }

    // May do path resolution and file IO
    fn read_file_from_arg(path: &str) -> FailResult<Config> {
        let path = asgrid_fs_util::canonicalize(path)?;
        let text = asgrid_fs_util::read_to_string(&path)?;

        let source = ConfigSource::File(path);
        let yaml = YamlRead::from_str(&text)?;
        Ok(Config { yaml, source })
    }

    fn make_nested_mapping(path: &[&str], mut value: Value) -> Value {
        for &key in path.iter().rev() {
            let mut mapping = Mapping::new();
            mapping.insert(Value::String(key.into()), value);
            value = Value::Mapping(mapping);
        }
        value
    }

    macro_rules! m { ($($arg:tt)*) => { Value::Mapping(vec![$($arg)*].into_iter().collect()) }; }
    macro_rules! s { ($($arg:tt)*) => { Value::Sequence(vec![$($arg)*]) }; }

    #[test]
    fn test_literal_args() {
        let expected = m!{ ("hello".into(), m!{ ("how-are-you".into(), s![42.into()]) }) };
        assert_eq!(expected, Config::resolve_from_arg(":{hello: {how-are-you: [42]}}").unwrap().yaml);
        assert_eq!(expected, Config::resolve_from_arg(": {hello: {how-are-you: [42]}}").unwrap().yaml);
        assert_eq!(expected, Config::resolve_from_arg("hello:{how-are-you: [42]}").unwrap().yaml);
        assert_eq!(expected, Config::resolve_from_arg("hello: {how-are-you: [42]}").unwrap().yaml);
        assert_eq!(expected, Config::resolve_from_arg("hello.how-are-you: [42]").unwrap().yaml);
    }

    #[test]
    fn test_model_names_survive() {
        // the first colon separates the key path, later ones belong to the yaml
        let expected = m!{ ("model".into(), "sin5Dexp0.1".into()) };
        assert_eq!(expected, Config::resolve_from_arg("model: sin5Dexp0.1").unwrap().yaml);
        let expected = m!{ ("data-dir".into(), "a:b".into()) };
        assert_eq!(expected, Config::resolve_from_arg("data-dir: 'a:b'").unwrap().yaml);
    }
}

impl ConfigSources {
    /// Construct from values given to --config.
    ///
    /// # Notice
    /// Relative paths will be resolved immediately, and possibly
    /// even opened, read, and parsed as yaml.
    pub fn resolve_from_args<As>(args: As) -> FailResult<Self>
    where
        As: IntoIterator,
        As::Item: AsRef<str>,
    {
        let mut out = vec![];
        for arg in args {
            out.push(Config::resolve_from_arg(arg.as_ref())?);
        }
        Ok(ConfigSources(out))
    }

    /// Append a config given directly on the command line.
    pub fn push_literal(&mut self, arg: &str) -> FailResult<()> {
        self.0.push(Config::resolve_from_arg(arg)?);
        Ok(())
    }

    pub fn effective_yaml(&self) -> Value {
        let empty = Value::Mapping(Default::default());
        self.0.iter()
            .fold(empty, |a, b| dumb_config_merge(a, b.yaml.clone()))
    }
}

/// A simplistic config-merging function which operates directly on the yaml representation,
/// independent of what is being deserialized.
///
/// Given two mappings, it takes the union of their keys and recursively merges their intersection.
/// Given any other two values, it prefers 'b'.
fn dumb_config_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Mapping(mut a), Value::Mapping(b)) => {
            for (key, b_value) in b {
                let value = match a.remove(&key) {
                    None => b_value,
                    Some(a_value) => dumb_config_merge(a_value, b_value),
                };
                a.insert(key, value);
            }
            Value::Mapping(a)
        },
        (_, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_sources_win() {
        let mut sources = ConfigSources::resolve_from_args(&[
            ":{model: exp3D, max-points: 40}",
            "max-points: 80",
        ]).unwrap();
        sources.push_literal("num-threads: 2").unwrap();

        let yaml = sources.effective_yaml();
        assert_eq!(yaml["model"], Value::from("exp3D"));
        assert_eq!(yaml["max-points"], Value::from(80));
        assert_eq!(yaml["num-threads"], Value::from(2));
    }

    #[test]
    fn files_are_read() {
        let tmp = asgrid_fs_util::TempDir::new("asgrid-cfg").unwrap();
        let path = tmp.path().join("sweep.yaml");
        asgrid_fs_util::write_atomic(&path, b"method: Halton\nmax-points: 64\n").unwrap();

        let sources = ConfigSources::resolve_from_args(&[path.to_str().unwrap(), "max-points: 128"]).unwrap();
        let yaml = sources.effective_yaml();
        assert_eq!(yaml["method"], Value::from("Halton"));
        assert_eq!(yaml["max-points"], Value::from(128));
    }
}
