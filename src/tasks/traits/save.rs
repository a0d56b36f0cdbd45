use crate::FailResult;

use std::path::Path;

pub trait Load: Sized {
    fn load(path: impl AsRef<Path>) -> FailResult<Self>;
}

/// Writes go through a temp file and a rename, so readers never see half a file.
pub trait Save {
    fn save(&self, path: impl AsRef<Path>) -> FailResult<()>;
}

/// Utility adapter for `Load`/`Save` that serializes as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Json<T: ?Sized>(pub T);

/// Utility adapter for `Save` that serializes as YAML.
///
/// There is deliberately no `Load`; yaml is read through `YamlRead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Yaml<T: ?Sized>(pub T);

impl<T> Load for Json<T> where T: for<'de> serde::Deserialize<'de> {
    fn load(path: impl AsRef<Path>) -> FailResult<Json<T>>
    { Ok(Json(serde_json::from_reader(asgrid_fs_util::open_text(path)?)?)) }
}

impl<T> Save for Json<T> where T: serde::Serialize {
    fn save(&self, path: impl AsRef<Path>) -> FailResult<()>
    { Ok(asgrid_fs_util::write_atomic(path, &serde_json::to_vec(&self.0)?)?) }
}

impl<T> Save for Yaml<T> where T: serde::Serialize {
    fn save(&self, path: impl AsRef<Path>) -> FailResult<()>
    { Ok(asgrid_fs_util::write_atomic(path, serde_yaml::to_string(&self.0)?.as_bytes())?) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_nan_is_null() {
        let tmp = asgrid_fs_util::TempDir::new("asgrid-save").unwrap();
        let path = tmp.path().join("x.json");
        Json(vec![1.0, std::f64::NAN]).save(&path).unwrap();

        assert_eq!(asgrid_fs_util::read_to_string(&path).unwrap(), "[1.0,null]");
        let Json(back): Json<Vec<Option<f64>>> = Load::load(&path).unwrap();
        assert_eq!(back, vec![Some(1.0), None]);
    }

    #[test]
    fn yaml_replaces_existing() {
        let tmp = asgrid_fs_util::TempDir::new("asgrid-save").unwrap();
        let path = tmp.path().join("x.yaml");
        Yaml(vec!["a"]).save(&path).unwrap();
        Yaml(vec!["b"]).save(&path).unwrap();
        assert!(asgrid_fs_util::read_to_string(&path).unwrap().contains("b"));
    }
}
