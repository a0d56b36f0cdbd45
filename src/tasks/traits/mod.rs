pub mod save;

pub use self::save::{Load, Save, Json, Yaml};
