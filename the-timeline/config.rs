use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::{
  edit::ReferencePoint,
  track::NeighborGapPolicy,
};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to parse edit config: {0}")]
  Parse(#[from] toml::de::Error),
}

/// Policies applied by [`Editor`](crate::edit::Editor) where the free edit
/// functions take them as arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EditConfig {
  /// Delete transitions in the way of overwrite, insert and slice instead of
  /// failing.
  pub remove_transitions:  bool,
  pub reference_point:     ReferencePoint,
  pub neighbor_gap_policy: NeighborGapPolicy,
}

impl Default for EditConfig {
  fn default() -> Self {
    Self {
      remove_transitions:  true,
      reference_point:     ReferencePoint::Source,
      neighbor_gap_policy: NeighborGapPolicy::Never,
    }
  }
}

impl EditConfig {
  pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
    let config = toml::from_str(contents)?;
    tracing::debug!(?config, "loaded edit config");
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    assert_eq!(EditConfig::from_toml_str("").unwrap(), EditConfig::default());
  }

  #[test]
  fn fields_are_kebab_case() {
    let config = EditConfig::from_toml_str(
      r#"
        remove-transitions = false
        reference-point = "fit"
        neighbor-gap-policy = "around-transitions"
      "#,
    )
    .unwrap();
    assert_eq!(config, EditConfig {
      remove_transitions:  false,
      reference_point:     ReferencePoint::Fit,
      neighbor_gap_policy: NeighborGapPolicy::AroundTransitions,
    });
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let err = EditConfig::from_toml_str("ripple-mode = true").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().starts_with("failed to parse edit config"));
  }
}
