//! Tests for panelmed-model types.

use panelmed_model::{
    EffectKind, EffectType, MediationVariables, ModelConfig, ModeratorSpec, PanelError,
    PanelModel, PanelSpec, split_joined,
};

#[test]
fn bogus_panel_model_is_configuration_error() {
    let err = "bogus".parse::<PanelModel>().unwrap_err();
    match err {
        PanelError::Configuration { field, message } => {
            assert_eq!(field, "panel_model");
            assert!(message.contains("bogus"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn labels_parse_case_insensitively() {
    assert_eq!("Within".parse::<PanelModel>().unwrap(), PanelModel::Within);
    assert_eq!(" pooling ".parse::<PanelModel>().unwrap(), PanelModel::Pooling);
    assert_eq!("TWOWAYS".parse::<EffectType>().unwrap(), EffectType::Twoways);
    assert!("both".parse::<EffectType>().unwrap_err().is_configuration());
}

#[test]
fn labels_round_trip_through_display() {
    for model in PanelModel::ALL {
        assert_eq!(model.to_string().parse::<PanelModel>().unwrap(), model);
    }
}

#[test]
fn from_labels_rejects_unknown_effect() {
    let err = ModelConfig::from_labels("random", "group").unwrap_err();
    assert!(matches!(err, PanelError::Configuration { ref field, .. } if field == "effect"));
}

#[test]
fn between_twoways_is_rejected() {
    let config = ModelConfig::new(PanelModel::Between, EffectType::Twoways);
    assert!(config.validate().unwrap_err().is_configuration());
    let config = ModelConfig::new(PanelModel::Within, EffectType::Twoways);
    assert!(config.validate().is_ok());
}

#[test]
fn multiple_moderators_are_rejected() {
    let config = ModelConfig::default().with_moderator(Some(ModeratorSpec {
        moderators: vec!["w1".to_string(), "w2".to_string()],
    }));
    assert!(config.validate().unwrap_err().is_configuration());
}

#[test]
fn empty_moderator_spec_is_dropped() {
    let config = ModelConfig::default().with_moderator(Some(ModeratorSpec::default()));
    assert!(config.moderator.is_none());
    let config = ModelConfig::default().with_moderator(Some(ModeratorSpec::single("w")));
    assert_eq!(config.moderator_column(), Some("w"));
}

#[test]
fn config_deserializes_from_toml_with_defaults() {
    let config: ModelConfig = toml::from_str(
        r#"
panel_model = "random"
robust_se = true
"#,
    )
    .expect("parse config");
    assert_eq!(config.panel_model, PanelModel::Random);
    assert_eq!(config.effect, EffectType::Individual);
    assert!(config.robust_se);
    assert_eq!(config.lag, 0);
}

#[test]
fn config_serializes_lowercase_labels() {
    let config = ModelConfig::new(PanelModel::Pooling, EffectType::Time);
    let json = serde_json::to_string(&config).expect("serialize config");
    assert!(json.contains("\"pooling\""));
    assert!(json.contains("\"time\""));
}

#[test]
fn panel_spec_balances_by_default() {
    let spec = PanelSpec::new("id", "year");
    assert!(spec.balance);
    assert!(!spec.with_balance(false).balance);
}

#[test]
fn variables_from_joined_list() {
    let vars = MediationVariables::from_joined("x", "m1, m2,,", "y");
    assert_eq!(vars.mediators, vec!["m1", "m2"]);
    assert_eq!(vars.columns(), vec!["x", "m1", "m2", "y"]);
    assert!(vars.validate().is_ok());
    assert_eq!(split_joined(" a "), vec!["a"]);
}

#[test]
fn variables_reject_reuse_and_empty_mediators() {
    let vars = MediationVariables::new("x", ["x"], "y");
    assert!(vars.validate().unwrap_err().is_configuration());
    let vars = MediationVariables::new("x", Vec::<String>::new(), "y");
    assert!(vars.validate().unwrap_err().is_configuration());
}

#[test]
fn effect_labels() {
    assert_eq!(EffectKind::Indirect.label("m1"), "indirect_m1");
    assert_eq!(EffectKind::Direct.label("x"), "direct_x");
    assert_eq!(EffectKind::Total.label("x"), "total_x");
}
