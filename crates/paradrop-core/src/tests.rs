#[cfg(test)]
mod tests {
    use crate::config::{AirdropConfig, ConfigError};
    use crate::constants::*;
    use crate::enums::*;
    use crate::events::{AirdropEvent, HostEvent};
    use crate::types::{EntityHandle, FactionId, LauncherId};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AirdropConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AirdropConfig::default());
        assert_eq!(config.cadence_secs, DEFAULT_CADENCE_SECS);
        assert_eq!(config.munition_type, DEFAULT_MUNITION_TYPE);
        assert!(config.max_landing_slope.is_none());
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = AirdropConfig::from_json_str(
            r#"{ "cadence_secs": 0.5, "formation_prefix": "Para", "max_landing_slope": 0.3 }"#,
        )
        .unwrap();
        assert_eq!(config.cadence_secs, 0.5);
        assert_eq!(config.formation_prefix, "Para");
        assert_eq!(config.max_landing_slope, Some(0.3));
        // Untouched fields keep their defaults.
        assert_eq!(config.unit_type, DEFAULT_UNIT_TYPE);
    }

    #[test]
    fn test_config_rejects_bad_cadence() {
        for json in [r#"{ "cadence_secs": 0.0 }"#, r#"{ "cadence_secs": -1.0 }"#] {
            match AirdropConfig::from_json_str(json) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "cadence_secs"),
                other => panic!("expected invalid cadence, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_config_rejects_negative_slope_and_empty_munition() {
        assert!(matches!(
            AirdropConfig::from_json_str(r#"{ "max_landing_slope": -0.1 }"#),
            Err(ConfigError::Invalid { field: "max_landing_slope", .. })
        ));
        assert!(matches!(
            AirdropConfig::from_json_str(r#"{ "munition_type": "" }"#),
            Err(ConfigError::Invalid { field: "munition_type", .. })
        ));
    }

    #[test]
    fn test_config_malformed_json() {
        assert!(matches!(
            AirdropConfig::from_json_str("{ cadence_secs: 1 }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_config_missing_file() {
        assert!(matches!(
            AirdropConfig::from_path("/definitely/not/here/airdrop.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_water_surfaces() {
        assert!(SurfaceType::Water.is_water());
        assert!(SurfaceType::ShallowWater.is_water());
        assert!(!SurfaceType::Land.is_water());
        assert!(!SurfaceType::Road.is_water());
        assert!(!SurfaceType::Runway.is_water());
    }

    #[test]
    fn test_tracker_phase_terminal() {
        assert!(!TrackerPhase::Tracking.is_terminal());
        assert!(!TrackerPhase::Predicting.is_terminal());
        assert!(TrackerPhase::Resolving.is_terminal());
        assert!(TrackerPhase::Resolved.is_terminal());
        assert_eq!(TrackerPhase::default(), TrackerPhase::Tracking);
    }

    #[test]
    fn test_host_event_tagged_json() {
        let json = r#"{ "type": "Shot", "launcher": 7, "faction": 2,
                        "weapon_type": "parachutist", "weapon": 99 }"#;
        let event: HostEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            HostEvent::Shot {
                launcher: LauncherId(7),
                faction: FactionId(2),
                weapon_type: "parachutist".into(),
                weapon: EntityHandle(99),
            }
        );
    }

    #[test]
    fn test_airdrop_event_carries_type_tag() {
        let event = AirdropEvent::BurstDiscarded {
            launcher: LauncherId(3),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "BurstDiscarded");
        assert_eq!(value["launcher"], 3);
    }
}
