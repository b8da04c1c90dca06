//! # gantry-rules
//!
//! The policy engine: a catalog of named, independently toggleable safety
//! rules grouped into structural, data, operational, and permission
//! categories, plus the numeric limits those rules enforce.
//!
//! ## Overview
//!
//! Twelve built-in rules are seeded at construction; a strict/permissive
//! mode controls the default enablement of the strict-only subset. Custom
//! rules may be appended at runtime and are treated uniformly with built-in
//! ones. The catalog's check functions are pure comparisons against the
//! configured limits; the batch evaluator in `gantry-validate` turns their
//! failures into violations.
//!
//! Configuration is TOML-driven (see [`RulesConfig`]): limits, structural
//! element type identifiers, per-rule enablement, and custom rules can all
//! be declared in a rules file.

pub mod catalog;
pub mod config;

pub use catalog::{RulesExport, SafetyLimits, SafetyMode, SafetyRules};
pub use config::{CustomRuleConfig, LimitsOverride, RulesConfig};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use gantry_contracts::error::GantryError;
    use gantry_contracts::operation::OpKind;
    use gantry_contracts::permission::PermissionLevel;
    use gantry_contracts::violation::{RuleCategory, SafetyRule, Severity};

    use crate::{RulesConfig, SafetyMode, SafetyRules};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn custom_rule(name: &str) -> SafetyRule {
        SafetyRule {
            name: name.to_string(),
            description: "a custom test rule".to_string(),
            category: RuleCategory::Operational,
            severity: Severity::Warning,
            enabled: true,
        }
    }

    // ── Seeding ───────────────────────────────────────────────────────────────

    #[test]
    fn test_strict_mode_seeds_twelve_rules() {
        let rules = SafetyRules::new(SafetyMode::Strict);
        assert_eq!(rules.export().rules.len(), 12);
    }

    #[test]
    fn test_no_floating_objects_only_enabled_in_strict() {
        let strict = SafetyRules::new(SafetyMode::Strict);
        assert!(strict.is_enabled("no_floating_objects"));

        let permissive = SafetyRules::new(SafetyMode::Permissive);
        assert!(!permissive.is_enabled("no_floating_objects"));
    }

    #[test]
    fn test_structural_element_detection() {
        let rules = SafetyRules::new(SafetyMode::Strict);
        assert!(rules.is_structural_type("Arch::Wall"));
        assert!(rules.is_structural_type("Arch::Structure"));
        assert!(!rules.is_structural_type("Arch::Window"));
        assert!(!rules.is_structural_type("Part::Box"));
    }

    // ── Registry operations ───────────────────────────────────────────────────

    #[test]
    fn test_enable_disable_round_trip() {
        let mut rules = SafetyRules::new(SafetyMode::Strict);
        assert!(rules.is_enabled("no_delete_load_bearing"));

        rules.disable("no_delete_load_bearing");
        assert!(!rules.is_enabled("no_delete_load_bearing"));

        rules.enable("no_delete_load_bearing");
        assert!(rules.is_enabled("no_delete_load_bearing"));
    }

    #[test]
    fn test_unknown_rule_is_treated_as_disabled() {
        let rules = SafetyRules::new(SafetyMode::Strict);
        assert!(!rules.is_enabled("does_not_exist"));
    }

    #[test]
    fn test_custom_rules_are_looked_up_uniformly() {
        let mut rules = SafetyRules::new(SafetyMode::Strict);
        rules.add_custom_rule(custom_rule("site_curfew")).unwrap();

        assert!(rules.is_enabled("site_curfew"));
        rules.disable("site_curfew");
        assert!(!rules.is_enabled("site_curfew"));

        // Category filtering includes enabled custom rules only.
        rules.enable("site_curfew");
        let operational = rules.rules_in_category(RuleCategory::Operational);
        assert!(operational.iter().any(|r| r.name == "site_curfew"));
    }

    #[test]
    fn test_duplicate_custom_rule_is_rejected() {
        let mut rules = SafetyRules::new(SafetyMode::Strict);
        let result = rules.add_custom_rule(custom_rule("no_mass_delete"));

        match result {
            Err(GantryError::DuplicateRule { name }) => assert_eq!(name, "no_mass_delete"),
            other => panic!("expected DuplicateRule, got {:?}", other),
        }
    }

    // ── Pure checks ───────────────────────────────────────────────────────────

    #[test]
    fn test_batch_size_check() {
        let rules = SafetyRules::new(SafetyMode::Strict);

        assert!(rules.check_batch_size(10).is_ok());

        let err = rules.check_batch_size(100).unwrap_err();
        assert!(err.contains("too many operations: 100"));
        assert!(err.contains("max: 50"));
    }

    #[test]
    fn test_batch_size_check_passes_when_rule_disabled() {
        let mut rules = SafetyRules::new(SafetyMode::Strict);
        rules.disable("limit_operation_complexity");
        assert!(rules.check_batch_size(100).is_ok());
    }

    #[test]
    fn test_mass_delete_check() {
        let rules = SafetyRules::new(SafetyMode::Strict);

        assert!(rules.check_mass_delete(5).is_ok());

        let err = rules.check_mass_delete(20).unwrap_err();
        assert!(err.contains("mass delete blocked: 20 objects"));
        assert!(err.contains("max: 10"));
    }

    #[test]
    fn test_permission_levels_for_operation_kinds() {
        let rules = SafetyRules::new(SafetyMode::Strict);
        assert_eq!(
            rules.required_permission(OpKind::Query),
            PermissionLevel::Read
        );
        assert_eq!(
            rules.required_permission(OpKind::Delete),
            PermissionLevel::Delete
        );
    }

    // ── Export ────────────────────────────────────────────────────────────────

    #[test]
    fn test_export_includes_limits_and_custom_rules() {
        let mut rules = SafetyRules::new(SafetyMode::Strict);
        rules.add_custom_rule(custom_rule("site_curfew")).unwrap();

        let export = rules.export();
        assert_eq!(export.mode, SafetyMode::Strict);
        assert_eq!(export.limits.max_operations_per_batch, 50);
        assert_eq!(export.rules.len(), 13);
        assert!(export.rules.iter().any(|r| r.name == "site_curfew"));
        assert!(export
            .structural_types
            .contains(&"Arch::Wall".to_string()));
    }

    // ── TOML configuration ────────────────────────────────────────────────────

    #[test]
    fn test_config_defaults_to_strict() {
        let config = RulesConfig::from_toml_str("").unwrap();
        let rules = SafetyRules::from_config(&config).unwrap();
        assert_eq!(rules.mode(), SafetyMode::Strict);
        assert!(rules.is_enabled("no_floating_objects"));
    }

    #[test]
    fn test_config_overrides_limits_and_disables_rules() {
        let toml = r#"
            mode = "permissive"

            [limits]
            max_operations_per_batch = 20
            max_delete_objects = 5

            disabled = ["require_delete_confirmation"]
        "#;

        let config = RulesConfig::from_toml_str(toml).unwrap();
        let rules = SafetyRules::from_config(&config).unwrap();

        assert_eq!(rules.mode(), SafetyMode::Permissive);
        assert_eq!(rules.limits().max_operations_per_batch, 20);
        assert_eq!(rules.limits().max_delete_objects, 5);
        assert!(!rules.is_enabled("require_delete_confirmation"));
        // Untouched rules keep their defaults.
        assert!(rules.is_enabled("no_mass_delete"));
    }

    #[test]
    fn test_config_structural_types_are_configuration() {
        let toml = r#"
            structural_types = ["Ship::Hull", "Ship::Keel"]
        "#;

        let config = RulesConfig::from_toml_str(toml).unwrap();
        let rules = SafetyRules::from_config(&config).unwrap();

        assert!(rules.is_structural_type("Ship::Keel"));
        assert!(!rules.is_structural_type("Arch::Wall"));
    }

    #[test]
    fn test_config_custom_rules_are_appended() {
        let toml = r#"
            [[custom]]
            name = "no_weekend_deploys"
            description = "Block execution outside business hours"
            category = "operational"
            severity = "warning"
        "#;

        let config = RulesConfig::from_toml_str(toml).unwrap();
        let rules = SafetyRules::from_config(&config).unwrap();

        assert!(rules.is_enabled("no_weekend_deploys"));
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        let result = RulesConfig::from_toml_str("this is not valid toml ][[[");

        match result {
            Err(GantryError::Config { reason }) => {
                assert!(reason.contains("failed to parse rules TOML"));
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }
}
