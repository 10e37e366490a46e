//! Property-based tests using proptest
//!
//! These tests verify conversion between API version shapes and the version
//! resolver using randomized inputs.

use gcp_plane::api::compute::{beta, v1};
use gcp_plane::convert::convert;
use gcp_plane::resource::JsonResourceData;
use gcp_plane::version::{resolve, ApiVersion, Feature, ProductLine, ResolveMode};
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_wire_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-zA-Z]{0,12}", 0..3)
}

fn arb_scheduling() -> impl Strategy<Value = v1::Scheduling> {
    (
        prop::option::of(any::<bool>()),
        prop_oneof!["", "MIGRATE", "TERMINATE"],
        any::<bool>(),
        arb_wire_names(),
    )
        .prop_map(|(automatic_restart, on_host_maintenance, preemptible, null_fields)| {
            v1::Scheduling {
                automatic_restart,
                on_host_maintenance: on_host_maintenance.to_string(),
                preemptible,
                null_fields,
            }
        })
}

fn arb_network_interface() -> impl Strategy<Value = v1::NetworkInterface> {
    (
        "[a-z0-9]{0,8}",
        prop_oneof!["", "global/networks/default", "global/networks/prod"],
        "(10\\.0\\.0\\.[0-9]{1,2})?",
        arb_wire_names(),
    )
        .prop_map(|(name, network, network_ip, null_fields)| v1::NetworkInterface {
            name,
            network: network.to_string(),
            network_ip,
            null_fields,
            ..Default::default()
        })
}

/// Generate arbitrary GA instances, including fields that are never sent
fn arb_instance() -> impl Strategy<Value = v1::Instance> {
    (
        "[a-z][a-z0-9-]{0,20}",
        ".{0,20}",
        prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,6}", 0..3),
        prop::collection::vec(arb_network_interface(), 0..3),
        prop::option::of(arb_scheduling()),
        arb_wire_names(),
    )
        .prop_map(
            |(name, description, labels, network_interfaces, scheduling, null_fields)| v1::Instance {
                name,
                description,
                labels,
                network_interfaces,
                scheduling: scheduling.map(Box::new),
                null_fields,
                ..Default::default()
            },
        )
}

proptest! {
    /// GA -> beta -> GA is lossless, never-sent fields included
    #[test]
    fn ga_beta_round_trip(instance in arb_instance()) {
        let wide: beta::Instance = convert(&instance).unwrap();
        let back: v1::Instance = convert(&wide).unwrap();
        prop_assert_eq!(back, instance);
    }

    /// Never-sent fields survive at every nesting level
    #[test]
    fn null_fields_follow_the_value(instance in arb_instance()) {
        let wide: beta::Instance = convert(&instance).unwrap();
        prop_assert_eq!(&wide.null_fields, &instance.null_fields);
        for (w, n) in wide.network_interfaces.iter().zip(&instance.network_interfaces) {
            prop_assert_eq!(&w.null_fields, &n.null_fields);
        }
        prop_assert_eq!(
            wide.scheduling.as_ref().map(|s| s.null_fields.clone()),
            instance.scheduling.as_ref().map(|s| s.null_fields.clone())
        );
    }

    /// Beta-only fields are dropped on the way down, shared ones kept
    #[test]
    fn beta_to_ga_keeps_shared_fields(
        instance in arb_instance(),
        platform in "(Intel [A-Z][a-z]{3,8})?",
    ) {
        let mut wide: beta::Instance = convert(&instance).unwrap();
        wide.min_cpu_platform = platform;
        wide.display_device = Some(Box::new(beta::DisplayDevice {
            enable_display: true,
            ..Default::default()
        }));

        let ga: v1::Instance = convert(&wide).unwrap();
        prop_assert_eq!(ga, instance);
    }
}

/// Tests for the version resolver
mod resolver_tests {
    use super::*;

    fn instance_features() -> Vec<Feature> {
        vec![
            Feature::new(ApiVersion::V0Beta, "min_cpu_platform"),
            Feature::new(ApiVersion::V0Beta, "scheduling.0.provisioning_model")
                .with_default(json!("STANDARD")),
            Feature::new(ApiVersion::V0Beta, "network_interface.*.alias_ip_range"),
        ]
    }

    fn arb_config() -> impl Strategy<Value = Value> {
        (
            prop_oneof!["", "Intel Skylake"],
            prop_oneof!["", "STANDARD", "SPOT"],
            prop::collection::vec(prop::option::of("10\\.[0-9]\\.0\\.0/24"), 0..4),
        )
            .prop_map(|(platform, model, ranges)| {
                let interfaces: Vec<Value> = ranges
                    .into_iter()
                    .map(|r| match r {
                        Some(cidr) => json!({"alias_ip_range": [{"ip_cidr_range": cidr}]}),
                        None => json!({"network": "default"}),
                    })
                    .collect();
                json!({
                    "min_cpu_platform": platform,
                    "scheduling": [{"provisioning_model": model}],
                    "network_interface": interfaces,
                })
            })
    }

    fn arb_declared() -> impl Strategy<Value = ApiVersion> {
        prop_oneof![Just(ApiVersion::V1), Just(ApiVersion::V0Beta)]
    }

    proptest! {
        /// The result is never less capable than what was declared
        #[test]
        fn never_below_declared(config in arb_config(), declared in arb_declared()) {
            let data = JsonResourceData::new(config);
            let line = ProductLine::Compute;
            for mode in [ResolveMode::AtCreate, ResolveMode::AtUpdate] {
                let version = resolve(line, declared, &instance_features(), mode, &data);
                prop_assert!(line.rank(version) >= line.rank(declared));
            }
        }

        /// Only versions that were passed in come back
        #[test]
        fn result_is_a_candidate(config in arb_config()) {
            let data = JsonResourceData::new(config);
            let version = resolve(
                ProductLine::Compute,
                ApiVersion::V1,
                &instance_features(),
                ResolveMode::AtCreate,
                &data,
            );
            prop_assert!(version == ApiVersion::V1 || version == ApiVersion::V0Beta);
        }

        /// Same input, same answer
        #[test]
        fn resolution_is_deterministic(config in arb_config()) {
            let data = JsonResourceData::new(config);
            let features = instance_features();
            let first = resolve(ProductLine::Compute, ApiVersion::V1, &features, ResolveMode::AtCreate, &data);
            let second = resolve(ProductLine::Compute, ApiVersion::V1, &features, ResolveMode::AtCreate, &data);
            prop_assert_eq!(first, second);
        }

        /// Beta is chosen exactly when some beta-only field is in use
        #[test]
        fn beta_iff_feature_in_use(config in arb_config()) {
            let uses_beta = config["min_cpu_platform"] != ""
                || config["scheduling"][0]["provisioning_model"] == "SPOT"
                || config["network_interface"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .any(|i| i.get("alias_ip_range").is_some());

            let data = JsonResourceData::new(config);
            let version = resolve(
                ProductLine::Compute,
                ApiVersion::V1,
                &instance_features(),
                ResolveMode::AtCreate,
                &data,
            );
            prop_assert_eq!(version == ApiVersion::V0Beta, uses_beta);
        }
    }
}
