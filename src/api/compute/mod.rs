//! Compute Engine shapes, one module per API surface

pub mod beta;
pub mod v1;

#[cfg(test)]
mod tests {
    use super::{beta, v1};
    use crate::convert::convert;

    fn beta_instance() -> beta::Instance {
        beta::Instance {
            name: "vm-1".to_string(),
            machine_type: "zones/us-central1-a/machineTypes/e2-small".to_string(),
            min_cpu_platform: "Intel Skylake".to_string(),
            network_interfaces: vec![beta::NetworkInterface {
                network: "global/networks/default".to_string(),
                alias_ip_ranges: vec![beta::AliasIpRange {
                    ip_cidr_range: "/24".to_string(),
                    ..Default::default()
                }],
                null_fields: vec!["subnetwork".to_string()],
                ..Default::default()
            }],
            scheduling: Some(Box::new(beta::Scheduling {
                automatic_restart: Some(false),
                null_fields: vec!["onHostMaintenance".to_string()],
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    #[test]
    fn test_beta_to_v1_keeps_shared_fields_and_sentinels() {
        let ga: v1::Instance = convert(&beta_instance()).unwrap();

        assert_eq!(ga.name, "vm-1");
        assert_eq!(ga.network_interfaces.len(), 1);
        assert_eq!(ga.network_interfaces[0].null_fields, vec!["subnetwork".to_string()]);
        let scheduling = ga.scheduling.unwrap();
        assert_eq!(scheduling.automatic_restart, Some(false));
        assert_eq!(scheduling.null_fields, vec!["onHostMaintenance".to_string()]);
    }

    #[test]
    fn test_v1_to_beta_round_trip() {
        let ga = v1::Instance {
            name: "vm-2".to_string(),
            null_fields: vec!["description".to_string()],
            network_interfaces: vec![v1::NetworkInterface {
                network_ip: "10.0.0.2".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let wide: beta::Instance = convert(&ga).unwrap();
        assert_eq!(wide.network_interfaces[0].network_ip, "10.0.0.2");
        assert_eq!(wide.null_fields, vec!["description".to_string()]);

        let back: v1::Instance = convert(&wide).unwrap();
        assert_eq!(back, ga);
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let doc = serde_json::to_value(beta_instance()).unwrap();
        assert_eq!(doc["minCpuPlatform"], "Intel Skylake");
        assert_eq!(doc["networkInterfaces"][0]["aliasIpRanges"][0]["ipCidrRange"], "/24");
        assert!(doc.get("nullFields").is_none());
    }
}
