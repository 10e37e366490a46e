//! Compute Engine beta resource shapes
//!
//! Supersets of the [`v1`](super::v1) shapes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::wire_shape;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Instance {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub machine_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub min_cpu_platform: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<Box<Scheduling>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_device: Option<Box<DisplayDevice>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub self_link: String,

    #[serde(skip)]
    pub null_fields: Vec<String>,
}

wire_shape!(Instance {
    unsent: [null_fields],
    nested: [scheduling => "scheduling", display_device => "displayDevice"],
    nested_list: [network_interfaces => "networkInterfaces"],
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subnetwork: String,
    #[serde(rename = "networkIP", skip_serializing_if = "String::is_empty")]
    pub network_ip: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alias_ip_ranges: Vec<AliasIpRange>,
    #[serde(skip)]
    pub null_fields: Vec<String>,
}

wire_shape!(NetworkInterface {
    unsent: [null_fields],
    nested: [],
    nested_list: [alias_ip_ranges => "aliasIpRanges"],
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AliasIpRange {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip_cidr_range: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subnetwork_range_name: String,
    #[serde(skip)]
    pub null_fields: Vec<String>,
}

wire_shape!(AliasIpRange {
    unsent: [null_fields],
    nested: [],
    nested_list: [],
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scheduling {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_restart: Option<bool>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub on_host_maintenance: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub preemptible: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub provisioning_model: String,
    #[serde(skip)]
    pub null_fields: Vec<String>,
}

wire_shape!(Scheduling {
    unsent: [null_fields],
    nested: [],
    nested_list: [],
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayDevice {
    pub enable_display: bool,
    #[serde(skip)]
    pub null_fields: Vec<String>,
}

wire_shape!(DisplayDevice {
    unsent: [null_fields],
    nested: [],
    nested_list: [],
});
