//! Compute Engine GA (`v1`) resource shapes

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
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<Box<Scheduling>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub self_link: String,

    /// Wire names to send as explicit nulls
    #[serde(skip)]
    pub null_fields: Vec<String>,
}

wire_shape!(Instance {
    unsent: [null_fields],
    nested: [scheduling => "scheduling"],
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
    #[serde(skip)]
    pub null_fields: Vec<String>,
}

wire_shape!(NetworkInterface {
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
    #[serde(skip)]
    pub null_fields: Vec<String>,
}

wire_shape!(Scheduling {
    unsent: [null_fields],
    nested: [],
    nested_list: [],
});
