//! Version-specific API resource shapes
//!
//! Shapes follow the API's camelCase wire names. Each level may list wire
//! names in `null_fields` to have them sent as explicit `null`, which is how a
//! field is cleared on PATCH.

pub mod compute;

use serde_json::Value;

use crate::convert::{ConvertError, Unsent, UnsentFields, WireShape};

/// Serialize a shape for a request body, honoring `null_fields` at every level
pub fn request_body<T: WireShape>(shape: &T) -> Result<Value, ConvertError> {
    let mut doc = serde_json::to_value(shape).map_err(|source| ConvertError::Serialize {
        shape: T::SHAPE,
        source,
    })?;
    apply_null_fields(&mut doc, &shape.unsent_fields()?);
    Ok(doc)
}

fn apply_null_fields(doc: &mut Value, fields: &UnsentFields) {
    for (field, entry) in fields.iter() {
        match entry {
            Unsent::Value(Value::Array(names)) if field == "null_fields" => {
                if let Value::Object(map) = doc {
                    for name in names.iter().filter_map(|n| n.as_str()) {
                        map.insert(name.to_string(), Value::Null);
                    }
                }
            }
            Unsent::Value(_) => {}
            Unsent::Nested { wire, fields } => {
                if let Some(child) = doc.get_mut(*wire) {
                    apply_null_fields(child, fields);
                }
            }
            Unsent::List { wire, items } => {
                if let Some(Value::Array(children)) = doc.get_mut(*wire) {
                    for (child, nested) in children.iter_mut().zip(items) {
                        apply_null_fields(child, nested);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire_shape;
    use compute::beta;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Range {
        ip_cidr_range: String,
        #[serde(skip)]
        null_fields: Vec<String>,
    }
    wire_shape!(Range { unsent: [null_fields], nested: [], nested_list: [] });

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Interface {
        #[serde(rename = "primaryIPRange", skip_serializing_if = "Option::is_none")]
        primary: Option<Box<Range>>,
        #[serde(rename = "secondaryIPRanges")]
        secondary: Vec<Range>,
        #[serde(skip)]
        null_fields: Vec<String>,
    }
    wire_shape!(Interface {
        unsent: [null_fields],
        nested: [primary => "primaryIPRange"],
        nested_list: [secondary => "secondaryIPRanges"],
    });

    #[test]
    fn test_request_body_follows_renamed_nested_fields() {
        let interface = Interface {
            primary: Some(Box::new(Range {
                ip_cidr_range: "10.0.0.0/24".to_string(),
                null_fields: vec!["subnetworkRangeName".to_string()],
            })),
            secondary: vec![Range {
                null_fields: vec!["ipCidrRange".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        };

        let body = request_body(&interface).unwrap();
        assert!(body["primaryIPRange"]
            .as_object()
            .unwrap()
            .contains_key("subnetworkRangeName"));
        assert!(body["secondaryIPRanges"][0]
            .as_object()
            .unwrap()
            .contains_key("ipCidrRange"));
        assert!(body.get("primary").is_none());
    }

    #[test]
    fn test_request_body_sends_nulls_at_every_level() {
        let instance = beta::Instance {
            name: "vm".to_string(),
            null_fields: vec!["description".to_string()],
            network_interfaces: vec![
                beta::NetworkInterface::default(),
                beta::NetworkInterface {
                    network: "default".to_string(),
                    null_fields: vec!["aliasIpRanges".to_string()],
                    ..Default::default()
                },
            ],
            scheduling: Some(Box::new(beta::Scheduling {
                preemptible: true,
                null_fields: vec!["provisioningModel".to_string()],
                ..Default::default()
            })),
            ..Default::default()
        };

        let body = request_body(&instance).unwrap();
        assert_eq!(body["name"], "vm");
        assert!(body["description"].is_null());
        assert!(body.as_object().unwrap().contains_key("description"));
        assert!(body["networkInterfaces"][1]
            .as_object()
            .unwrap()
            .contains_key("aliasIpRanges"));
        assert!(!body["networkInterfaces"][0]
            .as_object()
            .unwrap()
            .contains_key("aliasIpRanges"));
        assert!(body["scheduling"]
            .as_object()
            .unwrap()
            .contains_key("provisioningModel"));
    }
}
