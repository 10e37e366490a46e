//! Conversion between version-specific shapes of the same resource
//!
//! Two shapes are converted through their JSON wire form: serialize the source,
//! deserialize into the destination. Fields that never go on the wire (marked
//! `#[serde(skip)]`, such as `null_fields`) would be lost by that round
//! trip, so every shape also describes them through [`WireShape`] and they are
//! copied across by name afterwards, recursing into nested records and lists
//! of records.
//!
//! Shapes declare their table with [`wire_shape!`](crate::wire_shape):
//!
//! ```ignore
//! wire_shape!(Instance {
//!     unsent: [null_fields],
//!     nested: [scheduling => "scheduling"],
//!     nested_list: [network_interfaces => "networkInterfaces"],
//! });
//! ```
//!
//! Shapes are expected to be supersets or subsets of one another. A field with
//! the same name but an incompatible type is not detected up front; it surfaces
//! as a [`ConvertError`] at conversion time.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::resource::data::is_zero;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to serialize {shape} to a wire document: {source}")]
    Serialize {
        shape: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to deserialize wire document into {shape}: {source}")]
    Deserialize {
        shape: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to restore field {field} on {shape}: {source}")]
    Restore {
        shape: &'static str,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Values of a shape's non-transmitted fields, keyed by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnsentFields {
    entries: BTreeMap<&'static str, Unsent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Unsent {
    Value(Value),
    /// A nested shape, with the wire name of the field holding it
    Nested {
        wire: &'static str,
        fields: UnsentFields,
    },
    List {
        wire: &'static str,
        items: Vec<UnsentFields>,
    },
}

impl UnsentFields {
    /// Record a non-transmitted field; empty values are not carried
    pub fn insert_value<T: Serialize>(
        &mut self,
        shape: &'static str,
        field: &'static str,
        value: &T,
    ) -> Result<(), ConvertError> {
        let value = serde_json::to_value(value)
            .map_err(|source| ConvertError::Serialize { shape, source })?;
        if !is_zero(&value) {
            self.entries.insert(field, Unsent::Value(value));
        }
        Ok(())
    }

    pub fn insert_nested(
        &mut self,
        field: &'static str,
        wire: &'static str,
        nested: Option<UnsentFields>,
    ) {
        if let Some(fields) = nested.filter(|n| !n.is_empty()) {
            self.entries.insert(field, Unsent::Nested { wire, fields });
        }
    }

    pub fn insert_list(&mut self, field: &'static str, wire: &'static str, items: Vec<UnsentFields>) {
        if items.iter().any(|i| !i.is_empty()) {
            self.entries.insert(field, Unsent::List { wire, items });
        }
    }

    pub fn value(&self, field: &str) -> Option<&Value> {
        match self.entries.get(field) {
            Some(Unsent::Value(v)) => Some(v),
            _ => None,
        }
    }

    pub fn nested(&self, field: &str) -> Option<&UnsentFields> {
        match self.entries.get(field) {
            Some(Unsent::Nested { fields, .. }) => Some(fields),
            _ => None,
        }
    }

    pub fn list(&self, field: &str) -> Option<&[UnsentFields]> {
        match self.entries.get(field) {
            Some(Unsent::List { items, .. }) => Some(items),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Unsent)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A version-specific resource shape
pub trait WireShape: Serialize + DeserializeOwned + Default {
    /// Name used in error messages
    const SHAPE: &'static str;

    /// Collect non-transmitted fields, recursively
    fn unsent_fields(&self) -> Result<UnsentFields, ConvertError>;

    /// Copy non-transmitted fields this shape also declares
    fn restore_unsent_fields(&mut self, fields: &UnsentFields) -> Result<(), ConvertError>;
}

/// Convert `source` into the equivalent value of shape `D`.
///
/// Fields unknown to `D` are dropped, fields `D` has but `S` lacks stay at
/// their default. Non-transmitted fields are carried across by name.
pub fn convert<S, D>(source: &S) -> Result<D, ConvertError>
where
    S: WireShape,
    D: WireShape,
{
    let document = serde_json::to_value(source).map_err(|source| ConvertError::Serialize {
        shape: S::SHAPE,
        source,
    })?;
    let mut destination = from_document::<D>(document)?;
    destination.restore_unsent_fields(&source.unsent_fields()?)?;
    Ok(destination)
}

/// Convert `source` into an existing destination, replacing its contents.
/// On error `destination` is left untouched.
pub fn convert_into<S, D>(source: &S, destination: &mut D) -> Result<(), ConvertError>
where
    S: WireShape,
    D: WireShape,
{
    *destination = convert(source)?;
    Ok(())
}

/// Build a shape from a generic document, such as an API response.
/// Documents carry no non-transmitted fields, so nothing is restored.
pub fn from_document<D: WireShape>(document: Value) -> Result<D, ConvertError> {
    serde_json::from_value(document).map_err(|source| ConvertError::Deserialize {
        shape: D::SHAPE,
        source,
    })
}

/// Declare the non-transmitted field table of a shape and implement
/// [`WireShape`] from it.
///
/// - `unsent` - fields skipped by serde, copied by value
/// - `nested` - `Option<T>` or `Option<Box<T>>` fields holding another shape,
///   each with its wire name (`scheduling => "scheduling"`)
/// - `nested_list` - `Vec<T>` fields holding another shape, matched by index,
///   each with its wire name
#[macro_export]
macro_rules! wire_shape {
    ($ty:ident {
        unsent: [$($unsent:ident),* $(,)?],
        nested: [$($nested:ident => $nested_wire:literal),* $(,)?],
        nested_list: [$($list:ident => $list_wire:literal),* $(,)?] $(,)?
    }) => {
        impl $crate::convert::WireShape for $ty {
            const SHAPE: &'static str = concat!(module_path!(), "::", stringify!($ty));

            #[allow(unused_mut)]
            fn unsent_fields(
                &self,
            ) -> ::std::result::Result<$crate::convert::UnsentFields, $crate::convert::ConvertError> {
                #[allow(unused_imports)]
                use $crate::convert::WireShape as _;

                let mut fields = $crate::convert::UnsentFields::default();
                $( fields.insert_value(Self::SHAPE, stringify!($unsent), &self.$unsent)?; )*
                $(
                    let nested = match self.$nested.as_ref() {
                        Some(n) => Some(n.unsent_fields()?),
                        None => None,
                    };
                    fields.insert_nested(stringify!($nested), $nested_wire, nested);
                )*
                $(
                    let items = self
                        .$list
                        .iter()
                        .map(|item| item.unsent_fields())
                        .collect::<::std::result::Result<Vec<_>, _>>()?;
                    fields.insert_list(stringify!($list), $list_wire, items);
                )*
                Ok(fields)
            }

            #[allow(unused_variables)]
            fn restore_unsent_fields(
                &mut self,
                fields: &$crate::convert::UnsentFields,
            ) -> ::std::result::Result<(), $crate::convert::ConvertError> {
                #[allow(unused_imports)]
                use $crate::convert::WireShape as _;

                $(
                    if let Some(value) = fields.value(stringify!($unsent)) {
                        self.$unsent = ::serde_json::from_value(value.clone()).map_err(|source| {
                            $crate::convert::ConvertError::Restore {
                                shape: Self::SHAPE,
                                field: stringify!($unsent),
                                source,
                            }
                        })?;
                    }
                )*
                $(
                    if let (Some(nested), Some(dst)) =
                        (fields.nested(stringify!($nested)), self.$nested.as_mut())
                    {
                        dst.restore_unsent_fields(nested)?;
                    }
                )*
                $(
                    if let Some(items) = fields.list(stringify!($list)) {
                        for (dst, src) in self.$list.iter_mut().zip(items) {
                            dst.restore_unsent_fields(src)?;
                        }
                    }
                )*
                Ok(())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct NarrowRange {
        ip_cidr_range: String,
        #[serde(skip)]
        force_send_fields: Vec<String>,
    }
    wire_shape!(NarrowRange { unsent: [force_send_fields], nested: [], nested_list: [] });

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct WideRange {
        ip_cidr_range: String,
        subnetwork_range_name: String,
        #[serde(skip)]
        force_send_fields: Vec<String>,
    }
    wire_shape!(WideRange { unsent: [force_send_fields], nested: [], nested_list: [] });

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Narrow {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        primary: Option<Box<NarrowRange>>,
        ranges: Vec<NarrowRange>,
        #[serde(skip)]
        null_fields: Vec<String>,
    }
    wire_shape!(Narrow {
        unsent: [null_fields],
        nested: [primary => "primary"],
        nested_list: [ranges => "ranges"],
    });

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Wide {
        name: String,
        description: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        primary: Option<Box<WideRange>>,
        ranges: Vec<WideRange>,
        #[serde(skip)]
        null_fields: Vec<String>,
    }
    wire_shape!(Wide {
        unsent: [null_fields],
        nested: [primary => "primary"],
        nested_list: [ranges => "ranges"],
    });

    fn sample() -> Narrow {
        Narrow {
            name: "nic0".to_string(),
            primary: Some(Box::new(NarrowRange {
                ip_cidr_range: "10.0.0.0/24".to_string(),
                force_send_fields: vec!["IpCidrRange".to_string()],
            })),
            ranges: vec![
                NarrowRange::default(),
                NarrowRange {
                    ip_cidr_range: "/28".to_string(),
                    force_send_fields: vec!["IpCidrRange".to_string()],
                },
            ],
            null_fields: vec!["Description".to_string()],
        }
    }

    #[test]
    fn test_plain_round_trip_drops_skipped_fields() {
        // Baseline: the wire form alone loses them
        let doc = serde_json::to_value(sample()).unwrap();
        let back: Narrow = serde_json::from_value(doc).unwrap();
        assert!(back.null_fields.is_empty());
    }

    #[test]
    fn test_convert_restores_skipped_fields_at_every_level() {
        let wide: Wide = convert(&sample()).unwrap();
        assert_eq!(wide.name, "nic0");
        assert_eq!(wide.null_fields, vec!["Description".to_string()]);
        assert_eq!(
            wide.primary.as_ref().unwrap().force_send_fields,
            vec!["IpCidrRange".to_string()]
        );
        assert!(wide.ranges[0].force_send_fields.is_empty());
        assert_eq!(wide.ranges[1].force_send_fields, vec!["IpCidrRange".to_string()]);

        let back: Narrow = convert(&wide).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_narrowing_drops_unknown_fields() {
        let wide = Wide {
            name: "x".to_string(),
            description: "only in wide".to_string(),
            ..Default::default()
        };
        let narrow: Narrow = convert(&wide).unwrap();
        assert_eq!(narrow.name, "x");
        assert!(narrow.primary.is_none());
    }

    #[test]
    fn test_convert_into_keeps_destination_on_error() {
        #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        struct Clash {
            name: u32,
        }
        wire_shape!(Clash { unsent: [], nested: [], nested_list: [] });

        let mut destination = Clash { name: 7 };
        let err = convert_into(&sample(), &mut destination).unwrap_err();
        assert!(matches!(err, ConvertError::Deserialize { .. }));
        assert_eq!(destination.name, 7);
    }

    #[test]
    fn test_from_document_ignores_unknown_keys() {
        let doc = serde_json::json!({"name": "a", "kind": "compute#networkInterface"});
        let narrow: Narrow = from_document(doc).unwrap();
        assert_eq!(narrow.name, "a");
    }
}
