// `opnsense_firewall_category`: rule categories.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::firewall as api;
use opnsense_api::{Client, Error};

use crate::convert::{ConvertError, bool_to_wire, wire_to_bool};
use crate::diag::Diagnostics;
use crate::handler::Crud;
use crate::validate::{INVALID_ATTRIBUTE, Validate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Remove the category automatically once no rule uses it.
    #[serde(default)]
    pub auto: bool,
    pub name: String,
    /// Hex color `rrggbb`, or empty.
    #[serde(default)]
    pub color: String,
}

impl Validate for Category {
    fn validate(&self, diags: &mut Diagnostics) {
        let hex = self.color.len() == 6 && self.color.chars().all(|c| c.is_ascii_hexdigit());
        if !(self.color.is_empty() || hex) {
            diags.add_attribute_error(
                "color",
                INVALID_ATTRIBUTE,
                format!("Attribute color must be a hex color in format rrggbb, got: {}", self.color),
            );
        }
    }
}

pub struct CategoryResource;

#[async_trait]
impl Crud for CategoryResource {
    const TYPE_NAME: &'static str = "firewall_category";
    const DESCRIPTION: &'static str = "To ease maintenance of larger rulesets, OPNsense includes categories for the firewall. Each rule can contain one or more categories.";
    const KIND: &'static str = "firewall category";

    type Model = Category;
    type Wire = api::Category;

    fn to_wire(model: &Category) -> api::Category {
        api::Category {
            automatic: bool_to_wire(model.auto),
            name: model.name.clone(),
            color: model.color.clone(),
        }
    }

    fn from_wire(wire: api::Category) -> Result<Category, ConvertError> {
        Ok(Category {
            auto: wire_to_bool(&wire.automatic),
            name: wire.name,
            color: wire.color,
        })
    }

    async fn add(client: &Client, wire: &api::Category) -> Result<String, Error> {
        client.firewall().add_category(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Category, Error> {
        client.firewall().get_category(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Category) -> Result<(), Error> {
        client.firewall().update_category(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.firewall().delete_category(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::validate::decode;

    #[test]
    fn round_trips_through_wire() {
        let category: Category = decode(json!({ "name": "web", "color": "ff0000" })).unwrap();
        assert!(!category.auto);

        let wire = CategoryResource::to_wire(&category);
        assert_eq!(wire.automatic, "0");
        assert_eq!(CategoryResource::from_wire(wire).unwrap(), category);
    }

    #[test]
    fn color_must_be_hex() {
        assert!(decode::<Category>(json!({ "name": "web", "color": "red" })).is_err());
        assert!(decode::<Category>(json!({ "name": "web", "color": "" })).is_ok());
    }
}
