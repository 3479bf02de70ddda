// `opnsense_ipsec_psk`: pre-shared keys matched by IKE identity.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use opnsense_api::ipsec as api;
use opnsense_api::{Client, Error, SelectedMap};

use crate::convert::{ConvertError, parse_enum};
use crate::handler::Crud;
use crate::validate::Validate;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PskType {
    #[default]
    Psk,
    Eap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psk {
    pub identity_local: String,
    pub identity_remote: String,
    pub pre_shared_key: String,
    #[serde(rename = "type", default)]
    pub key_type: PskType,
    #[serde(default)]
    pub description: String,
}

impl Validate for Psk {}

pub struct PskResource;

#[async_trait]
impl Crud for PskResource {
    const TYPE_NAME: &'static str = "ipsec_psk";
    const DESCRIPTION: &'static str =
        "IPsec Pre-Shared Keys (PSKs) are used for authenticating IPsec VPN connections.";
    const KIND: &'static str = "IPsec pre-shared key";

    type Model = Psk;
    type Wire = api::Psk;

    fn to_wire(model: &Psk) -> api::Psk {
        api::Psk {
            identity_local: model.identity_local.clone(),
            identity_remote: model.identity_remote.clone(),
            pre_shared_key: model.pre_shared_key.clone(),
            key_type: SelectedMap::from(model.key_type.as_ref()),
            description: model.description.clone(),
        }
    }

    fn from_wire(wire: api::Psk) -> Result<Psk, ConvertError> {
        Ok(Psk {
            identity_local: wire.identity_local,
            identity_remote: wire.identity_remote,
            pre_shared_key: wire.pre_shared_key,
            key_type: parse_enum("type", wire.key_type.as_str())?,
            description: wire.description,
        })
    }

    async fn add(client: &Client, wire: &api::Psk) -> Result<String, Error> {
        client.ipsec().add_psk(wire).await
    }

    async fn get(client: &Client, id: &str) -> Result<api::Psk, Error> {
        client.ipsec().get_psk(id).await
    }

    async fn update(client: &Client, id: &str, wire: &api::Psk) -> Result<(), Error> {
        client.ipsec().update_psk(id, wire).await
    }

    async fn delete(client: &Client, id: &str) -> Result<(), Error> {
        client.ipsec().delete_psk(id).await
    }
}
