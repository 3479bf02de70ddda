// Static route endpoints (`/routes/routes/`).
//
// Verbs are lowercase here (`addroute`, `getroute`, ...), unlike the
// camelCase used by most other controllers.

use serde::{Deserialize, Serialize};

use crate::client::{Client, Controller, Endpoints, Item};
use crate::codec::SelectedMap;
use crate::error::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    /// Inverted on the wire: `"1"` means the route is off.
    pub disabled: String,
    #[serde(rename = "descr")]
    pub description: String,
    pub gateway: SelectedMap,
    pub network: String,
}

impl Item for Route {
    const KIND: &'static str = "route";
    const KEY: &'static str = "route";
    const ENDPOINTS: Endpoints = Endpoints {
        controller: Controller::Routes,
        add: "/routes/routes/addroute",
        get: "/routes/routes/getroute",
        set: "/routes/routes/setroute",
        delete: "/routes/routes/delroute",
        reconfigure: Some("/routes/routes/reconfigure"),
    };
}

/// Route endpoint group, returned by [`Client::routes`].
#[derive(Debug, Clone, Copy)]
pub struct Routes<'a> {
    client: &'a Client,
}

impl<'a> Routes<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `POST /routes/routes/addroute`, then `/routes/routes/reconfigure`.
    pub async fn add_route(&self, route: &Route) -> Result<String, Error> {
        self.client.add_item(route).await
    }

    /// `GET /routes/routes/getroute/{id}`
    pub async fn get_route(&self, id: &str) -> Result<Route, Error> {
        self.client.get_item(id).await
    }

    /// `POST /routes/routes/setroute/{id}`, then reconfigure.
    pub async fn update_route(&self, id: &str, route: &Route) -> Result<(), Error> {
        self.client.update_item(id, route).await
    }

    /// `POST /routes/routes/delroute/{id}`, then reconfigure.
    pub async fn delete_route(&self, id: &str) -> Result<(), Error> {
        self.client.delete_item::<Route>(id).await
    }
}
