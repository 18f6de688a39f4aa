use serde::{Deserialize, Serialize};

use stockline_core::{Entity, UserId};

/// Postal address; only the country is consumed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub country: Option<String>,
}

/// Read-only user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Also accepted as `_id`, the key the user service emits.
    #[serde(alias = "_id")]
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub address: Address,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl User {
    /// Country name, if the address carries a non-blank one.
    pub fn country(&self) -> Option<&str> {
        self.address
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}
