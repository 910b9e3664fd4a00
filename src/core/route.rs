//! URL-addressable views
//!
//! `/account/{address}`, `/account/{address}/resources/{slug}` and
//! `/tx/{hash}`. Parsing normalizes addresses and hashes so a route always
//! names its target in canonical form.

use std::fmt;

use crate::core::ExplorerError;
use crate::domain::{normalize_address, normalize_transaction_hash, resource_type_to_slug};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Account { address: String },
    AccountResource { address: String, slug: String },
    Transaction { hash: String },
}

impl Route {
    pub fn parse(path: &str) -> Result<Self, ExplorerError> {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches('/');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Ok(Route::Home),
            ["account", address] => Ok(Route::Account {
                address: normalize_address(address)?,
            }),
            ["account", address, "resources", slug] => Ok(Route::AccountResource {
                address: normalize_address(address)?,
                slug: slug.to_ascii_lowercase(),
            }),
            ["tx", hash] => normalize_transaction_hash(hash)
                .map(|hash| Route::Transaction { hash })
                .ok_or_else(|| ExplorerError::invalid_hash(hash)),
            _ => Err(ExplorerError::NotFound {
                kind: "route",
                id: format!("/{path}"),
            }),
        }
    }

    pub fn account(address: &str) -> Result<Self, ExplorerError> {
        Ok(Route::Account {
            address: normalize_address(address)?,
        })
    }

    /// Deep link to one resource of an account.
    pub fn account_resource(address: &str, resource_type: &str) -> Result<Self, ExplorerError> {
        Ok(Route::AccountResource {
            address: normalize_address(address)?,
            slug: resource_type_to_slug(resource_type),
        })
    }

    pub fn transaction(hash: &str) -> Result<Self, ExplorerError> {
        normalize_transaction_hash(hash)
            .map(|hash| Route::Transaction { hash })
            .ok_or_else(|| ExplorerError::invalid_hash(hash))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Account { address } => write!(f, "/account/{address}"),
            Route::AccountResource { address, slug } => {
                write!(f, "/account/{address}/resources/{slug}")
            }
            Route::Transaction { hash } => write!(f, "/tx/{hash}"),
        }
    }
}
