use reqwest::{Method, StatusCode};
use serde::Serialize;

use crate::args::Args;
use crate::errors::{CheckError, Result};
use crate::resources::{self, Resource, Target};
use crate::response;
use crate::runner::Session;
use crate::utils::random_suffix;

/// Server side state created as admin before a group runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Fixtures {
    pub(crate) registry_id: Option<i64>,
    pub(crate) policy_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct Credential<'a> {
    access_key: &'a str,
    access_secret: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Harbor endpoint pointing back at the server under test.
#[derive(Debug, Serialize)]
struct ReplicationRegistry<'a> {
    credential: Credential<'a>,
    description: &'static str,
    insecure: bool,
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    url: &'a str,
}

pub(crate) fn prepare(resource: Resource, args: &Args, target: &Target) -> Result<Fixtures> {
    if !resource.needs_fixtures() {
        return Ok(Fixtures::default());
    }

    let (Some(admin_user), Some(admin_password)) =
        (args.admin_user_name.as_deref(), args.admin_password.as_deref())
    else {
        return Err(CheckError::MissingAdminCredentials(resource.name()));
    };

    let admin = Session::new(args, admin_user, admin_password)?;
    let registry_id = create_registry(&admin, target, admin_password)?;

    let policy_id = match resource {
        Resource::Replication => Some(create_policy(&admin, target, registry_id)?),
        _ => None,
    };

    Ok(Fixtures {
        registry_id: Some(registry_id),
        policy_id,
    })
}

fn create_registry(admin: &Session, target: &Target, admin_password: &str) -> Result<i64> {
    let registry = ReplicationRegistry {
        credential: Credential {
            access_key: admin.username(),
            access_secret: admin_password,
            kind: "basic",
        },
        description: "",
        insecure: true,
        name: format!("replication-registry-{}", random_suffix()),
        kind: "harbor",
        url: &target.origin,
    };

    let url = format!("{}/registries", target.base);
    let id = create(admin, &url, &serde_json::to_value(&registry)?)?;
    log::info!("Created replication registry {} ({})", registry.name, id);
    Ok(id)
}

fn create_policy(admin: &Session, target: &Target, registry_id: i64) -> Result<i64> {
    let name = format!("replication-policy-{}", random_suffix());
    let policy = resources::replication_policy_payload(&name, Some(registry_id));

    let url = format!("{}/replication/policies", target.base);
    let id = create(admin, &url, &policy)?;
    log::info!("Created replication policy {} ({})", name, id);
    Ok(id)
}

/// POST `payload` and return the id from the Location header.
fn create(admin: &Session, url: &str, payload: &serde_json::Value) -> Result<i64> {
    let response = admin.send(Method::POST, url, Some(payload))?;
    let status = response.status();

    if status != StatusCode::CREATED {
        let body = response
            .text()
            .unwrap_or_else(|_| String::from("No response body"));
        log::warn!("Fixture creation at {} returned {}", url, status);
        return Err(CheckError::UnexpectedStatus {
            method: Method::POST,
            url: url.to_string(),
            expected: StatusCode::CREATED.as_u16(),
            actual: status.as_u16(),
            body,
        });
    }

    response::id_from_location(response.headers(), url)
}
