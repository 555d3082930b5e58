use clap::ValueEnum;
use reqwest::StatusCode;
use serde_json::json;
use std::fmt;

use crate::check::{PermissionCheck, PermissionGroup, ID_PLACEHOLDER};
use crate::fixtures::Fixtures;
use crate::utils::random_suffix;

/// Ids that never exist on the server.
const MISSING_ID: &str = "88888888";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Resource {
    AuditLog,
    PreheatInstance,
    Project,
    Registry,
    ReplicationAdapter,
    ReplicationPolicy,
    Replication,
    ScanAll,
    SystemVolumes,
    JobserviceMonitor,
    Scanner,
    Label,
    SecurityHub,
    Catalog,
}

impl Resource {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Resource::AuditLog => "audit-log",
            Resource::PreheatInstance => "preheat-instance",
            Resource::Project => "project",
            Resource::Registry => "registry",
            Resource::ReplicationAdapter => "replication-adapter",
            Resource::ReplicationPolicy => "replication-policy",
            Resource::Replication => "replication",
            Resource::ScanAll => "scan-all",
            Resource::SystemVolumes => "system-volumes",
            Resource::JobserviceMonitor => "jobservice-monitor",
            Resource::Scanner => "scanner",
            Resource::Label => "label",
            Resource::SecurityHub => "security-hub",
            Resource::Catalog => "catalog",
        }
    }

    /// Whether admin-created state must exist before the group runs.
    pub(crate) fn needs_fixtures(&self) -> bool {
        matches!(self, Resource::ReplicationPolicy | Resource::Replication)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Urls the checks are built against.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    /// API base, e.g. `https://harbor.local/api/v2.0`
    pub(crate) base: String,
    /// `scheme://host[:port]` of the base
    pub(crate) origin: String,
}

impl Target {
    pub(crate) fn new(base_url: &str) -> crate::errors::Result<Self> {
        Ok(Target {
            base: base_url.trim_end_matches('/').to_string(),
            origin: crate::utils::origin(base_url)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

pub(crate) fn group(resource: Resource, target: &Target, fixtures: &Fixtures) -> PermissionGroup {
    match resource {
        Resource::AuditLog => audit_log(target),
        Resource::PreheatInstance => preheat_instance(target),
        Resource::Project => project(target),
        Resource::Registry => registry(target),
        Resource::ReplicationAdapter => replication_adapter(target),
        Resource::ReplicationPolicy => replication_policy(target, fixtures),
        Resource::Replication => replication(target, fixtures),
        Resource::ScanAll => scan_all(target),
        Resource::SystemVolumes => system_volumes(target),
        Resource::JobserviceMonitor => jobservice_monitor(target),
        Resource::Scanner => scanner(target),
        Resource::Label => label(target),
        Resource::SecurityHub => security_hub(target),
        Resource::Catalog => catalog(target),
    }
}

fn audit_log(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    group.push(PermissionCheck::get(t.url("/audit-logs"), StatusCode::OK));
    group
}

fn preheat_instance(t: &Target) -> PermissionGroup {
    let name = format!("preheat_instance-{}", random_suffix());
    let mut group = PermissionGroup::new();
    let instance = group.add_payload(json!({
        "name": name,
        "endpoint": format!("http://{}", random_suffix()),
        "enabled": false,
        "vendor": "dragonfly",
        "auth_mode": "NONE",
        "insecure": true
    }));

    let collection = t.url("/p2p/preheat/instances");
    let item = format!("{}/{}", collection, name);

    group.push(PermissionCheck::post(&collection, StatusCode::CREATED).with_payload(instance));
    group.push(PermissionCheck::get(&collection, StatusCode::OK).with_payload(instance));
    // Picks up the server side id so the update carries it
    group.push(
        PermissionCheck::get(&item, StatusCode::OK)
            .with_payload(instance)
            .capture_from_body("id"),
    );
    group.push(PermissionCheck::put(&item, StatusCode::OK).with_payload(instance));
    group.push(PermissionCheck::delete(&item, StatusCode::OK).with_payload(instance));
    group
}

fn project(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    let project = group.add_payload(json!({
        "metadata": {
            "public": "false"
        },
        "project_name": format!("project-{}", random_suffix()),
        "storage_limit": -1
    }));

    let projects = t.url("/projects");
    group.push(PermissionCheck::post(&projects, StatusCode::CREATED).with_payload(project));
    group.push(PermissionCheck::get(&projects, StatusCode::OK).with_payload(project));
    group
}

fn docker_hub_registry() -> serde_json::Value {
    json!({
        "insecure": false,
        "name": format!("registry-{}", random_suffix()),
        "type": "docker-hub",
        "url": "https://hub.docker.com"
    })
}

fn registry(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    let registry = group.add_payload(docker_hub_registry());
    let ping = group.add_payload(docker_hub_registry());

    let registries = t.url("/registries");
    let item = format!("{}/{}", registries, ID_PLACEHOLDER);

    group.push(
        PermissionCheck::post(&registries, StatusCode::CREATED)
            .with_payload(registry)
            .capture_from_location("id"),
    );
    group.push(PermissionCheck::get(&registries, StatusCode::OK).with_payload(registry));
    group.push(
        PermissionCheck::get(&item, StatusCode::OK)
            .with_payload(registry)
            .id_field("id"),
    );
    group.push(
        PermissionCheck::get(format!("{}/info", item), StatusCode::OK)
            .with_payload(registry)
            .id_field("id"),
    );
    group.push(
        PermissionCheck::put(&item, StatusCode::OK)
            .with_payload(registry)
            .id_field("id"),
    );
    group.push(
        PermissionCheck::delete(&item, StatusCode::OK)
            .with_payload(registry)
            .id_field("id"),
    );
    group.push(
        PermissionCheck::post(t.url("/registries/ping"), StatusCode::OK).with_payload(ping),
    );
    group
}

fn replication_adapter(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    group.push(PermissionCheck::get(t.url("/replication/adapters"), StatusCode::OK));
    group.push(PermissionCheck::get(t.url("/replication/adapterinfos"), StatusCode::OK));
    group
}

/// Manual policy copying `library/**` to the given registry.
pub(crate) fn replication_policy_payload(name: &str, dest_registry_id: Option<i64>) -> serde_json::Value {
    json!({
        "name": name,
        "src_registry": null,
        "dest_registry": {
            "id": dest_registry_id
        },
        "dest_namespace": "library",
        "dest_namespace_replace_count": 1,
        "trigger": {
            "type": "manual",
            "trigger_settings": {
                "cron": ""
            }
        },
        "filters": [
            {
                "type": "name",
                "value": "library/**"
            }
        ],
        "enabled": true,
        "deletion": false,
        "override": true,
        "speed": -1,
        "copy_by_chunk": false
    })
}

fn replication_policy(t: &Target, fixtures: &Fixtures) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    let policy = group.add_payload(replication_policy_payload(
        &format!("replication_policy_{}", random_suffix()),
        fixtures.registry_id,
    ));

    let policies = t.url("/replication/policies");
    let item = format!("{}/{}", policies, ID_PLACEHOLDER);

    group.push(
        PermissionCheck::post(&policies, StatusCode::CREATED)
            .with_payload(policy)
            .capture_from_location("id"),
    );
    group.push(PermissionCheck::get(&policies, StatusCode::OK).with_payload(policy));
    group.push(
        PermissionCheck::get(&item, StatusCode::OK)
            .with_payload(policy)
            .id_field("id"),
    );
    group.push(
        PermissionCheck::put(&item, StatusCode::OK)
            .with_payload(policy)
            .id_field("id"),
    );
    group.push(
        PermissionCheck::delete(&item, StatusCode::OK)
            .with_payload(policy)
            .id_field("id"),
    );
    group
}

fn replication(t: &Target, fixtures: &Fixtures) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    let execution = group.add_payload(json!({
        "policy_id": fixtures.policy_id
    }));

    let executions = t.url("/replication/executions");
    let item = format!("{}/{}", executions, ID_PLACEHOLDER);

    group.push(
        PermissionCheck::post(&executions, StatusCode::CREATED)
            .with_payload(execution)
            .capture_from_location("id"),
    );
    group.push(PermissionCheck::get(&executions, StatusCode::OK).with_payload(execution));
    group.push(
        PermissionCheck::get(&item, StatusCode::OK)
            .with_payload(execution)
            .id_field("id"),
    );
    // Stops the execution
    group.push(
        PermissionCheck::put(&item, StatusCode::OK)
            .with_payload(execution)
            .id_field("id"),
    );
    group.push(
        PermissionCheck::get(format!("{}/tasks", item), StatusCode::OK)
            .with_payload(execution)
            .id_field("id"),
    );
    group.push(
        PermissionCheck::get(format!("{}/tasks/1", item), StatusCode::NOT_FOUND)
            .with_payload(execution)
            .id_field("id"),
    );
    group
}

fn scan_all(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    let weekly = group.add_payload(json!({
        "schedule": {
            "type": "Weekly",
            "cron": "0 0 0 * * 0"
        }
    }));
    let reset = group.add_payload(json!({
        "schedule": {
            "type": "None",
            "cron": ""
        }
    }));

    let schedule = t.url("/system/scanAll/schedule");
    group.push(PermissionCheck::post(&schedule, StatusCode::CREATED).with_payload(weekly));
    group.push(PermissionCheck::put(&schedule, StatusCode::OK).with_payload(reset));
    group.push(PermissionCheck::post(t.url("/system/scanAll/stop"), StatusCode::ACCEPTED));
    group.push(PermissionCheck::get(t.url("/scans/all/metrics"), StatusCode::OK));
    group.push(PermissionCheck::get(t.url("/scans/schedule/metrics"), StatusCode::OK));
    group
}

fn system_volumes(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    group.push(PermissionCheck::get(t.url("/systeminfo/volumes"), StatusCode::OK));
    group
}

fn jobservice_monitor(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    let stop = group.add_payload(json!({ "action": "stop" }));

    group.push(PermissionCheck::get(t.url("/jobservice/pools"), StatusCode::OK));
    group.push(PermissionCheck::get(
        t.url(&format!("/jobservice/pools/{}/workers", MISSING_ID)),
        StatusCode::OK,
    ));
    group.push(PermissionCheck::put(
        t.url(&format!("/jobservice/jobs/{}", MISSING_ID)),
        StatusCode::OK,
    ));
    // The job does not exist, so reading its log fails server side
    group.push(PermissionCheck::get(
        t.url(&format!("/jobservice/jobs/{}/log", MISSING_ID)),
        StatusCode::INTERNAL_SERVER_ERROR,
    ));
    group.push(PermissionCheck::get(t.url("/jobservice/queues"), StatusCode::OK));
    group.push(
        PermissionCheck::put(
            t.url(&format!("/jobservice/queues/{}", MISSING_ID)),
            StatusCode::OK,
        )
        .with_payload(stop),
    );
    group
}

fn scanner(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    let scanner = group.add_payload(json!({
        "name": format!("scanner-{}", random_suffix()),
        "url": format!("https://{}", random_suffix()),
        "description": null,
        "auth": "",
        "skip_certVerify": false,
        "use_internal_addr": false
    }));
    let set_default = group.add_payload(json!({ "is_default": true }));

    let scanners = t.url("/scanners");
    let item = format!("{}/{}", scanners, MISSING_ID);

    group.push(PermissionCheck::get(&scanners, StatusCode::OK));
    // The scanner url is unreachable, so allowed callers get a 500
    group.push(
        PermissionCheck::post(&scanners, StatusCode::INTERNAL_SERVER_ERROR).with_payload(scanner),
    );
    group.push(
        PermissionCheck::post(t.url("/scanners/ping"), StatusCode::INTERNAL_SERVER_ERROR)
            .with_payload(scanner),
    );
    group.push(PermissionCheck::get(&item, StatusCode::NOT_FOUND));
    group.push(PermissionCheck::put(&item, StatusCode::NOT_FOUND).with_payload(scanner));
    group.push(PermissionCheck::delete(&item, StatusCode::NOT_FOUND));
    group.push(PermissionCheck::patch(&item, StatusCode::NOT_FOUND).with_payload(set_default));
    group.push(PermissionCheck::get(
        format!("{}/metadata", item),
        StatusCode::NOT_FOUND,
    ));
    group
}

fn label(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    let label = group.add_payload(json!({
        "name": format!("label-{}", random_suffix()),
        "description": "",
        "color": "",
        "scope": "g",
        "project_id": 0
    }));

    let labels = t.url("/labels");
    let item = format!("{}/{}", labels, ID_PLACEHOLDER);

    group.push(
        PermissionCheck::post(&labels, StatusCode::CREATED)
            .with_payload(label)
            .capture_from_location("id"),
    );
    group.push(
        PermissionCheck::get(&item, StatusCode::OK)
            .with_payload(label)
            .id_field("id"),
    );
    group.push(
        PermissionCheck::put(&item, StatusCode::OK)
            .with_payload(label)
            .id_field("id"),
    );
    group.push(
        PermissionCheck::delete(&item, StatusCode::OK)
            .with_payload(label)
            .id_field("id"),
    );
    group
}

fn security_hub(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    group.push(PermissionCheck::get(t.url("/security/summary"), StatusCode::OK));
    group.push(PermissionCheck::get(t.url("/security/vul"), StatusCode::OK));
    group
}

fn catalog(t: &Target) -> PermissionGroup {
    let mut group = PermissionGroup::new();
    group.push(PermissionCheck::get(
        format!("{}/v2/_catalog", t.origin),
        StatusCode::OK,
    ));
    group
}
