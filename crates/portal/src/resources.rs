//! Well-known dashboard resources and their polling schedules.

use bifrost_api_client::routes;
use bifrost_resource_sync::{
    PollConfig,
    RequestSpec,
    ResourceKey,
};

/// A resource the portal keeps in sync, with its request and schedule.
#[derive(Debug, Clone)]
pub struct PortalResource {
    pub key: ResourceKey,
    pub spec: RequestSpec,
    pub config: PollConfig,
}

/// The resources the dashboard reads, derived from a base schedule.
///
/// Fast-moving resources (jobs, health) poll at the base interval; the
/// catalog endpoints change rarely and poll at a multiple of it.
pub fn dashboard_resources(base: &PollConfig) -> Vec<PortalResource> {
    vec![
        PortalResource {
            key: ResourceKey::from("health"),
            spec: RequestSpec::get(routes::HEALTH),
            config: *base,
        },
        PortalResource {
            key: ResourceKey::from("jobs"),
            spec: RequestSpec::get(routes::JOBS),
            config: *base,
        },
        PortalResource {
            key: ResourceKey::from("uploads"),
            spec: RequestSpec::get(routes::UPLOADS),
            config: scaled(base, 2),
        },
        PortalResource {
            key: ResourceKey::from("datasets"),
            spec: RequestSpec::get(routes::DATASETS),
            config: scaled(base, 2),
        },
        PortalResource {
            key: ResourceKey::from("clusters"),
            spec: RequestSpec::get(routes::CLUSTERS),
            config: scaled(base, 2),
        },
        PortalResource {
            key: ResourceKey::from("delta-tables"),
            spec: RequestSpec::get(routes::DELTA_TABLES),
            config: scaled(base, 4),
        },
    ]
}

/// Stretch the base interval by `factor`, keeping timeout and backoff.
fn scaled(base: &PollConfig, factor: u32) -> PollConfig {
    base.with_interval(base.interval.saturating_mul(factor))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn every_resource_has_a_unique_key_and_valid_schedule() {
        let base = PollConfig::default();
        let resources = dashboard_resources(&base);

        let mut keys: Vec<&str> = resources.iter().map(|r| r.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), resources.len());

        for resource in &resources {
            resource.config.validate().unwrap();
        }
    }

    #[test]
    fn catalog_resources_poll_slower_than_the_base_interval() {
        let base = PollConfig::default().with_interval(Duration::from_secs(10));
        let resources = dashboard_resources(&base);

        let interval_of = |key: &str| {
            resources
                .iter()
                .find(|r| r.key.as_str() == key)
                .unwrap()
                .config
                .interval
        };

        assert_eq!(interval_of("jobs"), Duration::from_secs(10));
        assert_eq!(interval_of("datasets"), Duration::from_secs(20));
        assert_eq!(interval_of("delta-tables"), Duration::from_secs(40));
    }
}
