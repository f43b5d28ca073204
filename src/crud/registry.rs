//! In-memory registry mapping entity names to their generated route
//! descriptors. Process-lifetime only; re-registration is last-write-wins.

use crate::crud::base::base_routes;
use crate::crud::types::{CrudKind, CrudRoute, HookOverride};
use crate::entity::Entity;
use crate::error::ConfigError;
use std::collections::HashMap;

pub struct EntityCruds {
    pub entity: Entity,
    /// Collection path the routes were generated under (e.g. "/v1/users").
    pub collection_path: String,
    routes: HashMap<CrudKind, CrudRoute>,
}

impl EntityCruds {
    pub fn generate(entity: Entity, prefix: Option<&str>, middlewares: &[String]) -> Self {
        let (collection_path, routes) = base_routes(&entity, prefix, middlewares);
        EntityCruds {
            entity,
            collection_path,
            routes,
        }
    }

    pub fn route(&self, kind: CrudKind) -> Option<&CrudRoute> {
        self.routes.get(&kind)
    }

    pub fn member_path(&self) -> String {
        format!("{}/:id", self.collection_path)
    }
}

#[derive(Default)]
pub struct CrudRegistry {
    entries: HashMap<String, EntityCruds>,
}

impl CrudRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) an entity's routes. Last write wins.
    pub fn insert(&mut self, cruds: EntityCruds) {
        self.entries.insert(cruds.entity.name.clone(), cruds);
    }

    pub fn get(&self, entity_name: &str) -> Option<&EntityCruds> {
        self.entries.get(entity_name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &EntityCruds> {
        self.entries.values()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the stages named by the override on one route. Errors when the
    /// entity was never registered.
    pub fn customize(
        &mut self,
        entity_name: &str,
        kind: CrudKind,
        edit: HookOverride,
    ) -> Result<(), ConfigError> {
        let entry = self
            .entries
            .get_mut(entity_name)
            .ok_or_else(|| ConfigError::CrudNotRegistered(entity_name.to_string()))?;
        let route = entry
            .routes
            .get_mut(&kind)
            .ok_or_else(|| ConfigError::CrudNotRegistered(entity_name.to_string()))?;
        if let Some(before) = edit.before {
            route.before = before;
        }
        if let Some(during) = edit.during {
            route.during = during;
        }
        if let Some(after) = edit.after {
            route.after = after;
        }
        if !edit.middlewares.is_empty() {
            route.middlewares = edit.middlewares;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::Arc;

    fn registry_with_user() -> CrudRegistry {
        let mut registry = CrudRegistry::new();
        registry.insert(EntityCruds::generate(
            Entity::new("User", "users"),
            None,
            &["log".to_string()],
        ));
        registry
    }

    #[test]
    fn customize_unknown_entity_is_an_error() {
        let mut registry = CrudRegistry::new();
        let err = registry
            .customize("Ghost", CrudKind::Index, HookOverride::new())
            .unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn empty_override_keeps_base_middlewares() {
        let mut registry = registry_with_user();
        registry
            .customize("User", CrudKind::Index, HookOverride::new())
            .unwrap();
        let route = registry.get("User").unwrap().route(CrudKind::Index).unwrap();
        assert_eq!(route.middlewares, vec!["log".to_string()]);
    }

    #[test]
    fn override_replaces_named_stages_and_middlewares() {
        let mut registry = registry_with_user();
        let edit = HookOverride::new()
            .before(|_ctx| Box::pin(async { Ok(Value::String("marker".into())) }))
            .middlewares(["auth"]);
        registry.customize("User", CrudKind::Show, edit).unwrap();

        let route = registry.get("User").unwrap().route(CrudKind::Show).unwrap();
        assert_eq!(route.middlewares, vec!["auth".to_string()]);

        let before = Arc::clone(&route.before);
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let out = rt
            .block_on(before(Arc::new(crate::request::RequestContext::default())))
            .unwrap();
        assert_eq!(out, Value::String("marker".into()));
    }

    #[test]
    fn reinsert_is_last_write_wins() {
        let mut registry = registry_with_user();
        registry.insert(EntityCruds::generate(
            Entity::new("User", "users"),
            Some("v2"),
            &[],
        ));
        let entry = registry.get("User").unwrap();
        assert_eq!(entry.collection_path, "/v2/users");
        assert!(entry.route(CrudKind::Index).unwrap().middlewares.is_empty());
    }
}
