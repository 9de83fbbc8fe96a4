//! Name-to-handle resolution for drawable resources.
//!
//! Loading the actual assets belongs to the renderer; the simulation only
//! needs to know that a name resolves and which handle to hand back.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceHandle(u32);

impl ResourceHandle {
    pub fn raw(self) -> u32 {
        self.0
    }
}

pub trait ResourceResolver {
    fn resolve(&self, name: &str) -> Option<ResourceHandle>;
}

pub const DEFAULT_RESOURCES: &[&str] = &[
    "terrain.plains",
    "terrain.grass",
    "terrain.hills",
    "terrain.swamp",
    "object.boulders",
    "object.forest.seedling",
    "object.forest.young",
    "object.forest.mature",
    "object.forest.old_growth",
    "unit.tribe",
];

#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    handles: HashMap<String, ResourceHandle>,
    names: Vec<String>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in DEFAULT_RESOURCES {
            registry.register(name);
        }
        registry
    }

    /// Registers `name`, returning the existing handle if already known.
    pub fn register(&mut self, name: &str) -> ResourceHandle {
        if let Some(handle) = self.handles.get(name) {
            return *handle;
        }
        let handle = ResourceHandle(self.names.len() as u32);
        self.names.push(name.to_string());
        self.handles.insert(name.to_string(), handle);
        handle
    }

    pub fn name(&self, handle: ResourceHandle) -> Option<&str> {
        self.names.get(handle.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl ResourceResolver for ResourceRegistry {
    fn resolve(&self, name: &str) -> Option<ResourceHandle> {
        self.handles.get(name).copied()
    }
}
