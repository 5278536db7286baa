use crate::package::{
    LocationId, PackageContext, PackageLocation, PackageRevision, TargetId,
};
use crate::error::StoreResult;
use crate::repository::DEFAULT_LOCATION;
use std::sync::Arc;
use tracing::debug;

/// A package, the root of the resolution chain
#[derive(Debug, Clone)]
pub struct PackageTarget {
    context: Arc<PackageContext>,
    id: TargetId,
}

impl PackageTarget {
    pub(crate) fn new(context: Arc<PackageContext>, id: TargetId) -> Self {
        Self { context, id }
    }

    pub fn id(&self) -> &TargetId {
        &self.id
    }

    /// Locations in search order.
    ///
    /// Declared locations come first, in declaration order. A `default`
    /// location reading `<target id>` is appended unless one is declared.
    pub fn locations(&self) -> Vec<PackageLocation> {
        let declared = self.context.declared_locations(&self.id);
        let mut locations: Vec<PackageLocation> = declared
            .iter()
            .map(|location| self.location_handle(&location.name, location.path.clone()))
            .collect();

        if !declared.iter().any(|l| l.name == DEFAULT_LOCATION) {
            locations.push(self.location_handle(DEFAULT_LOCATION, self.id.as_str().to_string()));
        }
        locations
    }

    /// Location `name`, if the target has it
    pub fn location(&self, name: &str) -> Option<PackageLocation> {
        self.locations().into_iter().find(|l| l.name() == name)
    }

    /// Main revision of the first location that has one
    pub async fn main_revision(&self) -> StoreResult<Option<PackageRevision>> {
        for location in self.locations() {
            if let Some(revision) = location.main_revision().await? {
                return Ok(Some(revision));
            }
            debug!("No content for location {}", location.id());
        }
        Ok(None)
    }

    fn location_handle(&self, name: &str, path: String) -> PackageLocation {
        PackageLocation::new(
            self.context.clone(),
            LocationId {
                target: self.id.clone(),
                name: name.to_string(),
            },
            path,
        )
    }
}
