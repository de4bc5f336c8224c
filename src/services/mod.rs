//! Business logic services

pub mod catalog;
pub mod reviews;

use crate::{config::PaginationConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub reviews: reviews::ReviewsService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, pagination: PaginationConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), pagination),
            reviews: reviews::ReviewsService::new(repository.clone()),
            repository,
        }
    }
}
