//! Category repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{categories, products};

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found.
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    /// Category name already taken.
    #[error("Category name already taken: {0}")]
    NameTaken(String),

    /// Category is referenced by products and cannot be deleted.
    #[error("Category is referenced by {products} product(s)")]
    InUse {
        /// Number of products referencing the category.
        products: u64,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Category name (unique).
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Input for updating a category.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Category repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new category.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the insert fails.
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        if self.name_exists(&input.name, None).await? {
            return Err(CategoryError::NameTaken(input.name));
        }

        let now = Utc::now().into();
        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(category.insert(&self.db).await?)
    }

    /// Lists all categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<categories::Model>, CategoryError> {
        Ok(categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Finds a category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<categories::Model>, CategoryError> {
        Ok(categories::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Updates a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not found, the new name is
    /// taken, or the update fails.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        let category = categories::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        if let Some(ref name) = input.name {
            if name != &category.name && self.name_exists(name, Some(id)).await? {
                return Err(CategoryError::NameTaken(name.clone()));
            }
        }

        let mut active: categories::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not found or is still
    /// referenced by products.
    pub async fn delete(&self, id: Uuid) -> Result<(), CategoryError> {
        let category = categories::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        let product_count = products::Entity::find()
            .filter(products::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;

        if product_count > 0 {
            return Err(CategoryError::InUse {
                products: product_count,
            });
        }

        categories::Entity::delete_by_id(category.id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Checks if a category name is already taken, optionally excluding one ID.
    async fn name_exists(&self, name: &str, exclude: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = categories::Entity::find().filter(categories::Column::Name.eq(name));

        if let Some(id) = exclude {
            query = query.filter(categories::Column::Id.ne(id));
        }

        let count = query.count(&self.db).await?;
        Ok(count > 0)
    }
}
