//! Supplier repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{products, receipts, suppliers};

/// Error types for supplier operations.
#[derive(Debug, thiserror::Error)]
pub enum SupplierError {
    /// Supplier not found.
    #[error("Supplier not found: {0}")]
    NotFound(Uuid),

    /// Supplier name already taken.
    #[error("Supplier name already taken: {0}")]
    NameTaken(String),

    /// Supplier is referenced by products or receipts and cannot be deleted.
    #[error("Supplier is referenced by {products} product(s) and {receipts} receipt(s)")]
    InUse {
        /// Number of products referencing the supplier.
        products: u64,
        /// Number of receipts referencing the supplier.
        receipts: u64,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a supplier.
#[derive(Debug, Clone)]
pub struct CreateSupplierInput {
    /// Supplier name (unique).
    pub name: String,
    /// Contact person.
    pub contact_person: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Input for updating a supplier.
#[derive(Debug, Clone, Default)]
pub struct UpdateSupplierInput {
    /// New name.
    pub name: Option<String>,
    /// New contact person.
    pub contact_person: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New phone.
    pub phone: Option<String>,
    /// New address.
    pub address: Option<String>,
}

/// Supplier repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    db: DatabaseConnection,
}

impl SupplierRepository {
    /// Creates a new supplier repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new supplier.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the insert fails.
    pub async fn create(
        &self,
        input: CreateSupplierInput,
    ) -> Result<suppliers::Model, SupplierError> {
        if self.name_exists(&input.name, None).await? {
            return Err(SupplierError::NameTaken(input.name));
        }

        let now = Utc::now().into();
        let supplier = suppliers::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            contact_person: Set(input.contact_person),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(supplier.insert(&self.db).await?)
    }

    /// Lists all suppliers, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<suppliers::Model>, SupplierError> {
        Ok(suppliers::Entity::find()
            .order_by_asc(suppliers::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Finds a supplier by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<suppliers::Model>, SupplierError> {
        Ok(suppliers::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Updates a supplier.
    ///
    /// # Errors
    ///
    /// Returns an error if the supplier is not found, the new name is
    /// taken, or the update fails.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSupplierInput,
    ) -> Result<suppliers::Model, SupplierError> {
        let supplier = suppliers::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(SupplierError::NotFound(id))?;

        if let Some(ref name) = input.name {
            if name != &supplier.name && self.name_exists(name, Some(id)).await? {
                return Err(SupplierError::NameTaken(name.clone()));
            }
        }

        let mut active: suppliers::ActiveModel = supplier.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(contact_person) = input.contact_person {
            active.contact_person = Set(Some(contact_person));
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a supplier.
    ///
    /// # Errors
    ///
    /// Returns an error if the supplier is not found or is still
    /// referenced by products or receipts.
    pub async fn delete(&self, id: Uuid) -> Result<(), SupplierError> {
        let supplier = suppliers::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(SupplierError::NotFound(id))?;

        let product_count = products::Entity::find()
            .filter(products::Column::SupplierId.eq(id))
            .count(&self.db)
            .await?;

        let receipt_count = receipts::Entity::find()
            .filter(receipts::Column::SupplierId.eq(id))
            .count(&self.db)
            .await?;

        if product_count > 0 || receipt_count > 0 {
            return Err(SupplierError::InUse {
                products: product_count,
                receipts: receipt_count,
            });
        }

        suppliers::Entity::delete_by_id(supplier.id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Checks if a supplier name is already taken, optionally excluding one ID.
    async fn name_exists(&self, name: &str, exclude: Option<Uuid>) -> Result<bool, DbErr> {
        let mut query = suppliers::Entity::find().filter(suppliers::Column::Name.eq(name));

        if let Some(id) = exclude {
            query = query.filter(suppliers::Column::Id.ne(id));
        }

        let count = query.count(&self.db).await?;
        Ok(count > 0)
    }
}
