//! Address default manager.
//!
//! Owns the invariant that a user has at most one default address, and
//! exactly one once they have any address at all. Every sequence that
//! touches the default flag on more than one row (count, clear-others,
//! write) runs inside a single transaction scope, so two concurrent
//! "first address" calls cannot both be promoted.

use tracing::{debug, instrument};

use chalkboard_core::{AddressId, UserId};

use crate::error::CommerceError;
use crate::models::{Address, AddressPatch, NewAddress};
use crate::store::{StorageEngine, TransactionScope};

/// Manager for user shipping addresses.
pub struct AddressManager<'a, S: StorageEngine> {
    store: &'a S,
}

impl<'a, S: StorageEngine> AddressManager<'a, S> {
    /// Create a new address manager over the given storage engine.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create an address for a user.
    ///
    /// A requested default clears the flag on the user's other addresses
    /// first. A user's first address becomes the default regardless of what
    /// was requested.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self, input))]
    pub async fn create_address(
        &self,
        user_id: UserId,
        input: &NewAddress,
    ) -> Result<Address, CommerceError> {
        let mut scope = self.store.begin().await?;

        let existing = scope.count_addresses(user_id).await?;
        let is_default = input.is_default || existing == 0;
        if is_default {
            scope.clear_default_address(user_id).await?;
        }

        let address = scope.insert_address(user_id, input, is_default).await?;
        scope.commit().await?;

        debug!(address_id = %address.id, is_default, "address created");
        Ok(address)
    }

    /// Apply a partial update to an address.
    ///
    /// A patch that sets the default flag clears it on the owner's other
    /// addresses in the same scope. Unsetting the flag on the current
    /// default is rejected: it would leave the user with addresses but no
    /// default, and the way to move the flag is to set it on another
    /// address.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::AddressNotFound`] if the address is gone,
    /// [`CommerceError::Validation`] if the patch unsets the flag on the
    /// current default, or [`CommerceError::Storage`] if the storage engine
    /// fails.
    #[instrument(skip(self, patch))]
    pub async fn update_address(
        &self,
        address_id: AddressId,
        patch: &AddressPatch,
    ) -> Result<Address, CommerceError> {
        let mut scope = self.store.begin().await?;

        let current = scope
            .address(address_id)
            .await?
            .ok_or(CommerceError::AddressNotFound { address_id })?;

        if patch.is_default == Some(true) {
            scope.clear_default_address(current.user_id).await?;
        } else if patch.is_default == Some(false) && current.is_default {
            return Err(CommerceError::Validation(
                "cannot unset the default flag; set another address as the default instead"
                    .to_owned(),
            ));
        }

        let updated = scope
            .update_address(address_id, patch)
            .await?
            .ok_or(CommerceError::AddressNotFound { address_id })?;
        scope.commit().await?;

        Ok(updated)
    }

    /// Make the given address the user's default.
    ///
    /// Clears the flag on all of the user's addresses, then sets it on the
    /// target only if the target belongs to that user. Returns `false` and
    /// leaves everything untouched when it does not (the ownership check is
    /// security-relevant, not just data hygiene) or when the address does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn set_default_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<bool, CommerceError> {
        let mut scope = self.store.begin().await?;

        scope.clear_default_address(user_id).await?;
        if !scope.mark_default_address(user_id, address_id).await? {
            // Foreign or missing address: drop the scope, keeping the
            // previous default in place.
            return Ok(false);
        }

        scope.commit().await?;
        Ok(true)
    }

    /// Delete an address. Idempotent.
    ///
    /// Deleting the default address does NOT promote another one; the user
    /// has no default until they pick one explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, address_id: AddressId) -> Result<bool, CommerceError> {
        let mut scope = self.store.begin().await?;
        let deleted = scope.delete_address(address_id).await?;
        scope.commit().await?;
        Ok(deleted)
    }

    /// All addresses for a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Storage`] if the storage engine fails.
    #[instrument(skip(self))]
    pub async fn addresses(&self, user_id: UserId) -> Result<Vec<Address>, CommerceError> {
        let mut scope = self.store.begin().await?;
        Ok(scope.addresses(user_id).await?)
    }
}
