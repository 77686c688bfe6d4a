use super::domain::{Account, AccountFilter, AccountId};
use crate::portal::repository::RepositoryError;

/// Storage abstraction for the `users` collection.
pub trait AccountRepository: Send + Sync {
    fn insert_account(&self, account: Account) -> Result<Account, RepositoryError>;
    /// Apply `change` to the stored account while holding the record, so
    /// concurrent writers touching other fields are not overwritten.
    fn modify_account(
        &self,
        id: &AccountId,
        change: &mut dyn FnMut(&mut Account),
    ) -> Result<Account, RepositoryError>;
    fn fetch_account(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError>;
    /// Matching accounts, oldest first.
    fn find_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, RepositoryError>;
}
