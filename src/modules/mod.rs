pub mod books;
pub mod reviews;
pub mod users;

use std::sync::Arc;

use shelf_authz::{JwtKeys, PasswordHasher};
use shelf_kernel::ModuleRegistry;

use crate::bootstrap::Stores;

/// Register every application module with the registry, sharing one set of
/// signing keys so tokens issued by `users` are accepted everywhere.
pub fn register_all(
    registry: &mut ModuleRegistry,
    stores: &Stores,
    keys: Arc<JwtKeys>,
    hasher: PasswordHasher,
) {
    let users = Arc::new(users::UserService::new(
        stores.users.clone(),
        hasher,
        keys.clone(),
    ));
    let books = Arc::new(books::BookService::new(stores.books.clone()));
    let reviews = Arc::new(reviews::ReviewService::new(stores.reviews.clone()));

    registry.register(users::create_module(users));
    registry.register(books::create_module(books, keys.clone()));
    registry.register(reviews::create_module(reviews, keys));
}
