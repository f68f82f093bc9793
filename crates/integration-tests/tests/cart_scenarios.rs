//! Integration tests for cart operations through a mounted provider.
//!
//! These exercise the public handle API over an in-memory store and check
//! the resulting snapshots, not the persisted blob.

use std::sync::Arc;

use marketplace_cart::{CartConfig, CartError, CartHandle, CartProvider, MemoryStore};
use marketplace_core::ProductId;
use marketplace_integration_tests::product;

async fn mounted() -> CartProvider<MemoryStore> {
    CartProvider::mount(MemoryStore::new(), CartConfig::default()).await
}

fn lines(handle: &CartHandle) -> Vec<(String, u32)> {
    handle
        .products()
        .iter()
        .map(|item| (item.id.to_string(), item.quantity.get()))
        .collect()
}

// =============================================================================
// Add / Increment / Decrement
// =============================================================================

#[tokio::test]
async fn test_add_to_empty_cart() {
    let provider = mounted().await;
    let cart = provider.handle();

    let snapshot = cart.add_to_cart(product("p1", "Shirt", 10));

    assert_eq!(snapshot.len(), 1);
    let item = snapshot.get(&ProductId::new("p1")).expect("p1 in cart");
    assert_eq!(item.title, "Shirt");
    assert_eq!(item.quantity.get(), 1);
}

#[tokio::test]
async fn test_add_existing_product_increments() {
    let provider = mounted().await;
    let cart = provider.handle();

    cart.add_to_cart(product("p1", "Shirt", 10));
    cart.add_to_cart(product("p1", "Shirt", 10));

    assert_eq!(lines(&cart), vec![("p1".to_owned(), 2)]);
}

#[tokio::test]
async fn test_readding_first_item_does_not_duplicate_it() {
    let provider = mounted().await;
    let cart = provider.handle();

    cart.add_to_cart(product("first", "Cap", 5));
    cart.add_to_cart(product("second", "Mug", 7));
    cart.add_to_cart(product("first", "Cap", 5));

    assert_eq!(
        lines(&cart),
        vec![("first".to_owned(), 2), ("second".to_owned(), 1)]
    );
}

#[tokio::test]
async fn test_new_products_append_in_order() {
    let provider = mounted().await;
    let cart = provider.handle();

    for id in ["a", "b", "c"] {
        cart.add_to_cart(product(id, id, 1));
    }

    let ids: Vec<_> = lines(&cart).into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_decrement_last_unit_removes_line() {
    let provider = mounted().await;
    let cart = provider.handle();

    cart.add_to_cart(product("p1", "Shirt", 10));
    let snapshot = cart.decrement(&ProductId::new("p1"));

    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn test_decrement_above_one() {
    let provider = mounted().await;
    let cart = provider.handle();

    cart.add_to_cart(product("a", "A", 1));
    cart.add_to_cart(product("b", "B", 1));
    cart.increment(&ProductId::new("b"));
    cart.increment(&ProductId::new("b"));
    cart.decrement(&ProductId::new("b"));

    assert_eq!(
        lines(&cart),
        vec![("a".to_owned(), 1), ("b".to_owned(), 2)]
    );
}

#[tokio::test]
async fn test_increment_missing_leaves_cart_unchanged() {
    let provider = mounted().await;
    let cart = provider.handle();

    cart.add_to_cart(product("a", "A", 1));
    let before = cart.products();
    let after = cart.increment(&ProductId::new("missing"));

    assert_eq!(*after, *before);
}

#[tokio::test]
async fn test_decrement_missing_leaves_cart_unchanged() {
    let provider = mounted().await;
    let cart = provider.handle();

    cart.add_to_cart(product("a", "A", 1));
    let before = cart.products();
    let after = cart.decrement(&ProductId::new("missing"));

    assert_eq!(*after, *before);
}

// =============================================================================
// Handles and Subscribers
// =============================================================================

#[tokio::test]
async fn test_cloned_handles_share_state() {
    let provider = mounted().await;
    let list_screen = provider.handle();
    let detail_screen = list_screen.clone();

    detail_screen.add_to_cart(product("p1", "Shirt", 10));

    assert_eq!(list_screen.products().len(), 1);
    assert!(Arc::ptr_eq(&list_screen.products(), &detail_screen.products()));
}

#[tokio::test]
async fn test_subscriber_receives_latest_snapshot() {
    let provider = mounted().await;
    let cart = provider.handle();
    let mut badge = cart.subscribe();

    cart.add_to_cart(product("a", "A", 1));
    cart.add_to_cart(product("a", "A", 1));

    badge.changed().await.expect("provider alive");
    assert_eq!(badge.borrow_and_update().total_quantity(), 2);
}

#[tokio::test]
async fn test_context_exposes_same_operations() {
    let provider = mounted().await;
    let context = provider.handle().try_cart().expect("bound handle");

    context.add_to_cart(product("p1", "Shirt", 10));
    context.increment(&ProductId::new("p1"));
    assert_eq!(context.products().total_quantity(), 2);
    context.decrement(&ProductId::new("p1"));
    assert_eq!(context.products().total_quantity(), 1);
}

#[tokio::test]
async fn test_dropped_provider_unbinds_handles() {
    let provider = mounted().await;
    let cart = provider.handle();
    drop(provider);

    assert!(!cart.is_bound());
    assert!(matches!(cart.try_cart(), Err(CartError::OutsideProvider)));
}

#[tokio::test]
async fn test_shutdown_unbinds_handles_while_context_is_held() {
    let provider = mounted().await;
    let cart = provider.handle();
    let context = cart.try_cart().expect("bound handle");
    context.add_to_cart(product("p1", "Shirt", 10));

    provider.shutdown().await.expect("clean shutdown");

    assert!(!cart.is_bound());
    assert!(!context.is_bound());
    assert!(matches!(cart.try_cart(), Err(CartError::OutsideProvider)));
}

#[tokio::test]
#[should_panic(expected = "useCart must be used within a CartProvider")]
async fn test_operation_without_provider_panics() {
    let cart = CartHandle::detached();
    cart.add_to_cart(product("p1", "Shirt", 10));
}
