pub mod band;
pub mod cart;
pub mod contact;
pub mod order;
pub mod watch;

pub use band::{Band, BandInput};
pub use cart::{
    AddToCartRequest, AddToCartResponse, CartItemView, CartLine, CartOwner, CartView,
    ClearCartRequest, MergeCartRequest, UpdateCartItemRequest,
};
pub use contact::{
    ContactReceipt, ContactRequest, ContactSubmission, NewsletterSubscriber, SubscribeOutcome,
    SubscribeRequest, UnsubscribeRequest,
};
pub use order::{
    CancelOrderRequest, CreateOrderRequest, CreateOrderResponse, MonthlyRevenue, OrderItemView,
    OrderStatistics, OrderSummary, OrderView, RevenueSummary, StatusCount, UpdateOrderStatusRequest,
};
pub use watch::{
    ComparisonSpec, SizeCompatibility, Watch, WatchComparison, WatchCompatibility, WatchInput,
};
