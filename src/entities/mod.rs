pub mod border;
pub mod category;
pub mod flavor;
pub mod flavor_category;
pub mod order;
pub mod order_item;
pub mod order_item_flavor;
pub mod product;
pub mod user;
