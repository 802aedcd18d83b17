pub mod router;
pub mod router_type;
