pub mod device_types;
pub mod identity;
pub mod internet_users;
